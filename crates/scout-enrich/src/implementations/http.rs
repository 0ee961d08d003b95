//! Generic JSON registry: `GET {base_url}/token/{address}`.

use crate::{MetadataRegistryInterface, RegistryError, RegistryRecord};
use async_trait::async_trait;
use reqwest::StatusCode;
use scout_types::{
	normalize_address, validators, Address, ConfigSchema, Field, FieldType, Schema,
	ValidationError,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Connection settings shared by the HTTP registry implementations.
#[derive(Debug, Clone)]
pub(crate) struct HttpSettings {
	pub base_url: String,
	pub headers: Vec<(String, String)>,
	pub timeout: Duration,
}

impl HttpSettings {
	pub fn from_config(config: &toml::Value) -> Result<Self, RegistryError> {
		let base_url = config
			.get("base_url")
			.and_then(|v| v.as_str())
			.ok_or_else(|| RegistryError::Config("base_url is required".to_string()))?
			.trim_end_matches('/')
			.to_string();

		let timeout_ms = config
			.get("timeout_ms")
			.and_then(|v| v.as_integer())
			.map(|v| v as u64)
			.unwrap_or(DEFAULT_TIMEOUT_MS);

		let headers = config
			.get("headers")
			.and_then(|v| v.as_table())
			.map(|table| {
				table
					.iter()
					.filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
					.collect()
			})
			.unwrap_or_default();

		Ok(Self {
			base_url,
			headers,
			timeout: Duration::from_millis(timeout_ms),
		})
	}

	pub fn client(&self) -> Result<reqwest::Client, RegistryError> {
		reqwest::Client::builder()
			.timeout(self.timeout)
			.build()
			.map_err(|e| RegistryError::Config(format!("Failed to build HTTP client: {}", e)))
	}

	/// Fetches and decodes `url`; 404 is `None`, 429 is [`RegistryError::RateLimited`].
	pub async fn get_json<T: DeserializeOwned>(
		&self,
		client: &reqwest::Client,
		url: &str,
	) -> Result<Option<T>, RegistryError> {
		let mut request = client.get(url);
		for (key, value) in &self.headers {
			request = request.header(key, value);
		}

		let response = request
			.send()
			.await
			.map_err(|e| RegistryError::Network(e.to_string()))?;

		match response.status() {
			StatusCode::NOT_FOUND => return Ok(None),
			StatusCode::TOO_MANY_REQUESTS => return Err(RegistryError::RateLimited),
			status if !status.is_success() => {
				return Err(RegistryError::Network(format!(
					"Registry returned status: {}",
					status
				)))
			}
			_ => {}
		}

		response
			.json::<T>()
			.await
			.map(Some)
			.map_err(|e| RegistryError::Decode(e.to_string()))
	}
}

/// Fields shared by every HTTP registry schema.
pub(crate) fn connection_fields() -> (Vec<Field>, Vec<Field>) {
	let required =
		vec![Field::new("base_url", FieldType::String).with_validator(validators::http_url)];
	let optional = vec![
		Field::new(
			"timeout_ms",
			FieldType::Integer {
				min: Some(1),
				max: None,
			},
		),
		Field::new("headers", FieldType::Table(Schema::new(vec![], vec![]))).with_validator(
			|value| match value.as_table() {
				Some(table) if table.values().all(|v| v.is_str()) => Ok(()),
				_ => Err("Header values must be strings".to_string()),
			},
		),
	];
	(required, optional)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	name: Option<String>,
	symbol: Option<String>,
	image: Option<String>,
	id: Option<String>,
}

/// Registry answering `GET {base_url}/token/{address}` with `{name, symbol, image}`.
pub struct HttpRegistry {
	settings: HttpSettings,
	client: reqwest::Client,
}

impl HttpRegistry {
	pub(crate) fn new(settings: HttpSettings) -> Result<Self, RegistryError> {
		let client = settings.client()?;
		Ok(Self { settings, client })
	}
}

/// Configuration schema for HttpRegistry.
pub struct HttpRegistrySchema;

impl ConfigSchema for HttpRegistrySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let (required, optional) = connection_fields();
		Schema::new(required, optional).validate(config)
	}
}

#[async_trait]
impl MetadataRegistryInterface for HttpRegistry {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpRegistrySchema)
	}

	async fn lookup(&self, address: Address) -> Result<Option<RegistryRecord>, RegistryError> {
		let url = format!(
			"{}/token/{}",
			self.settings.base_url,
			normalize_address(&address)
		);

		let response: Option<TokenResponse> = self.settings.get_json(&self.client, &url).await?;
		Ok(response.map(|r| RegistryRecord {
			name: r.name,
			symbol: r.symbol,
			image: r.image,
			id: r.id,
		}))
	}
}

/// Factory function to create an HTTP registry from configuration.
///
/// Required configuration parameters:
/// - `base_url`: registry root, without the `/token` suffix
///
/// Optional configuration parameters:
/// - `timeout_ms`: per-request timeout (default 10000)
/// - `headers`: static request headers, e.g. API keys
pub fn create_registry(
	config: &toml::Value,
) -> Result<Box<dyn MetadataRegistryInterface>, RegistryError> {
	HttpRegistrySchema
		.validate(config)
		.map_err(|e| RegistryError::Config(e.to_string()))?;

	Ok(Box::new(HttpRegistry::new(HttpSettings::from_config(
		config,
	)?)?))
}
