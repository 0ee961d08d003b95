//! CoinGecko contract lookup: `GET {base_url}/coins/{platform}/contract/{address}`.

use super::http::{connection_fields, HttpSettings};
use crate::{MetadataRegistryInterface, RegistryError, RegistryRecord};
use async_trait::async_trait;
use scout_types::{
	normalize_address, validators, Address, ConfigSchema, Field, FieldType, Schema,
	ValidationError,
};
use serde::Deserialize;

const DEFAULT_PLATFORM: &str = "ethereum";

#[derive(Debug, Deserialize)]
struct CoinResponse {
	id: Option<String>,
	name: Option<String>,
	symbol: Option<String>,
	image: Option<CoinImage>,
}

#[derive(Debug, Deserialize)]
struct CoinImage {
	small: Option<String>,
}

/// CoinGecko-backed registry. Symbols come back lower-cased and are
/// upper-cased here.
pub struct CoinGeckoRegistry {
	settings: HttpSettings,
	platform: String,
	client: reqwest::Client,
}

/// Configuration schema for CoinGeckoRegistry.
pub struct CoinGeckoSchema;

impl ConfigSchema for CoinGeckoSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let (required, mut optional) = connection_fields();
		optional.push(
			Field::new("platform", FieldType::String).with_validator(validators::non_empty),
		);
		Schema::new(required, optional).validate(config)
	}
}

#[async_trait]
impl MetadataRegistryInterface for CoinGeckoRegistry {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(CoinGeckoSchema)
	}

	async fn lookup(&self, address: Address) -> Result<Option<RegistryRecord>, RegistryError> {
		let url = format!(
			"{}/coins/{}/contract/{}",
			self.settings.base_url,
			self.platform,
			normalize_address(&address)
		);

		let response: Option<CoinResponse> = self.settings.get_json(&self.client, &url).await?;
		Ok(response.map(|coin| RegistryRecord {
			name: coin.name,
			symbol: coin.symbol.map(|s| s.to_uppercase()),
			image: coin.image.and_then(|i| i.small),
			id: coin.id,
		}))
	}
}

/// Factory function to create a CoinGecko registry from configuration.
///
/// Required configuration parameters:
/// - `base_url`: API root, e.g. `https://api.coingecko.com/api/v3`
///
/// Optional configuration parameters:
/// - `platform`: asset platform id (default `ethereum`)
/// - `timeout_ms`: per-request timeout (default 10000)
/// - `headers`: static request headers such as `x-cg-pro-api-key`
pub fn create_registry(
	config: &toml::Value,
) -> Result<Box<dyn MetadataRegistryInterface>, RegistryError> {
	CoinGeckoSchema
		.validate(config)
		.map_err(|e| RegistryError::Config(e.to_string()))?;

	let settings = HttpSettings::from_config(config)?;
	let platform = config
		.get("platform")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_PLATFORM)
		.to_string();
	let client = settings.client()?;

	Ok(Box::new(CoinGeckoRegistry {
		settings,
		platform,
		client,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const USDT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

	#[tokio::test]
	async fn test_lookup_maps_coin_fields() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(format!("/api/v3/coins/ethereum/contract/{}", USDT)))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"id": "tether",
				"symbol": "usdt",
				"name": "Tether",
				"image": {
					"thumb": "https://img/thumb/usdt.png",
					"small": "https://img/small/usdt.png",
					"large": "https://img/large/usdt.png"
				},
				"market_data": {}
			})))
			.mount(&server)
			.await;

		let config: toml::Value =
			toml::from_str(&format!(r#"base_url = "{}/api/v3""#, server.uri())).unwrap();
		let registry = create_registry(&config).unwrap();

		// mixed-case input is normalized in the request path
		let record = registry
			.lookup("0xdAC17F958D2ee523a2206206994597C13D831ec7".parse().unwrap())
			.await
			.unwrap()
			.unwrap();

		assert_eq!(record.symbol.as_deref(), Some("USDT"));
		assert_eq!(record.name.as_deref(), Some("Tether"));
		assert_eq!(record.image.as_deref(), Some("https://img/small/usdt.png"));
		assert_eq!(record.id.as_deref(), Some("tether"));
	}

	#[tokio::test]
	async fn test_custom_platform_and_unknown_token() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(format!("/coins/polygon-pos/contract/{}", USDT)))
			.respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "coin not found"})))
			.mount(&server)
			.await;

		let config: toml::Value = toml::from_str(&format!(
			r#"
			base_url = "{}"
			platform = "polygon-pos"
			"#,
			server.uri()
		))
		.unwrap();
		let registry = create_registry(&config).unwrap();

		assert_eq!(registry.lookup(USDT.parse().unwrap()).await.unwrap(), None);
	}

	#[test]
	fn test_schema_rejects_blank_platform() {
		let config: toml::Value = toml::from_str(
			r#"
			base_url = "https://api.coingecko.com/api/v3"
			platform = ""
			"#,
		)
		.unwrap();
		assert!(matches!(
			create_registry(&config),
			Err(RegistryError::Config(_))
		));
	}
}
