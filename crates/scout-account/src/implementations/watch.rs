//! Watch-only account backed by a configured address.

use crate::{AccountError, AccountInterface};
use async_trait::async_trait;
use scout_types::{
	parse_address, validators, Address, ConfigSchema, Field, FieldType, Schema, ValidationError,
};

/// An account that exposes a fixed address and holds no keys.
///
/// A missing address models "no wallet connected".
pub struct WatchAccount {
	address: Option<Address>,
}

impl WatchAccount {
	pub fn new(address: Option<Address>) -> Self {
		Self { address }
	}
}

/// Configuration schema for WatchAccount.
pub struct WatchAccountSchema;

impl ConfigSchema for WatchAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("address", FieldType::String).with_validator(validators::address)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for WatchAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WatchAccountSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		self.address.ok_or(AccountError::NotConnected)
	}
}

/// Factory function to create a watch account from configuration.
///
/// Optional configuration parameters:
/// - `address`: the address to scan; leaving it out yields a disconnected account
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	WatchAccountSchema
		.validate(config)
		.map_err(|e| AccountError::Config(e.to_string()))?;

	let address = match config.get("address").and_then(|v| v.as_str()) {
		Some(raw) => {
			Some(parse_address(raw).map_err(|e| AccountError::InvalidAddress(e.to_string()))?)
		}
		None => None,
	};

	tracing::debug!(connected = address.is_some(), "Created watch account");
	Ok(Box::new(WatchAccount::new(address)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_create_from_config() {
		let config: toml::Value =
			toml::from_str(r#"address = "0xdAC17F958D2ee523a2206206994597C13D831ec7""#).unwrap();
		let account = create_account(&config).unwrap();
		let expected = parse_address("0xdac17f958d2ee523a2206206994597c13d831ec7").unwrap();
		assert_eq!(account.address().await.unwrap(), expected);
	}

	#[tokio::test]
	async fn test_missing_address_is_disconnected() {
		let config = toml::Value::Table(toml::map::Map::new());
		let account = create_account(&config).unwrap();
		assert!(matches!(
			account.address().await,
			Err(AccountError::NotConnected)
		));
	}

	#[test]
	fn test_rejects_malformed_address() {
		let config: toml::Value = toml::from_str(r#"address = "0xnope""#).unwrap();
		assert!(matches!(
			create_account(&config),
			Err(AccountError::Config(_))
		));
	}
}
