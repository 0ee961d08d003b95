//! Chain query implementation for EVM networks using the Alloy library.

use crate::{ChainError, ChainInterface};
use alloy::primitives::{Address, FixedBytes, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::sol;
use async_trait::async_trait;
use scout_types::{
	validators, ConfigSchema, Field, FieldType, PairTokens, Schema, TokenMetadata,
	ValidationError,
};

sol! {
	#[sol(rpc)]
	interface IERC20Metadata {
		function balanceOf(address owner) external view returns (uint256);
		function decimals() external view returns (uint8);
		function symbol() external view returns (string);
		function name() external view returns (string);
	}

	/// Older tokens (MKR, SAI) return fixed-size strings.
	#[sol(rpc)]
	interface IERC20Bytes32Metadata {
		function symbol() external view returns (bytes32);
		function name() external view returns (bytes32);
	}

	#[sol(rpc)]
	interface IUniswapV2Pair {
		function token0() external view returns (address);
		function token1() external view returns (address);
	}
}

/// Alloy-backed chain client talking to one JSON-RPC endpoint.
pub struct AlloyChainClient {
	provider: RootProvider,
}

impl AlloyChainClient {
	pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
		let url = rpc_url
			.parse()
			.map_err(|e| ChainError::Config(format!("Invalid RPC URL: {}", e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
		})
	}

	async fn string_or_bytes32(
		&self,
		token: Address,
		field: StringField,
	) -> Result<String, ChainError> {
		let erc20 = IERC20Metadata::new(token, self.provider.clone());
		let primary = match field {
			StringField::Symbol => erc20.symbol().call().await,
			StringField::Name => erc20.name().call().await,
		};

		match primary {
			Ok(value) => Ok(value),
			Err(e) if is_missing_interface(&e) => {
				let legacy = IERC20Bytes32Metadata::new(token, self.provider.clone());
				let raw = match field {
					StringField::Symbol => legacy.symbol().call().await,
					StringField::Name => legacy.name().call().await,
				}
				.map_err(classify)?;
				decode_bytes32(raw).ok_or_else(|| {
					ChainError::Reverted(format!("{} is neither string nor bytes32", field.as_str()))
				})
			}
			Err(e) => Err(classify(e)),
		}
	}
}

#[derive(Clone, Copy)]
enum StringField {
	Symbol,
	Name,
}

impl StringField {
	fn as_str(&self) -> &'static str {
		match self {
			StringField::Symbol => "symbol()",
			StringField::Name => "name()",
		}
	}
}

/// Configuration schema for the Alloy chain client.
pub struct AlloyChainSchema;

impl ConfigSchema for AlloyChainSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::String).with_validator(validators::http_url)],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl ChainInterface for AlloyChainClient {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloyChainSchema)
	}

	async fn chain_id(&self) -> Result<u64, ChainError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| ChainError::Network(format!("Failed to get chain id: {}", e)))
	}

	async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
		IERC20Metadata::new(token, self.provider.clone())
			.balanceOf(owner)
			.call()
			.await
			.map_err(classify)
	}

	async fn metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
		let erc20 = IERC20Metadata::new(token, self.provider.clone());
		let decimals_call = erc20.decimals();

		let (decimals, symbol, name) = tokio::try_join!(
			async { decimals_call.call().await.map_err(classify) },
			self.string_or_bytes32(token, StringField::Symbol),
			self.string_or_bytes32(token, StringField::Name),
		)?;

		Ok(TokenMetadata {
			name,
			symbol,
			decimals,
		})
	}

	async fn symbol(&self, token: Address) -> Result<String, ChainError> {
		self.string_or_bytes32(token, StringField::Symbol).await
	}

	async fn pair_tokens(&self, token: Address) -> Result<Option<PairTokens>, ChainError> {
		let pair = IUniswapV2Pair::new(token, self.provider.clone());

		let token0 = match pair.token0().call().await {
			Ok(address) => address,
			Err(e) if is_missing_interface(&e) => return Ok(None),
			Err(e) => return Err(classify(e)),
		};
		if token0 == Address::ZERO {
			return Ok(None);
		}

		let token1 = match pair.token1().call().await {
			Ok(address) => address,
			Err(e) if is_missing_interface(&e) => return Ok(None),
			Err(e) => return Err(classify(e)),
		};

		Ok(Some(PairTokens { token0, token1 }))
	}
}

/// True when the error means the contract does not implement the function:
/// a revert, empty return data, or data that does not decode.
fn is_missing_interface(error: &alloy::contract::Error) -> bool {
	match error {
		alloy::contract::Error::ZeroData(..) | alloy::contract::Error::AbiError(_) => true,
		alloy::contract::Error::TransportError(e) => e.is_error_resp(),
		_ => false,
	}
}

fn classify(error: alloy::contract::Error) -> ChainError {
	if is_missing_interface(&error) {
		ChainError::Reverted(error.to_string())
	} else {
		ChainError::Network(error.to_string())
	}
}

/// Decodes a NUL-padded `bytes32` string.
fn decode_bytes32(raw: FixedBytes<32>) -> Option<String> {
	let end = raw.iter().position(|b| *b == 0).unwrap_or(32);
	let text = std::str::from_utf8(&raw[..end]).ok()?.trim();
	if text.is_empty() {
		None
	} else {
		Some(text.to_string())
	}
}

/// Factory function to create an Alloy chain client from configuration.
///
/// Required configuration parameters:
/// - `rpc_url`: HTTP(S) JSON-RPC endpoint
pub fn create_chain(config: &toml::Value) -> Result<Box<dyn ChainInterface>, ChainError> {
	AlloyChainSchema
		.validate(config)
		.map_err(|e| ChainError::Config(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| ChainError::Config("rpc_url is required".to_string()))?;

	Ok(Box::new(AlloyChainClient::new(rpc_url)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decode_bytes32() {
		let mut raw = [0u8; 32];
		raw[..3].copy_from_slice(b"MKR");
		assert_eq!(decode_bytes32(FixedBytes::from(raw)).as_deref(), Some("MKR"));

		assert_eq!(decode_bytes32(FixedBytes::ZERO), None);

		let mut invalid = [0u8; 32];
		invalid[0] = 0xff;
		assert_eq!(decode_bytes32(FixedBytes::from(invalid)), None);
	}

	#[test]
	fn test_schema_requires_http_url() {
		let ok: toml::Value = toml::from_str(r#"rpc_url = "https://eth.llamarpc.com""#).unwrap();
		assert!(AlloyChainSchema.validate(&ok).is_ok());

		let ws: toml::Value = toml::from_str(r#"rpc_url = "wss://eth.llamarpc.com""#).unwrap();
		assert!(AlloyChainSchema.validate(&ws).is_err());

		let empty = toml::Value::Table(toml::map::Map::new());
		assert!(matches!(create_chain(&empty), Err(ChainError::Config(_))));
	}

	#[tokio::test]
	async fn test_factory_builds_without_connecting() {
		let config: toml::Value = toml::from_str(r#"rpc_url = "http://127.0.0.1:1""#).unwrap();
		let client = create_chain(&config).unwrap();
		assert!(client.config_schema().validate(&config).is_ok());
	}
}
