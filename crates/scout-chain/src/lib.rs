//! Chain query module for the token-scout workspace.
//!
//! Read-only contract calls against token contracts: balances, metadata and
//! the pair-interface probe used to recognise liquidity-pool shares. The
//! [`ChainInterface`] reports failures as errors; [`ChainService`] turns them
//! into the documented fallbacks so that a broken contract can never abort a
//! discovery run.

use async_trait::async_trait;
use scout_types::{
	normalize_address, Address, ConfigSchema, PairTokens, Soft, SoftError, TokenMetadata,
	PLACEHOLDER_SYMBOL, U256,
};
use thiserror::Error;

pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during contract calls.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The contract reverted or returned data that does not decode.
	#[error("Call reverted: {0}")]
	Reverted(String),
	/// The node could not be reached or answered with a transport error.
	#[error("Network error: {0}")]
	Network(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Read-only access to token contracts on one chain.
///
/// Every method is idempotent; implementations perform no retries.
#[async_trait]
pub trait ChainInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Chain id reported by the node.
	async fn chain_id(&self) -> Result<u64, ChainError>;

	/// `balanceOf(owner)` on `token`.
	async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

	/// `name()`, `symbol()` and `decimals()` on `token`.
	async fn metadata(&self, token: Address) -> Result<TokenMetadata, ChainError>;

	/// `symbol()` on `token`.
	async fn symbol(&self, token: Address) -> Result<String, ChainError>;

	/// `token0()` and `token1()` on `token`.
	///
	/// A contract without the pair interface yields `Ok(None)`.
	async fn pair_tokens(&self, token: Address) -> Result<Option<PairTokens>, ChainError>;
}

/// Soft-failure wrapper around a [`ChainInterface`].
pub struct ChainService {
	client: Box<dyn ChainInterface>,
}

impl ChainService {
	pub fn new(client: Box<dyn ChainInterface>) -> Self {
		Self { client }
	}

	/// Chain id reported by the node. Unlike the probes, this is a hard call.
	pub async fn chain_id(&self) -> Result<u64, ChainError> {
		self.client.chain_id().await
	}

	/// Balance of `owner` in `token`; zero when the call fails.
	pub async fn get_balance(&self, token: Address, owner: Address) -> Soft<U256> {
		match self.client.balance_of(token, owner).await {
			Ok(balance) => Soft::ok(balance),
			Err(e) => {
				tracing::debug!(token = %token, error = %e, "balanceOf failed");
				Soft::degraded(U256::ZERO, chain_call(token, &e))
			}
		}
	}

	/// Token metadata; the placeholder triple when any part fails.
	pub async fn get_metadata(&self, token: Address) -> Soft<TokenMetadata> {
		match self.client.metadata(token).await {
			Ok(metadata) => Soft::ok(metadata),
			Err(e) => {
				tracing::debug!(token = %token, error = %e, "Metadata lookup failed");
				Soft::degraded(TokenMetadata::placeholder(), chain_call(token, &e))
			}
		}
	}

	/// Token symbol; `UNKNOWN` when the call fails.
	pub async fn get_symbol(&self, token: Address) -> Soft<String> {
		match self.client.symbol(token).await {
			Ok(symbol) => Soft::ok(symbol),
			Err(e) => Soft::degraded(PLACEHOLDER_SYMBOL.to_string(), chain_call(token, &e)),
		}
	}

	/// Pair constituents of `token`, or `None` for a plain token.
	///
	/// A failing probe is reported as "not a pair".
	pub async fn detect_pair(&self, token: Address) -> Soft<Option<PairTokens>> {
		match self.client.pair_tokens(token).await {
			Ok(pair) => Soft::ok(pair),
			Err(e) => {
				tracing::debug!(token = %token, error = %e, "Pair probe failed");
				Soft::degraded(None, chain_call(token, &e))
			}
		}
	}
}

fn chain_call(token: Address, error: &ChainError) -> SoftError {
	SoftError::ChainCall {
		address: normalize_address(&token),
		message: error.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use scout_types::{Field, FieldType, Schema, ValidationError};

	struct NoSchema;

	impl ConfigSchema for NoSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![Field::new("unused", FieldType::Boolean)]).validate(config)
		}
	}

	/// Answers for one healthy token and fails for everything else.
	struct OneToken {
		token: Address,
	}

	#[async_trait]
	impl ChainInterface for OneToken {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn chain_id(&self) -> Result<u64, ChainError> {
			Ok(1)
		}

		async fn balance_of(&self, token: Address, _owner: Address) -> Result<U256, ChainError> {
			if token == self.token {
				Ok(U256::from(7u64))
			} else {
				Err(ChainError::Reverted("execution reverted".into()))
			}
		}

		async fn metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
			if token == self.token {
				Ok(TokenMetadata {
					name: "Tether USD".into(),
					symbol: "USDT".into(),
					decimals: 6,
				})
			} else {
				Err(ChainError::Network("connection refused".into()))
			}
		}

		async fn symbol(&self, token: Address) -> Result<String, ChainError> {
			self.metadata(token).await.map(|m| m.symbol)
		}

		async fn pair_tokens(&self, token: Address) -> Result<Option<PairTokens>, ChainError> {
			if token == self.token {
				Ok(None)
			} else {
				Err(ChainError::Network("connection refused".into()))
			}
		}
	}

	fn service() -> (ChainService, Address, Address) {
		let good = Address::repeat_byte(0x01);
		let bad = Address::repeat_byte(0x02);
		(
			ChainService::new(Box::new(OneToken { token: good })),
			good,
			bad,
		)
	}

	#[tokio::test]
	async fn test_balance_failure_defaults_to_zero() {
		let (service, good, bad) = service();
		let owner = Address::repeat_byte(0xaa);

		let ok = service.get_balance(good, owner).await;
		assert_eq!(ok.value, U256::from(7u64));
		assert!(!ok.is_degraded());

		let failed = service.get_balance(bad, owner).await;
		assert_eq!(failed.value, U256::ZERO);
		assert!(matches!(
			failed.error,
			Some(SoftError::ChainCall { ref address, .. }) if *address == normalize_address(&bad)
		));
	}

	#[tokio::test]
	async fn test_metadata_failure_yields_placeholder() {
		let (service, good, bad) = service();

		assert_eq!(service.get_metadata(good).await.value.symbol, "USDT");

		let failed = service.get_metadata(bad).await;
		assert_eq!(failed.value, TokenMetadata::placeholder());
		assert!(failed.is_degraded());
		assert_eq!(service.get_symbol(bad).await.value, "UNKNOWN");
	}

	#[tokio::test]
	async fn test_pair_probe_failure_is_not_a_pair() {
		let (service, good, bad) = service();

		let plain = service.detect_pair(good).await;
		assert_eq!(plain.value, None);
		assert!(!plain.is_degraded());

		let failed = service.detect_pair(bad).await;
		assert_eq!(failed.value, None);
		assert!(failed.is_degraded());
	}
}
