//! Log source implementation using `eth_getLogs` through the Alloy library.

use crate::{LogError, LogSourceInterface, TransferLog};
use alloy::primitives::Address;
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::sol;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use scout_types::{validators, ConfigSchema, Field, FieldType, Schema, ValidationError};

sol! {
	/// Fungible transfer: both parties indexed, value in data.
	event Transfer(address indexed from, address indexed to, uint256 value);
}

/// Alloy-backed log source.
///
/// Each range is fetched with two filters, one with the owner as the indexed
/// sender and one with the owner as the indexed receiver.
pub struct AlloyLogSource {
	provider: RootProvider,
}

impl AlloyLogSource {
	pub fn new(rpc_url: &str) -> Result<Self, LogError> {
		let url = rpc_url
			.parse()
			.map_err(|e| LogError::Config(format!("Invalid RPC URL: {}", e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
		})
	}

	async fn fetch(&self, filter: &Filter) -> Result<Vec<TransferLog>, LogError> {
		let logs = self
			.provider
			.get_logs(filter)
			.await
			.map_err(|e| LogError::Query(format!("eth_getLogs failed: {}", e)))?;

		Ok(logs.iter().filter_map(decode_transfer).collect())
	}
}

/// Decodes a fungible transfer; ERC-721 transfers share the signature but
/// carry the token id as a fourth topic and no data, so they fail to decode
/// and are skipped.
fn decode_transfer(log: &Log) -> Option<TransferLog> {
	let decoded = log.log_decode::<Transfer>().ok()?;
	let event = &decoded.inner.data;

	Some(TransferLog {
		token: decoded.inner.address,
		from: event.from,
		to: event.to,
		amount: event.value,
		block_number: log.block_number,
	})
}

/// Configuration schema for the Alloy log source.
pub struct AlloyLogSchema;

impl ConfigSchema for AlloyLogSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::String).with_validator(validators::http_url)],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl LogSourceInterface for AlloyLogSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloyLogSchema)
	}

	async fn latest_block(&self) -> Result<u64, LogError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| LogError::Network(format!("Failed to get block number: {}", e)))
	}

	async fn transfer_logs(
		&self,
		owner: Address,
		from_block: u64,
		to_block: u64,
	) -> Result<Vec<TransferLog>, LogError> {
		let base = Filter::new()
			.event_signature(Transfer::SIGNATURE_HASH)
			.from_block(from_block)
			.to_block(to_block);

		let sent = base.clone().topic1(owner.into_word());
		let received = base.topic2(owner.into_word());

		let mut logs = self.fetch(&sent).await?;
		logs.extend(self.fetch(&received).await?);
		Ok(logs)
	}
}

/// Factory function to create an Alloy log source from configuration.
///
/// Required configuration parameters:
/// - `rpc_url`: HTTP(S) JSON-RPC endpoint that serves `eth_getLogs`
pub fn create_log_source(config: &toml::Value) -> Result<Box<dyn LogSourceInterface>, LogError> {
	AlloyLogSchema
		.validate(config)
		.map_err(|e| LogError::Config(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LogError::Config("rpc_url is required".to_string()))?;

	Ok(Box::new(AlloyLogSource::new(rpc_url)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{Bytes, LogData, B256, U256};

	fn rpc_log(topics: Vec<B256>, data: Bytes) -> Log {
		Log {
			inner: alloy::primitives::Log {
				address: Address::repeat_byte(0x77),
				data: LogData::new_unchecked(topics, data),
			},
			block_number: Some(42),
			..Default::default()
		}
	}

	#[test]
	fn test_decodes_fungible_transfer() {
		let from = Address::repeat_byte(0x01);
		let to = Address::repeat_byte(0x02);
		let log = rpc_log(
			vec![Transfer::SIGNATURE_HASH, from.into_word(), to.into_word()],
			Bytes::from(U256::from(500u64).to_be_bytes::<32>().to_vec()),
		);

		let transfer = decode_transfer(&log).unwrap();
		assert_eq!(transfer.token, Address::repeat_byte(0x77));
		assert_eq!(transfer.from, from);
		assert_eq!(transfer.to, to);
		assert_eq!(transfer.amount, U256::from(500u64));
		assert_eq!(transfer.block_number, Some(42));
	}

	#[test]
	fn test_skips_nft_transfer() {
		let log = rpc_log(
			vec![
				Transfer::SIGNATURE_HASH,
				Address::repeat_byte(0x01).into_word(),
				Address::repeat_byte(0x02).into_word(),
				B256::with_last_byte(9),
			],
			Bytes::new(),
		);

		assert!(decode_transfer(&log).is_none());
	}

	#[test]
	fn test_factory_validates_config() {
		let bad: toml::Value = toml::from_str(r#"rpc_url = "localhost:8545""#).unwrap();
		assert!(matches!(create_log_source(&bad), Err(LogError::Config(_))));

		let good: toml::Value = toml::from_str(r#"rpc_url = "http://localhost:8545""#).unwrap();
		assert!(create_log_source(&good).is_ok());
	}
}
