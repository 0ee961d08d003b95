//! Metadata enrichment from an external token registry.
//!
//! Holdings that still carry on-chain or placeholder metadata get one lookup
//! each against a [`MetadataRegistryInterface`]. Lookups run with bounded
//! concurrency and never retry; a failed or empty lookup leaves the holding as
//! it was. Results are returned to the caller, which applies them with
//! [`apply_record`], so the enricher never touches the inventory itself.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use scout_types::{normalize_address, Address, ConfigSchema, Soft, SoftError, TokenHolding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod coingecko;
	pub mod http;
}

/// Errors that can occur during registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Rate limited by registry")]
	RateLimited,
	#[error("Failed to decode registry response: {0}")]
	Decode(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Display metadata returned by a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
	pub name: Option<String>,
	pub symbol: Option<String>,
	pub image: Option<String>,
	/// Registry-specific identifier of the record.
	pub id: Option<String>,
}

/// External lookup of token metadata by contract address.
#[async_trait]
pub trait MetadataRegistryInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Looks up `address`. An unknown token is `Ok(None)`, not an error.
	async fn lookup(&self, address: Address) -> Result<Option<RegistryRecord>, RegistryError>;
}

/// Result of one lookup.
#[derive(Debug, Clone)]
pub struct Enrichment {
	pub address: Address,
	pub record: Soft<Option<RegistryRecord>>,
}

/// Runs registry lookups for a batch of holdings.
pub struct MetadataEnricher {
	registry: Box<dyn MetadataRegistryInterface>,
	concurrency: usize,
}

impl MetadataEnricher {
	pub fn new(registry: Box<dyn MetadataRegistryInterface>, concurrency: usize) -> Self {
		Self {
			registry,
			concurrency: concurrency.max(1),
		}
	}

	/// Looks up every address once, preserving input order.
	pub async fn lookup_all(&self, addresses: &[Address]) -> Vec<Enrichment> {
		stream::iter(addresses.iter().copied())
			.map(|address| async move {
				let record = match self.registry.lookup(address).await {
					Ok(record) => Soft::ok(record),
					Err(e) => {
						tracing::warn!(token = %address, error = %e, "Registry lookup failed");
						Soft::degraded(
							None,
							SoftError::RegistryFetch {
								address: normalize_address(&address),
								message: e.to_string(),
							},
						)
					}
				};
				Enrichment { address, record }
			})
			.buffered(self.concurrency)
			.collect()
			.await
	}
}

/// Holdings the enricher should look up: not complete and not a pair share.
pub fn needs_enrichment(holding: &TokenHolding) -> bool {
	!holding.metadata_complete && !holding.is_lp
}

/// Applies a registry record to a holding.
///
/// Complete holdings are left alone. A record without a symbol counts as not
/// found, so a holding is never marked complete while still showing the
/// placeholder symbol. Returns whether the holding changed.
pub fn apply_record(holding: &mut TokenHolding, record: &RegistryRecord) -> bool {
	if holding.metadata_complete {
		return false;
	}

	let Some(symbol) = non_empty(&record.symbol) else {
		return false;
	};

	holding.symbol = symbol.to_string();
	if let Some(name) = non_empty(&record.name) {
		holding.name = name.to_string();
	}
	if let Some(image) = non_empty(&record.image) {
		holding.logo = Some(image.to_string());
	}
	holding.registry_id = record.id.clone();
	holding.metadata_complete = true;
	true
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;
	use scout_types::{Schema, TokenMetadata, TokenSource, ValidationError, U256};
	use std::collections::HashMap;

	struct EmptySchema;

	impl ConfigSchema for EmptySchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	struct FakeRegistry {
		records: HashMap<Address, Result<Option<RegistryRecord>, ()>>,
	}

	#[async_trait]
	impl MetadataRegistryInterface for FakeRegistry {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		async fn lookup(&self, address: Address) -> Result<Option<RegistryRecord>, RegistryError> {
			match self.records.get(&address) {
				Some(Ok(record)) => Ok(record.clone()),
				Some(Err(())) => Err(RegistryError::RateLimited),
				None => Ok(None),
			}
		}
	}

	fn placeholder_holding(byte: u8) -> TokenHolding {
		TokenHolding::discovered(
			Address::repeat_byte(byte),
			TokenMetadata::placeholder(),
			U256::from(1u64),
			TokenSource::Discovered,
		)
	}

	fn dai_record() -> RegistryRecord {
		RegistryRecord {
			name: Some("Dai".into()),
			symbol: Some("DAI".into()),
			image: Some("https://assets/dai.png".into()),
			id: Some("dai".into()),
		}
	}

	#[tokio::test]
	async fn test_lookup_all_preserves_order_and_records_failures() {
		let mut records = HashMap::new();
		records.insert(Address::repeat_byte(1), Ok(Some(dai_record())));
		records.insert(Address::repeat_byte(2), Err(()));

		let enricher = MetadataEnricher::new(Box::new(FakeRegistry { records }), 2);
		let addresses = [
			Address::repeat_byte(1),
			Address::repeat_byte(2),
			Address::repeat_byte(3),
		];
		let results = enricher.lookup_all(&addresses).await;

		assert_eq!(
			results.iter().map(|r| r.address).collect::<Vec<_>>(),
			addresses.to_vec()
		);
		assert_eq!(results[0].record.value, Some(dai_record()));
		assert!(matches!(
			results[1].record.error,
			Some(SoftError::RegistryFetch { .. })
		));
		assert_eq!(results[2].record.value, None);
		assert!(!results[2].record.is_degraded());
	}

	#[test]
	fn test_apply_record_upgrades_placeholder() {
		let mut holding = placeholder_holding(1);
		assert!(needs_enrichment(&holding));
		assert!(apply_record(&mut holding, &dai_record()));

		assert_eq!(holding.symbol, "DAI");
		assert_eq!(holding.name, "Dai");
		assert_eq!(holding.logo.as_deref(), Some("https://assets/dai.png"));
		assert_eq!(holding.registry_id.as_deref(), Some("dai"));
		assert!(holding.metadata_complete);
		assert!(!needs_enrichment(&holding));
	}

	#[test]
	fn test_apply_record_never_touches_complete_metadata() {
		let mut holding = placeholder_holding(1);
		holding.metadata_complete = true;
		holding.symbol = "CURATED".into();

		assert!(!apply_record(&mut holding, &dai_record()));
		assert_eq!(holding.symbol, "CURATED");
	}

	#[test]
	fn test_empty_record_is_not_found() {
		let mut holding = placeholder_holding(1);
		let empty = RegistryRecord {
			name: Some("  ".into()),
			image: Some("x.png".into()),
			..Default::default()
		};

		assert!(!apply_record(&mut holding, &empty));
		assert_eq!(holding.symbol, "UNKNOWN");
		assert!(!holding.metadata_complete);
		assert!(holding.logo.is_none());
	}

	#[test]
	fn test_record_without_symbol_is_not_found() {
		let mut holding = placeholder_holding(1);
		let name_only = RegistryRecord {
			name: Some("Dai".into()),
			image: Some("https://assets/dai.png".into()),
			..Default::default()
		};

		assert!(!apply_record(&mut holding, &name_only));
		assert_eq!(holding.name, "Unknown Token");
		assert_eq!(holding.symbol, "UNKNOWN");
		assert!(!holding.metadata_complete);
		assert!(needs_enrichment(&holding));
	}

	#[test]
	fn test_lp_shares_are_not_enriched() {
		let holding = placeholder_holding(1).with_pair("USDC", "WETH");
		assert!(!needs_enrichment(&holding));
	}
}
