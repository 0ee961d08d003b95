//! Configuration types.

use scout_universe::UniverseConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration of a token-scout deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub scanner: ScannerConfig,
	pub account: ImplementationConfig,
	pub chain: ImplementationConfig,
	pub logs: LogsConfig,
	#[serde(default)]
	pub universe: UniverseConfig,
	#[serde(default)]
	pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
	/// Upper bound on concurrent probes within one stage.
	#[serde(default = "default_concurrency")]
	pub concurrency: usize,
	/// Expected chain id; checked against the node before a run.
	#[serde(default)]
	pub chain_id: Option<u64>,
}

impl Default for ScannerConfig {
	fn default() -> Self {
		Self {
			concurrency: default_concurrency(),
			chain_id: None,
		}
	}
}

/// Names a pluggable implementation and carries its own config table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationConfig {
	pub implementation: String,
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	pub implementation: String,
	/// Number of recent blocks covered by one scan.
	#[serde(default = "default_window_blocks")]
	pub window_blocks: u64,
	/// Largest block range requested in a single query.
	#[serde(default = "default_max_block_range")]
	pub max_block_range: u64,
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_registry")]
	pub implementation: String,
	#[serde(default = "default_enrichment_concurrency")]
	pub concurrency: usize,
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

impl Default for EnrichmentConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			implementation: default_registry(),
			concurrency: default_enrichment_concurrency(),
			config: empty_table(),
		}
	}
}

fn default_concurrency() -> usize {
	8
}

fn default_enrichment_concurrency() -> usize {
	4
}

fn default_window_blocks() -> u64 {
	10_000
}

fn default_max_block_range() -> u64 {
	2_000
}

fn default_registry() -> String {
	"coingecko".to_string()
}

fn default_true() -> bool {
	true
}

pub(crate) fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}
