//! Token holdings and the metadata attached to them.
//!
//! A [`TokenHolding`] is one fungible token owned by the scanned address. It
//! starts life either from a curated registry entry (metadata already known)
//! or from an on-chain probe (metadata read from the contract, possibly the
//! placeholder triple), and may later be upgraded by the metadata enricher.

use crate::serde_helpers::{lowercase_address, u256_decimal};
use crate::candidate::normalize_address;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name used until real metadata is known.
pub const PLACEHOLDER_NAME: &str = "Unknown Token";
/// Ticker used until real metadata is known.
pub const PLACEHOLDER_SYMBOL: &str = "UNKNOWN";
/// Decimals assumed when the contract cannot be asked.
pub const PLACEHOLDER_DECIMALS: u8 = 18;

/// Provenance of a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
	/// Found in the curated registry.
	Predefined,
	/// Found through the heuristic pool of well-known addresses.
	Discovered,
	/// Found through the liquidity-pool pool.
	LpDiscovered,
	/// Surfaced by mining transfer logs.
	LogDerived,
}

impl fmt::Display for TokenSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			TokenSource::Predefined => "predefined",
			TokenSource::Discovered => "discovered",
			TokenSource::LpDiscovered => "lp_discovered",
			TokenSource::LogDerived => "log_derived",
		};
		f.write_str(label)
	}
}

/// Name, symbol and decimals as reported by a token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
}

impl TokenMetadata {
	/// The `(Unknown Token, UNKNOWN, 18)` triple.
	pub fn placeholder() -> Self {
		Self {
			name: PLACEHOLDER_NAME.to_string(),
			symbol: PLACEHOLDER_SYMBOL.to_string(),
			decimals: PLACEHOLDER_DECIMALS,
		}
	}
}

impl Default for TokenMetadata {
	fn default() -> Self {
		Self::placeholder()
	}
}

/// An entry of the caller-supplied curated registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedToken {
	#[serde(with = "lowercase_address")]
	pub address: Address,
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo: Option<String>,
	#[serde(default)]
	pub is_lp: bool,
}

/// The two underlying tokens of a pair-style contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairTokens {
	pub token0: Address,
	pub token1: Address,
}

/// One token owned by the scanned address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
	/// Contract address, serialized lower-cased.
	#[serde(with = "lowercase_address")]
	pub address: Address,
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
	#[serde(with = "u256_decimal")]
	pub raw_balance: U256,
	/// `raw_balance / 10^decimals` rendered as a decimal string.
	pub formatted_balance: String,
	pub is_lp: bool,
	pub source: TokenSource,
	/// True once curated or registry metadata has been applied.
	pub metadata_complete: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo: Option<String>,
	/// Identifier of the record in the metadata registry, if enriched.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub registry_id: Option<String>,
}

impl TokenHolding {
	/// Builds a holding from a curated registry entry.
	pub fn curated(token: &CuratedToken, raw_balance: U256) -> Self {
		Self {
			address: token.address,
			name: token.name.clone(),
			symbol: token.symbol.clone(),
			decimals: token.decimals,
			raw_balance,
			formatted_balance: format_units(raw_balance, token.decimals),
			is_lp: token.is_lp,
			source: TokenSource::Predefined,
			metadata_complete: true,
			logo: token.logo.clone(),
			registry_id: None,
		}
	}

	/// Builds a holding from on-chain metadata.
	///
	/// On-chain metadata never counts as complete; only curated or registry
	/// data does.
	pub fn discovered(
		address: Address,
		metadata: TokenMetadata,
		raw_balance: U256,
		source: TokenSource,
	) -> Self {
		Self {
			address,
			formatted_balance: format_units(raw_balance, metadata.decimals),
			name: metadata.name,
			symbol: metadata.symbol,
			decimals: metadata.decimals,
			raw_balance,
			is_lp: false,
			source,
			metadata_complete: false,
			logo: None,
			registry_id: None,
		}
	}

	/// Marks the holding as a liquidity-pool share of `symbol0`/`symbol1`.
	pub fn with_pair(mut self, symbol0: &str, symbol1: &str) -> Self {
		let (symbol, name) = lp_labels(symbol0, symbol1);
		self.symbol = symbol;
		self.name = name;
		self.is_lp = true;
		self
	}

	/// Normalized identity key of this holding.
	pub fn key(&self) -> String {
		normalize_address(&self.address)
	}
}

/// Synthesizes the `(symbol, name)` labels of a pair share.
pub fn lp_labels(symbol0: &str, symbol1: &str) -> (String, String) {
	let symbol = format!("{}/{}", symbol0, symbol1);
	let name = format!("{} LP Token", symbol);
	(symbol, name)
}

/// Renders `raw / 10^decimals` as a decimal string.
///
/// Trailing zeros of the fraction are dropped but at least one fractional
/// digit is kept, so `1_000_000` with 6 decimals renders as `"1.0"`.
pub fn format_units(raw: U256, decimals: u8) -> String {
	let digits = raw.to_string();
	let decimals = decimals as usize;

	let padded = if digits.len() <= decimals {
		format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
	} else {
		digits
	};

	let (whole, fraction) = padded.split_at(padded.len() - decimals);
	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() {
		format!("{}.0", whole)
	} else {
		format!("{}.{}", whole, fraction)
	}
}
