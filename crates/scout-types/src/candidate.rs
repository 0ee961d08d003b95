//! Candidate addresses fed to the scan stages.

use crate::token::TokenSource;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a 20-byte hex address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid address: '{0}'")]
pub struct InvalidAddress(pub String);

/// The pool a candidate address was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePool {
	Curated,
	Heuristic,
	Lp,
	EventLog,
}

impl CandidatePool {
	/// Provenance recorded on holdings found through this pool.
	pub fn source(&self) -> TokenSource {
		match self {
			CandidatePool::Curated => TokenSource::Predefined,
			CandidatePool::Heuristic => TokenSource::Discovered,
			CandidatePool::Lp => TokenSource::LpDiscovered,
			CandidatePool::EventLog => TokenSource::LogDerived,
		}
	}
}

/// A bare address plus the pool it came from. Lives for one run only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateAddress {
	pub address: Address,
	pub pool: CandidatePool,
}

impl CandidateAddress {
	pub fn new(address: Address, pool: CandidatePool) -> Self {
		Self { address, pool }
	}
}

/// Parses a `0x`-prefixed hex address regardless of letter case.
///
/// Mixed-case input is accepted without checksum verification; identity is
/// case-insensitive.
pub fn parse_address(raw: &str) -> Result<Address, InvalidAddress> {
	let trimmed = raw.trim();
	let hex_part = trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
		.ok_or_else(|| InvalidAddress(raw.to_string()))?;

	if hex_part.len() != 40 {
		return Err(InvalidAddress(raw.to_string()));
	}

	let bytes = hex::decode(hex_part).map_err(|_| InvalidAddress(raw.to_string()))?;
	Ok(Address::from_slice(&bytes))
}

/// Lower-case `0x` rendering used as the identity key of an address.
pub fn normalize_address(address: &Address) -> String {
	format!("0x{}", hex::encode(address.as_slice()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_address_is_case_insensitive() {
		let upper = parse_address("0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48").unwrap();
		let lower = parse_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
		let mixed = parse_address(" 0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48 ").unwrap();

		assert_eq!(upper, lower);
		assert_eq!(lower, mixed);
		assert_eq!(
			normalize_address(&upper),
			"0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
		);
	}

	#[test]
	fn test_parse_address_rejects_garbage() {
		assert!(parse_address("").is_err());
		assert!(parse_address("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_err());
		assert!(parse_address("0x1234").is_err());
		assert!(parse_address("0xZZb86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_err());
	}

	#[test]
	fn test_pool_provenance() {
		assert_eq!(CandidatePool::Curated.source(), TokenSource::Predefined);
		assert_eq!(CandidatePool::Heuristic.source(), TokenSource::Discovered);
		assert_eq!(CandidatePool::Lp.source(), TokenSource::LpDiscovered);
		assert_eq!(CandidatePool::EventLog.source(), TokenSource::LogDerived);
	}
}
