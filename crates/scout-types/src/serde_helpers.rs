//! Serde helpers for addresses and balances.

/// Serializes a `U256` as a base-10 string; accepts decimal or `0x` hex.
pub mod u256_decimal {
	use alloy::primitives::U256;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		raw.parse::<U256>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid integer '{}': {}", raw, e)))
	}
}

/// Serializes an address lower-cased; accepts any letter case.
pub mod lowercase_address {
	use crate::candidate::{normalize_address, parse_address};
	use alloy::primitives::Address;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &Address, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&normalize_address(value))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		parse_address(&raw).map_err(serde::de::Error::custom)
	}
}
