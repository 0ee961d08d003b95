//! Candidate address pools for discovery.
//!
//! Three pools are supplied to the orchestrator:
//!
//! - **curated**: tokens whose metadata is already known, from inline
//!   configuration and token-list files
//! - **heuristic**: well-known token addresses without local metadata
//! - **lp**: addresses expected to be liquidity-pool shares
//!
//! Addresses are deduplicated case-insensitively within and across pools
//! before anything is returned, so no address is probed twice. An address
//! listed in several pools stays in the first of curated, lp, heuristic.

use scout_types::{
	parse_address, Address, CandidateAddress, CandidatePool, CuratedToken, InvalidAddress,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
	#[error("Invalid address in {pool} pool: {source}")]
	InvalidAddress {
		pool: &'static str,
		#[source]
		source: InvalidAddress,
	},
	#[error("Failed to read token list {path:?}: {message}")]
	TokenList { path: PathBuf, message: String },
}

/// Pool definitions as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
	#[serde(default)]
	pub curated: Vec<CuratedToken>,
	#[serde(default)]
	pub heuristic: Vec<String>,
	#[serde(default)]
	pub lp: Vec<String>,
	/// JSON token-list files whose entries join the curated pool. Relative paths
	/// are taken from the directory of the configuration file.
	#[serde(default)]
	pub token_lists: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct TokenListFile {
	tokens: Vec<TokenListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenListEntry {
	#[serde(default)]
	chain_id: Option<u64>,
	address: String,
	name: String,
	symbol: String,
	decimals: u8,
	#[serde(default, rename = "logoURI")]
	logo_uri: Option<String>,
}

/// The three deduplicated candidate pools of one run.
#[derive(Debug, Clone, Default)]
pub struct AddressUniverse {
	curated: Vec<CuratedToken>,
	heuristic: Vec<Address>,
	lp: Vec<Address>,
}

impl AddressUniverse {
	/// Builds the pools from configuration, reading any token-list files.
	///
	/// Token-list entries for another chain are ignored when `chain_id` is known.
	pub async fn load(
		config: &UniverseConfig,
		chain_id: Option<u64>,
	) -> Result<Self, UniverseError> {
		let mut curated = config.curated.clone();
		for path in &config.token_lists {
			curated.extend(read_token_list(path, chain_id).await?);
		}

		let heuristic = parse_pool("heuristic", &config.heuristic)?;
		let lp = parse_pool("lp", &config.lp)?;

		Ok(Self::new(curated, heuristic, lp))
	}

	/// Builds the pools from already-parsed entries.
	pub fn new(curated: Vec<CuratedToken>, heuristic: Vec<Address>, lp: Vec<Address>) -> Self {
		let mut seen = HashSet::new();

		let curated_count = curated.len();
		let curated: Vec<CuratedToken> = curated
			.into_iter()
			.filter(|token| seen.insert(token.address))
			.collect();
		let lp: Vec<Address> = lp.into_iter().filter(|a| seen.insert(*a)).collect();
		let heuristic: Vec<Address> = heuristic.into_iter().filter(|a| seen.insert(*a)).collect();

		tracing::debug!(
			curated = curated.len(),
			curated_duplicates = curated_count - curated.len(),
			heuristic = heuristic.len(),
			lp = lp.len(),
			"Built address universe"
		);

		Self {
			curated,
			heuristic,
			lp,
		}
	}

	pub fn curated(&self) -> &[CuratedToken] {
		&self.curated
	}

	pub fn heuristic(&self) -> Vec<CandidateAddress> {
		to_candidates(&self.heuristic, CandidatePool::Heuristic)
	}

	pub fn lp(&self) -> Vec<CandidateAddress> {
		to_candidates(&self.lp, CandidatePool::Lp)
	}

	pub fn len(&self) -> usize {
		self.curated.len() + self.heuristic.len() + self.lp.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

fn to_candidates(addresses: &[Address], pool: CandidatePool) -> Vec<CandidateAddress> {
	addresses
		.iter()
		.map(|a| CandidateAddress::new(*a, pool))
		.collect()
}

fn parse_pool(pool: &'static str, raw: &[String]) -> Result<Vec<Address>, UniverseError> {
	raw.iter()
		.map(|s| parse_address(s).map_err(|source| UniverseError::InvalidAddress { pool, source }))
		.collect()
}

async fn read_token_list(
	path: &Path,
	chain_id: Option<u64>,
) -> Result<Vec<CuratedToken>, UniverseError> {
	let list_error = |message: String| UniverseError::TokenList {
		path: path.to_path_buf(),
		message,
	};

	let contents = tokio::fs::read_to_string(path)
		.await
		.map_err(|e| list_error(e.to_string()))?;
	let list: TokenListFile =
		serde_json::from_str(&contents).map_err(|e| list_error(e.to_string()))?;

	let mut tokens = Vec::with_capacity(list.tokens.len());
	for entry in list.tokens {
		if let (Some(wanted), Some(entry_chain)) = (chain_id, entry.chain_id) {
			if wanted != entry_chain {
				continue;
			}
		}
		let address = parse_address(&entry.address).map_err(|e| list_error(e.to_string()))?;
		tokens.push(CuratedToken {
			address,
			name: entry.name,
			symbol: entry.symbol,
			decimals: entry.decimals,
			logo: entry.logo_uri,
			is_lp: false,
		});
	}

	tracing::info!(path = ?path, tokens = tokens.len(), "Loaded token list");
	Ok(tokens)
}
