//! The result handed back to the caller of a discovery run.

use chrono::{DateTime, Utc};
use scout_types::{Address, ExhaustionError, RunStage, StageError, StageStatus, TokenHolding};
use serde::Serialize;

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
	pub stage: RunStage,
	pub status: StageStatus,
	/// Candidates probed (after skipping addresses already held).
	pub candidates: usize,
	/// Holdings inserted, replaced or enriched.
	pub accepted: usize,
	/// Soft errors recorded during the stage.
	pub errors: usize,
	pub elapsed_ms: u64,
}

/// Inventory and diagnostics of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
	#[serde(serialize_with = "serialize_address")]
	pub owner: Address,
	/// Holdings in insertion order; every balance is positive.
	pub holdings: Vec<TokenHolding>,
	pub stages: Vec<StageReport>,
	pub errors: Vec<StageError>,
	/// Set when no scan stage produced candidates and nothing was found.
	pub exhaustion: Option<ExhaustionError>,
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
}

impl DiscoveryReport {
	pub fn is_exhausted(&self) -> bool {
		self.exhaustion.is_some()
	}

	pub fn stage(&self, stage: RunStage) -> Option<&StageReport> {
		self.stages.iter().find(|s| s.stage == stage)
	}

	pub fn lp_count(&self) -> usize {
		self.holdings.iter().filter(|h| h.is_lp).count()
	}
}

fn serialize_address<S: serde::Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
	scout_types::serde_helpers::lowercase_address::serialize(address, s)
}
