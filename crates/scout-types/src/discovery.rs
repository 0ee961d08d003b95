//! Run stages and the soft-failure envelope stages report through.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stage of a discovery run.
///
/// Runs advance strictly along
/// `Idle → ScanPredefined → ScanEvents → ScanHeuristic → ScanLp → Enrich → Done`.
/// `Failed` is reachable from `Idle` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
	Idle,
	ScanPredefined,
	ScanEvents,
	ScanHeuristic,
	ScanLp,
	Enrich,
	Done,
	Failed,
}

impl RunStage {
	/// The four stages that contribute candidates.
	pub const SCAN_STAGES: [RunStage; 4] = [
		RunStage::ScanPredefined,
		RunStage::ScanEvents,
		RunStage::ScanHeuristic,
		RunStage::ScanLp,
	];

	/// Successor on the happy path.
	pub fn next(self) -> Option<RunStage> {
		match self {
			RunStage::Idle => Some(RunStage::ScanPredefined),
			RunStage::ScanPredefined => Some(RunStage::ScanEvents),
			RunStage::ScanEvents => Some(RunStage::ScanHeuristic),
			RunStage::ScanHeuristic => Some(RunStage::ScanLp),
			RunStage::ScanLp => Some(RunStage::Enrich),
			RunStage::Enrich => Some(RunStage::Done),
			RunStage::Done | RunStage::Failed => None,
		}
	}

	pub fn can_transition_to(self, target: RunStage) -> bool {
		match (self, target) {
			(RunStage::Idle, RunStage::Failed) => true,
			(from, to) => from.next() == Some(to),
		}
	}

	pub fn is_scan(self) -> bool {
		Self::SCAN_STAGES.contains(&self)
	}
}

impl fmt::Display for RunStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			RunStage::Idle => "idle",
			RunStage::ScanPredefined => "scan_predefined",
			RunStage::ScanEvents => "scan_events",
			RunStage::ScanHeuristic => "scan_heuristic",
			RunStage::ScanLp => "scan_lp",
			RunStage::Enrich => "enrich",
			RunStage::Done => "done",
			RunStage::Failed => "failed",
		};
		f.write_str(label)
	}
}

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
	/// The stage reached its data source at least once.
	Completed,
	/// The stage had nothing to do.
	Skipped,
	/// The stage's data source failed outright.
	Failed,
}

/// A failure that is recorded but never interrupts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoftError {
	/// A contract call reverted or the node was unreachable.
	#[error("Chain call failed for {address}: {message}")]
	ChainCall { address: String, message: String },
	/// The log-query service returned an error.
	#[error("Log query failed: {message}")]
	LogQuery { message: String },
	/// The metadata registry could not be reached or refused the request.
	#[error("Registry lookup failed for {address}: {message}")]
	RegistryFetch { address: String, message: String },
}

/// Marker attached to a run that found nothing because every scan stage failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("No tokens found: no scan stage produced candidates ({} failed)", .failed_stages.len())]
pub struct ExhaustionError {
	pub failed_stages: Vec<RunStage>,
}

/// A soft error tagged with the stage it happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
	pub stage: RunStage,
	pub error: SoftError,
}

/// A value that is always usable, plus the soft error that degraded it.
///
/// Degraded values are the documented fallbacks: a zero balance, the
/// placeholder metadata triple, an empty candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soft<T> {
	pub value: T,
	pub error: Option<SoftError>,
}

impl<T> Soft<T> {
	pub fn ok(value: T) -> Self {
		Self { value, error: None }
	}

	pub fn degraded(value: T, error: SoftError) -> Self {
		Self {
			value,
			error: Some(error),
		}
	}

	pub fn is_degraded(&self) -> bool {
		self.error.is_some()
	}

	pub fn into_parts(self) -> (T, Option<SoftError>) {
		(self.value, self.error)
	}

	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Soft<U> {
		Soft {
			value: f(self.value),
			error: self.error,
		}
	}
}
