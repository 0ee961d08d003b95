//! Discovery orchestration for the token-scout workspace.
//!
//! [`DiscoveryEngine`] walks an owner address through the scan stages
//! (curated registry, transfer logs, heuristic list, LP list) and an optional
//! enrichment pass, folding everything it learns into one deduplicated
//! inventory. [`ScoutBuilder`] wires the engine from configuration and a set
//! of named implementation factories.

use scout_types::RunStage;
use thiserror::Error;

pub mod builder;
pub mod engine;
pub mod report;
pub mod run;

pub use builder::ScoutBuilder;
pub use engine::{DiscoveryEngine, EngineSettings};
pub use report::{DiscoveryReport, StageReport};
pub use run::{DiscoveryRun, MergeOutcome};

/// Errors that abort a discovery run before it produces a report.
#[derive(Debug, Error)]
pub enum DiscoveryError {
	#[error("No account connected: {0}")]
	NoAccount(String),
	#[error("Chain mismatch: expected chain id {expected}, node reports {actual}")]
	ChainMismatch { expected: u64, actual: u64 },
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Invalid stage transition from {from} to {to}")]
	InvalidTransition { from: RunStage, to: RunStage },
}
