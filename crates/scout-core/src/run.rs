//! Per-invocation accumulator and the merge policy.

use crate::report::{DiscoveryReport, StageReport};
use crate::DiscoveryError;
use chrono::{DateTime, Utc};
use scout_types::{
	Address, ExhaustionError, RunStage, SoftError, StageError, StageStatus, TokenHolding,
	TokenSource,
};
use std::collections::HashMap;

/// What [`DiscoveryRun::merge`] did with an incoming holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
	Inserted,
	Replaced,
	/// An entry with better provenance was already present.
	Kept,
	/// Zero balance; never part of an inventory.
	Rejected,
}

/// State of one discovery invocation.
///
/// Holdings are keyed by address, so two spellings of the same address can
/// never produce two entries. Only the engine writes to a run, and only
/// between probes, so the accumulator needs no locking.
#[derive(Debug)]
pub struct DiscoveryRun {
	owner: Address,
	stage: RunStage,
	holdings: Vec<TokenHolding>,
	index: HashMap<Address, usize>,
	errors: Vec<StageError>,
	stages: Vec<StageReport>,
	started_at: DateTime<Utc>,
}

impl DiscoveryRun {
	pub fn new(owner: Address) -> Self {
		Self {
			owner,
			stage: RunStage::Idle,
			holdings: Vec::new(),
			index: HashMap::new(),
			errors: Vec::new(),
			stages: Vec::new(),
			started_at: Utc::now(),
		}
	}

	pub fn owner(&self) -> Address {
		self.owner
	}

	pub fn stage(&self) -> RunStage {
		self.stage
	}

	pub fn advance(&mut self, next: RunStage) -> Result<(), DiscoveryError> {
		if !self.stage.can_transition_to(next) {
			return Err(DiscoveryError::InvalidTransition {
				from: self.stage,
				to: next,
			});
		}
		self.stage = next;
		Ok(())
	}

	pub fn contains(&self, address: &Address) -> bool {
		self.index.contains_key(address)
	}

	pub fn holdings(&self) -> &[TokenHolding] {
		&self.holdings
	}

	pub fn holding_mut(&mut self, address: &Address) -> Option<&mut TokenHolding> {
		let position = *self.index.get(address)?;
		self.holdings.get_mut(position)
	}

	pub fn errors(&self) -> &[StageError] {
		&self.errors
	}

	/// Inserts `incoming` or reconciles it with the entry already held.
	///
	/// The existing entry survives when it has complete metadata and the
	/// incoming one does not, or when it came from the curated registry and
	/// the incoming one did not. Otherwise the incoming entry replaces it in
	/// place.
	pub fn merge(&mut self, incoming: TokenHolding) -> MergeOutcome {
		if incoming.raw_balance.is_zero() {
			return MergeOutcome::Rejected;
		}

		match self.index.get(&incoming.address) {
			None => {
				self.index.insert(incoming.address, self.holdings.len());
				self.holdings.push(incoming);
				MergeOutcome::Inserted
			}
			Some(&position) => {
				let existing = &self.holdings[position];
				let keep = (existing.metadata_complete && !incoming.metadata_complete)
					|| (existing.source == TokenSource::Predefined
						&& incoming.source != TokenSource::Predefined);
				if keep {
					MergeOutcome::Kept
				} else {
					self.holdings[position] = incoming;
					MergeOutcome::Replaced
				}
			}
		}
	}

	/// Records a soft error against the current stage.
	pub fn record_error(&mut self, error: SoftError) {
		self.errors.push(StageError {
			stage: self.stage,
			error,
		});
	}

	pub fn record_stage(&mut self, report: StageReport) {
		self.stages.push(report);
	}

	/// Closes the run and builds the caller-facing report.
	pub fn finish(self) -> DiscoveryReport {
		let any_completed = self
			.stages
			.iter()
			.any(|s| s.stage.is_scan() && s.status == StageStatus::Completed);

		let exhaustion = if !any_completed && self.holdings.is_empty() {
			Some(ExhaustionError {
				failed_stages: self
					.stages
					.iter()
					.filter(|s| s.stage.is_scan() && s.status == StageStatus::Failed)
					.map(|s| s.stage)
					.collect(),
			})
		} else {
			None
		};

		DiscoveryReport {
			owner: self.owner,
			holdings: self.holdings,
			stages: self.stages,
			errors: self.errors,
			exhaustion,
			started_at: self.started_at,
			finished_at: Utc::now(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use scout_types::{parse_address, CuratedToken, TokenMetadata, U256};

	const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

	fn curated_usdc(balance: u64) -> TokenHolding {
		TokenHolding::curated(
			&CuratedToken {
				address: parse_address(USDC).unwrap(),
				name: "USD Coin".into(),
				symbol: "USDC".into(),
				decimals: 6,
				logo: None,
				is_lp: false,
			},
			U256::from(balance),
		)
	}

	fn discovered(address: &str, balance: u64, source: TokenSource) -> TokenHolding {
		TokenHolding::discovered(
			parse_address(address).unwrap(),
			TokenMetadata::placeholder(),
			U256::from(balance),
			source,
		)
	}

	#[test]
	fn test_zero_balance_rejected() {
		let mut run = DiscoveryRun::new(Address::ZERO);
		assert_eq!(
			run.merge(discovered(USDC, 0, TokenSource::LogDerived)),
			MergeOutcome::Rejected
		);
		assert!(run.holdings().is_empty());
	}

	#[test]
	fn test_curated_entry_is_never_downgraded() {
		let mut run = DiscoveryRun::new(Address::ZERO);
		assert_eq!(run.merge(curated_usdc(1_000_000)), MergeOutcome::Inserted);

		// same token, lower-cased, found again through logs
		let again = discovered(&USDC.to_lowercase(), 5, TokenSource::LogDerived);
		assert_eq!(run.merge(again), MergeOutcome::Kept);

		let mut enriched = discovered(USDC, 5, TokenSource::Discovered);
		enriched.metadata_complete = true;
		assert_eq!(run.merge(enriched), MergeOutcome::Kept);

		assert_eq!(run.holdings().len(), 1);
		assert_eq!(run.holdings()[0].symbol, "USDC");
		assert_eq!(run.holdings()[0].formatted_balance, "1.0");
	}

	#[test]
	fn test_incoming_replaces_in_place() {
		let other = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
		let mut run = DiscoveryRun::new(Address::ZERO);
		run.merge(discovered(other, 1, TokenSource::LogDerived));
		run.merge(discovered(USDC, 1, TokenSource::LogDerived));

		let mut newer = discovered(other, 9, TokenSource::Discovered);
		newer.symbol = "DAI".into();
		assert_eq!(run.merge(newer), MergeOutcome::Replaced);

		assert_eq!(run.holdings().len(), 2);
		assert_eq!(run.holdings()[0].symbol, "DAI");
		assert_eq!(run.holdings()[0].raw_balance, U256::from(9u64));

		// a complete entry may replace an incomplete one
		assert_eq!(run.merge(curated_usdc(2)), MergeOutcome::Replaced);
		assert!(run.holdings()[1].metadata_complete);
	}

	#[test]
	fn test_stage_transitions_are_enforced() {
		let mut run = DiscoveryRun::new(Address::ZERO);
		assert!(run.advance(RunStage::ScanEvents).is_err());
		run.advance(RunStage::ScanPredefined).unwrap();
		assert!(run.advance(RunStage::Failed).is_err());
		assert_eq!(run.stage(), RunStage::ScanPredefined);
	}

	#[test]
	fn test_errors_are_tagged_with_stage() {
		let mut run = DiscoveryRun::new(Address::ZERO);
		run.advance(RunStage::ScanPredefined).unwrap();
		run.advance(RunStage::ScanEvents).unwrap();
		run.record_error(SoftError::LogQuery {
			message: "timeout".into(),
		});

		assert_eq!(run.errors()[0].stage, RunStage::ScanEvents);
	}

	#[test]
	fn test_finish_marks_exhaustion() {
		let mut run = DiscoveryRun::new(Address::ZERO);
		for stage in RunStage::SCAN_STAGES {
			run.record_stage(StageReport {
				stage,
				status: StageStatus::Failed,
				candidates: 1,
				accepted: 0,
				errors: 1,
				elapsed_ms: 0,
			});
		}
		let report = run.finish();
		assert!(report.is_exhausted());
		assert_eq!(
			report.exhaustion.unwrap().failed_stages,
			RunStage::SCAN_STAGES.to_vec()
		);

		let mut found = DiscoveryRun::new(Address::ZERO);
		found.merge(curated_usdc(1));
		assert!(!found.finish().is_exhausted());
	}
}
