//! The discovery stage machine.
//!
//! Stages run one after another to keep RPC load bounded; inside a stage the
//! per-candidate probes run concurrently up to the configured cap. Probes only
//! return results, and the engine merges them into the run once the whole
//! stage has been collected. Dropping the future returned by
//! [`DiscoveryEngine::discover`] abandons the run; nothing outlives it.

use crate::report::{DiscoveryReport, StageReport};
use crate::run::{DiscoveryRun, MergeOutcome};
use crate::DiscoveryError;
use futures::stream::{self, StreamExt};
use scout_account::AccountService;
use scout_chain::ChainService;
use scout_enrich::{apply_record, needs_enrichment, MetadataEnricher};
use scout_logs::LogScanner;
use scout_types::{
	Address, CandidateAddress, CandidatePool, CuratedToken, RunStage, SoftError, StageStatus,
	TokenHolding,
};
use scout_universe::AddressUniverse;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tunables of the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
	/// Upper bound on concurrent probes within a stage.
	pub concurrency: usize,
	/// When set, the node's chain id must match before any stage runs.
	pub expected_chain_id: Option<u64>,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			concurrency: 8,
			expected_chain_id: None,
		}
	}
}

/// Something to probe in a scan stage.
enum Target<'a> {
	Curated(&'a CuratedToken),
	Candidate(CandidateAddress),
}

impl Target<'_> {
	fn address(&self) -> Address {
		match self {
			Target::Curated(token) => token.address,
			Target::Candidate(candidate) => candidate.address,
		}
	}
}

/// What one probe learned.
struct Probe {
	holding: Option<TokenHolding>,
	errors: Vec<SoftError>,
	balance_failed: bool,
}

/// Orchestrates one discovery run per call.
pub struct DiscoveryEngine {
	account: AccountService,
	chain: ChainService,
	logs: Option<LogScanner>,
	universe: AddressUniverse,
	enricher: Option<MetadataEnricher>,
	settings: EngineSettings,
}

impl DiscoveryEngine {
	pub fn new(
		account: AccountService,
		chain: ChainService,
		logs: Option<LogScanner>,
		universe: AddressUniverse,
		enricher: Option<MetadataEnricher>,
		settings: EngineSettings,
	) -> Self {
		Self {
			account,
			chain,
			logs,
			universe,
			enricher,
			settings: EngineSettings {
				concurrency: settings.concurrency.max(1),
				..settings
			},
		}
	}

	pub fn universe(&self) -> &AddressUniverse {
		&self.universe
	}

	/// Discovers the holdings of the connected account.
	///
	/// Fails only when no account is connected or the node serves another
	/// chain; every other problem is recorded in the report.
	pub async fn discover(&self) -> Result<DiscoveryReport, DiscoveryError> {
		let owner = self.account.get_address().await.map_err(|e| {
			warn!(error = %e, "Cannot start discovery without an account");
			DiscoveryError::NoAccount(e.to_string())
		})?;

		self.discover_for(owner).await
	}

	/// Discovers the holdings of `owner`.
	pub async fn discover_for(&self, owner: Address) -> Result<DiscoveryReport, DiscoveryError> {
		let mut run = DiscoveryRun::new(owner);
		info!(owner = %owner, "Starting token discovery");

		self.verify_chain(&mut run).await?;

		run.advance(RunStage::ScanPredefined)?;
		let curated = self
			.universe
			.curated()
			.iter()
			.map(Target::Curated)
			.collect();
		self.scan_stage(&mut run, curated, None).await;

		run.advance(RunStage::ScanEvents)?;
		let (log_candidates, log_error) = match &self.logs {
			Some(scanner) => scanner.scan(owner).await.into_parts(),
			None => (Vec::new(), None),
		};
		let log_targets = log_candidates
			.into_iter()
			.map(|address| Target::Candidate(CandidateAddress::new(address, CandidatePool::EventLog)))
			.collect();
		self.scan_stage(&mut run, log_targets, log_error).await;

		run.advance(RunStage::ScanHeuristic)?;
		let heuristic = self
			.universe
			.heuristic()
			.into_iter()
			.map(Target::Candidate)
			.collect();
		self.scan_stage(&mut run, heuristic, None).await;

		run.advance(RunStage::ScanLp)?;
		let lp = self.universe.lp().into_iter().map(Target::Candidate).collect();
		self.scan_stage(&mut run, lp, None).await;

		run.advance(RunStage::Enrich)?;
		self.enrich_stage(&mut run).await;

		run.advance(RunStage::Done)?;
		let report = run.finish();

		if let Some(exhaustion) = &report.exhaustion {
			warn!(owner = %owner, "{}", exhaustion);
		}
		info!(
			owner = %owner,
			holdings = report.holdings.len(),
			lp = report.lp_count(),
			errors = report.errors.len(),
			"Token discovery finished"
		);
		Ok(report)
	}

	async fn verify_chain(&self, run: &mut DiscoveryRun) -> Result<(), DiscoveryError> {
		let Some(expected) = self.settings.expected_chain_id else {
			return Ok(());
		};

		match self.chain.chain_id().await {
			Ok(actual) if actual == expected => Ok(()),
			Ok(actual) => {
				run.advance(RunStage::Failed)?;
				Err(DiscoveryError::ChainMismatch { expected, actual })
			}
			Err(e) => {
				// an unreachable node is a stage-level problem, not a setup one
				warn!(error = %e, "Could not verify chain id");
				run.record_error(SoftError::ChainCall {
					address: "eth_chainId".to_string(),
					message: e.to_string(),
				});
				Ok(())
			}
		}
	}

	async fn scan_stage(
		&self,
		run: &mut DiscoveryRun,
		targets: Vec<Target<'_>>,
		source_error: Option<SoftError>,
	) {
		let stage = run.stage();
		let started = Instant::now();
		let errors_before = run.errors().len();
		let source_failed = source_error.is_some();

		if let Some(error) = source_error {
			warn!(stage = %stage, error = %error, "Candidate source failed");
			run.record_error(error);
		}

		let targets: Vec<Target<'_>> = targets
			.into_iter()
			.filter(|t| !run.contains(&t.address()))
			.collect();
		let candidates = targets.len();
		let owner = run.owner();

		info!(stage = %stage, candidates, "Running stage");

		let probes: Vec<Probe> = stream::iter(targets)
			.map(|target| self.probe(owner, target))
			.buffered(self.settings.concurrency)
			.collect()
			.await;

		let mut accepted = 0;
		let mut balance_failures = 0;
		for probe in probes {
			if probe.balance_failed {
				balance_failures += 1;
			}
			for error in probe.errors {
				run.record_error(error);
			}
			if let Some(holding) = probe.holding {
				let address = holding.address;
				let outcome = run.merge(holding);
				debug!(stage = %stage, token = %address, outcome = ?outcome, "Merged holding");
				if matches!(outcome, MergeOutcome::Inserted | MergeOutcome::Replaced) {
					accepted += 1;
				}
			}
		}

		let status = if source_failed {
			StageStatus::Failed
		} else if candidates == 0 {
			StageStatus::Skipped
		} else if balance_failures == candidates {
			StageStatus::Failed
		} else {
			StageStatus::Completed
		};

		let errors = run.errors().len() - errors_before;
		if status == StageStatus::Failed {
			warn!(stage = %stage, errors, "Stage failed");
		}
		run.record_stage(StageReport {
			stage,
			status,
			candidates,
			accepted,
			errors,
			elapsed_ms: started.elapsed().as_millis() as u64,
		});
	}

	async fn probe(&self, owner: Address, target: Target<'_>) -> Probe {
		let address = target.address();
		let mut errors = Vec::new();

		let (balance, balance_error) = self.chain.get_balance(address, owner).await.into_parts();
		let balance_failed = balance_error.is_some();
		errors.extend(balance_error);

		if balance.is_zero() {
			return Probe {
				holding: None,
				errors,
				balance_failed,
			};
		}

		let candidate = match target {
			Target::Curated(token) => {
				return Probe {
					holding: Some(TokenHolding::curated(token, balance)),
					errors,
					balance_failed,
				};
			}
			Target::Candidate(candidate) => candidate,
		};

		let (metadata, metadata_error) = self.chain.get_metadata(address).await.into_parts();
		errors.extend(metadata_error);
		let mut holding =
			TokenHolding::discovered(address, metadata, balance, candidate.pool.source());

		let (pair, pair_error) = self.chain.detect_pair(address).await.into_parts();
		errors.extend(pair_error);
		if let Some(pair) = pair {
			let (symbol0, symbol1) = futures::join!(
				self.chain.get_symbol(pair.token0),
				self.chain.get_symbol(pair.token1)
			);
			let (symbol0, error0) = symbol0.into_parts();
			let (symbol1, error1) = symbol1.into_parts();
			errors.extend(error0);
			errors.extend(error1);
			holding = holding.with_pair(&symbol0, &symbol1);
		}

		debug!(
			token = %address,
			symbol = %holding.symbol,
			balance = %holding.formatted_balance,
			lp = holding.is_lp,
			"Found holding"
		);
		Probe {
			holding: Some(holding),
			errors,
			balance_failed,
		}
	}

	async fn enrich_stage(&self, run: &mut DiscoveryRun) {
		let started = Instant::now();
		let errors_before = run.errors().len();

		let targets: Vec<Address> = run
			.holdings()
			.iter()
			.filter(|h| needs_enrichment(h))
			.map(|h| h.address)
			.collect();

		let (status, accepted) = match &self.enricher {
			Some(enricher) if !targets.is_empty() => {
				info!(stage = %RunStage::Enrich, candidates = targets.len(), "Running stage");

				let mut accepted = 0;
				let mut failures = 0;
				for enrichment in enricher.lookup_all(&targets).await {
					let (record, error) = enrichment.record.into_parts();
					if let Some(error) = error {
						failures += 1;
						run.record_error(error);
					}
					let Some(record) = record else { continue };
					if let Some(holding) = run.holding_mut(&enrichment.address) {
						if apply_record(holding, &record) {
							accepted += 1;
						}
					}
				}

				let status = if failures == targets.len() {
					StageStatus::Failed
				} else {
					StageStatus::Completed
				};
				(status, accepted)
			}
			_ => (StageStatus::Skipped, 0),
		};

		run.record_stage(StageReport {
			stage: RunStage::Enrich,
			status,
			candidates: if self.enricher.is_some() { targets.len() } else { 0 },
			accepted,
			errors: run.errors().len() - errors_before,
			elapsed_ms: started.elapsed().as_millis() as u64,
		});
	}
}
