//! Transfer-log mining for the token-scout workspace.
//!
//! The [`LogScanner`] looks at a bounded window of recent blocks and returns
//! every contract that emitted a fungible `Transfer` naming the owner as
//! sender or receiver. Older transfers fall outside the window and are not
//! seen; the window size caps the cost of each scan against the log-query
//! service.

use async_trait::async_trait;
use scout_types::{Address, ConfigSchema, Soft, SoftError, U256};
use std::collections::HashSet;
use thiserror::Error;

pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while querying logs.
#[derive(Debug, Error)]
pub enum LogError {
	#[error("Query failed: {0}")]
	Query(String),
	#[error("Network error: {0}")]
	Network(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

/// A decoded fungible-token transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLog {
	/// Contract that emitted the event.
	pub token: Address,
	pub from: Address,
	pub to: Address,
	pub amount: U256,
	pub block_number: Option<u64>,
}

/// Filtered retrieval of transfer events.
#[async_trait]
pub trait LogSourceInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Most recent block number.
	async fn latest_block(&self) -> Result<u64, LogError>;

	/// Transfers in `[from_block, to_block]` where `owner` is sender or receiver.
	async fn transfer_logs(
		&self,
		owner: Address,
		from_block: u64,
		to_block: u64,
	) -> Result<Vec<TransferLog>, LogError>;
}

/// Windowed, chunked scan over a [`LogSourceInterface`].
pub struct LogScanner {
	source: Box<dyn LogSourceInterface>,
	window_blocks: u64,
	max_block_range: u64,
}

impl LogScanner {
	pub fn new(
		source: Box<dyn LogSourceInterface>,
		window_blocks: u64,
		max_block_range: u64,
	) -> Self {
		Self {
			source,
			window_blocks: window_blocks.max(1),
			max_block_range: max_block_range.max(1),
		}
	}

	/// Unique token contracts with a transfer involving `owner` in the window,
	/// in first-seen order.
	///
	/// Any query error degrades the whole result to an empty set.
	pub async fn scan(&self, owner: Address) -> Soft<Vec<Address>> {
		match self.collect(owner).await {
			Ok(tokens) => Soft::ok(tokens),
			Err(e) => {
				tracing::warn!(owner = %owner, error = %e, "Log scan failed");
				Soft::degraded(
					Vec::new(),
					SoftError::LogQuery {
						message: e.to_string(),
					},
				)
			}
		}
	}

	async fn collect(&self, owner: Address) -> Result<Vec<Address>, LogError> {
		let latest = self.source.latest_block().await?;
		let (from_block, to_block) = scan_window(latest, self.window_blocks);

		let mut seen = HashSet::new();
		let mut tokens = Vec::new();
		let mut total_logs = 0usize;

		for (start, end) in chunk_range(from_block, to_block, self.max_block_range) {
			let logs = self.source.transfer_logs(owner, start, end).await?;
			total_logs += logs.len();
			for log in logs {
				if seen.insert(log.token) {
					tokens.push(log.token);
				}
			}
		}

		tracing::debug!(
			owner = %owner,
			from_block,
			to_block,
			logs = total_logs,
			tokens = tokens.len(),
			"Scanned transfer logs"
		);
		Ok(tokens)
	}
}

/// `[latest - window + 1, latest]`, clamped at genesis.
pub fn scan_window(latest: u64, window_blocks: u64) -> (u64, u64) {
	let span = window_blocks.max(1) - 1;
	(latest.saturating_sub(span), latest)
}

/// Splits `[from, to]` into consecutive inclusive ranges of at most `max` blocks.
pub fn chunk_range(from: u64, to: u64, max: u64) -> Vec<(u64, u64)> {
	let max = max.max(1);
	let mut chunks = Vec::new();
	let mut start = from;
	while start <= to {
		let end = start.saturating_add(max - 1).min(to);
		chunks.push((start, end));
		if end == u64::MAX {
			break;
		}
		start = end + 1;
	}
	chunks
}
