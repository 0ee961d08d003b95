//! Rendering of discovery reports.

use scout_core::DiscoveryReport;
use scout_types::{normalize_address, StageStatus};
use std::fmt::Write;

/// Renders the inventory as a fixed-width table followed by a stage summary.
pub fn render_table(report: &DiscoveryReport) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Holdings of {}", normalize_address(&report.owner));

	if report.holdings.is_empty() {
		let _ = writeln!(out, "  (none)");
	} else {
		let _ = writeln!(
			out,
			"  {:<14} {:<28} {:>24}  {:<13} {}",
			"SYMBOL", "NAME", "BALANCE", "SOURCE", "ADDRESS"
		);
		for holding in &report.holdings {
			let mut symbol = truncate(&holding.symbol, 14);
			if !holding.metadata_complete && !holding.is_lp {
				symbol.push('*');
			}
			let _ = writeln!(
				out,
				"  {:<14} {:<28} {:>24}  {:<13} {}",
				symbol,
				truncate(&holding.name, 28),
				holding.formatted_balance,
				holding.source.to_string(),
				holding.key()
			);
		}
	}

	let _ = writeln!(out);
	for stage in &report.stages {
		let marker = match stage.status {
			StageStatus::Completed => "ok",
			StageStatus::Skipped => "skipped",
			StageStatus::Failed => "FAILED",
		};
		let _ = writeln!(
			out,
			"  {:<16} {:<8} candidates={} accepted={} errors={} ({} ms)",
			stage.stage.to_string(),
			marker,
			stage.candidates,
			stage.accepted,
			stage.errors,
			stage.elapsed_ms
		);
	}

	if let Some(exhaustion) = &report.exhaustion {
		let _ = writeln!(out, "\n{}", exhaustion);
	}

	out
}

fn truncate(text: &str, width: usize) -> String {
	if text.chars().count() <= width {
		text.to_string()
	} else {
		let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
		cut.push('~');
		cut
	}
}
