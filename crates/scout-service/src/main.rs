use anyhow::{Context, Result};
use clap::Parser;
use scout_account::implementations::watch;
use scout_chain::implementations::evm::alloy as alloy_chain;
use scout_config::{Config, ConfigLoader, EXAMPLE_CONFIG};
use scout_core::{DiscoveryEngine, DiscoveryReport, ScoutBuilder};
use scout_enrich::implementations::{coingecko, http};
use scout_logs::implementations::evm::alloy as alloy_logs;
use scout_types::parse_address;
use std::path::Path;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod output;

use cli::{Args, Command, LogFormat, OutputFormat};

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	// Initialize tracing
	setup_tracing(&args.log_level, args.log_format)?;

	match args.command {
		Some(Command::Scan { address, format }) => {
			scan(&args.config, address.as_deref(), format).await
		}
		None => scan(&args.config, None, OutputFormat::Table).await,
		Some(Command::Validate) => validate_config(&args.config).await,
		Some(Command::GenerateConfig { output }) => generate_config(&output).await,
	}
}

async fn load_config(path: &Path) -> Result<Config> {
	info!("Loading configuration from: {:?}", path);

	ConfigLoader::new()
		.with_file(path)
		.load()
		.await
		.context("Failed to load configuration")
}

async fn build_engine(config: Config) -> Result<DiscoveryEngine> {
	ScoutBuilder::new(config)
		.with_account_factory("watch", watch::create_account)
		.with_chain_factory("alloy", alloy_chain::create_chain)
		.with_log_source_factory("alloy", alloy_logs::create_log_source)
		.with_registry_factory("http", http::create_registry)
		.with_registry_factory("coingecko", coingecko::create_registry)
		.build()
		.await
		.context("Failed to build discovery engine")
}

async fn scan(config_path: &Path, address: Option<&str>, format: OutputFormat) -> Result<()> {
	let config = load_config(config_path).await?;
	let engine = build_engine(config).await?;

	let owner = address
		.map(parse_address)
		.transpose()
		.context("Invalid --address")?;

	let discovery = async {
		match owner {
			Some(owner) => engine.discover_for(owner).await,
			None => engine.discover().await,
		}
	};

	// dropping the discovery future abandons the run
	let report = tokio::select! {
		report = discovery => report.context("Discovery failed")?,
		_ = signal::ctrl_c() => {
			warn!("Interrupted, discarding partial results");
			return Ok(());
		}
	};

	print_report(&report, format)
}

fn print_report(report: &DiscoveryReport, format: OutputFormat) -> Result<()> {
	match format {
		OutputFormat::Table => print!("{}", output::render_table(report)),
		OutputFormat::Json => println!(
			"{}",
			serde_json::to_string_pretty(report).context("Failed to serialize report")?
		),
	}
	Ok(())
}

async fn validate_config(config_path: &Path) -> Result<()> {
	info!("Validating configuration file: {:?}", config_path);

	let config = load_config(config_path).await?;
	info!("Account: {}", config.account.implementation);
	info!("Chain: {}", config.chain.implementation);
	if config.logs.enabled {
		info!(
			"Logs: {} (window {} blocks)",
			config.logs.implementation, config.logs.window_blocks
		);
	}
	if config.enrichment.enabled {
		info!("Enrichment: {}", config.enrichment.implementation);
	}

	// constructs every backend without touching the network
	let engine = build_engine(config).await?;
	info!(
		"Configuration is valid ({} candidate addresses)",
		engine.universe().len()
	);

	Ok(())
}

async fn generate_config(output: &Path) -> Result<()> {
	if output.exists() {
		anyhow::bail!("Refusing to overwrite existing file {:?}", output);
	}

	tokio::fs::write(output, EXAMPLE_CONFIG)
		.await
		.with_context(|| format!("Failed to write {:?}", output))?;

	info!("Example configuration written to {:?}", output);
	Ok(())
}

fn setup_tracing(log_level: &str, format: LogFormat) -> Result<()> {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

	let registry = tracing_subscriber::registry().with(env_filter);
	match format {
		LogFormat::Text => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.try_init(),
		LogFormat::Json => registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.try_init(),
	}
	.context("Failed to initialize tracing")?;

	Ok(())
}
