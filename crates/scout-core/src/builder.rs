//! Assembles a [`DiscoveryEngine`] from configuration and named factories.

use crate::engine::{DiscoveryEngine, EngineSettings};
use crate::DiscoveryError;
use scout_account::{AccountError, AccountInterface, AccountService};
use scout_chain::{ChainError, ChainInterface, ChainService};
use scout_config::Config;
use scout_enrich::{MetadataEnricher, MetadataRegistryInterface, RegistryError};
use scout_logs::{LogError, LogScanner, LogSourceInterface};
use scout_universe::AddressUniverse;
use std::collections::HashMap;

type AccountFactory =
	Box<dyn Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> + Send>;
type ChainFactory =
	Box<dyn Fn(&toml::Value) -> Result<Box<dyn ChainInterface>, ChainError> + Send>;
type LogSourceFactory =
	Box<dyn Fn(&toml::Value) -> Result<Box<dyn LogSourceInterface>, LogError> + Send>;
type RegistryFactory = Box<
	dyn Fn(&toml::Value) -> Result<Box<dyn MetadataRegistryInterface>, RegistryError> + Send,
>;

/// Builder for [`DiscoveryEngine`].
///
/// Each backend section of the configuration names an implementation; the
/// builder looks the name up among the registered factories and hands it the
/// section's `config` table.
pub struct ScoutBuilder {
	config: Config,
	account_factories: HashMap<String, AccountFactory>,
	chain_factories: HashMap<String, ChainFactory>,
	log_source_factories: HashMap<String, LogSourceFactory>,
	registry_factories: HashMap<String, RegistryFactory>,
}

impl ScoutBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			account_factories: HashMap::new(),
			chain_factories: HashMap::new(),
			log_source_factories: HashMap::new(),
			registry_factories: HashMap::new(),
		}
	}

	pub fn with_account_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> + Send + 'static,
	{
		self.account_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_chain_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Box<dyn ChainInterface>, ChainError> + Send + 'static,
	{
		self.chain_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_log_source_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Box<dyn LogSourceInterface>, LogError> + Send + 'static,
	{
		self.log_source_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub fn with_registry_factory<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Box<dyn MetadataRegistryInterface>, RegistryError>
			+ Send
			+ 'static,
	{
		self.registry_factories
			.insert(name.to_string(), Box::new(factory));
		self
	}

	pub async fn build(self) -> Result<DiscoveryEngine, DiscoveryError> {
		let config = &self.config;

		// Create account provider
		let factory = lookup(
			&self.account_factories,
			"account",
			&config.account.implementation,
		)?;
		let account = AccountService::new(
			factory(&config.account.config).map_err(|e| config_error("account", e))?,
		);

		// Create chain client
		let factory = lookup(&self.chain_factories, "chain", &config.chain.implementation)?;
		let chain =
			ChainService::new(factory(&config.chain.config).map_err(|e| config_error("chain", e))?);

		// Create log scanner
		let logs = if config.logs.enabled {
			let factory = lookup(&self.log_source_factories, "logs", &config.logs.implementation)?;
			let source = factory(&config.logs.config).map_err(|e| config_error("logs", e))?;
			Some(LogScanner::new(
				source,
				config.logs.window_blocks,
				config.logs.max_block_range,
			))
		} else {
			None
		};

		// Create metadata enricher
		let enricher = if config.enrichment.enabled {
			let factory = lookup(
				&self.registry_factories,
				"enrichment",
				&config.enrichment.implementation,
			)?;
			let registry =
				factory(&config.enrichment.config).map_err(|e| config_error("enrichment", e))?;
			Some(MetadataEnricher::new(registry, config.enrichment.concurrency))
		} else {
			None
		};

		let universe = AddressUniverse::load(&config.universe, config.scanner.chain_id)
			.await
			.map_err(|e| config_error("universe", e))?;

		tracing::info!(
			curated = universe.curated().len(),
			candidates = universe.len(),
			logs = logs.is_some(),
			enrichment = enricher.is_some(),
			"Discovery engine ready"
		);

		Ok(DiscoveryEngine::new(
			account,
			chain,
			logs,
			universe,
			enricher,
			EngineSettings {
				concurrency: config.scanner.concurrency,
				expected_chain_id: config.scanner.chain_id,
			},
		))
	}
}

fn lookup<'a, F>(
	factories: &'a HashMap<String, F>,
	section: &str,
	name: &str,
) -> Result<&'a F, DiscoveryError> {
	factories.get(name).ok_or_else(|| {
		DiscoveryError::Config(format!("Unknown {} implementation '{}'", section, name))
	})
}

fn config_error(section: &str, error: impl std::fmt::Display) -> DiscoveryError {
	DiscoveryError::Config(format!("{}: {}", section, error))
}
