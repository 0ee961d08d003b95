//! Configuration loading for token-scout.
//!
//! Files are TOML, JSON or YAML (picked by extension). `${VAR}` placeholders
//! are substituted from the environment before parsing, then a handful of
//! `SCOUT_*` variables override individual settings, and the result is
//! validated before anything is built from it.

use scout_types::parse_address;
use std::path::{Path, PathBuf};
use thiserror::Error;

mod example;
mod types;

pub use example::EXAMPLE_CONFIG;
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(ConfigFormat::Toml),
			Some("json") => Ok(ConfigFormat::Json),
			Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {:?}",
				path
			))),
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "SCOUT_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Reads, substitutes, overrides and validates the configured file.
	pub async fn load(&self) -> Result<Config, ConfigError> {
		let path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;
		if !path.exists() {
			return Err(ConfigError::FileNotFound(path.display().to_string()));
		}

		tracing::info!(path = %path.display(), "Loading configuration");
		let content = tokio::fs::read_to_string(path).await?;
		let env = |name: &str| std::env::var(name).ok();

		let mut config = Self::parse(&content, ConfigFormat::from_path(path)?, &env)?;
		self.apply_env_overrides(&mut config, &env)?;
		if let Some(dir) = path.parent() {
			resolve_token_lists(&mut config, dir);
		}
		Self::validate(&config)?;

		Ok(config)
	}

	/// Parses configuration text after substituting `${VAR}` placeholders via `env`.
	pub fn parse(
		content: &str,
		format: ConfigFormat,
		env: &dyn Fn(&str) -> Option<String>,
	) -> Result<Config, ConfigError> {
		let content = substitute_env_vars(content, env)?;

		match format {
			ConfigFormat::Toml => {
				toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			ConfigFormat::Json => {
				serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			ConfigFormat::Yaml => {
				serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
		}
	}

	fn apply_env_overrides(
		&self,
		config: &mut Config,
		env: &dyn Fn(&str) -> Option<String>,
	) -> Result<(), ConfigError> {
		let var = |suffix: &str| env(&format!("{}{}", self.env_prefix, suffix));

		if let Some(rpc_url) = var("RPC_URL") {
			tracing::debug!("Overriding RPC URL from environment");
			set_string(&mut config.chain.config, "rpc_url", &rpc_url);
			set_string(&mut config.logs.config, "rpc_url", &rpc_url);
		}

		if let Some(account) = var("ACCOUNT") {
			tracing::debug!("Overriding account address from environment");
			set_string(&mut config.account.config, "address", &account);
		}

		if let Some(concurrency) = var("CONCURRENCY") {
			config.scanner.concurrency = concurrency.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid concurrency: {}", e))
			})?;
		}

		Ok(())
	}

	/// Checks settings that do not belong to any single implementation.
	pub fn validate(config: &Config) -> Result<(), ConfigError> {
		let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

		if config.scanner.concurrency == 0 {
			return invalid("scanner.concurrency must be greater than 0");
		}
		if config.logs.window_blocks == 0 {
			return invalid("logs.window_blocks must be greater than 0");
		}
		if config.logs.max_block_range == 0 {
			return invalid("logs.max_block_range must be greater than 0");
		}
		if config.enrichment.enabled && config.enrichment.concurrency == 0 {
			return invalid("enrichment.concurrency must be greater than 0");
		}

		for (section, implementation) in [
			("account", &config.account.implementation),
			("chain", &config.chain.implementation),
			("logs", &config.logs.implementation),
			("enrichment", &config.enrichment.implementation),
		] {
			if implementation.trim().is_empty() {
				return Err(ConfigError::ValidationError(format!(
					"{}.implementation cannot be empty",
					section
				)));
			}
		}

		for (pool, addresses) in [
			("heuristic", &config.universe.heuristic),
			("lp", &config.universe.lp),
		] {
			for address in addresses {
				parse_address(address).map_err(|e| {
					ConfigError::ValidationError(format!("universe.{}: {}", pool, e))
				})?;
			}
		}

		Ok(())
	}
}

/// Replaces every `${VAR}` with the value `env` returns for `VAR`.
///
/// Lines starting with `#` are copied untouched, so comments may mention
/// placeholders without requiring them to be set.
fn substitute_env_vars(
	content: &str,
	env: &dyn Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
	let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut result = String::with_capacity(content.len());
	for line in content.split_inclusive('\n') {
		if line.trim_start().starts_with('#') {
			result.push_str(line);
			continue;
		}

		let mut last = 0;
		for cap in re.captures_iter(line) {
			let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
				continue;
			};
			let value = env(var_name.as_str())
				.ok_or_else(|| ConfigError::EnvVarNotFound(var_name.as_str().to_string()))?;
			result.push_str(&line[last..full_match.start()]);
			result.push_str(&value);
			last = full_match.end();
		}
		result.push_str(&line[last..]);
	}

	Ok(result)
}

/// Anchors relative token-list paths to the directory holding the config file.
fn resolve_token_lists(config: &mut Config, base: &Path) {
	for list in &mut config.universe.token_lists {
		if list.is_relative() {
			*list = base.join(&*list);
		}
	}
}

fn set_string(table: &mut toml::Value, key: &str, value: &str) {
	if !table.is_table() {
		*table = types::empty_table();
	}
	if let Some(map) = table.as_table_mut() {
		map.insert(key.to_string(), toml::Value::String(value.to_string()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	const MINIMAL: &str = r#"
[account]
implementation = "watch"

[chain]
implementation = "alloy"
[chain.config]
rpc_url = "${NODE_URL}"

[logs]
implementation = "alloy"
[logs.config]
rpc_url = "${NODE_URL}"
"#;

	fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name: &str| map.get(name).cloned()
	}

	#[test]
	fn test_parse_with_defaults_and_substitution() {
		let env = env_of(&[("NODE_URL", "http://localhost:8545")]);
		let config = ConfigLoader::parse(MINIMAL, ConfigFormat::Toml, &env).unwrap();

		assert_eq!(config.scanner.concurrency, 8);
		assert_eq!(config.logs.window_blocks, 10_000);
		assert_eq!(config.logs.max_block_range, 2_000);
		assert!(config.logs.enabled);
		assert!(!config.enrichment.enabled);
		assert!(config.universe.curated.is_empty());
		assert_eq!(
			config.chain.config.get("rpc_url").and_then(|v| v.as_str()),
			Some("http://localhost:8545")
		);
		assert!(ConfigLoader::validate(&config).is_ok());
	}

	#[test]
	fn test_missing_env_var() {
		let env = env_of(&[]);
		let err = ConfigLoader::parse(MINIMAL, ConfigFormat::Toml, &env).unwrap_err();
		assert!(matches!(err, ConfigError::EnvVarNotFound(ref v) if v == "NODE_URL"));
	}

	#[test]
	fn test_env_overrides() {
		let env = env_of(&[
			("NODE_URL", "http://localhost:8545"),
			("SCOUT_RPC_URL", "https://rpc.example.org"),
			("SCOUT_ACCOUNT", "0x00000000000000000000000000000000000000aa"),
			("SCOUT_CONCURRENCY", "3"),
		]);
		let mut config = ConfigLoader::parse(MINIMAL, ConfigFormat::Toml, &env).unwrap();
		ConfigLoader::new()
			.apply_env_overrides(&mut config, &env)
			.unwrap();

		assert_eq!(config.scanner.concurrency, 3);
		assert_eq!(
			config.logs.config.get("rpc_url").and_then(|v| v.as_str()),
			Some("https://rpc.example.org")
		);
		assert_eq!(
			config.account.config.get("address").and_then(|v| v.as_str()),
			Some("0x00000000000000000000000000000000000000aa")
		);

		let bad = env_of(&[("SCOUT_CONCURRENCY", "many")]);
		assert!(ConfigLoader::new()
			.apply_env_overrides(&mut config, &bad)
			.is_err());
	}

	#[test]
	fn test_validation_rejects_bad_values() {
		let env = env_of(&[("NODE_URL", "http://localhost:8545")]);
		let mut config = ConfigLoader::parse(MINIMAL, ConfigFormat::Toml, &env).unwrap();

		config.scanner.concurrency = 0;
		assert!(ConfigLoader::validate(&config).is_err());
		config.scanner.concurrency = 2;

		config.logs.max_block_range = 0;
		assert!(ConfigLoader::validate(&config).is_err());
		config.logs.max_block_range = 500;

		config.universe.lp.push("0x123".to_string());
		assert!(matches!(
			ConfigLoader::validate(&config),
			Err(ConfigError::ValidationError(msg)) if msg.starts_with("universe.lp")
		));
	}

	#[test]
	fn test_json_and_yaml() {
		let json = r#"{
			"account": {"implementation": "watch"},
			"chain": {"implementation": "alloy", "config": {"rpc_url": "http://localhost:8545"}},
			"logs": {"implementation": "alloy", "window_blocks": 500},
			"universe": {"curated": [{"address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "name": "USD Coin", "symbol": "USDC", "decimals": 6}]}
		}"#;
		let config = ConfigLoader::parse(json, ConfigFormat::Json, &env_of(&[])).unwrap();
		assert_eq!(config.logs.window_blocks, 500);
		assert_eq!(config.universe.curated[0].decimals, 6);

		let yaml = r#"
scanner:
  concurrency: 2
  chain_id: 1
account:
  implementation: watch
chain:
  implementation: alloy
logs:
  implementation: alloy
  enabled: false
"#;
		let config = ConfigLoader::parse(yaml, ConfigFormat::Yaml, &env_of(&[])).unwrap();
		assert_eq!(config.scanner.chain_id, Some(1));
		assert!(!config.logs.enabled);
	}

	#[tokio::test]
	async fn test_load_from_file() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		file.write_all(
			MINIMAL
				.replace("${NODE_URL}", "http://127.0.0.1:8545")
				.as_bytes(),
		)
		.unwrap();

		let config = ConfigLoader::new()
			.with_env_prefix("SCOUT_TEST_UNSET_")
			.with_file(file.path())
			.load()
			.await
			.unwrap();
		assert_eq!(config.account.implementation, "watch");

		let missing = ConfigLoader::new().with_file("/nonexistent/scout.toml").load().await;
		assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

		let unsupported = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
		let result = ConfigLoader::new()
			.with_file(unsupported.path())
			.load()
			.await;
		assert!(matches!(result, Err(ConfigError::ParseError(_))));
	}

	#[test]
	fn test_example_config_is_valid() {
		let config = ConfigLoader::parse(EXAMPLE_CONFIG, ConfigFormat::Toml, &env_of(&[])).unwrap();
		ConfigLoader::validate(&config).unwrap();

		assert_eq!(config.scanner.chain_id, Some(1));
		assert_eq!(config.universe.curated.len(), 5);
		assert!(config.enrichment.enabled);
		assert!(config
			.universe
			.lp
			.iter()
			.any(|a| a.eq_ignore_ascii_case("0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc")));
	}

	#[test]
	fn test_comment_placeholders_are_ignored() {
		let content = format!(
			"# rpc_url may be written as ${{NAME}}\n  # indented ${{OTHER}} too\n{}",
			MINIMAL
		);
		let env = env_of(&[("NODE_URL", "http://localhost:8545")]);
		let config = ConfigLoader::parse(&content, ConfigFormat::Toml, &env).unwrap();

		assert_eq!(
			config.logs.config.get("rpc_url").and_then(|v| v.as_str()),
			Some("http://localhost:8545")
		);
	}

	#[test]
	fn test_substitution_keeps_surrounding_text() {
		let env = env_of(&[("HOST", "node.local"), ("PORT", "8545")]);
		let out = substitute_env_vars("url = \"http://${HOST}:${PORT}/rpc\"\n", &env).unwrap();
		assert_eq!(out, "url = \"http://node.local:8545/rpc\"\n");
	}

	#[tokio::test]
	async fn test_shipped_config_loads() {
		let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/mainnet.toml");
		assert_eq!(std::fs::read_to_string(path).unwrap(), EXAMPLE_CONFIG);

		let config = ConfigLoader::new()
			.with_env_prefix("SCOUT_TEST_UNSET_")
			.with_file(path)
			.load()
			.await
			.unwrap();
		assert_eq!(config.scanner.chain_id, Some(1));
		assert_eq!(config.account.implementation, "watch");
	}

	#[tokio::test]
	async fn test_relative_token_lists_follow_config_dir() {
		let dir = tempfile::tempdir().unwrap();
		let config_path = dir.path().join("scout.toml");
		let content = format!(
			"{}\n[universe]\ntoken_lists = [\"lists/tokens.json\", \"/srv/lists/extra.json\"]\n",
			MINIMAL.replace("${NODE_URL}", "http://127.0.0.1:8545")
		);
		std::fs::write(&config_path, content).unwrap();

		let config = ConfigLoader::new()
			.with_env_prefix("SCOUT_TEST_UNSET_")
			.with_file(&config_path)
			.load()
			.await
			.unwrap();
		assert_eq!(
			config.universe.token_lists,
			vec![
				dir.path().join("lists/tokens.json"),
				PathBuf::from("/srv/lists/extra.json"),
			]
		);
	}
}
