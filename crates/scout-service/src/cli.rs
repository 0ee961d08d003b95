//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "token-scout")]
#[command(about = "Discovers the fungible tokens and LP shares held by an address", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "SCOUT_CONFIG", default_value = "config/mainnet.toml")]
	pub config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, env = "SCOUT_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	/// Log line format
	#[arg(long, value_enum, default_value_t = LogFormat::Text)]
	pub log_format: LogFormat,

	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run one discovery pass and print the inventory
	Scan {
		/// Address to scan instead of the configured account
		#[arg(short, long)]
		address: Option<String>,

		/// Output format of the inventory
		#[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
		format: OutputFormat,
	},

	/// Validate the configuration file
	Validate,

	/// Generate an example configuration
	GenerateConfig {
		/// Output file path
		#[arg(short, long, default_value = "config.toml")]
		output: PathBuf,
	},
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Table,
	Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
	Text,
	Json,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scan_defaults() {
		let args = Args::try_parse_from(["token-scout", "scan"]).unwrap();
		assert_eq!(args.log_format, LogFormat::Text);
		match args.command {
			Some(Command::Scan { address, format }) => {
				assert!(address.is_none());
				assert_eq!(format, OutputFormat::Table);
			}
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_scan_with_address_and_json() {
		let args = Args::try_parse_from([
			"token-scout",
			"--config",
			"scout.yaml",
			"scan",
			"--address",
			"0x000000000000000000000000000000000000dEaD",
			"--format",
			"json",
		])
		.unwrap();

		assert_eq!(args.config, PathBuf::from("scout.yaml"));
		assert!(matches!(
			args.command,
			Some(Command::Scan {
				address: Some(_),
				format: OutputFormat::Json
			})
		));
	}
}
