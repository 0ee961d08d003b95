//! Account module for the token-scout workspace.
//!
//! The account is the scan target: discovery runs against whatever address
//! the connected account reports. Signing is deliberately absent; the
//! workspace only ever reads chain state.

use async_trait::async_trait;
use scout_types::{Address, ConfigSchema};
use thiserror::Error;

pub mod implementations {
	pub mod watch;
}

/// Errors that can occur while resolving the scan target.
#[derive(Debug, Error)]
pub enum AccountError {
	/// No address is connected.
	#[error("No account connected")]
	NotConnected,
	/// The configured address could not be parsed.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Source of the address a discovery run scans.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address of the connected account.
	async fn address(&self) -> Result<Address, AccountError>;
}

/// Thin wrapper over the configured account implementation.
pub struct AccountService {
	provider: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(provider: Box<dyn AccountInterface>) -> Self {
		Self { provider }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.provider.address().await
	}
}
