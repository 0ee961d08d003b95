//! Shared types for the token-scout workspace.
//!
//! Every crate in the discovery pipeline speaks in these types: the holdings
//! that end up in an inventory, the candidate addresses that feed the scan
//! stages, the soft-failure envelope the stages report through, and the
//! configuration schema helpers used by implementation factories.

pub mod candidate;
pub mod discovery;
pub mod serde_helpers;
pub mod token;
pub mod validation;

pub use candidate::*;
pub use discovery::*;
pub use token::*;
pub use validation::*;

/// Re-exported so downstream crates agree on one primitive set.
pub use alloy::primitives::{Address, U256};
