//! Transaction results and balances

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::SuiAddress;

/// MIST per SUI
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Balances by address, in MIST. Rebuilt on every poll, never persisted.
pub type BalanceMap = HashMap<SuiAddress, u64>;

/// Digest of an executed transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionDigest(pub String);

impl std::fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionResult {
    Success { digest: TransactionDigest },
    Failure { error: String },
}

impl TransactionResult {
    pub fn failure(error: impl std::fmt::Display) -> Self {
        TransactionResult::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransactionResult::Success { .. })
    }

    pub fn digest(&self) -> Option<&TransactionDigest> {
        match self {
            TransactionResult::Success { digest } => Some(digest),
            TransactionResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TransactionResult::Success { .. } => None,
            TransactionResult::Failure { error } => Some(error),
        }
    }
}

/// Format a MIST amount as SUI with four decimals, rounding half up
pub fn format_sui(mist: u64) -> String {
    let units = (mist as u128 + 50_000) / 100_000;
    format!("{}.{:04}", units / 10_000, units % 10_000)
}
