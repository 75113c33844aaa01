//! Error types for zkLogin

use thiserror::Error;

use crate::address::SuiAddress;

/// Main error type for zkLogin operations
#[derive(Error, Debug)]
pub enum ZkLoginError {
    #[error("Validation failure: {0}")]
    Validation(String),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Account {0} is already logged in")]
    DuplicateAccount(SuiAddress),

    #[error("Setup data missing for this callback")]
    MissingSetup,

    #[error("A transaction is already in flight for {0}")]
    SendInFlight(SuiAddress),

    #[error("Ephemeral key expired: current epoch {current} is past max epoch {max_epoch}")]
    EpochExpired { current: u64, max_epoch: u64 },

    #[error("Signing failure: {0}")]
    Signing(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a failure, used by callers that only need to
/// know which stage of the protocol went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing or malformed token claims, salt or proof responses
    Validation,
    /// Unreachable collaborator or non-success status
    Network,
    /// Duplicate account, missing setup data, concurrent send
    StateConflict,
    /// Transaction build, sign or submit error
    Signing,
    /// Entropy or key material failure
    Crypto,
    /// Local storage failure
    Storage,
    /// Invalid configuration
    Config,
}

impl ZkLoginError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            ZkLoginError::Validation(_) | ZkLoginError::Serialization(_) => {
                FailureKind::Validation
            }
            ZkLoginError::Network(_) => FailureKind::Network,
            ZkLoginError::DuplicateAccount(_)
            | ZkLoginError::MissingSetup
            | ZkLoginError::SendInFlight(_) => FailureKind::StateConflict,
            ZkLoginError::EpochExpired { .. } | ZkLoginError::Signing(_) => FailureKind::Signing,
            ZkLoginError::Crypto(_) => FailureKind::Crypto,
            ZkLoginError::Storage(_) => FailureKind::Storage,
            ZkLoginError::Config(_) => FailureKind::Config,
        }
    }
}

impl From<serde_json::Error> for ZkLoginError {
    fn from(err: serde_json::Error) -> Self {
        ZkLoginError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            ZkLoginError::Validation("missing claims".into()).kind(),
            FailureKind::Validation
        );
        assert_eq!(ZkLoginError::MissingSetup.kind(), FailureKind::StateConflict);
        assert_eq!(
            ZkLoginError::EpochExpired {
                current: 10,
                max_epoch: 9
            }
            .kind(),
            FailureKind::Signing
        );
    }
}
