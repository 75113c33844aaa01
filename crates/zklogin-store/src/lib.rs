//! zkLogin Session Store
//!
//! Tab-scoped persistence for the in-flight login setup and the list of
//! finalized accounts. Nothing here outlives the storage scope: an
//! in-memory backend for a single process, or a session directory for the
//! command-line front-end.

pub mod backend;
pub mod session;

pub use backend::{FileTabStorage, InMemoryTabStorage, TabStorage};
pub use session::{SessionStore, ACCOUNTS_KEY, SETUP_KEY};

use thiserror::Error;
use zklogin_core::{SuiAddress, ZkLoginError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Account already stored: {0}")]
    Duplicate(SuiAddress),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ZkLoginError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(address) => ZkLoginError::DuplicateAccount(address),
            other => ZkLoginError::Storage(other.to_string()),
        }
    }
}
