//! zkLogin Core
//!
//! Core domain types for the zkLogin session lifecycle.
//! This crate defines the data structures shared by the key manager,
//! the session store, the login pipeline and the transaction signer.

pub mod account;
pub mod address;
pub mod error;
pub mod proof;
pub mod secret;
pub mod transaction;

pub use account::{AccountRecord, OpenIdProvider, SetupData};
pub use address::SuiAddress;
pub use error::{FailureKind, ZkLoginError};
pub use proof::ProofBundle;
pub use secret::{EphemeralPrivateKey, JwtRandomness, UserSalt};
pub use transaction::{format_sui, BalanceMap, TransactionDigest, TransactionResult};
