//! zkLogin Crypto
//!
//! Cryptographic primitives for the zkLogin flow: ephemeral Ed25519 keys,
//! the Poseidon nonce that binds them to an OAuth request, deterministic
//! address derivation, and composite signature assembly.

pub mod address;
pub mod ephemeral;
pub mod error;
pub mod hash;
pub mod nonce;
pub mod signature;

pub use address::{derive_address, gen_address_seed};
pub use ephemeral::{EphemeralKeypair, EphemeralPublicKey, EphemeralSession};
pub use error::CryptoError;
pub use hash::{blake2b256, poseidon_hash};
pub use nonce::generate_nonce;
pub use signature::{sign_transaction, UserSignature, ZkLoginSignature};
