//! Ephemeral Ed25519 keys
//!
//! A fresh keypair is generated for every login attempt. It is only valid
//! until `max_epoch`; after that the proof bound to it is useless, which is
//! what bounds the damage of a leaked session store.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;
use zklogin_core::{EphemeralPrivateKey, JwtRandomness, OpenIdProvider, SetupData};

use crate::error::CryptoError;
use crate::nonce::generate_nonce;

/// Signature scheme flag for Ed25519
pub const ED25519_FLAG: u8 = 0x00;

/// Bytes of randomness mixed into each nonce
pub const RANDOMNESS_BYTES: usize = 16;

/// Fill `buf` from the OS RNG, surfacing entropy failure as an error
fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::Entropy(e.to_string()))
}

/// Generate 128 bits of nonce randomness as a decimal string
pub fn generate_randomness() -> Result<JwtRandomness, CryptoError> {
    let mut bytes = [0u8; RANDOMNESS_BYTES];
    fill_random(&mut bytes)?;
    let decimal = BigUint::from_bytes_be(&bytes).to_str_radix(10);
    bytes.zeroize();
    JwtRandomness::new(decimal).ok_or(CryptoError::InvalidDecimal("randomness"))
}

/// Ephemeral Ed25519 public key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EphemeralPublicKey([u8; 32]);

impl EphemeralPublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `flag || public_key`, the ledger's serialized form
    pub fn to_sui_bytes(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        out[0] = ED25519_FLAG;
        out[1..].copy_from_slice(&self.0);
        out
    }

    /// The serialized key as a big-endian integer
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_sui_bytes())
    }

    /// Extended public key expected by the proving service (decimal string)
    pub fn extended(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    /// Verify a signature made by the matching private key
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        VerifyingKey::from_bytes(&self.0)
            .map(|vk| vk.verify(message, &Signature::from_bytes(signature)).is_ok())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for EphemeralPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EphemeralPublicKey({})", hex::encode(self.0))
    }
}

/// Ephemeral signing keypair (the secret half zeroizes on drop)
pub struct EphemeralKeypair {
    signing_key: SigningKey,
}

impl EphemeralKeypair {
    /// Generate a new keypair from the OS RNG
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = [0u8; 32];
        fill_random(&mut seed)?;
        let keypair = Self {
            signing_key: SigningKey::from_bytes(&seed),
        };
        seed.zeroize();
        Ok(keypair)
    }

    /// Rebuild a keypair from a stored private key
    pub fn from_private_key(key: &EphemeralPrivateKey) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(key.expose()),
        }
    }

    /// Copy of the private key, for persistence
    pub fn private_key(&self) -> EphemeralPrivateKey {
        EphemeralPrivateKey::from_bytes(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> EphemeralPublicKey {
        EphemeralPublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public_key", &self.public_key())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// An in-flight login attempt: key, epoch window and nonce randomness
#[derive(Debug)]
pub struct EphemeralSession {
    keypair: EphemeralKeypair,
    max_epoch: u64,
    randomness: JwtRandomness,
}

impl EphemeralSession {
    /// Start a session valid through `now_epoch + epoch_window`
    pub fn create(now_epoch: u64, epoch_window: u64) -> Result<Self, CryptoError> {
        Ok(Self {
            keypair: EphemeralKeypair::generate()?,
            max_epoch: now_epoch.saturating_add(epoch_window),
            randomness: generate_randomness()?,
        })
    }

    /// Restore the session persisted before the provider redirect
    pub fn from_setup(setup: &SetupData) -> Self {
        Self {
            keypair: EphemeralKeypair::from_private_key(&setup.ephemeral_private_key),
            max_epoch: setup.max_epoch,
            randomness: setup.randomness.clone(),
        }
    }

    /// Persistable form of this session
    pub fn to_setup(&self, provider: OpenIdProvider) -> SetupData {
        SetupData {
            provider,
            max_epoch: self.max_epoch,
            randomness: self.randomness.clone(),
            ephemeral_private_key: self.keypair.private_key(),
        }
    }

    pub fn keypair(&self) -> &EphemeralKeypair {
        &self.keypair
    }

    pub fn public_key(&self) -> EphemeralPublicKey {
        self.keypair.public_key()
    }

    pub fn max_epoch(&self) -> u64 {
        self.max_epoch
    }

    pub fn randomness(&self) -> &JwtRandomness {
        &self.randomness
    }

    /// OAuth nonce binding this session's key, epoch and randomness
    pub fn nonce(&self) -> Result<String, CryptoError> {
        generate_nonce(&self.public_key(), self.max_epoch, &self.randomness)
    }
}
