//! OAuth nonce binding
//!
//! The provider signs the nonce into the identity token, so the proof later
//! generated from that token is tied to exactly one ephemeral key and epoch
//! window. The nonce is derived from:
//! - the ephemeral public key, split into two 128-bit halves
//! - the max epoch
//! - the per-session randomness

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use num_bigint::BigUint;
use zklogin_core::JwtRandomness;

use crate::ephemeral::EphemeralPublicKey;
use crate::error::CryptoError;
use crate::hash::{parse_decimal, poseidon_hash, to_padded_be_bytes};

/// Length of an encoded nonce
pub const NONCE_LENGTH: usize = 27;

/// Bytes of the Poseidon output kept in the nonce
const NONCE_BYTES: usize = 20;

/// Derive the OAuth nonce for a session
pub fn generate_nonce(
    public_key: &EphemeralPublicKey,
    max_epoch: u64,
    randomness: &JwtRandomness,
) -> Result<String, CryptoError> {
    let key = public_key.to_biguint();
    let low_mask = (BigUint::from(1u8) << 128usize) - 1u8;
    let key_hi = &key >> 128usize;
    let key_lo = &key & &low_mask;

    let randomness = parse_decimal("randomness", randomness.expose())?;

    let hash = poseidon_hash(&[key_hi, key_lo, BigUint::from(max_epoch), randomness])?;
    let nonce = URL_SAFE_NO_PAD.encode(to_padded_be_bytes(&hash, NONCE_BYTES));

    if nonce.len() != NONCE_LENGTH {
        return Err(CryptoError::Encoding(format!(
            "nonce has length {}, expected {}",
            nonce.len(),
            NONCE_LENGTH
        )));
    }

    Ok(nonce)
}
