//! Hash functions for zkLogin
//!
//! Provides the circom-compatible Poseidon hash over the BN254 scalar field
//! (what the zkLogin circuit uses for nonces and address seeds) and
//! Blake2b-256 (what the ledger uses for addresses and signing digests).

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;

use crate::error::CryptoError;

/// Bits packed into one field element when hashing strings
pub const PACK_WIDTH: usize = 248;

/// Largest input count supported by the circom parameter sets
pub const MAX_POSEIDON_INPUTS: usize = 12;

/// Compute Blake2b-256
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let hash = blake2b_simd::Params::new().hash_length(32).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// Compute Blake2b-256 of multiple byte slices
pub fn blake2b256_multi(data: &[&[u8]]) -> [u8; 32] {
    let mut state = blake2b_simd::Params::new().hash_length(32).to_state();
    for d in data {
        state.update(d);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(state.finalize().as_bytes());
    out
}

fn bn254_modulus() -> BigUint {
    BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be())
}

fn to_field(value: &BigUint) -> Result<Fr, CryptoError> {
    if *value >= bn254_modulus() {
        return Err(CryptoError::FieldOverflow);
    }
    Ok(Fr::from_be_bytes_mod_order(&value.to_bytes_be()))
}

fn from_field(value: Fr) -> BigUint {
    BigUint::from_bytes_be(&value.into_bigint().to_bytes_be())
}

/// Poseidon hash of 1..=12 field elements.
///
/// Every input must already be a canonical BN254 scalar; values at or above
/// the modulus are rejected rather than silently reduced.
pub fn poseidon_hash(inputs: &[BigUint]) -> Result<BigUint, CryptoError> {
    if inputs.is_empty() || inputs.len() > MAX_POSEIDON_INPUTS {
        return Err(CryptoError::InvalidInputCount {
            actual: inputs.len(),
            max: MAX_POSEIDON_INPUTS,
        });
    }

    let fields = inputs.iter().map(to_field).collect::<Result<Vec<_>, _>>()?;

    let mut poseidon = Poseidon::<Fr>::new_circom(fields.len())
        .map_err(|e| CryptoError::Poseidon(e.to_string()))?;
    let hash = poseidon
        .hash(&fields)
        .map_err(|e| CryptoError::Poseidon(e.to_string()))?;

    Ok(from_field(hash))
}

/// Hash an ASCII string to a single field element.
///
/// The string is zero-padded to `max_size` bytes, packed big-endian into
/// 31-byte chunks aligned to the end of the buffer, and Poseidon-hashed.
pub fn hash_ascii_str_to_field(
    field: &'static str,
    value: &str,
    max_size: usize,
) -> Result<BigUint, CryptoError> {
    let bytes = value.as_bytes();
    if bytes.len() > max_size {
        return Err(CryptoError::StringTooLong {
            field,
            actual: bytes.len(),
            max: max_size,
        });
    }

    let mut padded = bytes.to_vec();
    padded.resize(max_size, 0);

    let chunk_size = PACK_WIDTH / 8;
    let head = padded.len() % chunk_size;

    let mut packed = Vec::with_capacity(padded.len().div_ceil(chunk_size));
    if head != 0 {
        packed.push(BigUint::from_bytes_be(&padded[..head]));
    }
    packed.extend(padded[head..].chunks(chunk_size).map(BigUint::from_bytes_be));

    poseidon_hash(&packed)
}

/// Big-endian bytes of `value`, keeping the low `width` bytes and
/// left-padding with zeros
pub fn to_padded_be_bytes(value: &BigUint, width: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes.len() >= width {
        return bytes[bytes.len() - width..].to_vec();
    }
    let mut out = vec![0u8; width - bytes.len()];
    out.extend_from_slice(&bytes);
    out
}

/// Parse a decimal string into an integer
pub fn parse_decimal(name: &'static str, value: &str) -> Result<BigUint, CryptoError> {
    BigUint::parse_bytes(value.as_bytes(), 10).ok_or(CryptoError::InvalidDecimal(name))
}
