//! zkLogin address derivation
//!
//! The address is a pure function of (issuer, audience, subject, salt):
//!
//! ```text
//! address_seed = Poseidon(H("sub", 32), H(sub, 115), H(aud, 145), Poseidon(salt))
//! address      = Blake2b-256(0x05 || len(iss) || iss || address_seed_be32)
//! ```
//!
//! where `H(s, n)` hashes an ASCII string padded to `n` bytes. No entropy,
//! timestamps or proof data ever enter the derivation.

use num_bigint::BigUint;
use zklogin_core::{SuiAddress, UserSalt};

use crate::error::CryptoError;
use crate::hash::{
    blake2b256_multi, hash_ascii_str_to_field, parse_decimal, poseidon_hash, to_padded_be_bytes,
};

/// Signature scheme flag for zkLogin
pub const ZKLOGIN_FLAG: u8 = 0x05;

/// Claim used as the stable user identifier
pub const KEY_CLAIM_NAME: &str = "sub";

pub const MAX_KEY_CLAIM_NAME_LENGTH: usize = 32;
pub const MAX_KEY_CLAIM_VALUE_LENGTH: usize = 115;
pub const MAX_AUD_VALUE_LENGTH: usize = 145;

/// Google issues tokens with a scheme-less `iss`; the ledger expects the URL
pub fn normalize_issuer(issuer: &str) -> &str {
    if issuer == "accounts.google.com" {
        "https://accounts.google.com"
    } else {
        issuer
    }
}

/// Compute the address seed binding a claim and audience to a salt
pub fn gen_address_seed(
    salt: &UserSalt,
    claim_name: &str,
    claim_value: &str,
    audience: &str,
) -> Result<BigUint, CryptoError> {
    let salt = parse_decimal("salt", salt.expose())?;
    let salt_hash = poseidon_hash(&[salt])?;

    poseidon_hash(&[
        hash_ascii_str_to_field("claim name", claim_name, MAX_KEY_CLAIM_NAME_LENGTH)?,
        hash_ascii_str_to_field("claim value", claim_value, MAX_KEY_CLAIM_VALUE_LENGTH)?,
        hash_ascii_str_to_field("audience", audience, MAX_AUD_VALUE_LENGTH)?,
        salt_hash,
    ])
}

/// Compute the address for an address seed and issuer
pub fn address_from_seed(address_seed: &BigUint, issuer: &str) -> Result<SuiAddress, CryptoError> {
    let issuer = normalize_issuer(issuer);
    let issuer_len = u8::try_from(issuer.len())
        .map_err(|_| CryptoError::InvalidIssuer(format!("{} bytes is too long", issuer.len())))?;
    if issuer.is_empty() {
        return Err(CryptoError::InvalidIssuer("empty issuer".into()));
    }

    let seed_bytes = to_padded_be_bytes(address_seed, 32);
    let header = [ZKLOGIN_FLAG, issuer_len];
    let digest = blake2b256_multi(&[&header[..], issuer.as_bytes(), seed_bytes.as_slice()]);

    Ok(SuiAddress::from_bytes(digest))
}

/// Derive the on-chain address for an identity
pub fn derive_address(
    issuer: &str,
    audience: &str,
    subject: &str,
    salt: &UserSalt,
) -> Result<SuiAddress, CryptoError> {
    let seed = gen_address_seed(salt, KEY_CLAIM_NAME, subject, audience)?;
    address_from_seed(&seed, issuer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt(value: &str) -> UserSalt {
        UserSalt::new(value).unwrap()
    }

    #[test]
    fn test_address_deterministic() {
        let a = derive_address("iss", "c1", "u1", &salt("42")).unwrap();
        let b = derive_address("iss", "c1", "u1", &salt("42")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_address_sensitive_to_each_input() {
        let base = derive_address("iss", "c1", "u1", &salt("42")).unwrap();

        assert_ne!(base, derive_address("iss2", "c1", "u1", &salt("42")).unwrap());
        assert_ne!(base, derive_address("iss", "c2", "u1", &salt("42")).unwrap());
        assert_ne!(base, derive_address("iss", "c1", "u2", &salt("42")).unwrap());
        assert_ne!(base, derive_address("iss", "c1", "u1", &salt("43")).unwrap());
    }

    #[test]
    fn test_google_issuer_normalized() {
        let short = derive_address("accounts.google.com", "c1", "u1", &salt("7")).unwrap();
        let full = derive_address("https://accounts.google.com", "c1", "u1", &salt("7")).unwrap();
        assert_eq!(short, full);
    }

    #[test]
    fn test_address_seed_matches_derivation() {
        let seed = gen_address_seed(&salt("42"), "sub", "u1", "c1").unwrap();
        assert_eq!(
            address_from_seed(&seed, "iss").unwrap(),
            derive_address("iss", "c1", "u1", &salt("42")).unwrap()
        );
    }

    #[test]
    fn test_oversized_claims_rejected() {
        let long_sub = "s".repeat(MAX_KEY_CLAIM_VALUE_LENGTH + 1);
        assert!(matches!(
            derive_address("iss", "c1", &long_sub, &salt("1")),
            Err(CryptoError::StringTooLong { .. })
        ));
        assert!(matches!(
            derive_address("", "c1", "u1", &salt("1")),
            Err(CryptoError::InvalidIssuer(_))
        ));
    }
}
