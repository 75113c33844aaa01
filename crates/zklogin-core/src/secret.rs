//! Secret values
//!
//! The ephemeral private key, the JWT randomness and the user salt must never
//! reach a log line. Each is a distinct type that zeroizes on drop, prints as
//! `[REDACTED]` under `Debug`, has no `Display`, and only hands out its
//! contents through `expose()`. `Serialize` exists solely so the session
//! store can persist them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Seed bytes of an ephemeral Ed25519 signing key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EphemeralPrivateKey([u8; 32]);

impl EphemeralPrivateKey {
    /// Wrap raw seed bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes (use carefully!)
    pub fn expose(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for EphemeralPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EphemeralPrivateKey([REDACTED])")
    }
}

impl Serialize for EphemeralPrivateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for EphemeralPrivateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut encoded = String::deserialize(deserializer)?;
        let decoded = hex::decode(&encoded);
        encoded.zeroize();
        let mut bytes = decoded.map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            bytes.zeroize();
            return Err(serde::de::Error::custom("ephemeral private key must be 32 bytes"));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(seed))
    }
}

/// Check that a string is a non-empty run of ASCII digits
fn is_decimal(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Randomness mixed into the OAuth nonce, as a decimal integer string
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(try_from = "String")]
pub struct JwtRandomness(String);

impl JwtRandomness {
    /// Wrap a decimal string; `None` when it is not a decimal integer
    pub fn new(decimal: impl Into<String>) -> Option<Self> {
        let decimal = decimal.into();
        is_decimal(&decimal).then(|| Self(decimal))
    }

    /// Get the decimal string (use carefully!)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JwtRandomness {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "randomness must be a decimal integer".to_string())
    }
}

impl Serialize for JwtRandomness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl std::fmt::Debug for JwtRandomness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtRandomness([REDACTED])")
    }
}

/// Per-user salt from the salt service, as a decimal integer string
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(try_from = "String")]
pub struct UserSalt(String);

impl UserSalt {
    /// Wrap a decimal string; `None` when it is not a decimal integer
    pub fn new(decimal: impl Into<String>) -> Option<Self> {
        let decimal = decimal.into();
        is_decimal(&decimal).then(|| Self(decimal))
    }

    /// Get the decimal string (use carefully!)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserSalt {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "salt must be a decimal integer".to_string())
    }
}

impl Serialize for UserSalt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl std::fmt::Debug for UserSalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserSalt([REDACTED])")
    }
}
