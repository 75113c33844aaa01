//! Ledger addresses

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Length of a Sui address in bytes
pub const SUI_ADDRESS_LENGTH: usize = 32;

/// A 32-byte Sui address, rendered as `0x`-prefixed lowercase hex
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiAddress([u8; SUI_ADDRESS_LENGTH]);

impl SuiAddress {
    /// Create an address from raw bytes
    pub fn from_bytes(bytes: [u8; SUI_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; SUI_ADDRESS_LENGTH] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Shortened form for display, e.g. `0x1234…cdef`
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl std::fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for SuiAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SuiAddress({})", self.to_hex())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid address: {0}")]
pub struct AddressParseError(String);

impl FromStr for SuiAddress {
    type Err = AddressParseError;

    /// Parse a hex address; short forms such as `0x2` are left-padded
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > SUI_ADDRESS_LENGTH * 2 {
            return Err(AddressParseError(s.to_string()));
        }

        let padded = format!("{:0>width$}", digits, width = SUI_ADDRESS_LENGTH * 2);
        let bytes = hex::decode(padded).map_err(|_| AddressParseError(s.to_string()))?;

        let mut out = [0u8; SUI_ADDRESS_LENGTH];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl Serialize for SuiAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SuiAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
