//! Login setup and account records
//!
//! `SetupData` is the persisted half of an in-flight login attempt; it
//! survives the redirect to the identity provider and is consumed when the
//! callback is processed. `AccountRecord` is the finalized result of a
//! successful login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::address::SuiAddress;
use crate::proof::ProofBundle;
use crate::secret::{EphemeralPrivateKey, JwtRandomness, UserSalt};

/// Supported OpenID providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenIdProvider {
    Google,
    Twitch,
    Facebook,
}

impl OpenIdProvider {
    /// All providers, in menu order
    pub const ALL: [OpenIdProvider; 3] = [
        OpenIdProvider::Google,
        OpenIdProvider::Twitch,
        OpenIdProvider::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenIdProvider::Google => "Google",
            OpenIdProvider::Twitch => "Twitch",
            OpenIdProvider::Facebook => "Facebook",
        }
    }
}

impl std::fmt::Display for OpenIdProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenIdProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(OpenIdProvider::Google),
            "twitch" => Ok(OpenIdProvider::Twitch),
            "facebook" => Ok(OpenIdProvider::Facebook),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Data saved before redirecting to the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupData {
    pub provider: OpenIdProvider,
    pub max_epoch: u64,
    pub randomness: JwtRandomness,
    pub ephemeral_private_key: EphemeralPrivateKey,
}

/// A finalized zkLogin account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Provider the user logged in with
    pub provider: OpenIdProvider,

    /// Address derived from (iss, aud, sub, salt)
    pub address: SuiAddress,

    /// Proof bundle returned by the proving service, verbatim
    pub proof: ProofBundle,

    /// Ephemeral key bound to the proof through the nonce
    pub ephemeral_private_key: EphemeralPrivateKey,

    /// User salt
    pub salt: UserSalt,

    /// `sub` claim of the identity token
    pub subject: String,

    /// `aud` claim of the identity token
    pub audience: String,

    /// Last epoch in which the ephemeral key may sign
    pub max_epoch: u64,

    /// When the login completed
    pub created_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Check whether the ephemeral key can still sign at `current_epoch`
    pub fn is_valid_at(&self, current_epoch: u64) -> bool {
        current_epoch <= self.max_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("google".parse::<OpenIdProvider>().unwrap(), OpenIdProvider::Google);
        assert_eq!("Twitch".parse::<OpenIdProvider>().unwrap(), OpenIdProvider::Twitch);
        assert!("github".parse::<OpenIdProvider>().is_err());
    }

    #[test]
    fn test_setup_data_field_names() {
        let setup = SetupData {
            provider: OpenIdProvider::Google,
            max_epoch: 12,
            randomness: JwtRandomness::new("5").unwrap(),
            ephemeral_private_key: EphemeralPrivateKey::from_bytes([0u8; 32]),
        };
        let json = serde_json::to_value(&setup).unwrap();
        assert_eq!(json["provider"], "Google");
        assert_eq!(json["maxEpoch"], 12);
        assert_eq!(json["randomness"], "5");
        assert!(json["ephemeralPrivateKey"].is_string());
    }
}
