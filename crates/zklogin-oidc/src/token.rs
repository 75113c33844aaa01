//! Identity token decoding and claim validation
//!
//! The signature of the identity token is not checked here: the proving
//! service verifies it against the provider's keys as part of proof
//! generation. This module only needs the claims that feed address
//! derivation.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};
use zklogin_core::ZkLoginError;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Missing claims: {0}")]
    MissingClaims(&'static str),

    #[error("Invalid authorization endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<TokenError> for ZkLoginError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidEndpoint(_) => ZkLoginError::Config(err.to_string()),
            _ => ZkLoginError::Validation(err.to_string()),
        }
    }
}

/// Raw identity token (JWT). Never persisted, never logged.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the encoded JWT (use carefully!)
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Decode the payload without verifying the signature
    pub fn decode_claims(&self) -> Result<IdTokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<IdTokenClaims>(&self.0, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::DecodingFailed(e.to_string()))
    }
}

impl std::fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityToken([REDACTED])")
    }
}

/// `aud` is either a single client ID or a list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// The audience used for address derivation
    pub fn primary(&self) -> Option<&str> {
        match self {
            Audience::One(aud) => Some(aud.as_str()),
            Audience::Many(auds) => auds.first().map(String::as_str),
        }
    }
}

/// Claims read from an identity token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl IdTokenClaims {
    /// Require non-empty `sub` and `aud`
    pub fn validate(self) -> Result<ValidatedClaims, TokenError> {
        let subject = self
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(TokenError::MissingClaims("sub"))?;
        let audience = self
            .aud
            .as_ref()
            .and_then(Audience::primary)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .ok_or(TokenError::MissingClaims("aud"))?;

        Ok(ValidatedClaims {
            issuer: self.iss.filter(|s| !s.is_empty()),
            subject,
            audience,
            nonce: self.nonce,
        })
    }
}

/// Claims that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedClaims {
    pub issuer: Option<String>,
    pub subject: String,
    pub audience: String,
    pub nonce: Option<String>,
}
