//! Proving service client
//!
//! Proof generation is the slowest step of a login, often several seconds,
//! so this client gets its own, longer timeout.

use serde::Serialize;
use zklogin_core::{JwtRandomness, ProofBundle, UserSalt, ZkLoginError};
use zklogin_crypto::address::KEY_CLAIM_NAME;
use zklogin_oidc::IdentityToken;

use crate::config::{http_client, ClientConfig};

/// Source of zero-knowledge proofs
#[async_trait::async_trait]
pub trait ProofService: Send + Sync {
    async fn request_proof(
        &self,
        token: &IdentityToken,
        max_epoch: u64,
        randomness: &JwtRandomness,
        extended_public_key: &str,
        salt: &UserSalt,
    ) -> Result<ProofBundle, ZkLoginError>;
}

/// Request body; numbers travel as decimal strings
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofRequest<'a> {
    jwt: &'a str,
    extended_ephemeral_public_key: &'a str,
    max_epoch: String,
    jwt_randomness: &'a str,
    salt: &'a str,
    key_claim_name: &'a str,
}

/// HTTP proving service client
pub struct ProofClient {
    url: String,
    client: reqwest::Client,
}

impl ProofClient {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ZkLoginError> {
        Ok(Self::new(&config.prover_url, http_client(config.prover_timeout)?))
    }
}

#[async_trait::async_trait]
impl ProofService for ProofClient {
    async fn request_proof(
        &self,
        token: &IdentityToken,
        max_epoch: u64,
        randomness: &JwtRandomness,
        extended_public_key: &str,
        salt: &UserSalt,
    ) -> Result<ProofBundle, ZkLoginError> {
        let body = ProofRequest {
            jwt: token.expose(),
            extended_ephemeral_public_key: extended_public_key,
            max_epoch: max_epoch.to_string(),
            jwt_randomness: randomness.expose(),
            salt: salt.expose(),
            key_claim_name: KEY_CLAIM_NAME,
        };

        tracing::debug!(max_epoch, "Requesting proof");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ZkLoginError::Network(format!("proving service: {}", e)))?;

        if !response.status().is_success() {
            return Err(ZkLoginError::Network(format!(
                "proving service returned {}",
                response.status()
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ZkLoginError::Validation(format!("proof response: {}", e)))?;

        if !value.is_object() {
            return Err(ZkLoginError::Validation(
                "proof response is not a JSON object".into(),
            ));
        }

        Ok(ProofBundle::new(value))
    }
}
