//! Salt service client

use serde::{Deserialize, Serialize};
use zklogin_core::{UserSalt, ZkLoginError};
use zklogin_oidc::IdentityToken;

use crate::config::{http_client, ClientConfig, SaltMethod};

/// Source of per-user salts
#[async_trait::async_trait]
pub trait SaltService: Send + Sync {
    /// Fetch the salt for the identity in `token`
    async fn fetch_salt(&self, token: &IdentityToken) -> Result<UserSalt, ZkLoginError>;
}

#[derive(Serialize)]
struct SaltRequest<'a> {
    jwt: &'a str,
}

#[derive(Deserialize)]
struct SaltResponse {
    salt: String,
}

/// HTTP salt service client
pub struct SaltClient {
    url: String,
    method: SaltMethod,
    client: reqwest::Client,
}

impl SaltClient {
    pub fn new(url: impl Into<String>, method: SaltMethod, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            method,
            client,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ZkLoginError> {
        Ok(Self::new(
            &config.salt_url,
            config.salt_method,
            http_client(config.request_timeout)?,
        ))
    }
}

#[async_trait::async_trait]
impl SaltService for SaltClient {
    async fn fetch_salt(&self, token: &IdentityToken) -> Result<UserSalt, ZkLoginError> {
        let request = match self.method {
            SaltMethod::Get => self.client.get(&self.url),
            SaltMethod::Post => self.client.post(&self.url).json(&SaltRequest {
                jwt: token.expose(),
            }),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ZkLoginError::Network(format!("salt service: {}", e)))?;

        if !response.status().is_success() {
            return Err(ZkLoginError::Network(format!(
                "salt service returned {}",
                response.status()
            )));
        }

        let body: SaltResponse = response
            .json()
            .await
            .map_err(|e| ZkLoginError::Validation(format!("salt response: {}", e)))?;

        UserSalt::new(body.salt)
            .ok_or_else(|| ZkLoginError::Validation("salt is not a decimal integer".into()))
    }
}
