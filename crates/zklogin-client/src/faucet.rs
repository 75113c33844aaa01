//! Test-network faucet

use serde::Deserialize;
use serde_json::json;
use zklogin_core::{SuiAddress, ZkLoginError};

use crate::config::{http_client, ClientConfig};

#[derive(Deserialize)]
struct FaucetResponse {
    error: Option<String>,
}

/// Faucet client for devnet, testnet and localnet
pub struct FaucetClient {
    url: String,
    client: reqwest::Client,
}

impl FaucetClient {
    pub fn new(host: &str, client: reqwest::Client) -> Self {
        Self {
            url: format!("{}/v1/gas", host.trim_end_matches('/')),
            client,
        }
    }

    /// Faucet of the configured network; mainnet has none
    pub fn from_config(config: &ClientConfig) -> Result<Self, ZkLoginError> {
        let host = config.faucet_host().ok_or_else(|| {
            ZkLoginError::Config(format!("no faucet on {}", config.network))
        })?;
        Ok(Self::new(host, http_client(config.request_timeout)?))
    }

    /// Ask for test SUI to be sent to `recipient`
    pub async fn request(&self, recipient: &SuiAddress) -> Result<(), ZkLoginError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "FixedAmountRequest": { "recipient": recipient.to_hex() } }))
            .send()
            .await
            .map_err(|e| ZkLoginError::Network(format!("faucet: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZkLoginError::Network(format!("faucet returned {}", status)));
        }

        let body: FaucetResponse = response
            .json()
            .await
            .map_err(|e| ZkLoginError::Network(format!("faucet response: {}", e)))?;

        match body.error {
            Some(error) => Err(ZkLoginError::Network(format!("faucet: {}", error))),
            None => {
                tracing::info!(recipient = %recipient, "Faucet request accepted");
                Ok(())
            }
        }
    }
}
