//! Client configuration
//!
//! Every value can be set through the environment (a `.env` file is loaded
//! by the CLI before `from_env` runs).

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zklogin_core::{OpenIdProvider, ZkLoginError};

/// Sui network the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
    Localnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
            Network::Localnet => "localnet",
        }
    }

    /// Public fullnode JSON-RPC endpoint
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://fullnode.devnet.sui.io:443",
            Network::Testnet => "https://fullnode.testnet.sui.io:443",
            Network::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Network::Localnet => "http://127.0.0.1:9000",
        }
    }

    /// Faucet host; mainnet has none
    pub fn faucet_url(&self) -> Option<&'static str> {
        match self {
            Network::Devnet => Some("https://faucet.devnet.sui.io"),
            Network::Testnet => Some("https://faucet.testnet.sui.io"),
            Network::Mainnet => None,
            Network::Localnet => Some("http://127.0.0.1:9123"),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ZkLoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            "localnet" => Ok(Network::Localnet),
            other => Err(ZkLoginError::Config(format!("unknown network: {}", other))),
        }
    }
}

/// How the salt service is called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaltMethod {
    /// Plain GET without a body (static salt files)
    Get,
    /// POST `{ "jwt": ... }`
    #[default]
    Post,
}

impl FromStr for SaltMethod {
    type Err = ZkLoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(SaltMethod::Get),
            "post" => Ok(SaltMethod::Post),
            other => Err(ZkLoginError::Config(format!("unknown salt method: {}", other))),
        }
    }
}

/// zkLogin client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Network name
    pub network: Network,

    /// Fullnode JSON-RPC URL
    pub rpc_url: String,

    /// Proving service URL
    pub prover_url: String,

    /// Salt service URL
    pub salt_url: String,

    /// Salt service request method
    pub salt_method: SaltMethod,

    /// OAuth client IDs per provider
    pub client_ids: HashMap<OpenIdProvider, String>,

    /// Where the provider sends the user back
    pub redirect_uri: String,

    /// Epochs an ephemeral key stays valid after the current one
    pub max_epoch_window: u64,

    /// Balance poll period
    pub poll_interval: Duration,

    /// Timeout for salt, ledger and faucet requests
    pub request_timeout: Duration,

    /// Timeout for proof requests (much slower)
    pub prover_timeout: Duration,

    /// Amount moved by a send, in MIST
    pub transfer_amount: u64,

    /// Gas budget of a send, in MIST
    pub gas_budget: u64,

    /// Faucet host override
    pub faucet_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let network = Network::default();
        Self {
            network,
            rpc_url: network.fullnode_url().to_string(),
            prover_url: "https://prover-dev.mystenlabs.com/v1".to_string(),
            salt_url: "https://salt.api.mystenlabs.com/get_salt".to_string(),
            salt_method: SaltMethod::Post,
            client_ids: HashMap::new(),
            redirect_uri: "http://localhost:3000".to_string(),
            max_epoch_window: 2,
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            prover_timeout: Duration::from_secs(120),
            transfer_amount: 1_000_000,
            gas_budget: 10_000_000,
            faucet_url: None,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ZkLoginError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ZkLoginError::Config(format!("{} has an invalid value: {}", key, value))),
        Err(_) => Ok(None),
    }
}

impl ClientConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ZkLoginError> {
        let defaults = Self::default();

        let network: Network = match std::env::var("ZKLOGIN_NETWORK") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.network,
        };

        let mut client_ids = HashMap::new();
        for provider in OpenIdProvider::ALL {
            let key = format!("ZKLOGIN_CLIENT_ID_{}", provider.as_str().to_ascii_uppercase());
            if let Ok(id) = std::env::var(&key) {
                if !id.is_empty() {
                    client_ids.insert(provider, id);
                }
            }
        }

        let salt_method = match std::env::var("ZKLOGIN_SALT_METHOD") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.salt_method,
        };

        let poll_interval = env_parse("ZKLOGIN_POLL_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);
        if poll_interval.is_zero() {
            return Err(ZkLoginError::Config(
                "ZKLOGIN_POLL_INTERVAL_SECS must be at least 1".into(),
            ));
        }

        Ok(Self {
            network,
            rpc_url: std::env::var("ZKLOGIN_RPC_URL")
                .unwrap_or_else(|_| network.fullnode_url().to_string()),
            prover_url: std::env::var("ZKLOGIN_PROVER_URL").unwrap_or(defaults.prover_url),
            salt_url: std::env::var("ZKLOGIN_SALT_URL").unwrap_or(defaults.salt_url),
            salt_method,
            client_ids,
            redirect_uri: std::env::var("ZKLOGIN_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
            max_epoch_window: env_parse("ZKLOGIN_MAX_EPOCH_WINDOW")?
                .unwrap_or(defaults.max_epoch_window),
            poll_interval,
            request_timeout: env_parse("ZKLOGIN_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            prover_timeout: env_parse("ZKLOGIN_PROVER_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.prover_timeout),
            transfer_amount: env_parse("ZKLOGIN_TRANSFER_AMOUNT")?
                .unwrap_or(defaults.transfer_amount),
            gas_budget: env_parse("ZKLOGIN_GAS_BUDGET")?.unwrap_or(defaults.gas_budget),
            faucet_url: std::env::var("ZKLOGIN_FAUCET_URL").ok(),
        })
    }

    /// Use a different network (and its fullnode)
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self.rpc_url = network.fullnode_url().to_string();
        self
    }

    /// Register an OAuth client ID
    pub fn with_client_id(mut self, provider: OpenIdProvider, client_id: impl Into<String>) -> Self {
        self.client_ids.insert(provider, client_id.into());
        self
    }

    pub fn client_id(&self, provider: OpenIdProvider) -> Option<&str> {
        self.client_ids.get(&provider).map(String::as_str)
    }

    /// Faucet host: the override, else the network's own
    pub fn faucet_host(&self) -> Option<&str> {
        self.faucet_url
            .as_deref()
            .or_else(|| self.network.faucet_url())
    }
}

/// HTTP client with a request timeout
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ZkLoginError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ZkLoginError::Config(format!("HTTP client: {}", e)))
}
