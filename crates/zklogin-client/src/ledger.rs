//! Ledger access over Sui JSON-RPC
//!
//! Transaction bytes are built by the fullnode (`unsafe_paySui`) so this
//! crate never has to know the transaction wire format; it only signs and
//! submits the bytes it is handed.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use zklogin_core::{SuiAddress, TransactionDigest, ZkLoginError};

use crate::config::{http_client, ClientConfig};

/// Coin type of native SUI
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Ledger operations the client needs
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Current epoch
    async fn latest_epoch(&self) -> Result<u64, ZkLoginError>;

    /// Total balance of `coin_type` owned by `owner`, in MIST
    async fn balance(&self, owner: &SuiAddress, coin_type: &str) -> Result<u64, ZkLoginError>;

    /// Unsigned transaction bytes moving `amount` MIST
    async fn build_transfer(
        &self,
        sender: &SuiAddress,
        recipient: &SuiAddress,
        amount: u64,
    ) -> Result<Vec<u8>, ZkLoginError>;

    /// Submit signed transaction bytes
    async fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signature: &str,
    ) -> Result<TransactionDigest, ZkLoginError>;
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<CoinEntry>,
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinEntry {
    coin_object_id: String,
    balance: String,
}

/// Coins fetched per page when selecting inputs for a transfer
const COIN_PAGE_LIMIT: u64 = 50;

/// JSON-RPC 2.0 client for a Sui fullnode
pub struct SuiRpcLedger {
    url: String,
    client: reqwest::Client,
    gas_budget: u64,
    next_id: AtomicU64,
}

impl SuiRpcLedger {
    pub fn new(url: impl Into<String>, client: reqwest::Client, gas_budget: u64) -> Self {
        Self {
            url: url.into(),
            client,
            gas_budget,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ZkLoginError> {
        Ok(Self::new(
            &config.rpc_url,
            http_client(config.request_timeout)?,
            config.gas_budget,
        ))
    }

    /// Read-only call: every failure is a network failure
    async fn call(&self, method: &str, params: Value) -> Result<Value, ZkLoginError> {
        self.call_with(method, params, ZkLoginError::Network).await
    }

    /// Call whose JSON-RPC `error` replies are mapped by `rejected`.
    ///
    /// Transport and HTTP status failures are always `Network`.
    async fn call_with(
        &self,
        method: &str,
        params: Value,
        rejected: fn(String) -> ZkLoginError,
    ) -> Result<Value, ZkLoginError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "RPC call");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ZkLoginError::Network(format!("{}: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(ZkLoginError::Network(format!(
                "{}: fullnode returned {}",
                method,
                response.status()
            )));
        }

        let reply: RpcResponse = response
            .json()
            .await
            .map_err(|e| ZkLoginError::Network(format!("{}: invalid response: {}", method, e)))?;

        if let Some(error) = reply.error {
            return Err(rejected(format!(
                "{}: RPC error {}: {}",
                method, error.code, error.message
            )));
        }

        reply
            .result
            .ok_or_else(|| ZkLoginError::Network(format!("{}: empty result", method)))
    }
}

/// Sui returns 64-bit integers as strings; accept both forms
fn u64_field(value: &Value, field: &str) -> Result<u64, ZkLoginError> {
    match value.get(field) {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    }
    .ok_or_else(|| ZkLoginError::Network(format!("missing or invalid field `{}`", field)))
}

#[async_trait::async_trait]
impl Ledger for SuiRpcLedger {
    async fn latest_epoch(&self) -> Result<u64, ZkLoginError> {
        let state = self
            .call("suix_getLatestSuiSystemState", json!([]))
            .await?;
        u64_field(&state, "epoch")
    }

    async fn balance(&self, owner: &SuiAddress, coin_type: &str) -> Result<u64, ZkLoginError> {
        let balance = self
            .call("suix_getBalance", json!([owner.to_hex(), coin_type]))
            .await?;
        u64_field(&balance, "totalBalance")
    }

    async fn build_transfer(
        &self,
        sender: &SuiAddress,
        recipient: &SuiAddress,
        amount: u64,
    ) -> Result<Vec<u8>, ZkLoginError> {
        // pay and gas come out of the same coins
        let needed = u128::from(amount) + u128::from(self.gas_budget);
        let mut selected = Vec::new();
        let mut total: u128 = 0;
        let mut cursor: Option<String> = None;

        while total < needed {
            let page = self
                .call(
                    "suix_getCoins",
                    json!([sender.to_hex(), SUI_COIN_TYPE, cursor, COIN_PAGE_LIMIT]),
                )
                .await?;
            let page: CoinPage = serde_json::from_value(page)
                .map_err(|e| ZkLoginError::Network(format!("suix_getCoins: {}", e)))?;

            for coin in page.data {
                if total >= needed {
                    break;
                }
                let balance = coin.balance.parse::<u128>().map_err(|_| {
                    ZkLoginError::Network(format!(
                        "suix_getCoins: coin {} has invalid balance `{}`",
                        coin.coin_object_id, coin.balance
                    ))
                })?;
                total += balance;
                selected.push(coin.coin_object_id);
            }

            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        if total < needed {
            return Err(ZkLoginError::Signing(format!(
                "insufficient balance: need {} MIST, have {}",
                needed, total
            )));
        }

        let built = self
            .call_with(
                "unsafe_paySui",
                json!([
                    sender.to_hex(),
                    selected,
                    [recipient.to_hex()],
                    [amount.to_string()],
                    self.gas_budget.to_string(),
                ]),
                ZkLoginError::Signing,
            )
            .await?;

        let tx_bytes = built
            .get("txBytes")
            .and_then(Value::as_str)
            .ok_or_else(|| ZkLoginError::Network("unsafe_paySui: missing txBytes".into()))?;

        STANDARD
            .decode(tx_bytes)
            .map_err(|e| ZkLoginError::Network(format!("unsafe_paySui: txBytes: {}", e)))
    }

    async fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signature: &str,
    ) -> Result<TransactionDigest, ZkLoginError> {
        let result = self
            .call_with(
                "sui_executeTransactionBlock",
                json!([
                    STANDARD.encode(tx_bytes),
                    [signature],
                    { "showEffects": true },
                    "WaitForLocalExecution",
                ]),
                ZkLoginError::Signing,
            )
            .await?;

        let digest = result
            .get("digest")
            .and_then(Value::as_str)
            .ok_or_else(|| ZkLoginError::Network("execute: missing digest".into()))?;

        let status = result.pointer("/effects/status");
        let succeeded = status
            .and_then(|s| s.get("status"))
            .and_then(Value::as_str)
            .map_or(true, |s| s == "success");

        if !succeeded {
            let reason = status
                .and_then(|s| s.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ZkLoginError::Signing(format!(
                "transaction {} failed: {}",
                digest, reason
            )));
        }

        Ok(TransactionDigest(digest.to_string()))
    }
}
