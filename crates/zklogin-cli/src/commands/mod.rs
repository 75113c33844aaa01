//! CLI command implementations

pub mod account;
pub mod login;
pub mod session;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use zklogin_client::{ClientConfig, Network, SessionContext};
use zklogin_core::{AccountRecord, SuiAddress};
use zklogin_store::{FileTabStorage, SessionStore};

/// Build a session context over the session directory
pub async fn open_context(session_dir: &Path, network: Option<Network>) -> Result<SessionContext> {
    let mut config = ClientConfig::from_env()?;
    if let Some(network) = network {
        config = config.with_network(network);
    }

    let storage = FileTabStorage::open(session_dir)
        .await
        .with_context(|| format!("opening session directory {}", session_dir.display()))?;
    let store = Arc::new(SessionStore::new(Arc::new(storage)));
    tracing::debug!(
        "Session directory {} on {}",
        session_dir.display(),
        config.network
    );

    Ok(SessionContext::from_config(config, store)?)
}

/// Spinner for a step of unknown length
pub fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// The account at `address`, or the newest one
pub async fn pick_account(
    ctx: &SessionContext,
    address: Option<SuiAddress>,
) -> Result<AccountRecord> {
    let accounts = ctx.accounts().await?;
    let account = match address {
        Some(address) => accounts.into_iter().find(|a| a.address == address),
        None => accounts.into_iter().next(),
    };
    account.context("no matching account; run `zklogin login` first")
}
