//! Session context
//!
//! Owns everything one tab (or CLI session) needs: store, ledger, remote
//! services, signer and poller. There is no global state; two contexts over
//! two stores are fully independent.

use std::sync::Arc;

use tokio::sync::watch;
use url::Url;
use zklogin_core::{
    AccountRecord, BalanceMap, OpenIdProvider, SuiAddress, TransactionResult, ZkLoginError,
};
use zklogin_crypto::EphemeralSession;
use zklogin_oidc::{build_auth_url, CallbackProcessor, ProviderConfig};
use zklogin_store::SessionStore;

use crate::config::ClientConfig;
use crate::ledger::{Ledger, SuiRpcLedger};
use crate::login::{LoginPipeline, LoginState, StatusSender};
use crate::poller::{BalancePoller, PollerHandle};
use crate::prover::{ProofClient, ProofService};
use crate::salt::{SaltClient, SaltService};
use crate::signer::TransactionSigner;

/// Message shown while a send is in progress
pub const SEND_STATUS: &str = "Sending transaction...";

pub struct SessionContext {
    config: ClientConfig,
    store: Arc<SessionStore>,
    ledger: Arc<dyn Ledger>,
    pipeline: LoginPipeline,
    signer: TransactionSigner,
    poller: Arc<BalancePoller>,
    status: StatusSender,
}

impl SessionContext {
    pub fn new(
        config: ClientConfig,
        store: Arc<SessionStore>,
        ledger: Arc<dyn Ledger>,
        salt_service: Arc<dyn SaltService>,
        proof_service: Arc<dyn ProofService>,
    ) -> Self {
        let (status, _) = watch::channel(None);
        let status = Arc::new(status);

        Self {
            pipeline: LoginPipeline::new(
                store.clone(),
                salt_service,
                proof_service,
                status.clone(),
            ),
            signer: TransactionSigner::new(ledger.clone(), config.transfer_amount),
            poller: Arc::new(BalancePoller::new(ledger.clone())),
            config,
            store,
            ledger,
            status,
        }
    }

    /// Context talking to the services named in `config`
    pub fn from_config(config: ClientConfig, store: Arc<SessionStore>) -> Result<Self, ZkLoginError> {
        let ledger = Arc::new(SuiRpcLedger::from_config(&config)?);
        let salt = Arc::new(SaltClient::from_config(&config)?);
        let prover = Arc::new(ProofClient::from_config(&config)?);
        Ok(Self::new(config, store, ledger, salt, prover))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Start a login: new ephemeral session, saved setup, provider URL.
    ///
    /// Any earlier unfinished attempt is replaced.
    pub async fn begin_login(&self, provider: OpenIdProvider) -> Result<Url, ZkLoginError> {
        let client_id = self.config.client_id(provider).ok_or_else(|| {
            ZkLoginError::Config(format!("no client ID configured for {}", provider))
        })?;

        let epoch = self.ledger.latest_epoch().await?;
        let session = EphemeralSession::create(epoch, self.config.max_epoch_window)?;
        let nonce = session.nonce()?;

        self.store.save_setup(&session.to_setup(provider)).await?;

        let url = build_auth_url(
            &ProviderConfig::for_provider(provider, client_id),
            &self.config.redirect_uri,
            &nonce,
        )?;

        tracing::info!(%provider, epoch, max_epoch = session.max_epoch(), "Login started");
        Ok(url)
    }

    /// Process the location the provider redirected to.
    ///
    /// Returns `None` when the location carries no token (nothing happens).
    /// On success the new account's balance is fetched once.
    pub async fn complete_login(&self, location: &mut Url) -> Option<LoginState> {
        let state = LoginState::from_callback(CallbackProcessor::process(location))?;
        let state = self.pipeline.run(state).await;

        if let LoginState::Completed(account) = &state {
            self.poller.refresh(std::slice::from_ref(account)).await;
        }
        Some(state)
    }

    /// All accounts, newest first
    pub async fn accounts(&self) -> Result<Vec<AccountRecord>, ZkLoginError> {
        Ok(self.store.load_accounts().await?)
    }

    /// Self-transfer from the account at `address`
    pub async fn send(&self, address: &SuiAddress) -> TransactionResult {
        self.send_to(address, address).await
    }

    /// Transfer from the account at `address` to `recipient`
    pub async fn send_to(&self, address: &SuiAddress, recipient: &SuiAddress) -> TransactionResult {
        let account = match self.store.find_account(address).await {
            Ok(Some(account)) => account,
            Ok(None) => return TransactionResult::failure(format!("unknown account {}", address)),
            Err(err) => return TransactionResult::failure(err),
        };

        self.status.send_replace(Some(SEND_STATUS.to_string()));
        let result = self.signer.send_to(&account, recipient).await;
        self.status.send_replace(None);

        if result.is_success() {
            self.poller.refresh(std::slice::from_ref(&account)).await;
        }
        result
    }

    /// Query every account's balance once
    pub async fn refresh_balances(&self) -> Result<BalanceMap, ZkLoginError> {
        let accounts = self.accounts().await?;
        self.poller.refresh(&accounts).await;
        Ok(self.poller.balances())
    }

    /// Forget the setup, every account and every balance
    pub async fn clear_state(&self) -> Result<(), ZkLoginError> {
        self.store.clear_all().await?;
        self.poller.clear();
        Ok(())
    }

    /// Poll balances every `poll_interval` until the handle is dropped
    pub fn start_polling(&self) -> PollerHandle {
        self.poller
            .clone()
            .spawn(self.store.clone(), self.config.poll_interval)
    }

    pub fn balances(&self) -> watch::Receiver<BalanceMap> {
        self.poller.subscribe()
    }

    /// Progress message of the current long-running step
    pub fn status(&self) -> watch::Receiver<Option<String>> {
        self.status.subscribe()
    }
}
