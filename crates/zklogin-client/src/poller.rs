//! Balance polling

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use zklogin_core::{AccountRecord, BalanceMap, SuiAddress};
use zklogin_store::{SessionStore, StoreError};

use crate::ledger::{Ledger, SUI_COIN_TYPE};

/// Queries balances and publishes them on a watch channel
pub struct BalancePoller {
    ledger: Arc<dyn Ledger>,
    balances: watch::Sender<BalanceMap>,
}

impl BalancePoller {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        let (balances, _) = watch::channel(BalanceMap::new());
        Self { ledger, balances }
    }

    /// Receiver of the latest balances
    pub fn subscribe(&self) -> watch::Receiver<BalanceMap> {
        self.balances.subscribe()
    }

    /// Snapshot of the latest balances
    pub fn balances(&self) -> BalanceMap {
        self.balances.borrow().clone()
    }

    /// Query every account concurrently.
    ///
    /// A failed query is logged and leaves that account out of the map.
    pub async fn poll_once(&self, accounts: &[AccountRecord]) -> BalanceMap {
        let queries = accounts.iter().map(|account| {
            let address = account.address;
            async move {
                match self.ledger.balance(&address, SUI_COIN_TYPE).await {
                    Ok(balance) => Some((address, balance)),
                    Err(err) => {
                        tracing::warn!(address = %address, "Balance query failed: {}", err);
                        None
                    }
                }
            }
        });

        join_all(queries).await.into_iter().flatten().collect()
    }

    /// Query `accounts` and merge the results into the published map
    pub async fn refresh(&self, accounts: &[AccountRecord]) {
        if accounts.is_empty() {
            return;
        }
        let fresh = self.poll_once(accounts).await;
        self.balances.send_modify(|balances| balances.extend(fresh));
    }

    /// One periodic poll of the store's accounts.
    ///
    /// The account list is read again once the queries return: accounts
    /// removed meanwhile are dropped, accounts added meanwhile keep the
    /// balance a `refresh` gave them. A polled account whose query failed
    /// is left absent.
    async fn tick(&self, store: &SessionStore) -> Result<(), StoreError> {
        let polled = store.load_accounts().await?;
        let fresh = self.poll_once(&polled).await;

        let current: HashSet<SuiAddress> = store
            .load_accounts()
            .await?
            .into_iter()
            .map(|account| account.address)
            .collect();

        self.balances.send_modify(|balances| {
            balances.retain(|address, _| current.contains(address));
            for account in &polled {
                balances.remove(&account.address);
            }
            balances.extend(
                fresh
                    .into_iter()
                    .filter(|(address, _)| current.contains(address)),
            );
        });
        Ok(())
    }

    /// Forget every balance
    pub fn clear(&self) {
        self.balances.send_replace(BalanceMap::new());
    }

    /// Drop the balance of one address
    pub fn forget(&self, address: &SuiAddress) {
        self.balances.send_modify(|balances| {
            balances.remove(address);
        });
    }

    /// Poll the store's accounts every `period` until the handle is dropped
    pub fn spawn(self: Arc<Self>, store: Arc<SessionStore>, period: Duration) -> PollerHandle {
        let notify = Arc::new(Notify::new());
        let wake = notify.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = wake.notified() => {}
                }

                if let Err(err) = self.tick(&store).await {
                    tracing::warn!("Balance poll skipped: {}", err);
                }
            }
        });

        PollerHandle { task, notify }
    }
}

/// Running poll task; dropping it stops polling
pub struct PollerHandle {
    task: JoinHandle<()>,
    notify: Arc<Notify>,
}

impl PollerHandle {
    /// Run a poll now instead of waiting for the next period
    pub fn poll_now(&self) {
        self.notify.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
