//! Setup data and account list on top of a `TabStorage`

use std::sync::Arc;

use tokio::sync::Mutex;
use zklogin_core::{AccountRecord, SetupData, SuiAddress};

use crate::backend::{InMemoryTabStorage, TabStorage};
use crate::StoreError;

/// Key of the in-flight login setup
pub const SETUP_KEY: &str = "zklogin.setup";

/// Key of the account list (newest first)
pub const ACCOUNTS_KEY: &str = "zklogin.accounts";

/// Session-scoped store of login state
pub struct SessionStore {
    storage: Arc<dyn TabStorage>,
    // serialises read-modify-write of the account list
    accounts_lock: Mutex<()>,
    // serialises setup writes against `take_setup`
    setup_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TabStorage>) -> Self {
        Self {
            storage,
            accounts_lock: Mutex::new(()),
            setup_lock: Mutex::new(()),
        }
    }

    /// Store backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTabStorage::new()))
    }

    /// Persist the setup of a login attempt, replacing any earlier one
    pub async fn save_setup(&self, setup: &SetupData) -> Result<(), StoreError> {
        let _guard = self.setup_lock.lock().await;
        let json = serde_json::to_string(setup)?;
        self.storage.set(SETUP_KEY, json).await?;
        tracing::debug!(provider = %setup.provider, max_epoch = setup.max_epoch, "Setup saved");
        Ok(())
    }

    pub async fn load_setup(&self) -> Result<Option<SetupData>, StoreError> {
        match self.storage.get(SETUP_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn clear_setup(&self) -> Result<(), StoreError> {
        let _guard = self.setup_lock.lock().await;
        self.storage.remove(SETUP_KEY).await
    }

    /// Load and clear the setup in one step.
    ///
    /// Of two concurrent callers at most one gets the setup.
    pub async fn take_setup(&self) -> Result<Option<SetupData>, StoreError> {
        let _guard = self.setup_lock.lock().await;
        let setup = self.load_setup().await?;
        if setup.is_some() {
            self.storage.remove(SETUP_KEY).await?;
        }
        Ok(setup)
    }

    /// All accounts, newest first
    pub async fn load_accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        match self.storage.get(ACCOUNTS_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Look up an account by address
    pub async fn find_account(
        &self,
        address: &SuiAddress,
    ) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self
            .load_accounts()
            .await?
            .into_iter()
            .find(|account| &account.address == address))
    }

    pub async fn contains(&self, address: &SuiAddress) -> Result<bool, StoreError> {
        Ok(self.find_account(address).await?.is_some())
    }

    /// Prepend a new account.
    ///
    /// An account whose address is already stored is rejected and the
    /// store is left untouched.
    pub async fn save_account(&self, account: AccountRecord) -> Result<(), StoreError> {
        let _guard = self.accounts_lock.lock().await;

        let mut accounts = self.load_accounts().await?;
        if accounts.iter().any(|a| a.address == account.address) {
            tracing::warn!(address = %account.address, "Account already logged in, not saving");
            return Err(StoreError::Duplicate(account.address));
        }

        let address = account.address;
        accounts.insert(0, account);
        self.storage
            .set(ACCOUNTS_KEY, serde_json::to_string(&accounts)?)
            .await?;

        tracing::info!(address = %address, total = accounts.len(), "Account saved");
        Ok(())
    }

    /// Forget the setup and every account
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.accounts_lock.lock().await;
        self.storage.clear().await?;
        tracing::info!("Session state cleared");
        Ok(())
    }
}
