//! Transaction signing and submission

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use zklogin_core::{AccountRecord, SuiAddress, TransactionDigest, TransactionResult, ZkLoginError};
use zklogin_crypto::address::KEY_CLAIM_NAME;
use zklogin_crypto::{gen_address_seed, sign_transaction, EphemeralKeypair, ZkLoginSignature};

use crate::ledger::Ledger;

/// Marks an address as having a send in flight until dropped
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<SuiAddress>>,
    address: SuiAddress,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(
        in_flight: &'a Mutex<HashSet<SuiAddress>>,
        address: SuiAddress,
    ) -> Result<Self, ZkLoginError> {
        let mut set = in_flight
            .lock()
            .map_err(|e| ZkLoginError::Storage(e.to_string()))?;
        if !set.insert(address) {
            return Err(ZkLoginError::SendInFlight(address));
        }
        Ok(Self { in_flight, address })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.address);
        }
    }
}

/// Signs ledger-built transactions with an account's ephemeral key and
/// submits them with a zkLogin signature.
///
/// At most one send per account is in flight; a concurrent second send is
/// rejected, not queued. Nothing is retried.
pub struct TransactionSigner {
    ledger: Arc<dyn Ledger>,
    transfer_amount: u64,
    in_flight: Mutex<HashSet<SuiAddress>>,
}

impl TransactionSigner {
    pub fn new(ledger: Arc<dyn Ledger>, transfer_amount: u64) -> Self {
        Self {
            ledger,
            transfer_amount,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Transfer `transfer_amount` MIST from the account to itself
    pub async fn send(&self, account: &AccountRecord) -> TransactionResult {
        self.send_to(account, &account.address).await
    }

    /// Transfer `transfer_amount` MIST to `recipient`
    pub async fn send_to(&self, account: &AccountRecord, recipient: &SuiAddress) -> TransactionResult {
        match self.try_send(account, recipient).await {
            Ok(digest) => {
                tracing::info!(address = %account.address, digest = %digest, "Transaction executed");
                TransactionResult::Success { digest }
            }
            Err(err) => {
                tracing::warn!(address = %account.address, kind = ?err.kind(), "Send failed: {}", err);
                TransactionResult::failure(err)
            }
        }
    }

    async fn try_send(
        &self,
        account: &AccountRecord,
        recipient: &SuiAddress,
    ) -> Result<TransactionDigest, ZkLoginError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, account.address)?;

        let current = self.ledger.latest_epoch().await?;
        if !account.is_valid_at(current) {
            return Err(ZkLoginError::EpochExpired {
                current,
                max_epoch: account.max_epoch,
            });
        }

        let tx_bytes = self
            .ledger
            .build_transfer(&account.address, recipient, self.transfer_amount)
            .await?;

        let keypair = EphemeralKeypair::from_private_key(&account.ephemeral_private_key);
        let user_signature = sign_transaction(&keypair, &tx_bytes);

        let address_seed = gen_address_seed(
            &account.salt,
            KEY_CLAIM_NAME,
            &account.subject,
            &account.audience,
        )?;

        let signature = ZkLoginSignature::assemble(
            &account.proof,
            &address_seed,
            account.max_epoch,
            &user_signature,
        )?
        .to_base64()?;

        self.ledger.execute_transaction(&tx_bytes, &signature).await
    }
}
