//! Test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::sync::Notify;
use url::Url;
use zklogin_client::{ClientConfig, Ledger, LoginState, ProofService, SaltService, SessionContext};
use zklogin_core::{
    JwtRandomness, OpenIdProvider, ProofBundle, SuiAddress, TransactionDigest, UserSalt,
    ZkLoginError,
};
use zklogin_oidc::IdentityToken;
use zklogin_store::SessionStore;

pub const CLIENT_ID: &str = "c1";
pub const ISSUER: &str = "iss";
pub const STARTING_EPOCH: u64 = 10;
pub const BALANCE: u64 = 2_500_000_000;

/// Mint an HS256 identity token; the signature is never checked
pub fn mint_token(claims: Value) -> IdentityToken {
    let jwt = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"provider-secret"),
    )
    .unwrap();
    IdentityToken::new(jwt)
}

/// Location the provider would redirect back to
pub fn callback_location(token: &IdentityToken) -> Url {
    Url::parse(&format!(
        "http://localhost:3000/#id_token={}&authuser=0",
        token.expose()
    ))
    .unwrap()
}

/// Proof bundle shaped like a real proving service response
pub fn sample_proof() -> Value {
    json!({
        "proofPoints": {
            "a": ["1", "2", "1"],
            "b": [["1", "2"], ["3", "4"], ["1", "0"]],
            "c": ["5", "6", "1"]
        },
        "issBase64Details": {
            "value": "wiaXNzIjoiaXNzIiw",
            "indexMod4": 2
        },
        "headerBase64": "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9"
    })
}

/// Serve a router on an ephemeral local port
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub struct MockSalt {
    salt: Option<String>,
    pub calls: AtomicUsize,
}

impl MockSalt {
    pub fn new(salt: &str) -> Self {
        Self {
            salt: Some(salt.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            salt: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SaltService for MockSalt {
    async fn fetch_salt(&self, _token: &IdentityToken) -> Result<UserSalt, ZkLoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let salt = self
            .salt
            .clone()
            .ok_or_else(|| ZkLoginError::Network("salt service unreachable".into()))?;
        UserSalt::new(salt).ok_or_else(|| ZkLoginError::Validation("bad salt".into()))
    }
}

pub struct MockProver {
    response: Value,
    pub calls: AtomicUsize,
    pub last_max_epoch: AtomicU64,
}

impl MockProver {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            last_max_epoch: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProofService for MockProver {
    async fn request_proof(
        &self,
        _token: &IdentityToken,
        max_epoch: u64,
        _randomness: &JwtRandomness,
        _extended_public_key: &str,
        _salt: &UserSalt,
    ) -> Result<ProofBundle, ZkLoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_max_epoch.store(max_epoch, Ordering::SeqCst);
        Ok(ProofBundle::new(self.response.clone()))
    }
}

/// Holds `build_transfer` until released
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub struct MockLedger {
    pub epoch: AtomicU64,
    pub failing_balances: Mutex<HashSet<SuiAddress>>,
    pub execute_error: Mutex<Option<String>>,
    pub gate: Option<Arc<Gate>>,
    /// Holds the next `balance` query for one address until released
    pub balance_gate: Mutex<Option<(SuiAddress, Arc<Gate>)>>,
    pub last_signature: Mutex<Option<String>>,
    pub balance_calls: AtomicUsize,
    pub build_calls: AtomicUsize,
    pub execute_calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU64::new(STARTING_EPOCH),
            failing_balances: Mutex::new(HashSet::new()),
            execute_error: Mutex::new(None),
            gate: None,
            balance_gate: Mutex::new(None),
            last_signature: Mutex::new(None),
            balance_calls: AtomicUsize::new(0),
            build_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn gate_balance(&self, address: SuiAddress, gate: Arc<Gate>) {
        *self.balance_gate.lock().unwrap() = Some((address, gate));
    }

    pub fn set_epoch(&self, epoch: u64) {
        self.epoch.store(epoch, Ordering::SeqCst);
    }

    pub fn fail_execution(&self, error: &str) {
        *self.execute_error.lock().unwrap() = Some(error.to_string());
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Ledger for MockLedger {
    async fn latest_epoch(&self) -> Result<u64, ZkLoginError> {
        Ok(self.epoch.load(Ordering::SeqCst))
    }

    async fn balance(&self, owner: &SuiAddress, _coin_type: &str) -> Result<u64, ZkLoginError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let gate = {
            let mut slot = self.balance_gate.lock().unwrap();
            match slot.as_ref() {
                Some((address, _)) if address == owner => slot.take().map(|(_, gate)| gate),
                _ => None,
            }
        };
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.failing_balances.lock().unwrap().contains(owner) {
            return Err(ZkLoginError::Network("fullnode unavailable".into()));
        }
        Ok(BALANCE)
    }

    async fn build_transfer(
        &self,
        sender: &SuiAddress,
        _recipient: &SuiAddress,
        amount: u64,
    ) -> Result<Vec<u8>, ZkLoginError> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        let mut bytes = sender.as_bytes().to_vec();
        bytes.extend_from_slice(&amount.to_le_bytes());
        Ok(bytes)
    }

    async fn execute_transaction(
        &self,
        _tx_bytes: &[u8],
        signature: &str,
    ) -> Result<TransactionDigest, ZkLoginError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_signature.lock().unwrap() = Some(signature.to_string());
        match self.execute_error.lock().unwrap().clone() {
            Some(error) => Err(ZkLoginError::Signing(error)),
            None => Ok(TransactionDigest("5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqv".into())),
        }
    }
}

/// A session context wired to counting mocks
pub struct TestApp {
    pub ctx: Arc<SessionContext>,
    pub store: Arc<SessionStore>,
    pub salt: Arc<MockSalt>,
    pub prover: Arc<MockProver>,
    pub ledger: Arc<MockLedger>,
}

impl TestApp {
    /// Salt "42", proof `{ "proof": "p" }`
    pub fn new() -> Self {
        Self::with(
            MockSalt::new("42"),
            MockProver::new(json!({ "proof": "p" })),
            MockLedger::new(),
        )
    }

    /// Salt "42" and a proof that can be turned into a signature
    pub fn signing() -> Self {
        Self::with(
            MockSalt::new("42"),
            MockProver::new(sample_proof()),
            MockLedger::new(),
        )
    }

    pub fn with(salt: MockSalt, prover: MockProver, ledger: MockLedger) -> Self {
        let config = ClientConfig::default().with_client_id(OpenIdProvider::Google, CLIENT_ID);
        let store = Arc::new(SessionStore::in_memory());
        let salt = Arc::new(salt);
        let prover = Arc::new(prover);
        let ledger = Arc::new(ledger);

        let ctx = SessionContext::new(
            config,
            store.clone(),
            ledger.clone(),
            salt.clone(),
            prover.clone(),
        );

        Self {
            ctx: Arc::new(ctx),
            store,
            salt,
            prover,
            ledger,
        }
    }

    /// Full login for `sub`, returning the pipeline's final state
    pub async fn login(&self, sub: &str) -> LoginState {
        let auth_url = self.ctx.begin_login(OpenIdProvider::Google).await.unwrap();
        let nonce = auth_url
            .query_pairs()
            .find(|(key, _)| key == "nonce")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        let token = mint_token(json!({
            "iss": ISSUER,
            "sub": sub,
            "aud": CLIENT_ID,
            "nonce": nonce,
        }));
        let mut location = callback_location(&token);
        self.ctx.complete_login(&mut location).await.unwrap()
    }
}
