//! Login pipeline
//!
//! The callback's validated claims are carried through a strictly
//! sequential pipeline. Each state holds exactly what the next stage needs,
//! and a failure at any stage lands in `Aborted` without touching later
//! stages:
//!
//! ```text
//! TokenValidated → SaltFetched → AddressDerived → SetupLoaded → ProofReceived → Completed
//!        └──────────────┴──────────────┴──────────────┴──────────────┴──▶ Aborted
//! ```

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use zklogin_core::{
    AccountRecord, ProofBundle, SetupData, SuiAddress, UserSalt, ZkLoginError,
};
use zklogin_crypto::{derive_address, EphemeralSession};
use zklogin_oidc::{CallbackProcessor, CallbackState, IdentityToken, ValidatedClaims};
use zklogin_store::SessionStore;

use crate::prover::ProofService;
use crate::salt::SaltService;

/// Transient progress message, `None` when idle
pub type StatusSender = Arc<watch::Sender<Option<String>>>;

/// Message shown while the proving service works
pub const PROOF_STATUS: &str = "Requesting ZK proof. This can take a few seconds...";

/// Where a login attempt stands
#[derive(Debug)]
pub enum LoginState {
    TokenValidated {
        token: IdentityToken,
        claims: ValidatedClaims,
    },
    SaltFetched {
        token: IdentityToken,
        claims: ValidatedClaims,
        salt: UserSalt,
    },
    AddressDerived {
        token: IdentityToken,
        claims: ValidatedClaims,
        salt: UserSalt,
        address: SuiAddress,
    },
    /// Setup consumed, nonce checked, address not yet stored
    SetupLoaded {
        token: IdentityToken,
        claims: ValidatedClaims,
        salt: UserSalt,
        address: SuiAddress,
        setup: SetupData,
    },
    ProofReceived {
        claims: ValidatedClaims,
        salt: UserSalt,
        address: SuiAddress,
        setup: SetupData,
        proof: ProofBundle,
    },
    Completed(AccountRecord),
    Aborted(ZkLoginError),
}

impl LoginState {
    /// Enter the pipeline from a processed callback.
    ///
    /// `None` when the location carried no token.
    pub fn from_callback(state: CallbackState) -> Option<Self> {
        match state {
            CallbackState::AwaitingRedirect => None,
            extracted @ CallbackState::TokenExtracted(_) => {
                Self::from_callback(CallbackProcessor::validate(extracted))
            }
            CallbackState::TokenValidated { token, claims } => {
                Some(LoginState::TokenValidated { token, claims })
            }
            CallbackState::Aborted(err) => Some(LoginState::Aborted(err.into())),
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            LoginState::TokenValidated { .. } => "token_validated",
            LoginState::SaltFetched { .. } => "salt_fetched",
            LoginState::AddressDerived { .. } => "address_derived",
            LoginState::SetupLoaded { .. } => "setup_loaded",
            LoginState::ProofReceived { .. } => "proof_received",
            LoginState::Completed(_) => "completed",
            LoginState::Aborted(_) => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginState::Completed(_) | LoginState::Aborted(_))
    }

    pub fn account(&self) -> Option<&AccountRecord> {
        match self {
            LoginState::Completed(account) => Some(account),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ZkLoginError> {
        match self {
            LoginState::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

fn abort(stage: &'static str, err: ZkLoginError) -> LoginState {
    tracing::warn!(stage, kind = ?err.kind(), "Login aborted: {}", err);
    LoginState::Aborted(err)
}

/// Drives a `LoginState` to completion
pub struct LoginPipeline {
    store: Arc<SessionStore>,
    salt_service: Arc<dyn SaltService>,
    proof_service: Arc<dyn ProofService>,
    status: StatusSender,
}

impl LoginPipeline {
    pub fn new(
        store: Arc<SessionStore>,
        salt_service: Arc<dyn SaltService>,
        proof_service: Arc<dyn ProofService>,
        status: StatusSender,
    ) -> Self {
        Self {
            store,
            salt_service,
            proof_service,
            status,
        }
    }

    /// Run one stage
    pub async fn step(&self, state: LoginState) -> LoginState {
        let stage = state.stage();
        match state {
            LoginState::TokenValidated { token, claims } => {
                match self.salt_service.fetch_salt(&token).await {
                    Ok(salt) => LoginState::SaltFetched {
                        token,
                        claims,
                        salt,
                    },
                    Err(err) => abort(stage, err),
                }
            }

            LoginState::SaltFetched {
                token,
                claims,
                salt,
            } => {
                let Some(issuer) = claims.issuer.as_deref() else {
                    return abort(stage, ZkLoginError::Validation("missing claims: iss".into()));
                };
                match derive_address(issuer, &claims.audience, &claims.subject, &salt) {
                    Ok(address) => {
                        tracing::debug!(address = %address, "Address derived");
                        LoginState::AddressDerived {
                            token,
                            claims,
                            salt,
                            address,
                        }
                    }
                    Err(err) => abort(stage, err.into()),
                }
            }

            LoginState::AddressDerived {
                token,
                claims,
                salt,
                address,
            } => match self.consume_setup(&claims, &address).await {
                Ok(setup) => LoginState::SetupLoaded {
                    token,
                    claims,
                    salt,
                    address,
                    setup,
                },
                Err(err) => abort(stage, err),
            },

            LoginState::SetupLoaded {
                token,
                claims,
                salt,
                address,
                setup,
            } => match self.fetch_proof(&token, &salt, &setup).await {
                // the token is not needed past this point
                Ok(proof) => LoginState::ProofReceived {
                    claims,
                    salt,
                    address,
                    setup,
                    proof,
                },
                Err(err) => abort(stage, err),
            },

            LoginState::ProofReceived {
                claims,
                salt,
                address,
                setup,
                proof,
            } => {
                let account = AccountRecord {
                    provider: setup.provider,
                    address,
                    proof,
                    ephemeral_private_key: setup.ephemeral_private_key,
                    salt,
                    subject: claims.subject,
                    audience: claims.audience,
                    max_epoch: setup.max_epoch,
                    created_at: Utc::now(),
                };
                match self.store.save_account(account.clone()).await {
                    Ok(()) => {
                        tracing::info!(
                            provider = %account.provider,
                            address = %account.address,
                            "Login completed"
                        );
                        LoginState::Completed(account)
                    }
                    Err(err) => abort(stage, err.into()),
                }
            }

            terminal @ (LoginState::Completed(_) | LoginState::Aborted(_)) => terminal,
        }
    }

    /// Run stages until a terminal state
    pub async fn run(&self, mut state: LoginState) -> LoginState {
        while !state.is_terminal() {
            state = self.step(state).await;
        }
        state
    }

    /// Take the setup out of the store and check it against the token.
    ///
    /// The setup is cleared before any check, so a failed or duplicate
    /// attempt can never be resumed.
    async fn consume_setup(
        &self,
        claims: &ValidatedClaims,
        address: &SuiAddress,
    ) -> Result<SetupData, ZkLoginError> {
        let setup = self
            .store
            .take_setup()
            .await?
            .ok_or(ZkLoginError::MissingSetup)?;

        if let Some(nonce) = &claims.nonce {
            let expected = EphemeralSession::from_setup(&setup).nonce()?;
            if nonce != &expected {
                return Err(ZkLoginError::Validation(
                    "token nonce does not match the login setup".into(),
                ));
            }
        }

        if self.store.contains(address).await? {
            return Err(ZkLoginError::DuplicateAccount(*address));
        }

        Ok(setup)
    }

    async fn fetch_proof(
        &self,
        token: &IdentityToken,
        salt: &UserSalt,
        setup: &SetupData,
    ) -> Result<ProofBundle, ZkLoginError> {
        let extended_public_key = EphemeralSession::from_setup(setup).public_key().extended();

        self.status.send_replace(Some(PROOF_STATUS.to_string()));
        let result = self
            .proof_service
            .request_proof(
                token,
                setup.max_epoch,
                &setup.randomness,
                &extended_public_key,
                salt,
            )
            .await;
        self.status.send_replace(None);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zklogin_oidc::TokenError;

    #[test]
    fn test_no_token_does_not_enter_pipeline() {
        assert!(LoginState::from_callback(CallbackState::AwaitingRedirect).is_none());
    }

    #[test]
    fn test_callback_abort_is_validation_failure() {
        let state =
            LoginState::from_callback(CallbackState::Aborted(TokenError::MissingClaims("sub")))
                .unwrap();
        assert!(state.is_terminal());
        assert_eq!(
            state.error().unwrap().kind(),
            zklogin_core::FailureKind::Validation
        );
    }

    #[test]
    fn test_validated_callback_enters_first_stage() {
        let state = LoginState::from_callback(CallbackState::TokenValidated {
            token: IdentityToken::new("t"),
            claims: ValidatedClaims {
                issuer: Some("iss".into()),
                subject: "u1".into(),
                audience: "c1".into(),
                nonce: None,
            },
        })
        .unwrap();
        assert_eq!(state.stage(), "token_validated");
        assert!(!state.is_terminal());
        assert!(state.account().is_none());
    }
}
