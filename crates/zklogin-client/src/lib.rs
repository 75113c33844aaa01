//! zkLogin Client
//!
//! Drives the zkLogin flow against its external collaborators: the salt
//! service, the proving service and a Sui fullnode.
//!
//! ```text
//! begin_login ─▶ provider ─▶ complete_login ─▶ salt ─▶ address ─▶ proof ─▶ store
//!                                                                           │
//!                                        send ◀── signer ◀──────────────────┤
//!                                        balances ◀── poller ◀──────────────┘
//! ```

pub mod config;
pub mod faucet;
pub mod ledger;
pub mod login;
pub mod poller;
pub mod prover;
pub mod salt;
pub mod session;
pub mod signer;

pub use config::{ClientConfig, Network, SaltMethod};
pub use faucet::FaucetClient;
pub use ledger::{Ledger, SuiRpcLedger, SUI_COIN_TYPE};
pub use login::{LoginPipeline, LoginState};
pub use poller::{BalancePoller, PollerHandle};
pub use prover::{ProofClient, ProofService};
pub use salt::{SaltClient, SaltService};
pub use session::SessionContext;
pub use signer::TransactionSigner;
