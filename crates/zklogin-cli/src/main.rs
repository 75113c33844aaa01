//! zkLogin CLI
//!
//! Command-line front-end for zkLogin: log in with an OpenID provider,
//! list the derived accounts and send transactions from them.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zklogin_client::Network;
use zklogin_core::{OpenIdProvider, SuiAddress};

mod commands;

#[derive(Parser)]
#[command(name = "zklogin")]
#[command(author, version, about = "zkLogin: sign Sui transactions with an OpenID login", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding this session's state
    #[arg(long, global = true, default_value = ".zklogin", env = "ZKLOGIN_SESSION_DIR")]
    session_dir: PathBuf,

    /// Network to use (overrides ZKLOGIN_NETWORK)
    #[arg(short, long, global = true)]
    network: Option<Network>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a login and print the provider URL
    Login {
        /// Provider (google, twitch, facebook)
        provider: OpenIdProvider,
    },

    /// Finish a login from the URL the provider redirected to
    Complete {
        /// Redirect URL, including the `#id_token=...` fragment
        url: String,
    },

    /// List accounts and their balances
    Accounts,

    /// Send a transaction from an account
    Send {
        /// Sending account (defaults to the newest)
        address: Option<SuiAddress>,

        /// Recipient (defaults to the sender itself)
        #[arg(long)]
        to: Option<SuiAddress>,
    },

    /// Watch balances until interrupted
    Watch,

    /// Request test SUI from the network faucet
    Faucet {
        /// Receiving account (defaults to the newest)
        address: Option<SuiAddress>,
    },

    /// Forget the pending login and every account
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show configuration and status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("zklogin={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ctx = commands::open_context(&cli.session_dir, cli.network).await?;

    match cli.command {
        Commands::Login { provider } => commands::login::begin(&ctx, provider).await?,
        Commands::Complete { url } => commands::login::complete(&ctx, &url).await?,
        Commands::Accounts => commands::account::list(&ctx).await?,
        Commands::Send { address, to } => {
            commands::account::send(&ctx, address, to).await?;
        }
        Commands::Watch => commands::account::watch(&ctx).await?,
        Commands::Faucet { address } => commands::account::faucet(&ctx, address).await?,
        Commands::Clear { yes } => commands::session::clear(&ctx, yes).await?,
        Commands::Status => commands::session::status(&ctx, &cli.session_dir).await?,
    }

    Ok(())
}
