//! Login commands

use anyhow::{bail, Result};
use console::style;
use url::Url;
use zklogin_client::{LoginState, SessionContext};
use zklogin_core::{format_sui, OpenIdProvider};

use super::spinner;

/// Start a login and print where to go next
pub async fn begin(ctx: &SessionContext, provider: OpenIdProvider) -> Result<()> {
    println!("\n{}", style(format!("Log in with {}", provider)).bold().underlined());
    println!();

    let pb = spinner("Creating ephemeral session...")?;
    let url = ctx.begin_login(provider).await;
    pb.finish_and_clear();
    let url = url?;

    println!("  Network:       {}", style(ctx.config().network).cyan());
    println!("  Redirect URI:  {}", ctx.config().redirect_uri);
    println!();
    println!("  Open this URL in a browser and sign in:");
    println!();
    println!("  {}", style(url.as_str()).green());
    println!();
    println!(
        "  Then run {} with the URL you land on.",
        style("zklogin complete '<url>'").bold()
    );

    Ok(())
}

/// Finish a login from the provider's redirect URL
pub async fn complete(ctx: &SessionContext, raw_url: &str) -> Result<()> {
    let mut location = Url::parse(raw_url)?;

    let pb = spinner("Completing login...")?;
    let mut status = ctx.status();
    let progress = pb.clone();
    let watcher = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if let Some(message) = status.borrow_and_update().clone() {
                progress.set_message(message);
            }
        }
    });

    let outcome = ctx.complete_login(&mut location).await;
    watcher.abort();
    pb.finish_and_clear();

    match outcome {
        None => bail!("the URL carries no id_token"),
        Some(LoginState::Completed(account)) => {
            println!("\n{} Logged in", style("✓").green().bold());
            println!();
            println!("  Provider:      {}", account.provider);
            println!("  Address:       {}", style(account.address).cyan());
            println!("  Max epoch:     {}", account.max_epoch);
            if let Some(balance) = ctx.balances().borrow().get(&account.address) {
                println!("  Balance:       {} SUI", format_sui(*balance));
            }
            Ok(())
        }
        Some(LoginState::Aborted(err)) => {
            println!("\n{} Login aborted", style("✗").red().bold());
            Err(err.into())
        }
        Some(other) => bail!("login stopped at {}", other.stage()),
    }
}
