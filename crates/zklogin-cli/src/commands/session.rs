//! Session commands: clear and status

use std::path::Path;

use anyhow::Result;
use console::style;
use dialoguer::Confirm;
use zklogin_client::SessionContext;

/// Forget the pending login and every account
pub async fn clear(ctx: &SessionContext, yes: bool) -> Result<()> {
    let accounts = ctx.accounts().await?.len();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Forget {} account(s)? Their ephemeral keys cannot be recovered",
                accounts
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Nothing cleared").dim());
            return Ok(());
        }
    }

    ctx.clear_state().await?;
    println!("{} Session state cleared", style("✓").green().bold());
    Ok(())
}

/// Show configuration and status
pub async fn status(ctx: &SessionContext, session_dir: &Path) -> Result<()> {
    let config = ctx.config();

    println!("\n{}", style("zkLogin Status").bold().underlined());
    println!();

    println!("{}", style("Version").bold().underlined());
    println!("  zklogin-cli:     {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("{}", style("Network").bold().underlined());
    println!("  Network:         {}", style(config.network).cyan());
    println!("  RPC:             {}", config.rpc_url);
    match ctx.ledger().latest_epoch().await {
        Ok(epoch) => println!("  Epoch:           {}", style(epoch).green()),
        Err(err) => println!("  Epoch:           {}", style(err).red()),
    }
    println!(
        "  Faucet:          {}",
        config
            .faucet_host()
            .map(|host| style(host.to_string()).green())
            .unwrap_or_else(|| style("none".to_string()).yellow())
    );
    println!();

    println!("{}", style("Services").bold().underlined());
    println!("  Prover:          {}", config.prover_url);
    println!("  Salt:            {} ({:?})", config.salt_url, config.salt_method);
    println!("  Redirect URI:    {}", config.redirect_uri);
    for provider in zklogin_core::OpenIdProvider::ALL {
        println!(
            "  {:<16} {}",
            format!("{}:", provider),
            if config.client_id(provider).is_some() {
                style("client ID set").green()
            } else {
                style("no client ID").yellow()
            }
        );
    }
    println!();

    println!("{}", style("Session").bold().underlined());
    println!("  Directory:       {}", session_dir.display());
    println!(
        "  Pending login:   {}",
        match ctx.store().load_setup().await? {
            Some(setup) => style(format!(
                "{} (max epoch {})",
                setup.provider, setup.max_epoch
            ))
            .yellow(),
            None => style("none".to_string()).dim(),
        }
    );
    println!("  Accounts:        {}", ctx.accounts().await?.len());

    Ok(())
}
