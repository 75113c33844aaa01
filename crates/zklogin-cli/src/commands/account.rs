//! Account commands

use anyhow::Result;
use console::style;
use zklogin_client::{FaucetClient, SessionContext};
use zklogin_core::{format_sui, SuiAddress, TransactionResult};

use super::{pick_account, spinner};

/// List accounts, newest first, with their balances
pub async fn list(ctx: &SessionContext) -> Result<()> {
    println!("\n{}", style("Accounts").bold().underlined());
    println!();

    let accounts = ctx.accounts().await?;
    if accounts.is_empty() {
        println!("  {}", style("No accounts yet. Run `zklogin login <provider>`.").dim());
        return Ok(());
    }

    let balances = ctx.refresh_balances().await?;
    let epoch = ctx.ledger().latest_epoch().await.ok();

    for account in &accounts {
        let balance = balances
            .get(&account.address)
            .map(|mist| format!("{} SUI", format_sui(*mist)))
            .unwrap_or_else(|| "unavailable".to_string());
        let expired = epoch.map_or(false, |e| !account.is_valid_at(e));

        println!(
            "  {} {} ({})",
            if expired {
                style("●").red()
            } else {
                style("●").green()
            },
            style(account.address).bold(),
            account.provider
        );
        println!("    Balance:    {}", style(balance).cyan());
        println!(
            "    Max epoch:  {}{}",
            account.max_epoch,
            if expired { " (expired)" } else { "" }
        );
        println!("    Created:    {}", account.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!();
    }

    Ok(())
}

/// Send a transaction from an account
pub async fn send(
    ctx: &SessionContext,
    address: Option<SuiAddress>,
    to: Option<SuiAddress>,
) -> Result<()> {
    let account = pick_account(ctx, address).await?;
    let recipient = to.unwrap_or(account.address);

    println!("\n{}", style("Send Transaction").bold().underlined());
    println!();
    println!("  From:          {}", style(account.address).cyan());
    println!("  To:            {}", style(recipient).cyan());
    println!(
        "  Amount:        {} SUI",
        format_sui(ctx.config().transfer_amount)
    );
    println!();

    let pb = spinner("Sending transaction...")?;
    let result = ctx.send_to(&account.address, &recipient).await;
    pb.finish_and_clear();

    match result {
        TransactionResult::Success { digest } => {
            println!("{} Transaction executed", style("✓").green().bold());
            println!("  Digest:        {}", digest);
            Ok(())
        }
        TransactionResult::Failure { error } => {
            println!("{} Transaction failed", style("✗").red().bold());
            anyhow::bail!(error)
        }
    }
}

/// Print balances every poll period until Ctrl-C
pub async fn watch(ctx: &SessionContext) -> Result<()> {
    println!("\n{}", style("Watching balances (Ctrl-C to stop)").bold().underlined());
    println!();

    let mut balances = ctx.balances();
    let _poller = ctx.start_polling();

    loop {
        tokio::select! {
            changed = balances.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = balances.borrow_and_update().clone();
                for account in ctx.accounts().await? {
                    let shown = snapshot
                        .get(&account.address)
                        .map(|mist| format_sui(*mist))
                        .unwrap_or_else(|| "-".to_string());
                    println!("  {}  {} SUI", account.address.short(), style(shown).cyan());
                }
                println!();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Request test SUI for an account
pub async fn faucet(ctx: &SessionContext, address: Option<SuiAddress>) -> Result<()> {
    let account = pick_account(ctx, address).await?;
    let faucet = FaucetClient::from_config(ctx.config())?;

    let pb = spinner("Requesting SUI from faucet...")?;
    let result = faucet.request(&account.address).await;
    pb.finish_and_clear();
    result?;

    println!(
        "{} Faucet request sent for {} on {}",
        style("✓").green().bold(),
        style(account.address).cyan(),
        ctx.config().network
    );
    Ok(())
}
