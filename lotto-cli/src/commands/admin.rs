use super::open_engine;
use crate::config::CliConfig;
use clap::Subcommand;
use dialoguer::Confirm;
use lotto_core::{AccountNo, Amount, SqliteStore};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Add funds to an account
    Credit {
        /// Account number
        account: AccountNo,
        /// Amount, e.g. 1000 or 1000.50
        amount: Amount,
    },
    /// Remove funds from an account
    Debit {
        /// Account number
        account: AccountNo,
        /// Amount, e.g. 1000 or 1000.50
        amount: Amount,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_admin_command(
    cmd: AdminCommands,
    config: &CliConfig,
    store: Arc<SqliteStore>,
) -> anyhow::Result<()> {
    let engine = open_engine(config, store, None).await?;
    let currency = &config.lottery.currency;

    match cmd {
        AdminCommands::Credit { account, amount } => {
            let balance = engine.credit(&account, amount).await?;
            println!("Credited {} {} to {}", amount, currency, account);
            println!("New balance: {} {}", balance, currency);
        }

        AdminCommands::Debit {
            account,
            amount,
            force,
        } => {
            if !force {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Debit {} {} from account {}?",
                        amount, currency, account
                    ))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("Debit cancelled.");
                    return Ok(());
                }
            }

            let balance = engine.debit(&account, amount).await?;
            println!("Debited {} {} from {}", amount, currency, account);
            println!("New balance: {} {}", balance, currency);
        }
    }

    Ok(())
}

pub async fn withdraw(
    config: &CliConfig,
    store: Arc<SqliteStore>,
    account: &AccountNo,
    amount: Amount,
) -> anyhow::Result<()> {
    let engine = open_engine(config, store, None).await?;
    let currency = &config.lottery.currency;

    let balance = engine.withdraw(account, amount).await?;
    println!("Withdrawal of {} {} approved.", amount, currency);
    println!("Remaining balance: {} {}", balance, currency);
    Ok(())
}
