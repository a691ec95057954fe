use super::open_engine;
use crate::config::CliConfig;
use anyhow::Context;
use clap::Subcommand;
use dialoguer::Password;
use lotto_core::{Account, AccountNo, Registration, SqliteStore};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Register {
        /// Display name
        #[arg(short, long)]
        username: String,
        /// Email address, unique per account
        #[arg(short, long)]
        email: String,
    },
    /// Check credentials and show the account
    Login {
        /// Account number
        account: AccountNo,
    },
    /// Show account details and balance
    Show {
        /// Account number
        account: AccountNo,
    },
}

pub async fn handle_account_command(
    cmd: AccountCommands,
    config: &CliConfig,
    store: Arc<SqliteStore>,
) -> anyhow::Result<()> {
    let engine = open_engine(config, store, None).await?;

    match cmd {
        AccountCommands::Register { username, email } => {
            let password = Password::new()
                .with_prompt("Choose a password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
                .context("Failed to read password")?;

            let account = engine
                .register(Registration {
                    username,
                    email,
                    password,
                })
                .await?;

            println!("Account created successfully!");
            println!();
            println!("IMPORTANT: Your account number is needed to log in.");
            print_account(&account, &config.lottery.currency);
        }

        AccountCommands::Login { account } => {
            let password = Password::new()
                .with_prompt("Password")
                .interact()
                .context("Failed to read password")?;

            let account = engine.authenticate(&account, &password).await?;
            println!("Welcome back, {}!", account.username);
            print_account(&account, &config.lottery.currency);
        }

        AccountCommands::Show { account } => {
            let account = engine.account(&account).await?;
            print_account(&account, &config.lottery.currency);

            if let Some(bet) = engine.last_bet(&account.account_no).await? {
                println!();
                println!("Last bet:");
                println!("  Numbers: {}", bet.numbers);
                println!("  Stake: {} {}", bet.stake, config.lottery.currency);
                println!("  Status: {:?}", bet.status);
            }
        }
    }

    Ok(())
}

fn print_account(account: &Account, currency: &str) {
    println!("Account Information:");
    println!("  Account number: {}", account.account_no);
    println!("  Username: {}", account.username);
    println!("  Email: {}", account.email);
    println!("  Balance: {} {}", account.balance, currency);
    println!(
        "  Opened: {}",
        account.created_at.format("%Y-%m-%d %H:%M")
    );
}
