mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::{CliConfig, DataDirLock};
use lotto_core::{LotteryError, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lotto")]
#[command(about = "Timed-draw lottery: accounts, bets and draws")]
#[command(version)]
struct Cli {
    /// Data directory for the lottery database and config.json
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account registration and lookup
    #[command(subcommand)]
    Account(commands::AccountCommands),

    /// Privileged balance adjustments
    #[command(subcommand)]
    Admin(commands::AdminCommands),

    /// Withdraw winnings from an account
    Withdraw {
        /// Account number
        account: lotto_core::AccountNo,
        /// Amount, e.g. 20000 or 20000.50
        amount: lotto_core::Amount,
    },

    /// List an account's bets
    Bets {
        /// Account number
        account: lotto_core::AccountNo,
    },

    /// Show recent winning numbers
    History {
        /// Number of draws to show (defaults to the configured window)
        #[arg(short, long)]
        n: Option<usize>,
    },

    /// Suggest six random numbers
    QuickPick,

    /// Draw window commands
    #[command(subcommand)]
    Draw(commands::DrawCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "lotto={},lotto_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    // Held until the command finishes
    let lock = DataDirLock::acquire(&data_dir)?;

    let config = CliConfig::load(&data_dir).await?;
    tracing::debug!("Using data directory {}", data_dir.display());
    let store = Arc::new(SqliteStore::new(&config.database_path()).await?);

    // Execute command
    let result = match cli.command {
        Commands::Account(cmd) => commands::handle_account_command(cmd, &config, store).await,
        Commands::Admin(cmd) => commands::handle_admin_command(cmd, &config, store).await,
        Commands::Withdraw { account, amount } => {
            commands::withdraw(&config, store, &account, amount).await
        }
        Commands::Bets { account } => commands::list_bets(&config, store, &account).await,
        Commands::History { n } => commands::show_history(&config, store, n).await,
        Commands::QuickPick => commands::quick_pick(),
        Commands::Draw(cmd) => commands::handle_draw_command(cmd, &config, store).await,
    };

    drop(lock);

    if let Err(e) = result {
        match e.downcast_ref::<LotteryError>() {
            Some(LotteryError::AccountNotFound(account)) => {
                eprintln!("Error: Account '{}' not found", account);
                eprintln!("Use 'lotto account register' to open one");
            }
            Some(LotteryError::InsufficientFunds { need, available }) => {
                eprintln!("Error: Insufficient funds");
                eprintln!(
                    "Need: {} {}, Available: {} {}",
                    need, config.lottery.currency, available, config.lottery.currency
                );
            }
            Some(LotteryError::InvalidCredentials) => {
                eprintln!("Error: Wrong account number or password");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
