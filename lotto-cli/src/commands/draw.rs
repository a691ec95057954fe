use super::open_engine;
use crate::config::CliConfig;
use anyhow::{anyhow, bail};
use clap::Subcommand;
use dialoguer::Input;
use lotto_core::{
    AccountNo, Amount, Bet, DrawEngine, DrawRecord, DrawState, Notifier, Result, SqliteStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Subcommand)]
pub enum DrawCommands {
    /// Open a draw window and take bets until it settles
    Run {
        /// Window length in seconds (defaults to the configured duration)
        #[arg(short, long)]
        duration: Option<u64>,
    },
}

/// Prints draw events as they happen and wakes the prompt loop when the
/// draw completes.
struct ConsoleNotifier {
    currency: String,
    finished: Arc<Notify>,
}

impl Notifier for ConsoleNotifier {
    fn draw_opened(&self, duration: Duration) -> Result<()> {
        println!("Draw is open! Betting closes in {}.", countdown(duration.as_secs()));
        Ok(())
    }

    fn draw_completed(&self, record: &DrawRecord, settled: usize) -> Result<()> {
        println!();
        println!("Winning numbers: {}", record.numbers);
        println!("{} bets settled.", settled);
        self.finished.notify_one();
        Ok(())
    }

    fn bet_won(&self, bet: &Bet) -> Result<()> {
        let narrative = bet
            .result
            .as_ref()
            .map(|r| r.narrative.as_str())
            .unwrap_or_default();
        println!(
            "  {} {} Account {} wins {} {}",
            narrative, bet.numbers, bet.account_no, bet.winnings, self.currency
        );
        Ok(())
    }
}

pub async fn handle_draw_command(
    cmd: DrawCommands,
    config: &CliConfig,
    store: Arc<SqliteStore>,
) -> anyhow::Result<()> {
    match cmd {
        DrawCommands::Run { duration } => {
            let mut config = config.clone();
            if let Some(secs) = duration {
                config.lottery = config
                    .lottery
                    .with_draw_duration(Duration::from_secs(secs));
            }

            let finished = Arc::new(Notify::new());
            let notifier = Arc::new(ConsoleNotifier {
                currency: config.lottery.currency.clone(),
                finished: finished.clone(),
            });
            let engine = open_engine(&config, store, Some(notifier)).await?;

            engine.open_draw().await?;
            print_help();
            run_prompt(&engine, &config, &finished).await?;
        }
    }

    Ok(())
}

async fn run_prompt(
    engine: &DrawEngine,
    config: &CliConfig,
    finished: &Notify,
) -> anyhow::Result<()> {
    loop {
        let mut line = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("lotto")
                .allow_empty(true)
                .interact_text()
        });

        let line = tokio::select! {
            line = &mut line => line??,
            _ = finished.notified() => {
                println!("Draw settled. Press Enter to exit.");
                let _ = line.await;
                return Ok(());
            }
        };

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        let outcome = match command {
            "bet" => place_bet(engine, config, &args).await,
            "status" => {
                let status = engine.window_status().await;
                match status.state {
                    DrawState::Open => println!(
                        "Draw open, closes in {}.",
                        countdown(status.remaining_seconds)
                    ),
                    state => println!("Draw is {:?}.", state),
                }
                Ok(())
            }
            "settle" => match engine.settle().await {
                Ok(Some(_)) => return Ok(()),
                Ok(None) => {
                    println!("No open draw to settle.");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            "cancel" | "quit" | "exit" => {
                engine.cancel().await;
                println!("Draw cancelled. Pending bets carry over to the next draw.");
                return Ok(());
            }
            "help" => {
                print_help();
                Ok(())
            }
            other => Err(anyhow!("Unknown command '{}'. Type 'help'.", other)),
        };

        if let Err(e) = outcome {
            eprintln!("Error: {}", e);
        }
    }
}

/// `bet <account> <stake> [n1,n2,...]`; numbers are quick-picked when left out.
async fn place_bet(engine: &DrawEngine, config: &CliConfig, args: &[&str]) -> anyhow::Result<()> {
    let (account, stake, numbers) = match args {
        [account, stake, numbers @ ..] => (*account, *stake, numbers.join(" ")),
        _ => bail!("Usage: bet <account> <stake> [numbers]"),
    };
    let account: AccountNo = account.parse()?;
    let stake: Amount = stake.parse()?;

    let selection = if numbers.trim().is_empty() {
        let pick = engine.quick_pick();
        println!("Quick pick: {}", pick);
        pick
    } else {
        numbers.parse()?
    };

    let bet_id = engine
        .submit_bet(&account, selection.numbers(), stake)
        .await?;
    let balance = engine.balance(&account).await?;

    println!(
        "Bet {} accepted: [{}] for {} {}",
        bet_id, selection, stake, config.lottery.currency
    );
    println!("Balance: {} {}", balance, config.lottery.currency);
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  bet <account> <stake> [numbers]  place a bet (six numbers 1-99)");
    println!("  status                           time left in the draw");
    println!("  settle                           draw the numbers now");
    println!("  cancel                           close the draw without drawing");
    println!("  quit                             same as cancel");
}

fn countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
