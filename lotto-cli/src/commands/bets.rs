use super::open_engine;
use crate::config::CliConfig;
use comfy_table::{presets::UTF8_FULL, Table};
use lotto_core::{numbers, AccountNo, SqliteStore};
use std::sync::Arc;

pub async fn list_bets(
    config: &CliConfig,
    store: Arc<SqliteStore>,
    account: &AccountNo,
) -> anyhow::Result<()> {
    let engine = open_engine(config, store, None).await?;
    let bets = engine.bets_for_account(account).await?;

    if bets.is_empty() {
        println!("No bets placed by account {}.", account);
        println!("Place one during a draw with: lotto draw run");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Placed",
        "Numbers",
        "Stake",
        "Status",
        "Result",
        "Winnings",
    ]);

    for bet in bets.iter().rev() {
        let result = bet
            .result
            .as_ref()
            .map(|r| r.narrative.clone())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            bet.placed_at.format("%Y-%m-%d %H:%M").to_string(),
            bet.numbers.to_string(),
            bet.stake.to_string(),
            format!("{:?}", bet.status),
            result,
            bet.winnings.to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub async fn show_history(
    config: &CliConfig,
    store: Arc<SqliteStore>,
    n: Option<usize>,
) -> anyhow::Result<()> {
    let engine = open_engine(config, store, None).await?;
    let draws = match n {
        Some(n) => engine.recent_draws(n).await,
        None => engine.draw_history().await,
    };

    if draws.is_empty() {
        println!("No draws yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Drawn", "Winning numbers", "Draw ID"]);

    for draw in draws {
        table.add_row(vec![
            draw.drawn_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            draw.numbers.to_string(),
            draw.id.to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn quick_pick() -> anyhow::Result<()> {
    println!("Your numbers: {}", numbers::quick_pick());
    Ok(())
}
