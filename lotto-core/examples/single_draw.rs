use lotto_core::{
    Amount, DrawEngine, LotteryConfig, ManualScheduler, MemoryStore, Registration, Selection,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let scheduler = Arc::new(ManualScheduler::new());
    let winning = Selection::new(&[4, 8, 15, 16, 23, 42])?;
    let engine = DrawEngine::builder(LotteryConfig::default())
        .store(Arc::new(MemoryStore::new()))
        .scheduler(scheduler.clone())
        .number_source(move || winning)
        .build()
        .await?;

    let account = engine
        .register(Registration {
            username: "demo".to_string(),
            email: "demo@example.com".to_string(),
            password: "demo-password".to_string(),
        })
        .await?;
    engine
        .credit(&account.account_no, Amount::from_major(1_000))
        .await?;
    println!("Registered account {}", account.account_no);

    let status = engine.open_draw().await?;
    println!("Draw open, closes in {}s", status.remaining_seconds);

    let pick = engine.quick_pick();
    engine
        .submit_bet(&account.account_no, &[4, 8, 15, 16, 50, 60], Amount::from_major(100))
        .await?;
    engine
        .submit_bet(&account.account_no, pick.numbers(), Amount::from_major(50))
        .await?;

    // Let the window run out
    scheduler.advance(Duration::from_secs(600)).await;

    for bet in engine.bets_for_account(&account.account_no).await? {
        println!(
            "[{}] stake {} -> {:?}, won {}",
            bet.numbers, bet.stake, bet.status, bet.winnings
        );
    }
    println!(
        "Balance: {}",
        engine.balance(&account.account_no).await?
    );

    Ok(())
}
