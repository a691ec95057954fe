//! Lotto core - timed-draw lottery engine
//!
//! Players stake on six distinct numbers from 1 to 99 while a draw window is
//! open. When the window closes, six winning numbers are drawn, every pending
//! bet is settled against them and winnings are credited to the ledger.

pub mod bet_book;
pub mod config;
pub mod credentials;
pub mod draw;
pub mod error;
pub mod history;
pub mod ledger;
pub mod notifier;
pub mod numbers;
pub mod payout;
pub mod scheduler;
pub mod storage;
pub mod types;

pub use bet_book::{Bet, BetStatus};
pub use config::LotteryConfig;
pub use draw::{DrawEngine, DrawEngineBuilder, DrawState, SettlementReport, WindowStatus};
pub use error::{ErrorCategory, LotteryError, Result};
pub use history::{DrawRecord, HistoryLog};
pub use ledger::{Account, Ledger, Registration};
pub use notifier::{Notifier, TracingNotifier};
pub use numbers::{NumberSource, RandomNumbers, Selection};
pub use payout::BetResult;
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
pub use storage::{MemoryStore, SnapshotStore, SqliteStore, StoreKey};
pub use types::{AccountNo, Amount, BetId, DrawId};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_engine_on_sqlite() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::new(&temp_dir.path().join("lotto.db")).await.unwrap());

        let engine = DrawEngine::builder(LotteryConfig::default())
            .store(store.clone())
            .build()
            .await
            .unwrap();
        let account = engine
            .register(Registration {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        engine
            .credit(&account.account_no, Amount::from_major(500))
            .await
            .unwrap();

        let reopened = DrawEngine::builder(LotteryConfig::default())
            .store(store)
            .build()
            .await
            .unwrap();
        assert_eq!(
            reopened.balance(&account.account_no).await.unwrap(),
            Amount::from_major(500)
        );
    }
}
