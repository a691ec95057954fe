use crate::bet_book::Bet;
use crate::error::Result;
use crate::history::DrawRecord;
use std::time::Duration;

/// Presentation-layer hooks. The engine logs and ignores any failure.
pub trait Notifier: Send + Sync {
    fn draw_opened(&self, _duration: Duration) -> Result<()> {
        Ok(())
    }

    fn draw_completed(&self, record: &DrawRecord, settled: usize) -> Result<()>;

    fn bet_won(&self, bet: &Bet) -> Result<()>;
}

/// Default notifier: writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn draw_opened(&self, duration: Duration) -> Result<()> {
        tracing::info!("Draw opened for {} seconds", duration.as_secs());
        Ok(())
    }

    fn draw_completed(&self, record: &DrawRecord, settled: usize) -> Result<()> {
        tracing::info!(
            "Draw {} complete: winning numbers [{}], {} bets settled",
            record.id,
            record.numbers,
            settled
        );
        Ok(())
    }

    fn bet_won(&self, bet: &Bet) -> Result<()> {
        tracing::info!(
            "Account {} won {} on bet {}",
            bet.account_no,
            bet.winnings,
            bet.id
        );
        Ok(())
    }
}
