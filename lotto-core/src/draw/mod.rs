//! Draw lifecycle and settlement.
//!
//! [`DrawEngine`] is a cheap-to-clone handle over the ledger, bet book and
//! history. Every operation takes the same async lock, so ticks, expiry,
//! submissions and ledger changes are applied one at a time and each one is
//! persisted before the lock is released.

pub mod window;

pub use window::{DrawState, WindowStatus};

use crate::bet_book::{Bet, BetBook, BetOutcome, BetStatus};
use crate::config::LotteryConfig;
use crate::error::{LotteryError, Result};
use crate::history::{DrawRecord, HistoryLog};
use crate::ledger::{Account, Ledger, Registration};
use crate::notifier::{Notifier, TracingNotifier};
use crate::numbers::{self, NumberSource, RandomNumbers, Selection};
use crate::payout::{self, BetResult};
use crate::scheduler::{Scheduler, TimerTask, TokioScheduler};
use crate::storage::{self, MemoryStore, SnapshotStore, StoreKey};
use crate::types::{AccountNo, Amount, BetId};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use window::DrawWindow;

/// Everything a settlement pass decided.
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub record: DrawRecord,
    pub settled: Vec<Bet>,
    pub total_paid: Amount,
}

impl SettlementReport {
    pub fn winners(&self) -> impl Iterator<Item = &Bet> {
        self.settled
            .iter()
            .filter(|bet| bet.status == BetStatus::Won)
    }
}

struct Book {
    ledger: Ledger,
    bets: BetBook,
    history: HistoryLog,
    window: DrawWindow,
    numbers: Box<dyn NumberSource>,
}

struct Shared {
    book: Mutex<Book>,
    config: LotteryConfig,
    store: Arc<dyn SnapshotStore>,
    scheduler: Arc<dyn Scheduler>,
    notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, Copy)]
enum TimerKind {
    Tick,
    Expiry,
}

pub struct DrawEngineBuilder {
    config: LotteryConfig,
    store: Option<Arc<dyn SnapshotStore>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    notifier: Arc<dyn Notifier>,
    numbers: Box<dyn NumberSource>,
}

impl DrawEngineBuilder {
    pub fn new(config: LotteryConfig) -> Self {
        Self {
            config,
            store: None,
            scheduler: None,
            notifier: Arc::new(TracingNotifier),
            numbers: Box::new(RandomNumbers::from_entropy()),
        }
    }

    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn number_source(mut self, source: impl NumberSource + 'static) -> Self {
        self.numbers = Box::new(source);
        self
    }

    /// Validates the config and restores the last saved snapshots.
    pub async fn build(self) -> Result<DrawEngine> {
        self.config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(TokioScheduler::new()));

        let ledger: Ledger = storage::load_as(store.as_ref(), StoreKey::Accounts).await?;
        let bets: BTreeMap<AccountNo, Vec<Bet>> =
            storage::load_as(store.as_ref(), StoreKey::Bets).await?;
        let history: HistoryLog = storage::load_as(store.as_ref(), StoreKey::DrawHistory).await?;
        let bets = BetBook::from_snapshot(bets);

        tracing::info!(
            "Loaded {} accounts, {} bets, {} past draws",
            ledger.len(),
            bets.len(),
            history.len()
        );

        let book = Book {
            ledger,
            bets,
            history,
            window: DrawWindow::default(),
            numbers: self.numbers,
        };

        Ok(DrawEngine {
            shared: Arc::new(Shared {
                book: Mutex::new(book),
                config: self.config,
                store,
                scheduler,
                notifier: self.notifier,
            }),
        })
    }
}

#[derive(Clone)]
pub struct DrawEngine {
    shared: Arc<Shared>,
}

impl DrawEngine {
    pub fn builder(config: LotteryConfig) -> DrawEngineBuilder {
        DrawEngineBuilder::new(config)
    }

    pub fn config(&self) -> &LotteryConfig {
        &self.shared.config
    }

    // Draw lifecycle

    /// Opens the betting window and starts the countdown and expiry timers.
    pub async fn open_draw(&self) -> Result<WindowStatus> {
        let mut book = self.shared.book.lock().await;
        if book.window.state != DrawState::Idle {
            return Err(LotteryError::DrawAlreadyOpen);
        }

        let config = &self.shared.config;
        let generation = book.window.next_generation();
        let tick = self
            .shared
            .scheduler
            .every(config.tick_interval, self.timer_task(generation, TimerKind::Tick));
        let expiry = self
            .shared
            .scheduler
            .after(config.draw_duration, self.timer_task(generation, TimerKind::Expiry));
        book.window
            .open(generation, config.draw_duration, tick, expiry);

        tracing::info!(
            "Draw #{} open for {} seconds",
            generation,
            config.draw_duration.as_secs()
        );
        if let Err(e) = self.shared.notifier.draw_opened(config.draw_duration) {
            tracing::warn!("Notifier failed on draw open: {}", e);
        }

        Ok(book.window.status())
    }

    /// Closes the window without drawing. Pending bets stay pending and are
    /// settled by the next draw.
    pub async fn cancel(&self) -> WindowStatus {
        let mut book = self.shared.book.lock().await;
        let previous = book.window.state;

        for handle in book.window.close() {
            self.shared.scheduler.cancel(handle);
        }

        if previous != DrawState::Idle {
            tracing::info!(
                "Draw #{} cancelled; {} bets remain pending",
                book.window.generation,
                book.bets.pending_snapshot().len()
            );
        }
        book.window.status()
    }

    /// Draws the winning numbers and settles every pending bet. Returns
    /// `None` without side effects when no window is open.
    pub async fn settle(&self) -> Result<Option<SettlementReport>> {
        let mut book = self.shared.book.lock().await;
        self.settle_locked(&mut book).await
    }

    pub async fn window_status(&self) -> WindowStatus {
        self.shared.book.lock().await.window.status()
    }

    fn timer_task(&self, generation: u64, kind: TimerKind) -> TimerTask {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        Box::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let engine = DrawEngine { shared };
                match kind {
                    TimerKind::Tick => engine.on_tick(generation).await,
                    TimerKind::Expiry => engine.on_expiry(generation).await,
                }
            })
        })
    }

    async fn on_tick(&self, generation: u64) {
        let mut book = self.shared.book.lock().await;
        if !book.window.accepts(generation) {
            tracing::debug!("Ignoring tick for stale draw #{}", generation);
            return;
        }

        let remaining = book.window.tick(self.shared.config.tick_interval);
        tracing::debug!("Draw #{} closes in {}s", generation, remaining);
    }

    async fn on_expiry(&self, generation: u64) {
        let mut book = self.shared.book.lock().await;
        if !book.window.accepts(generation) {
            tracing::debug!("Ignoring expiry for stale draw #{}", generation);
            return;
        }

        if let Err(e) = self.settle_locked(&mut book).await {
            tracing::error!("Settlement of draw #{} failed: {}", generation, e);
        }
    }

    async fn settle_locked(&self, book: &mut Book) -> Result<Option<SettlementReport>> {
        if book.window.state != DrawState::Open {
            tracing::debug!("No open draw to settle ({:?})", book.window.state);
            return Ok(None);
        }

        book.window.state = DrawState::Settling;
        let record = DrawRecord::new(book.numbers.draw());
        let settlement = Self::apply_settlement(book, &record);

        for handle in book.window.close() {
            self.shared.scheduler.cancel(handle);
        }

        // Nothing is committed unless every bet settled.
        let (ledger, bets, report) = match settlement {
            Ok(settlement) => settlement,
            Err(e) => {
                tracing::error!(
                    "Draw #{} abandoned, pending bets carry over: {}",
                    book.window.generation,
                    e
                );
                return Err(e);
            }
        };
        book.ledger = ledger;
        book.bets = bets;
        book.history.append(record.clone());

        tracing::info!(
            "Draw #{} winning numbers: [{}]",
            book.window.generation,
            record.numbers
        );
        tracing::info!(
            "Settled {} bets against draw {}, paid out {}",
            report.settled.len(),
            record.id,
            report.total_paid
        );

        let persisted = self.persist(book, &StoreKey::ALL).await;
        self.notify_settlement(&report);
        persisted?;

        Ok(Some(report))
    }

    /// Settles every pending bet against copies of the ledger and bet book.
    /// A bet whose winnings cannot be paid is settled as lost with the reason
    /// in its narrative; any other failure leaves the book untouched.
    fn apply_settlement(
        book: &Book,
        record: &DrawRecord,
    ) -> Result<(Ledger, BetBook, SettlementReport)> {
        let mut ledger = book.ledger.clone();
        let mut bets = book.bets.clone();
        let pending = book.bets.pending_snapshot();
        let mut settled = Vec::with_capacity(pending.len());
        let mut total_paid = Amount::ZERO;

        for bet in pending {
            let match_count = bet.numbers.match_count(&record.numbers);
            let paid = Self::pay_winnings(&mut ledger, &bet, match_count, total_paid);

            let (result, winnings) = match paid {
                Ok((winnings, total)) => {
                    total_paid = total;
                    (BetResult::new(match_count), winnings)
                }
                Err(e) => {
                    tracing::error!("Bet {} won but could not be paid: {}", bet.id, e);
                    (BetResult::unpaid(match_count, &e), Amount::ZERO)
                }
            };

            let resolved = bets.resolve(
                &bet.id,
                BetOutcome {
                    draw_id: record.id,
                    result,
                    winnings,
                },
            )?;
            settled.push(resolved.clone());
        }

        let report = SettlementReport {
            record: record.clone(),
            settled,
            total_paid,
        };
        Ok((ledger, bets, report))
    }

    /// Credits one bet's winnings. Returns the winnings and the new running
    /// total; on error the ledger is unchanged.
    fn pay_winnings(
        ledger: &mut Ledger,
        bet: &Bet,
        match_count: usize,
        total_paid: Amount,
    ) -> Result<(Amount, Amount)> {
        let winnings = payout::payout(bet.stake, match_count)?;
        if winnings.is_zero() {
            return Ok((winnings, total_paid));
        }

        let total = total_paid
            .checked_add(winnings)
            .ok_or_else(|| LotteryError::invalid_amount("total payout overflow"))?;
        ledger.credit(&bet.account_no, winnings)?;
        Ok((winnings, total))
    }

    fn notify_settlement(&self, report: &SettlementReport) {
        let notifier = &self.shared.notifier;
        if let Err(e) = notifier.draw_completed(&report.record, report.settled.len()) {
            tracing::warn!("Notifier failed on draw completion: {}", e);
        }
        for bet in report.winners() {
            if let Err(e) = notifier.bet_won(bet) {
                tracing::warn!("Notifier failed on win for bet {}: {}", bet.id, e);
            }
        }
    }

    // Bets

    pub async fn submit_bet(
        &self,
        account_no: &AccountNo,
        numbers: &[u8],
        stake: Amount,
    ) -> Result<BetId> {
        let mut guard = self.shared.book.lock().await;
        let book = &mut *guard;

        let bet_id = book.bets.submit(
            &mut book.ledger,
            account_no,
            numbers,
            stake,
            self.shared.config.min_stake,
            book.window.state,
        )?;

        self.persist(book, &[StoreKey::Accounts, StoreKey::Bets])
            .await?;
        Ok(bet_id)
    }

    pub async fn bets_for_account(&self, account_no: &AccountNo) -> Result<Vec<Bet>> {
        let book = self.shared.book.lock().await;
        book.ledger.account(account_no)?;
        Ok(book.bets.bets_for_account(account_no).to_vec())
    }

    /// The account's most recent bet, settled or not.
    pub async fn last_bet(&self, account_no: &AccountNo) -> Result<Option<Bet>> {
        let book = self.shared.book.lock().await;
        book.ledger.account(account_no)?;
        Ok(book.bets.last_bet(account_no).cloned())
    }

    pub fn quick_pick(&self) -> Selection {
        numbers::quick_pick()
    }

    // History

    pub async fn recent_draws(&self, n: usize) -> Vec<DrawRecord> {
        self.shared.book.lock().await.history.recent(n)
    }

    /// Recent draws limited to the configured display window.
    pub async fn draw_history(&self) -> Vec<DrawRecord> {
        self.recent_draws(self.shared.config.history_display).await
    }

    // Accounts

    pub async fn register(&self, registration: Registration) -> Result<Account> {
        let mut book = self.shared.book.lock().await;
        let account = book.ledger.register(registration)?;
        self.persist(&book, &[StoreKey::Accounts]).await?;
        Ok(account)
    }

    pub async fn authenticate(&self, account_no: &AccountNo, password: &str) -> Result<Account> {
        let book = self.shared.book.lock().await;
        book.ledger.authenticate(account_no, password).cloned()
    }

    pub async fn account(&self, account_no: &AccountNo) -> Result<Account> {
        let book = self.shared.book.lock().await;
        book.ledger.account(account_no).cloned()
    }

    pub async fn balance(&self, account_no: &AccountNo) -> Result<Amount> {
        self.shared.book.lock().await.ledger.balance(account_no)
    }

    /// Privileged top-up used by admin tooling.
    pub async fn credit(&self, account_no: &AccountNo, amount: Amount) -> Result<Amount> {
        let mut book = self.shared.book.lock().await;
        let balance = book.ledger.credit(account_no, amount)?;
        self.persist(&book, &[StoreKey::Accounts]).await?;

        tracing::info!("Credited {} to account {}", amount, account_no);
        Ok(balance)
    }

    pub async fn debit(&self, account_no: &AccountNo, amount: Amount) -> Result<Amount> {
        let mut book = self.shared.book.lock().await;
        let balance = book.ledger.debit(account_no, amount)?;
        self.persist(&book, &[StoreKey::Accounts]).await?;

        tracing::info!("Debited {} from account {}", amount, account_no);
        Ok(balance)
    }

    pub async fn withdraw(&self, account_no: &AccountNo, amount: Amount) -> Result<Amount> {
        let mut book = self.shared.book.lock().await;
        let balance =
            book.ledger
                .withdraw(account_no, amount, self.shared.config.min_withdrawal)?;
        self.persist(&book, &[StoreKey::Accounts]).await?;

        tracing::info!("Account {} withdrew {}", account_no, amount);
        Ok(balance)
    }

    async fn persist(&self, book: &Book, keys: &[StoreKey]) -> Result<()> {
        let store = self.shared.store.as_ref();
        for key in keys {
            match key {
                StoreKey::Accounts => storage::save_as(store, *key, &book.ledger).await?,
                StoreKey::Bets => storage::save_as(store, *key, book.bets.snapshot()).await?,
                StoreKey::DrawHistory => storage::save_as(store, *key, &book.history).await?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use parking_lot::Mutex as SyncMutex;
    use std::time::Duration;

    const WINDOW: Duration = Duration::from_secs(600);

    struct Harness {
        engine: DrawEngine,
        scheduler: Arc<ManualScheduler>,
        store: Arc<MemoryStore>,
    }

    async fn harness_with(source: impl NumberSource + 'static) -> Harness {
        let scheduler = Arc::new(ManualScheduler::new());
        let store = Arc::new(MemoryStore::new());
        let engine = DrawEngine::builder(LotteryConfig::default())
            .store(store.clone())
            .scheduler(scheduler.clone())
            .number_source(source)
            .build()
            .await
            .unwrap();
        Harness {
            engine,
            scheduler,
            store,
        }
    }

    async fn harness(winning: &[u8]) -> Harness {
        let winning = Selection::new(winning).unwrap();
        harness_with(move || winning).await
    }

    async fn funded(engine: &DrawEngine, name: &str, balance: u32) -> AccountNo {
        let account = engine
            .register(Registration {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        if balance > 0 {
            engine
                .credit(&account.account_no, Amount::from_major(balance))
                .await
                .unwrap();
        }
        account.account_no
    }

    #[tokio::test]
    async fn test_jackpot_scenario() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;

        h.engine.open_draw().await.unwrap();
        let bet_id = h
            .engine
            .submit_bet(&a, &[1, 2, 3, 4, 5, 6], Amount::from_major(100))
            .await
            .unwrap();
        assert_eq!(h.engine.balance(&a).await.unwrap(), Amount::from_major(900));

        h.scheduler.advance(WINDOW).await;

        let bets = h.engine.bets_for_account(&a).await.unwrap();
        assert_eq!(bets[0].id, bet_id);
        assert_eq!(bets[0].status, BetStatus::Won);
        assert_eq!(bets[0].winnings, Amount::from_major(100_000));
        let result = bets[0].result.as_ref().unwrap();
        assert_eq!(result.match_count, 6);
        assert!(result.is_jackpot());
        assert_eq!(
            h.engine.balance(&a).await.unwrap(),
            Amount::from_major(100_900)
        );

        let status = h.engine.window_status().await;
        assert_eq!(status.state, DrawState::Idle);
        assert_eq!(status.remaining_seconds, 0);
        assert_eq!(h.scheduler.pending(), 0);
        assert_eq!(h.engine.recent_draws(5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_three_matches_scenario() {
        let h = harness(&[1, 2, 3, 10, 20, 30]).await;
        let b = funded(&h.engine, "bayo", 200).await;

        h.engine.open_draw().await.unwrap();
        h.engine
            .submit_bet(&b, &[10, 20, 30, 40, 50, 60], Amount::from_major(50))
            .await
            .unwrap();
        let report = h.engine.settle().await.unwrap().unwrap();

        assert_eq!(report.settled.len(), 1);
        let bet = &report.settled[0];
        assert_eq!(bet.result.as_ref().unwrap().match_count, 3);
        assert_eq!(bet.winnings, Amount::from_major(100));
        assert_eq!(bet.status, BetStatus::Won);
        assert_eq!(bet.draw_id, Some(report.record.id));
        assert_eq!(report.total_paid, Amount::from_major(100));
        assert_eq!(h.engine.balance(&b).await.unwrap(), Amount::from_major(250));
    }

    #[tokio::test]
    async fn test_stake_below_minimum_rejected() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;
        h.engine.open_draw().await.unwrap();

        let err = h
            .engine
            .submit_bet(&a, &[1, 2, 3, 4, 5, 6], Amount::from_major(40))
            .await
            .unwrap_err();

        assert!(matches!(err, LotteryError::BelowMinimumStake { .. }));
        assert_eq!(h.engine.balance(&a).await.unwrap(), Amount::from_major(1000));
        assert!(h.engine.bets_for_account(&a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_two_losing_accounts() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 500).await;
        let b = funded(&h.engine, "bayo", 500).await;

        h.engine.open_draw().await.unwrap();
        h.engine
            .submit_bet(&a, &[11, 12, 13, 14, 15, 16], Amount::from_major(50))
            .await
            .unwrap();
        h.engine
            .submit_bet(&b, &[21, 22, 23, 24, 25, 26], Amount::from_major(75))
            .await
            .unwrap();
        h.scheduler.advance(WINDOW).await;

        for (account, balance) in [(&a, 450), (&b, 425)] {
            let bets = h.engine.bets_for_account(account).await.unwrap();
            assert_eq!(bets[0].status, BetStatus::Lost);
            assert_eq!(bets[0].winnings, Amount::ZERO);
            assert_eq!(bets[0].result.as_ref().unwrap().narrative, "Matched 0 numbers.");
            assert_eq!(
                h.engine.balance(account).await.unwrap(),
                Amount::from_major(balance)
            );
        }
    }

    #[tokio::test]
    async fn test_submit_outside_open_window() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;

        let err = h
            .engine
            .submit_bet(&a, &[1, 2, 3, 4, 5, 6], Amount::from_major(50))
            .await
            .unwrap_err();
        assert!(matches!(err, LotteryError::WindowNotOpen));
        assert!(h.engine.bets_for_account(&a).await.unwrap().is_empty());
        assert_eq!(h.engine.balance(&a).await.unwrap(), Amount::from_major(1000));

        // also rejected once the window has closed again
        h.engine.open_draw().await.unwrap();
        h.scheduler.advance(WINDOW).await;
        assert!(matches!(
            h.engine
                .submit_bet(&a, &[1, 2, 3, 4, 5, 6], Amount::from_major(50))
                .await,
            Err(LotteryError::WindowNotOpen)
        ));
    }

    #[tokio::test]
    async fn test_open_twice_rejected() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        h.engine.open_draw().await.unwrap();
        h.scheduler.advance(Duration::from_secs(100)).await;

        let before = h.engine.window_status().await;
        assert!(matches!(
            h.engine.open_draw().await,
            Err(LotteryError::DrawAlreadyOpen)
        ));
        assert_eq!(h.engine.window_status().await, before);
        assert_eq!(before.remaining_seconds, 500);
        // still exactly one tick and one expiry timer
        assert_eq!(h.scheduler.pending(), 2);
    }

    #[tokio::test]
    async fn test_settle_is_idempotent() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;

        assert!(h.engine.settle().await.unwrap().is_none());

        h.engine.open_draw().await.unwrap();
        h.engine
            .submit_bet(&a, &[1, 2, 3, 7, 8, 9], Amount::from_major(100))
            .await
            .unwrap();
        assert!(h.engine.settle().await.unwrap().is_some());
        let after_first = h.engine.balance(&a).await.unwrap();
        assert_eq!(after_first, Amount::from_major(1100));

        assert!(h.engine.settle().await.unwrap().is_none());
        // the cancelled expiry timer never fires a second payout
        h.scheduler.advance(WINDOW).await;
        assert_eq!(h.engine.balance(&a).await.unwrap(), after_first);
        assert_eq!(h.engine.recent_draws(10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_countdown_and_expiry() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let status = h.engine.open_draw().await.unwrap();
        assert_eq!(status.state, DrawState::Open);
        assert_eq!(status.remaining_seconds, 600);

        h.scheduler.advance(Duration::from_secs(599)).await;
        let status = h.engine.window_status().await;
        assert_eq!(status.state, DrawState::Open);
        assert_eq!(status.remaining_seconds, 1);
        assert!(h.engine.recent_draws(1).await.is_empty());

        h.scheduler.advance(Duration::from_secs(1)).await;
        assert_eq!(h.engine.window_status().await.state, DrawState::Idle);
        assert_eq!(h.engine.recent_draws(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_keeps_bets_pending_for_next_draw() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;

        h.engine.open_draw().await.unwrap();
        h.engine
            .submit_bet(&a, &[1, 2, 3, 40, 50, 60], Amount::from_major(100))
            .await
            .unwrap();
        h.scheduler.advance(Duration::from_secs(300)).await;

        let status = h.engine.cancel().await;
        assert_eq!(status.state, DrawState::Idle);
        assert_eq!(status.remaining_seconds, 0);
        assert_eq!(h.scheduler.pending(), 0);

        h.scheduler.advance(WINDOW).await;
        assert!(h.engine.recent_draws(1).await.is_empty());
        let bets = h.engine.bets_for_account(&a).await.unwrap();
        assert_eq!(bets[0].status, BetStatus::Pending);

        // cancelling while idle changes nothing
        assert_eq!(h.engine.cancel().await.state, DrawState::Idle);

        h.engine.open_draw().await.unwrap();
        h.scheduler.advance(WINDOW).await;
        let bets = h.engine.bets_for_account(&a).await.unwrap();
        assert_eq!(bets[0].status, BetStatus::Won);
        assert_eq!(bets[0].winnings, Amount::from_major(200));
    }

    #[tokio::test]
    async fn test_reopened_window_uses_its_own_expiry() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        h.engine.open_draw().await.unwrap();
        h.scheduler.advance(Duration::from_secs(300)).await;
        h.engine.cancel().await;

        h.engine.open_draw().await.unwrap();
        h.scheduler.advance(Duration::from_secs(300)).await;
        // the first window would have expired here
        assert_eq!(h.engine.window_status().await.state, DrawState::Open);
        assert_eq!(h.engine.window_status().await.remaining_seconds, 300);

        h.scheduler.advance(Duration::from_secs(300)).await;
        assert_eq!(h.engine.window_status().await.state, DrawState::Idle);
        assert_eq!(h.engine.recent_draws(5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_balance_drops_by_stake() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;
        h.engine.open_draw().await.unwrap();

        for stake in [50u32, 75, 120, 300] {
            let before = h.engine.balance(&a).await.unwrap();
            h.engine
                .submit_bet(&a, &[90, 91, 92, 93, 94, 95], Amount::from_major(stake))
                .await
                .unwrap();
            let after = h.engine.balance(&a).await.unwrap();
            assert_eq!(before.checked_sub(after), Some(Amount::from_major(stake)));
        }

        let err = h
            .engine
            .submit_bet(&a, &[90, 91, 92, 93, 94, 95], Amount::from_major(500))
            .await
            .unwrap_err();
        assert!(matches!(err, LotteryError::InsufficientFunds { .. }));
        assert_eq!(h.engine.balance(&a).await.unwrap(), Amount::from_major(455));
        assert_eq!(h.engine.bets_for_account(&a).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_payouts_follow_table_for_random_draws() {
        let h = harness_with(RandomNumbers::seeded(42)).await;
        let a = funded(&h.engine, "ada", 1_000_000).await;
        let mut picks = RandomNumbers::seeded(7);

        for _ in 0..25 {
            h.engine.open_draw().await.unwrap();
            for _ in 0..4 {
                let pick = picks.draw();
                h.engine
                    .submit_bet(&a, pick.numbers(), Amount::from_major(50))
                    .await
                    .unwrap();
            }
            let report = h.engine.settle().await.unwrap().unwrap();

            assert_eq!(report.settled.len(), 4);
            for bet in &report.settled {
                let expected = bet.numbers.match_count(&report.record.numbers);
                assert_eq!(bet.result.as_ref().unwrap().match_count, expected);
                assert_eq!(
                    bet.winnings,
                    bet.stake.checked_mul(payout::multiplier(expected)).unwrap()
                );
                assert_ne!(bet.status, BetStatus::Pending);
            }
        }
        assert_eq!(h.engine.recent_draws(100).await.len(), 25);
        assert_eq!(h.engine.draw_history().await.len(), 5);
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;
        h.engine.open_draw().await.unwrap();
        h.engine
            .submit_bet(&a, &[1, 2, 3, 4, 5, 9], Amount::from_major(50))
            .await
            .unwrap();
        h.engine
            .submit_bet(&a, &[1, 2, 3, 4, 5, 9], Amount::from_major(50))
            .await
            .unwrap();
        h.scheduler.advance(WINDOW).await;
        assert!(h.store.get(StoreKey::DrawHistory).is_some());

        let restarted = DrawEngine::builder(LotteryConfig::default())
            .store(h.store.clone())
            .scheduler(Arc::new(ManualScheduler::new()))
            .build()
            .await
            .unwrap();

        // 1000 - 2 * 50 + 2 * 5000
        assert_eq!(
            restarted.balance(&a).await.unwrap(),
            Amount::from_major(10_900)
        );
        assert!(restarted.authenticate(&a, "pw").await.is_ok());
        let bets = restarted.bets_for_account(&a).await.unwrap();
        assert_eq!(bets.len(), 2);
        assert!(bets.iter().all(|b| b.status == BetStatus::Won));
        assert_eq!(
            restarted.recent_draws(5).await,
            h.engine.recent_draws(5).await
        );
        assert_eq!(restarted.window_status().await.state, DrawState::Idle);
    }

    #[tokio::test]
    async fn test_unpayable_winner_does_not_block_settlement() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 1000).await;
        let b = funded(&h.engine, "bayo", 0).await;
        let near_max = Amount::from_minor(u64::MAX - 5_000);
        h.engine.credit(&b, near_max).await.unwrap();

        h.engine.open_draw().await.unwrap();
        for account in [&a, &b] {
            h.engine
                .submit_bet(account, &[1, 2, 3, 40, 50, 60], Amount::from_major(100))
                .await
                .unwrap();
        }
        let report = h.engine.settle().await.unwrap().unwrap();

        assert_eq!(report.settled.len(), 2);
        assert_eq!(report.total_paid, Amount::from_major(200));
        assert_eq!(h.engine.window_status().await.state, DrawState::Idle);
        assert_eq!(h.engine.recent_draws(5).await.len(), 1);

        let won = &h.engine.bets_for_account(&a).await.unwrap()[0];
        assert_eq!(won.status, BetStatus::Won);
        assert_eq!(won.winnings, Amount::from_major(200));
        assert_eq!(h.engine.balance(&a).await.unwrap(), Amount::from_major(1100));

        // 3 matches, but crediting 200.00 would overflow the balance
        let unpaid = &h.engine.bets_for_account(&b).await.unwrap()[0];
        assert_eq!(unpaid.status, BetStatus::Lost);
        assert_eq!(unpaid.winnings, Amount::ZERO);
        assert_eq!(unpaid.draw_id, Some(report.record.id));
        let result = unpaid.result.as_ref().unwrap();
        assert_eq!(result.match_count, 3);
        assert!(result.narrative.contains("could not be paid"));
        assert_eq!(
            h.engine.balance(&b).await.unwrap(),
            Amount::from_minor(u64::MAX - 15_000)
        );

        // the store holds exactly what memory holds
        let restarted = DrawEngine::builder(LotteryConfig::default())
            .store(h.store.clone())
            .scheduler(Arc::new(ManualScheduler::new()))
            .build()
            .await
            .unwrap();
        assert_eq!(
            restarted.balance(&a).await.unwrap(),
            Amount::from_major(1100)
        );
        assert_eq!(
            restarted.balance(&b).await.unwrap(),
            Amount::from_minor(u64::MAX - 15_000)
        );
        assert_eq!(
            restarted.bets_for_account(&b).await.unwrap()[0].status,
            BetStatus::Lost
        );
        assert_eq!(restarted.recent_draws(5).await.len(), 1);

        // nothing is left pending to trip the next draw
        h.engine.open_draw().await.unwrap();
        let next = h.engine.settle().await.unwrap().unwrap();
        assert!(next.settled.is_empty());
        assert_eq!(h.engine.recent_draws(5).await.len(), 2);
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: SyncMutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn draw_opened(&self, duration: Duration) -> Result<()> {
            self.events
                .lock()
                .push(format!("opened {}", duration.as_secs()));
            Ok(())
        }

        fn draw_completed(&self, _record: &DrawRecord, settled: usize) -> Result<()> {
            self.events.lock().push(format!("completed {}", settled));
            Err(LotteryError::internal("display offline"))
        }

        fn bet_won(&self, bet: &Bet) -> Result<()> {
            self.events.lock().push(format!("won {}", bet.winnings));
            Err(LotteryError::internal("display offline"))
        }
    }

    #[tokio::test]
    async fn test_notifier_failures_do_not_affect_settlement() {
        let notifier = Arc::new(RecordingNotifier::default());
        let winning = Selection::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        let engine = DrawEngine::builder(LotteryConfig::default())
            .scheduler(Arc::new(ManualScheduler::new()))
            .notifier(notifier.clone())
            .number_source(move || winning)
            .build()
            .await
            .unwrap();
        let a = funded(&engine, "ada", 100).await;

        engine.open_draw().await.unwrap();
        engine
            .submit_bet(&a, &[1, 2, 3, 4, 50, 60], Amount::from_major(50))
            .await
            .unwrap();
        let report = engine.settle().await.unwrap().unwrap();

        assert_eq!(report.winners().count(), 1);
        assert_eq!(engine.balance(&a).await.unwrap(), Amount::from_major(550));
        assert_eq!(
            *notifier.events.lock(),
            vec!["opened 600", "completed 1", "won 500.00"]
        );
    }

    #[tokio::test]
    async fn test_withdraw_and_last_bet() {
        let h = harness(&[1, 2, 3, 4, 5, 6]).await;
        let a = funded(&h.engine, "ada", 25_000).await;

        assert!(h.engine.last_bet(&a).await.unwrap().is_none());
        assert!(matches!(
            h.engine.withdraw(&a, Amount::from_major(100)).await,
            Err(LotteryError::BelowMinimumWithdrawal { .. })
        ));
        let left = h
            .engine
            .withdraw(&a, Amount::from_major(20_000))
            .await
            .unwrap();
        assert_eq!(left, Amount::from_major(5_000));

        h.engine.open_draw().await.unwrap();
        let id = h
            .engine
            .submit_bet(&a, &[7, 8, 9, 10, 11, 12], Amount::from_major(50))
            .await
            .unwrap();
        assert_eq!(h.engine.last_bet(&a).await.unwrap().unwrap().id, id);

        let ghost = AccountNo::parse("12345678901").unwrap();
        assert!(matches!(
            h.engine.bets_for_account(&ghost).await,
            Err(LotteryError::AccountNotFound(_))
        ));
    }
}
