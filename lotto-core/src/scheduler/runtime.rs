use super::{Scheduler, TimerHandle, TimerTask};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Wall-clock scheduler backed by tokio tasks. Must be used inside a runtime.
pub struct TokioScheduler {
    next_id: AtomicU64,
    timers: Arc<Mutex<HashMap<TimerHandle, JoinHandle<()>>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn next_handle(&self) -> TimerHandle {
        TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn active(&self) -> usize {
        self.timers.lock().len()
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, mut task: TimerTask) -> TimerHandle {
        let handle = self.next_handle();
        let timers = self.timers.clone();

        // Held across spawn so the task cannot deregister before it is registered.
        let mut guard = self.timers.lock();
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Deregister first: a task that cancels its own handle must not abort itself.
            timers.lock().remove(&handle);
            task().await;
        });
        guard.insert(handle, join);

        handle
    }

    fn every(&self, interval: Duration, mut task: TimerTask) -> TimerHandle {
        let handle = self.next_handle();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task().await;
            }
        });
        self.timers.lock().insert(handle, join);

        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(join) = self.timers.lock().remove(&handle) {
            join.abort();
            tracing::debug!("Cancelled timer {:?}", handle);
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, join) in self.timers.lock().drain() {
            join.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(counter: Arc<AtomicUsize>) -> TimerTask {
        Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_fires_once() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.after(Duration::from_secs(10), counting_task(fired.clone()));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_until_cancelled() {
        let scheduler = TokioScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.every(Duration::from_secs(1), counting_task(ticks.clone()));
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        scheduler.cancel(handle);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        // second cancel is a no-op
        scheduler.cancel(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.after(Duration::from_secs(10), counting_task(fired.clone()));
        scheduler.cancel(handle);
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
