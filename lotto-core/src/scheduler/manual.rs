use super::{Scheduler, TimerHandle, TimerTask};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

type SharedTask = Arc<Mutex<TimerTask>>;

struct ManualTimer {
    due: Duration,
    period: Option<Duration>,
    task: SharedTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerHandle, ManualTimer>,
}

/// Simulated clock. Nothing fires until [`ManualScheduler::advance`] is
/// awaited; timers due at the same instant fire in registration order.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    pub fn pending(&self) -> usize {
        self.state.lock().timers.len()
    }

    fn register(&self, delay: Duration, period: Option<Duration>, task: TimerTask) -> TimerHandle {
        let mut state = self.state.lock();
        state.next_id += 1;
        let handle = TimerHandle::new(state.next_id);
        let due = state.now + delay;
        state.timers.insert(
            handle,
            ManualTimer {
                due,
                period,
                task: Arc::new(Mutex::new(task)),
            },
        );
        handle
    }

    /// Moves the clock forward by `by`, running every timer that comes due.
    pub async fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;

        loop {
            let next = {
                let mut state = self.state.lock();
                let due = state
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(handle, timer)| (timer.due, **handle))
                    .map(|(handle, _)| *handle);

                match due {
                    Some(handle) => {
                        let (due, task, reschedule) = {
                            let timer = &state.timers[&handle];
                            (timer.due, timer.task.clone(), timer.period)
                        };
                        state.now = due;
                        match reschedule {
                            Some(period) => {
                                if let Some(timer) = state.timers.get_mut(&handle) {
                                    timer.due = due + period;
                                }
                            }
                            None => {
                                state.timers.remove(&handle);
                            }
                        }
                        Some(task)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            let Some(task) = next else { break };
            let fut = {
                let mut task = task.lock();
                (*task)()
            };
            fut.await;
        }
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        self.register(delay, None, task)
    }

    fn every(&self, interval: Duration, task: TimerTask) -> TimerHandle {
        self.register(interval, Some(interval), task)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.state.lock().timers.remove(&handle);
    }
}
