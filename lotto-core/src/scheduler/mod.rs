//! Timer collaborator for the draw engine.
//!
//! Tasks are async closures so they can drive the engine directly. Cancelling
//! an unknown or already-fired handle is a no-op.

pub mod manual;
pub mod runtime;

pub use manual::ManualScheduler;
pub use runtime::TokioScheduler;

use futures::future::BoxFuture;
use std::time::Duration;

pub type TimerTask = Box<dyn FnMut() -> BoxFuture<'static, ()> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`.
    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle;

    /// Run `task` every `interval`, first after one full interval.
    fn every(&self, interval: Duration, task: TimerTask) -> TimerHandle;

    fn cancel(&self, handle: TimerHandle);
}
