use crate::scheduler::TimerHandle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawState {
    #[default]
    Idle,
    Open,
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStatus {
    pub state: DrawState,
    pub remaining_seconds: u64,
}

/// The single betting window. `generation` increases on every open so that
/// callbacks scheduled for an earlier window can recognise themselves as stale.
#[derive(Debug, Default)]
pub(crate) struct DrawWindow {
    pub(crate) state: DrawState,
    pub(crate) generation: u64,
    remaining: Duration,
    tick: Option<TimerHandle>,
    expiry: Option<TimerHandle>,
}

impl DrawWindow {
    pub(crate) fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    pub(crate) fn open(
        &mut self,
        generation: u64,
        duration: Duration,
        tick: TimerHandle,
        expiry: TimerHandle,
    ) {
        self.state = DrawState::Open;
        self.generation = generation;
        self.remaining = duration;
        self.tick = Some(tick);
        self.expiry = Some(expiry);
    }

    pub(crate) fn accepts(&self, generation: u64) -> bool {
        self.state == DrawState::Open && self.generation == generation
    }

    /// Counts the clock down; never goes below zero.
    pub(crate) fn tick(&mut self, interval: Duration) -> u64 {
        self.remaining = self.remaining.saturating_sub(interval);
        self.remaining_seconds()
    }

    /// Back to idle. Returns the timers the caller must cancel.
    pub(crate) fn close(&mut self) -> Vec<TimerHandle> {
        self.state = DrawState::Idle;
        self.remaining = Duration::ZERO;
        self.tick.take().into_iter().chain(self.expiry.take()).collect()
    }

    pub(crate) fn remaining_seconds(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub(crate) fn status(&self) -> WindowStatus {
        WindowStatus {
            state: self.state,
            remaining_seconds: self.remaining_seconds(),
        }
    }
}
