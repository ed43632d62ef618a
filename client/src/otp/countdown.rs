//! Cancellable OTP countdown.
//!
//! The countdown is a spawned tokio task that decrements a counter once per
//! tick and publishes it through a `watch` channel. The [`Countdown`] handle
//! owns the task: cancelling it or dropping it aborts the task, so a closed
//! challenge never leaves a timer behind.
//!
//! ```text
//!   start(60)           tick            tick                 tick
//!   ────●──────────────●───────────────●─────── ... ─────────●
//!      60             59              58                     0  resend_eligible
//!                                                               task exits
//! ```

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

use crate::config::CountdownConfig;

/// Snapshot of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    /// Ticks left before a new code may be requested.
    pub remaining_seconds: u32,
    /// Becomes `true` exactly when `remaining_seconds` reaches zero.
    pub resend_eligible: bool,
}

impl CountdownState {
    fn at(remaining_seconds: u32) -> Self {
        Self {
            remaining_seconds,
            resend_eligible: remaining_seconds == 0,
        }
    }
}

/// Handle to a running countdown task.
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct Countdown {
    state: watch::Receiver<CountdownState>,
    task: JoinHandle<()>,
    cancelled: bool,
}

impl Countdown {
    /// Spawns the countdown. The first decrement happens one full tick after
    /// this call, not immediately.
    pub fn start(config: CountdownConfig) -> Self {
        let (tx, rx) = watch::channel(CountdownState::at(config.start));
        let task = tokio::spawn(run(tx, config));
        Self {
            state: rx,
            task,
            cancelled: false,
        }
    }

    /// Current value.
    pub fn state(&self) -> CountdownState {
        *self.state.borrow()
    }

    /// A receiver that is notified on every tick. It reports the sender as
    /// closed once the countdown finishes or is cancelled.
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.state.clone()
    }

    /// Whether the task may still tick.
    pub fn is_running(&self) -> bool {
        !self.cancelled && !self.task.is_finished()
    }

    /// Stops the countdown. The value is frozen where it was. Idempotent.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            self.task.abort();
            trace!(remaining = self.state().remaining_seconds, "countdown cancelled");
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(tx: watch::Sender<CountdownState>, config: CountdownConfig) {
    let mut remaining = config.start;
    if remaining == 0 {
        return;
    }

    let mut interval = time::interval_at(Instant::now() + config.tick, config.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        interval.tick().await;
        remaining -= 1;
        trace!(remaining, "countdown tick");

        if tx.send(CountdownState::at(remaining)).is_err() {
            // Every receiver is gone; nobody is watching.
            return;
        }
        if remaining == 0 {
            return;
        }
    }
}
