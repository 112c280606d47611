//! Settling delay between AI units.
//!
//! The core resolves units synchronously; the pause between them only
//! exists so a viewer can follow along. [`Pacer::settle`] sleeps for the
//! configured delay unless fast-forwarding, and wakes early when the run
//! is cancelled.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

/// How a settling pause ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// The full delay passed.
    Elapsed,
    /// No delay configured, or fast-forwarding.
    Skipped,
    /// The run was cancelled; stop processing units.
    Cancelled,
}

/// Sending half of the cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Ask every pacer listening on this handle to stop.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Create a linked cancel handle and receiver for [`Pacer::new`].
#[must_use]
pub fn cancel_channel() -> (CancelHandle, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, rx)
}

/// Cancellable, skippable pause.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    fast_forward: bool,
    cancel: watch::Receiver<bool>,
}

impl Pacer {
    /// Pacer pausing `delay` between units.
    #[must_use]
    pub fn new(delay: Duration, fast_forward: bool, cancel: watch::Receiver<bool>) -> Self {
        Self {
            delay,
            fast_forward,
            cancel,
        }
    }

    /// Pacer that never waits and can never be cancelled.
    #[must_use]
    pub fn unpaced() -> Self {
        let (_, rx) = cancel_channel();
        Self::new(Duration::ZERO, true, rx)
    }

    /// Configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Toggle fast-forward. Takes effect on the next pause.
    pub fn set_fast_forward(&mut self, fast_forward: bool) {
        self.fast_forward = fast_forward;
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Wait out the settling delay.
    pub async fn settle(&mut self) -> Settle {
        if self.is_cancelled() {
            return Settle::Cancelled;
        }
        if self.fast_forward || self.delay.is_zero() {
            return Settle::Skipped;
        }

        let sleep = time::sleep(self.delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return Settle::Elapsed,
                changed = self.cancel.changed() => {
                    if changed.is_err() {
                        // Nobody can cancel any more.
                        (&mut sleep).await;
                        return Settle::Elapsed;
                    }
                    if *self.cancel.borrow_and_update() {
                        return Settle::Cancelled;
                    }
                }
            }
        }
    }
}
