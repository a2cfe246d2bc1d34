//! Explicit, cancellable reconnect timer.
//!
//! Reconnect delays hidden inside closures are the classic way to leak a
//! timer that fires after teardown.  [`ReconnectTimer`] makes the pending
//! delay a first-class object owned by the connection:
//!
//! - [`schedule`](ReconnectTimer::schedule) aborts any previously pending
//!   delay before arming a new one, so at most one timer is ever
//!   outstanding no matter how many disconnect events race in.
//! - [`cancel`](ReconnectTimer::cancel) is an ordinary operation used by
//!   teardown; a cancelled timer never fires.
//! - [`fired`](ReconnectTimer::fired) is awaited by the connection loop to
//!   sleep until the armed delay elapses.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

/// A reconnect delay with explicit ownership and cancellation.
#[derive(Debug, Default)]
pub struct ReconnectTimer {
    /// The currently armed delay task, if any.
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Signalled when the armed delay elapses.
    fired: Arc<Notify>,
}

impl ReconnectTimer {
    /// Creates a timer with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to fire after `delay`.
    ///
    /// Any previously pending delay is aborted first — scheduling is
    /// idempotent under duplicate disconnect events: however many times it
    /// is called, exactly one timer is outstanding afterwards.
    pub async fn schedule(&self, delay: Duration) {
        let mut pending = self.pending.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let fired = Arc::clone(&self.fired);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // `notify_one` stores a permit if nobody is awaiting yet, so a
            // fire that races ahead of `fired()` is not lost.
            fired.notify_one();
        }));
    }

    /// Cancels the pending delay, if any.  A cancelled timer never fires.
    pub async fn cancel(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }

    /// `true` while a scheduled delay has neither fired nor been cancelled.
    pub async fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits for the armed delay to elapse.
    ///
    /// If the delay already elapsed, returns immediately (the fire is
    /// latched).  If the timer was cancelled, this never resolves — callers
    /// tear the owning task down rather than waiting it out.
    pub async fn fired(&self) {
        self.fired.notified().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
