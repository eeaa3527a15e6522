//! Double-click confirmation for destructive order actions.
//!
//! Each order id moves through `Idle -> PendingConfirmation -> Committed`.
//! The first request arms a timer; a second request before the window runs
//! out commits and cancels the timer; if the timer fires first the id drops
//! back to idle and nothing is sent to the backend.
//!
//! Every pending entry carries a generation number, so a timer that lost the
//! race against a confirmation can never remove a newer entry for the same
//! order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::model::{OrderAction, OrderId};

/// How long a first request waits for its confirming second request.
pub const CONFIRMATION_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    Idle,
    PendingConfirmation,
    /// Returned by [`ConfirmationTracker::request`] when the request confirmed
    /// a pending one. The id is already back out of the pending set.
    Committed,
}

struct PendingEntry {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct TrackerInner {
    next_generation: u64,
    pending: HashMap<OrderId, PendingEntry>,
}

/// Pending set for one action kind (cancel or complete).
#[derive(Clone)]
pub struct ConfirmationTracker {
    action: OrderAction,
    window: Duration,
    inner: Arc<Mutex<TrackerInner>>,
}

impl ConfirmationTracker {
    pub fn new(action: OrderAction) -> Self {
        Self::with_window(action, CONFIRMATION_WINDOW)
    }

    pub fn with_window(action: OrderAction, window: Duration) -> Self {
        Self {
            action,
            window,
            inner: Arc::new(Mutex::new(TrackerInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        lock_inner(&self.inner)
    }

    /// Register one user request for `order_id`.
    ///
    /// Returns `PendingConfirmation` when this armed a new entry and
    /// `Committed` when it confirmed an existing one. Must be called from
    /// within a tokio runtime since arming spawns the expiry timer.
    pub fn request(&self, order_id: OrderId) -> ConfirmState {
        let mut inner = self.lock();
        if let Some(entry) = inner.pending.remove(&order_id) {
            entry.cancel.cancel();
            debug!(order_id, action = self.action.as_str(), "confirmation received");
            return ConfirmState::Committed;
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        let cancel = CancellationToken::new();
        inner.pending.insert(
            order_id,
            PendingEntry {
                generation,
                cancel: cancel.clone(),
            },
        );
        drop(inner);

        // The window starts now, not when the timer task is first polled.
        let deadline = tokio::time::Instant::now() + self.window;
        let shared = Arc::clone(&self.inner);
        let action = self.action;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    let mut inner = lock_inner(&shared);
                    let still_ours = inner
                        .pending
                        .get(&order_id)
                        .is_some_and(|entry| entry.generation == generation);
                    if still_ours {
                        inner.pending.remove(&order_id);
                        debug!(order_id, action = action.as_str(), "confirmation window expired");
                    }
                }
            }
        });

        debug!(
            order_id,
            action = self.action.as_str(),
            window_ms = self.window.as_millis() as u64,
            "awaiting confirmation"
        );
        ConfirmState::PendingConfirmation
    }

    pub fn state(&self, order_id: OrderId) -> ConfirmState {
        if self.lock().pending.contains_key(&order_id) {
            ConfirmState::PendingConfirmation
        } else {
            ConfirmState::Idle
        }
    }

    pub fn is_pending(&self, order_id: OrderId) -> bool {
        self.state(order_id) == ConfirmState::PendingConfirmation
    }

    /// Snapshot of the pending ids, ascending.
    pub fn pending_ids(&self) -> Vec<OrderId> {
        let mut ids: Vec<OrderId> = self.lock().pending.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drop every pending entry and stop its timer.
    pub fn clear(&self) {
        let mut inner = self.lock();
        for (_, entry) in inner.pending.drain() {
            entry.cancel.cancel();
        }
    }
}

fn lock_inner(inner: &Mutex<TrackerInner>) -> MutexGuard<'_, TrackerInner> {
    // A panicking holder cannot leave the map half-updated.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
