//! Transient status line with a fixed expiry.
//!
//! Holds zero or one message. Setting a new message replaces the current
//! one and cancels its pending expiry; on expiry the slot clears to empty.
//! There is no queue — only the most recent message is ever visible.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

/// How long a status message stays visible unless replaced.
pub const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Slot {
    message: Option<String>,
    /// Bumped on every `set`; an expiry task only clears the slot when its
    /// generation still matches, so a timer that fired just before being
    /// aborted cannot wipe a newer message.
    generation: u64,
    expiry: Option<AbortHandle>,
}

/// Single-slot, self-expiring status message.
///
/// Cheap to clone; clones share the same slot.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    slot: Arc<Mutex<Slot>>,
    ttl: Duration,
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusNotifier {
    /// Create a notifier with the standard [`STATUS_TTL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(STATUS_TTL)
    }

    /// Create a notifier with a custom expiry.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the current message and restart the expiry timer.
    ///
    /// Must be called from within a tokio runtime (the expiry is a spawned
    /// task).
    pub fn set(&self, message: impl Into<String>) {
        let mut slot = self.lock();
        if let Some(pending) = slot.expiry.take() {
            pending.abort();
        }
        slot.generation += 1;
        slot.message = Some(message.into());

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let ttl = self.ttl;
        let task = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.generation == generation {
                slot.message = None;
                slot.expiry = None;
            }
        });
        slot.expiry = Some(task.abort_handle());
    }

    /// The currently visible message, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.lock().message.clone()
    }
}
