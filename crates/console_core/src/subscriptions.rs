//! Owned arena of cancellation tokens for long-lived observations.
//!
//! Handles are indexed by creation order. Teardown drains the arena once; a
//! handle registered after teardown is cancelled on the spot.

use std::fmt;

use tokio::task::JoinHandle;
use tracing::debug;

type CancelFn = Box<dyn FnOnce() + Send>;

pub struct SubscriptionHandle {
    label: &'static str,
    cancel: Option<CancelFn>,
}

impl SubscriptionHandle {
    pub fn from_task(label: &'static str, task: JoinHandle<()>) -> Self {
        Self::from_fn(label, move || task.abort())
    }

    pub fn from_fn(label: &'static str, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("label", &self.label)
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub usize);

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    slots: Vec<Option<SubscriptionHandle>>,
    disposed: bool,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: SubscriptionHandle) -> SubscriptionId {
        let id = SubscriptionId(self.slots.len());
        if self.disposed {
            debug!(
                subscription = handle.label(),
                id = id.0,
                "registry already disposed; cancelling subscription immediately"
            );
            handle.cancel();
            self.slots.push(None);
        } else {
            self.slots.push(Some(handle));
        }
        id
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Total number of handles ever registered.
    pub fn registered_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Cancels every live handle and returns how many were cancelled.
    pub fn dispose(&mut self) -> usize {
        self.disposed = true;
        let mut cancelled = 0;
        for slot in &mut self.slots {
            if let Some(handle) = slot.take() {
                debug!(subscription = handle.label(), "cancelling subscription");
                handle.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "tests/subscriptions_tests.rs"]
mod tests;
