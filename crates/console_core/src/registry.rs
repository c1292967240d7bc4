use std::sync::Arc;

use shared::{
    domain::{Appointment, AppointmentId},
    error::RemoteFailure,
    protocol::RemoteOutcome,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::store::AppointmentStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    Replaced(usize),
    Failed(RemoteFailure),
    /// The registry was disposed before the result arrived.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Appointment>,
    pub index: usize,
    pub size: usize,
    pub total: usize,
}

impl Page {
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.size.max(1))
    }
}

#[derive(Default)]
struct RegistryState {
    appointments: Vec<Appointment>,
    filter: Option<String>,
    disposed: bool,
}

impl RegistryState {
    fn visible(&self) -> impl Iterator<Item = &Appointment> {
        let filter = self.filter.as_deref();
        self.appointments
            .iter()
            .filter(move |appointment| match filter {
                Some(needle) => appointment.search_text().contains(needle),
                None => true,
            })
    }
}

/// Holds the last complete appointment list returned by the store.
pub struct AppointmentRegistry {
    store: Arc<dyn AppointmentStore>,
    inner: RwLock<RegistryState>,
}

impl AppointmentRegistry {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            store,
            inner: RwLock::new(RegistryState::default()),
        }
    }

    /// Fetches the list and replaces the held collection wholesale. Failures
    /// keep the previous collection. Overlapping reloads: last write wins.
    pub async fn reload(&self) -> ReloadOutcome {
        if self.inner.read().await.disposed {
            return ReloadOutcome::Discarded;
        }

        let outcome = self.store.fetch_pending().await;

        let mut inner = self.inner.write().await;
        if inner.disposed {
            debug!("registry disposed while loading; discarding appointment list");
            return ReloadOutcome::Discarded;
        }

        match outcome {
            RemoteOutcome::Success(appointments) => {
                let count = appointments.len();
                inner.appointments = appointments;
                info!(count, "appointment list replaced");
                ReloadOutcome::Replaced(count)
            }
            RemoteOutcome::Failure(failure) => {
                warn!(
                    status = %failure.status,
                    message = %failure.message,
                    "failed to load appointments; keeping previous list"
                );
                ReloadOutcome::Failed(failure)
            }
        }
    }

    pub async fn find_by_id(&self, appointment_id: AppointmentId) -> Option<Appointment> {
        self.inner
            .read()
            .await
            .appointments
            .iter()
            .find(|appointment| appointment.appointment_id == appointment_id)
            .cloned()
    }

    pub async fn contains(&self, appointment_id: AppointmentId) -> bool {
        self.inner
            .read()
            .await
            .appointments
            .iter()
            .any(|appointment| appointment.appointment_id == appointment_id)
    }

    pub async fn snapshot(&self) -> Vec<Appointment> {
        self.inner.read().await.appointments.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.appointments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Narrows the materialized view; blank text clears the filter. Returns
    /// the number of visible appointments.
    pub async fn apply_text_filter(&self, text: &str) -> usize {
        let trimmed = text.trim();
        let mut inner = self.inner.write().await;
        inner.filter = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        };
        inner.visible().count()
    }

    pub async fn filter(&self) -> Option<String> {
        self.inner.read().await.filter.clone()
    }

    pub async fn view(&self) -> Vec<Appointment> {
        self.inner.read().await.visible().cloned().collect()
    }

    /// Zero-based page over the filtered view. A zero size is treated as one.
    pub async fn page(&self, index: usize, size: usize) -> Page {
        let size = size.max(1);
        let inner = self.inner.read().await;
        let total = inner.visible().count();
        let items = inner
            .visible()
            .skip(index.saturating_mul(size))
            .take(size)
            .cloned()
            .collect();
        Page {
            items,
            index,
            size,
            total,
        }
    }

    /// Later reload results are dropped instead of applied.
    pub async fn dispose(&self) {
        self.inner.write().await.disposed = true;
    }

    pub async fn is_disposed(&self) -> bool {
        self.inner.read().await.disposed
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
