//! Ordered start-up: first viewport classification, then a confirmed session
//! identity. Every observation started here is owned by the sequencer and
//! released by [`BootstrapSequencer::dispose`].

use std::{future::{self, Future}, sync::Arc};

use futures::StreamExt;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::{
    session::{SessionGate, SessionIdentity},
    subscriptions::{SubscriptionHandle, SubscriptionId, SubscriptionRegistry},
    viewport::{ViewportClass, ViewportClassifier},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReady {
    pub viewport: ViewportClass,
    pub identity: SessionIdentity,
}

pub struct BootstrapSequencer {
    viewport: Arc<dyn ViewportClassifier>,
    session: Arc<dyn SessionGate>,
    viewport_tx: Arc<watch::Sender<Option<ViewportClass>>>,
    identity_tx: Arc<watch::Sender<Option<SessionIdentity>>>,
    subscriptions: Mutex<SubscriptionRegistry>,
    disposed: watch::Sender<bool>,
}

impl BootstrapSequencer {
    pub fn new(viewport: Arc<dyn ViewportClassifier>, session: Arc<dyn SessionGate>) -> Self {
        let (viewport_tx, _) = watch::channel(None);
        let (identity_tx, _) = watch::channel(None);
        let (disposed, _) = watch::channel(false);
        Self {
            viewport,
            session,
            viewport_tx: Arc::new(viewport_tx),
            identity_tx: Arc::new(identity_tx),
            subscriptions: Mutex::new(SubscriptionRegistry::new()),
            disposed,
        }
    }

    /// Resolves once a viewport class and a session identity have both been
    /// observed. Without a session this never resolves, and neither does it
    /// once the sequencer has been disposed.
    pub async fn initialize(&self) -> BootstrapReady {
        let Some(viewport) = self.await_first_viewport().await else {
            return future::pending().await;
        };
        let Some(identity) = self.await_session_identity().await else {
            return future::pending().await;
        };
        if self.is_disposed() {
            return future::pending().await;
        }
        info!(
            handset = viewport.handset,
            user_id = %identity.user_id,
            "console bootstrap complete"
        );
        BootstrapReady { viewport, identity }
    }

    /// `None` when the sequencer was disposed before `work` completed; `work`
    /// is dropped at that point.
    async fn unless_disposed<T>(&self, work: impl Future<Output = T>) -> Option<T> {
        let mut disposed = self.disposed.subscribe();
        tokio::select! {
            biased;
            _ = disposed.wait_for(|disposed| *disposed) => None,
            value = work => Some(value),
        }
    }

    async fn await_first_viewport(&self) -> Option<ViewportClass> {
        if self.is_disposed() {
            return None;
        }
        let mut classes = self.viewport.class_stream();
        let Some(next) = self.unless_disposed(classes.next()).await else {
            debug!("disposed before the first viewport classification");
            return None;
        };
        let Some(first) = next else {
            warn!("viewport stream ended before the first classification; staying suspended");
            return None;
        };
        self.viewport_tx.send_replace(Some(first));

        let viewport_tx = Arc::clone(&self.viewport_tx);
        let follower = tokio::spawn(async move {
            while let Some(class) = classes.next().await {
                viewport_tx.send_replace(Some(class));
            }
        });
        self.register(SubscriptionHandle::from_task("viewport", follower))
            .await;
        Some(first)
    }

    async fn await_session_identity(&self) -> Option<SessionIdentity> {
        if !self.unless_disposed(self.session.has_session()).await? {
            info!("no confirmed session; waiting for the navigation guard");
            return None;
        }

        let mut identities = self.session.identity_stream();
        let Some(next) = self.unless_disposed(identities.next()).await else {
            debug!("disposed before a session identity was published");
            return None;
        };
        let Some(identity) = next else {
            warn!("identity stream ended before an identity was published; staying suspended");
            return None;
        };
        self.identity_tx.send_replace(Some(identity.clone()));

        let identity_tx = Arc::clone(&self.identity_tx);
        let follower = tokio::spawn(async move {
            while let Some(identity) = identities.next().await {
                identity_tx.send_replace(Some(identity));
            }
        });
        self.register(SubscriptionHandle::from_task("session_identity", follower))
            .await;
        Some(identity)
    }

    pub async fn register(&self, handle: SubscriptionHandle) -> SubscriptionId {
        self.subscriptions.lock().await.register(handle)
    }

    pub fn current_viewport(&self) -> Option<ViewportClass> {
        *self.viewport_tx.borrow()
    }

    pub fn subscribe_viewport(&self) -> watch::Receiver<Option<ViewportClass>> {
        self.viewport_tx.subscribe()
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        self.identity_tx.borrow().clone()
    }

    pub async fn live_subscriptions(&self) -> usize {
        self.subscriptions.lock().await.live_count()
    }

    pub fn is_disposed(&self) -> bool {
        *self.disposed.borrow()
    }

    /// Cancels every registered subscription and halts a pending
    /// [`initialize`](Self::initialize); repeat calls cancel nothing.
    pub async fn dispose(&self) -> usize {
        self.disposed.send_replace(true);
        let cancelled = self.subscriptions.lock().await.dispose();
        info!(cancelled, "bootstrap subscriptions released");
        cancelled
    }
}

#[cfg(test)]
#[path = "tests/bootstrap_tests.rs"]
mod tests;
