use async_trait::async_trait;
use futures::{future, stream::BoxStream, StreamExt};
use shared::domain::UserId;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Who is operating the console. Opaque to the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: UserId,
    pub display_name: String,
}

pub type IdentityStream = BoxStream<'static, SessionIdentity>;

#[async_trait]
pub trait SessionGate: Send + Sync {
    async fn has_session(&self) -> bool;
    /// Emits the identity once known, then any later change.
    fn identity_stream(&self) -> IdentityStream;
}

/// Session gate whose verification already happened elsewhere (a token
/// handed to the process, a login screen). Identity may arrive later via
/// [`StaticSessionGate::publish`].
pub struct StaticSessionGate {
    active: bool,
    identity: watch::Sender<Option<SessionIdentity>>,
}

impl StaticSessionGate {
    pub fn confirmed(identity: SessionIdentity) -> Self {
        let (identity, _) = watch::channel(Some(identity));
        Self {
            active: true,
            identity,
        }
    }

    /// Session exists but the identity has not been resolved yet.
    pub fn pending() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            active: true,
            identity,
        }
    }

    pub fn anonymous() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            active: false,
            identity,
        }
    }

    pub fn publish(&self, identity: SessionIdentity) {
        self.identity.send_replace(Some(identity));
    }
}

#[async_trait]
impl SessionGate for StaticSessionGate {
    async fn has_session(&self) -> bool {
        self.active
    }

    fn identity_stream(&self) -> IdentityStream {
        WatchStream::new(self.identity.subscribe())
            .filter_map(future::ready)
            .boxed()
    }
}
