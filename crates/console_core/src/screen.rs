use std::sync::Arc;

use tracing::info;

use crate::{
    bootstrap::{BootstrapReady, BootstrapSequencer},
    registry::{AppointmentRegistry, ReloadOutcome},
    session::SessionGate,
    store::AppointmentStore,
    viewport::ViewportClassifier,
    workflow::{DecisionSurface, StatusTransitionWorkflow},
};

pub struct ScreenDependencies {
    pub viewport: Arc<dyn ViewportClassifier>,
    pub session: Arc<dyn SessionGate>,
    pub store: Arc<dyn AppointmentStore>,
    pub surface: Arc<dyn DecisionSurface>,
}

/// Pending-appointments screen: bootstrap, initial load, operator reviews.
pub struct AppointmentsScreen {
    sequencer: BootstrapSequencer,
    registry: Arc<AppointmentRegistry>,
    workflow: StatusTransitionWorkflow,
}

impl AppointmentsScreen {
    pub fn new(deps: ScreenDependencies) -> Arc<Self> {
        let sequencer = BootstrapSequencer::new(deps.viewport, deps.session);
        let registry = Arc::new(AppointmentRegistry::new(Arc::clone(&deps.store)));
        let workflow = StatusTransitionWorkflow::new(
            Arc::clone(&registry),
            deps.store,
            deps.surface,
            sequencer.subscribe_viewport(),
        );
        Arc::new(Self {
            sequencer,
            registry,
            workflow,
        })
    }

    /// Waits for the bootstrap prerequisites, then performs the first load.
    pub async fn start(&self) -> (BootstrapReady, ReloadOutcome) {
        let ready = self.initialize().await;
        let loaded = self.load().await;
        (ready, loaded)
    }

    /// Bootstrap only; never resolves without a confirmed session.
    pub async fn initialize(&self) -> BootstrapReady {
        self.sequencer.initialize().await
    }

    pub async fn load(&self) -> ReloadOutcome {
        self.registry.reload().await
    }

    pub fn sequencer(&self) -> &BootstrapSequencer {
        &self.sequencer
    }

    pub fn registry(&self) -> &Arc<AppointmentRegistry> {
        &self.registry
    }

    pub fn workflow(&self) -> &StatusTransitionWorkflow {
        &self.workflow
    }

    pub async fn dispose(&self) {
        let cancelled = self.sequencer.dispose().await;
        self.registry.dispose().await;
        info!(cancelled, "appointments screen disposed");
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
