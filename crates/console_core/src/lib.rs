pub mod bootstrap;
pub mod registry;
pub mod screen;
pub mod session;
pub mod store;
pub mod subscriptions;
pub mod viewport;
pub mod workflow;

pub use bootstrap::{BootstrapReady, BootstrapSequencer};
pub use registry::{AppointmentRegistry, Page, ReloadOutcome};
pub use screen::{AppointmentsScreen, ScreenDependencies};
pub use session::{SessionGate, SessionIdentity, StaticSessionGate};
pub use store::{AppointmentStore, HttpAppointmentStore, StorePaths};
pub use subscriptions::{SubscriptionHandle, SubscriptionId, SubscriptionRegistry};
pub use viewport::{ViewportClass, ViewportClassifier, WatchViewport};
pub use workflow::{
    DecisionRequest, DecisionResponse, DecisionSurface, StatusTransitionWorkflow, SurfaceSizing,
    SurfaceWidth, TransitionAction, TransitionCommand, TransitionOutcome, WorkflowState,
};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
