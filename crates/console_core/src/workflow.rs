//! Operator decisions on a single appointment: open the decision surface,
//! map the answer to one backend mutation, refresh the registry on success.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{Appointment, AppointmentId, AppointmentStatus},
    error::RemoteFailure,
    protocol::RemoteOutcome,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::{
    registry::{AppointmentRegistry, ReloadOutcome},
    store::AppointmentStore,
    viewport::ViewportClass,
};

const HANDSET_WIDTH_PERCENT: u8 = 90;
const WIDE_WIDTH_PX: u32 = 500;
const TRANSITION_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionAction {
    Approve,
    Annul,
    Unknown(String),
}

impl TransitionAction {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "approve" => Self::Approve,
            "annul" => Self::Annul,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Approve => "approve",
            Self::Annul => "annul",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Approval,
    Annulment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCommand {
    pub action: TransitionAction,
    pub appointment_id: AppointmentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceWidth {
    Percent(u8),
    Pixels(u32),
}

impl fmt::Display for SurfaceWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(value) => write!(f, "{value}%"),
            Self::Pixels(value) => write!(f, "{value}px"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSizing {
    pub width: SurfaceWidth,
}

impl SurfaceSizing {
    /// No observed viewport yet counts as a wide display.
    pub fn for_decision(viewport: Option<ViewportClass>) -> Self {
        let width = match viewport {
            Some(ViewportClass { handset: true }) => SurfaceWidth::Percent(HANDSET_WIDTH_PERCENT),
            _ => SurfaceWidth::Pixels(WIDE_WIDTH_PX),
        };
        Self { width }
    }

    pub fn for_details() -> Self {
        Self {
            width: SurfaceWidth::Percent(HANDSET_WIDTH_PERCENT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub appointment_id: AppointmentId,
    pub current_status: AppointmentStatus,
    pub sizing: SurfaceSizing,
}

impl DecisionRequest {
    pub fn current_status_code(&self) -> u8 {
        self.current_status.code()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionResponse {
    pub action: String,
}

impl DecisionResponse {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }
}

/// Modal collaborator that asks the operator what to do.
#[async_trait]
pub trait DecisionSurface: Send + Sync {
    /// `None` when the operator dismissed the surface.
    async fn request_decision(&self, request: DecisionRequest) -> Option<DecisionResponse>;

    async fn show_details(&self, _appointment: Appointment, _sizing: SurfaceSizing) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    AwaitingDecision(AppointmentId),
    Dispatching(TransitionCommand),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Dismissed,
    NotFound(AppointmentId),
    Unrecognized(String),
    Applied {
        command: TransitionCommand,
        reload: ReloadOutcome,
    },
    Rejected {
        command: TransitionCommand,
        failure: RemoteFailure,
    },
}

pub struct StatusTransitionWorkflow {
    registry: Arc<AppointmentRegistry>,
    store: Arc<dyn AppointmentStore>,
    surface: Arc<dyn DecisionSurface>,
    viewport: watch::Receiver<Option<ViewportClass>>,
    state: watch::Sender<WorkflowState>,
    transitions: broadcast::Sender<WorkflowState>,
}

impl StatusTransitionWorkflow {
    pub fn new(
        registry: Arc<AppointmentRegistry>,
        store: Arc<dyn AppointmentStore>,
        surface: Arc<dyn DecisionSurface>,
        viewport: watch::Receiver<Option<ViewportClass>>,
    ) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            registry,
            store,
            surface,
            viewport,
            state,
            transitions,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Every state entered, in order. `subscribe_state` only keeps the latest.
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<WorkflowState> {
        self.transitions.subscribe()
    }

    fn enter(&self, state: WorkflowState) {
        debug!(?state, "transition workflow state");
        let _ = self.transitions.send(state.clone());
        self.state.send_replace(state);
    }

    fn finish(&self, outcome: TransitionOutcome) -> TransitionOutcome {
        self.enter(WorkflowState::Idle);
        outcome
    }

    /// Runs one decision for `appointment_id` from `Idle` back to `Idle`.
    pub async fn review(&self, appointment_id: AppointmentId) -> TransitionOutcome {
        let Some(appointment) = self.registry.find_by_id(appointment_id).await else {
            warn!(%appointment_id, "appointment no longer held; ignoring review request");
            return self.finish(TransitionOutcome::NotFound(appointment_id));
        };

        let request = DecisionRequest {
            appointment_id,
            current_status: appointment.status,
            sizing: SurfaceSizing::for_decision(*self.viewport.borrow()),
        };
        self.enter(WorkflowState::AwaitingDecision(appointment_id));

        let Some(response) = self.surface.request_decision(request).await else {
            debug!(%appointment_id, "decision surface dismissed");
            self.enter(WorkflowState::Cancelled);
            return self.finish(TransitionOutcome::Dismissed);
        };

        let command = TransitionCommand {
            action: TransitionAction::parse(&response.action),
            appointment_id,
        };
        self.dispatch(command).await
    }

    async fn dispatch(&self, command: TransitionCommand) -> TransitionOutcome {
        let appointment_id = command.appointment_id;

        let endpoint = match &command.action {
            TransitionAction::Approve => Endpoint::Approval,
            TransitionAction::Annul => Endpoint::Annulment,
            TransitionAction::Unknown(raw) => {
                warn!(%appointment_id, action = %raw, "unrecognized transition action; nothing dispatched");
                return self.finish(TransitionOutcome::Unrecognized(raw.clone()));
            }
        };

        // A reload may have landed while the surface was open.
        if !self.registry.contains(appointment_id).await {
            warn!(%appointment_id, "appointment disappeared before dispatch; nothing dispatched");
            return self.finish(TransitionOutcome::NotFound(appointment_id));
        }

        self.enter(WorkflowState::Dispatching(command.clone()));
        let result = match endpoint {
            Endpoint::Approval => self.store.approve(appointment_id).await,
            Endpoint::Annulment => self.store.annul(appointment_id).await,
        };

        match result {
            RemoteOutcome::Success(()) => {
                info!(%appointment_id, action = %command.action, "appointment transition applied");
                let reload = self.registry.reload().await;
                self.finish(TransitionOutcome::Applied { command, reload })
            }
            RemoteOutcome::Failure(failure) => {
                error!(
                    %appointment_id,
                    action = %command.action,
                    status = %failure.status,
                    message = %failure.message,
                    "appointment transition rejected"
                );
                self.finish(TransitionOutcome::Rejected { command, failure })
            }
        }
    }

    /// Opens the read-only details surface for a held appointment.
    pub async fn show(&self, appointment_id: AppointmentId) -> Option<Appointment> {
        let Some(appointment) = self.registry.find_by_id(appointment_id).await else {
            warn!(%appointment_id, "appointment no longer held; nothing to show");
            return None;
        };
        self.surface
            .show_details(appointment.clone(), SurfaceSizing::for_details())
            .await;
        Some(appointment)
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
