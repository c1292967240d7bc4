use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::StreamExt;
use shared::{
    domain::{
        Appointment, AppointmentId, AppointmentStatus, DoctorId, DoctorRef, PatientId, PatientRef,
        UserId,
    },
    error::RemoteFailure,
    protocol::RemoteOutcome,
};
use tokio::sync::{mpsc, watch, Mutex};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    registry::AppointmentRegistry,
    session::{IdentityStream, SessionGate, SessionIdentity, StaticSessionGate},
    store::AppointmentStore,
    viewport::{ViewportClass, ViewportClassifier, ViewportStream},
    workflow::{DecisionRequest, DecisionResponse, DecisionSurface, SurfaceSizing, WorkflowState},
};

pub fn appointment(id: i64, doctor: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
        appointment_id: AppointmentId(id),
        date: NaiveDate::from_ymd_opt(2024, 5, 1 + (id as u32 % 28)).expect("date"),
        time: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
        kind: "General".to_string(),
        patient: PatientRef {
            patient_id: PatientId(100 + id),
            display_name: format!("Patient {id}"),
        },
        doctor: DoctorRef {
            doctor_id: DoctorId(200 + id),
            display_name: doctor.to_string(),
        },
        status,
    }
}

pub fn pending(id: i64) -> Appointment {
    appointment(id, "Dr. Vega", AppointmentStatus::Pending)
}

pub fn operator() -> SessionIdentity {
    SessionIdentity {
        user_id: UserId(1),
        display_name: "admin".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    FetchPending,
    Approve(AppointmentId),
    Annul(AppointmentId),
}

/// Store double that replays queued fetch results and records every call.
pub struct ScriptedStore {
    fetches: Mutex<VecDeque<RemoteOutcome<Vec<Appointment>>>>,
    mutation: Mutex<RemoteOutcome<()>>,
    pub calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            fetches: Mutex::new(VecDeque::new()),
            mutation: Mutex::new(RemoteOutcome::Success(())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_fetch(self, result: RemoteOutcome<Vec<Appointment>>) -> Self {
        self.fetches
            .try_lock()
            .expect("unshared store")
            .push_back(result);
        self
    }

    pub fn with_list(self, appointments: Vec<Appointment>) -> Self {
        self.with_fetch(RemoteOutcome::Success(appointments))
    }

    pub fn with_mutation(self, result: RemoteOutcome<()>) -> Self {
        *self.mutation.try_lock().expect("unshared store") = result;
        self
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub async fn mutation_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| *call != StoreCall::FetchPending)
            .collect()
    }

    pub async fn fetch_count(&self) -> usize {
        self.calls()
            .await
            .iter()
            .filter(|call| **call == StoreCall::FetchPending)
            .count()
    }
}

#[async_trait]
impl AppointmentStore for ScriptedStore {
    async fn fetch_pending(&self) -> RemoteOutcome<Vec<Appointment>> {
        self.calls.lock().await.push(StoreCall::FetchPending);
        self.fetches.lock().await.pop_front().unwrap_or_else(|| {
            RemoteOutcome::Failure(RemoteFailure::new("error", "no scripted fetch left"))
        })
    }

    async fn approve(&self, appointment_id: AppointmentId) -> RemoteOutcome<()> {
        self.calls.lock().await.push(StoreCall::Approve(appointment_id));
        self.mutation.lock().await.clone()
    }

    async fn annul(&self, appointment_id: AppointmentId) -> RemoteOutcome<()> {
        self.calls.lock().await.push(StoreCall::Annul(appointment_id));
        self.mutation.lock().await.clone()
    }
}

/// Decision surface that answers with a fixed response.
pub struct ScriptedSurface {
    response: Option<DecisionResponse>,
    pub requests: Mutex<Vec<DecisionRequest>>,
    pub shown: Mutex<Vec<(AppointmentId, SurfaceSizing)>>,
}

impl ScriptedSurface {
    pub fn answering(action: &str) -> Self {
        Self::with_response(Some(DecisionResponse::new(action)))
    }

    pub fn dismissing() -> Self {
        Self::with_response(None)
    }

    fn with_response(response: Option<DecisionResponse>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
            shown: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DecisionSurface for ScriptedSurface {
    async fn request_decision(&self, request: DecisionRequest) -> Option<DecisionResponse> {
        self.requests.lock().await.push(request);
        self.response.clone()
    }

    async fn show_details(&self, appointment: Appointment, sizing: SurfaceSizing) {
        self.shown
            .lock()
            .await
            .push((appointment.appointment_id, sizing));
    }
}

/// Surface that reloads the registry while "open", simulating a refresh
/// racing the operator's decision.
pub struct ReloadingSurface {
    pub registry: Arc<AppointmentRegistry>,
    pub action: String,
}

#[async_trait]
impl DecisionSurface for ReloadingSurface {
    async fn request_decision(&self, _request: DecisionRequest) -> Option<DecisionResponse> {
        self.registry.reload().await;
        Some(DecisionResponse::new(self.action.clone()))
    }
}

/// Records the workflow state as seen from inside collaborator calls.
#[derive(Default)]
pub struct StateWitness {
    state: std::sync::Mutex<Option<watch::Receiver<WorkflowState>>>,
    seen: std::sync::Mutex<Vec<WorkflowState>>,
}

impl StateWitness {
    pub fn attach(&self, state: watch::Receiver<WorkflowState>) {
        *self.state.lock().expect("witness lock") = Some(state);
    }

    fn record(&self) {
        if let Some(state) = self.state.lock().expect("witness lock").as_ref() {
            let current = state.borrow().clone();
            self.seen.lock().expect("witness lock").push(current);
        }
    }

    pub fn seen(&self) -> Vec<WorkflowState> {
        self.seen.lock().expect("witness lock").clone()
    }
}

pub struct WitnessSurface {
    pub inner: ScriptedSurface,
    pub witness: Arc<StateWitness>,
}

#[async_trait]
impl DecisionSurface for WitnessSurface {
    async fn request_decision(&self, request: DecisionRequest) -> Option<DecisionResponse> {
        self.witness.record();
        self.inner.request_decision(request).await
    }
}

pub struct WitnessStore {
    pub inner: ScriptedStore,
    pub witness: Arc<StateWitness>,
}

#[async_trait]
impl AppointmentStore for WitnessStore {
    async fn fetch_pending(&self) -> RemoteOutcome<Vec<Appointment>> {
        self.inner.fetch_pending().await
    }

    async fn approve(&self, appointment_id: AppointmentId) -> RemoteOutcome<()> {
        self.witness.record();
        self.inner.approve(appointment_id).await
    }

    async fn annul(&self, appointment_id: AppointmentId) -> RemoteOutcome<()> {
        self.witness.record();
        self.inner.annul(appointment_id).await
    }
}

/// Classifier whose emissions are pushed by the test.
pub struct ChannelViewport {
    rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<ViewportClass>>>,
}

impl ChannelViewport {
    pub fn new() -> (Self, mpsc::UnboundedSender<ViewportClass>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx: std::sync::Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl ViewportClassifier for ChannelViewport {
    fn class_stream(&self) -> ViewportStream {
        let rx = self
            .rx
            .lock()
            .expect("viewport lock")
            .take()
            .expect("class stream taken once");
        UnboundedReceiverStream::new(rx).boxed()
    }
}

/// Session gate that counts how often it was asked for a session.
pub struct CountingSessionGate {
    pub inner: StaticSessionGate,
    pub checks: AtomicUsize,
}

impl CountingSessionGate {
    pub fn new(inner: StaticSessionGate) -> Self {
        Self {
            inner,
            checks: AtomicUsize::new(0),
        }
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionGate for CountingSessionGate {
    async fn has_session(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.inner.has_session().await
    }

    fn identity_stream(&self) -> IdentityStream {
        self.inner.identity_stream()
    }
}
