use serde::{Deserialize, Serialize};

use crate::{
    domain::{Appointment, AppointmentId},
    error::{RemoteFailure, STATUS_SUCCESS},
};

/// Tagged result of every backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome<T> {
    Success(T),
    Failure(RemoteFailure),
}

/// Wire envelope: `{"status": "success", ...}` or `{"status": <other>, "message": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEnvelope {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointments: Option<Vec<Appointment>>,
}

impl StatusEnvelope {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
            appointments: None,
        }
    }

    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Some(appointments),
            ..Self::success()
        }
    }

    pub fn failure(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: Some(message.into()),
            appointments: None,
        }
    }

    fn split(self) -> Result<Option<Vec<Appointment>>, RemoteFailure> {
        if self.status == STATUS_SUCCESS {
            Ok(self.appointments)
        } else {
            Err(RemoteFailure::new(
                self.status,
                self.message.unwrap_or_default(),
            ))
        }
    }

    /// Mutation responses only carry the tag.
    pub fn into_ack(self) -> RemoteOutcome<()> {
        match self.split() {
            Ok(_) => RemoteOutcome::Success(()),
            Err(failure) => RemoteOutcome::Failure(failure),
        }
    }

    /// A success envelope without a list is malformed rather than empty.
    pub fn into_appointments(self) -> RemoteOutcome<Vec<Appointment>> {
        match self.split() {
            Ok(Some(appointments)) => RemoteOutcome::Success(appointments),
            Ok(None) => RemoteOutcome::Failure(RemoteFailure::new(
                "malformed",
                "success response without appointments",
            )),
            Err(failure) => RemoteOutcome::Failure(failure),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub appointment_id: AppointmentId,
}
