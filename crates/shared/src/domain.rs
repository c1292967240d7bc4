use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(AppointmentId);
id_newtype!(PatientId);
id_newtype!(DoctorId);
id_newtype!(UserId);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown appointment status code {0}")]
pub struct UnknownStatusCode(pub u8);

/// Lifecycle of an appointment. The numeric code is what the backend stores
/// and what the decision surface is seeded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Annulled,
}

impl AppointmentStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Pending => 1,
            Self::Approved => 2,
            Self::Annulled => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Annulled => "annulled",
        }
    }
}

impl TryFrom<u8> for AppointmentStatus {
    type Error = UnknownStatusCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Approved),
            3 => Ok(Self::Annulled),
            other => Err(UnknownStatusCode(other)),
        }
    }
}

impl From<AppointmentStatus> for u8 {
    fn from(value: AppointmentStatus) -> Self {
        value.code()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef {
    pub patient_id: PatientId,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRef {
    pub doctor_id: DoctorId,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: AppointmentId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: String,
    pub patient: PatientRef,
    pub doctor: DoctorRef,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Columns as the table renders them, in display order.
    pub fn display_columns(&self) -> [String; 6] {
        [
            self.date.format("%Y-%m-%d").to_string(),
            self.time.format("%H:%M").to_string(),
            self.kind.clone(),
            self.patient.display_name.clone(),
            self.doctor.display_name.clone(),
            self.status.label().to_string(),
        ]
    }

    /// Lowercased projection used for free-text filtering.
    pub fn search_text(&self) -> String {
        self.display_columns().join(" ").to_lowercase()
    }
}
