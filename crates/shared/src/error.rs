use thiserror::Error;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_TRANSPORT: &str = "transport";

/// Non-success answer from the appointment backend, or a transport fault
/// folded into the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct RemoteFailure {
    pub status: String,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(STATUS_TRANSPORT, message)
    }

    pub fn http(code: u16, message: impl Into<String>) -> Self {
        Self::new(format!("http_{code}"), message)
    }

    pub fn is_transport(&self) -> bool {
        self.status == STATUS_TRANSPORT || self.status.starts_with("http_")
    }
}
