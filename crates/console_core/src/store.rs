use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use shared::{
    domain::{Appointment, AppointmentId},
    error::RemoteFailure,
    protocol::{RemoteOutcome, StatusEnvelope, TransitionRequest},
};
use tracing::debug;
use url::Url;

const NO_FIELDS: &[(&str, &str)] = &[];

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn fetch_pending(&self) -> RemoteOutcome<Vec<Appointment>>;
    async fn approve(&self, appointment_id: AppointmentId) -> RemoteOutcome<()>;
    async fn annul(&self, appointment_id: AppointmentId) -> RemoteOutcome<()>;
}

/// Endpoint paths, relative to the api base url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub pending: String,
    pub approve: String,
    pub annul: String,
}

impl Default for StorePaths {
    fn default() -> Self {
        Self {
            pending: "admins/appointments/pending".into(),
            approve: "admins/appointments/approve".into(),
            annul: "admins/appointments/annul".into(),
        }
    }
}

pub struct HttpAppointmentStore {
    http: Client,
    base_url: Url,
    paths: StorePaths,
    bearer_token: Option<String>,
}

impl HttpAppointmentStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid api url '{base_url}'"))?;
        Ok(Self {
            http: Client::new(),
            base_url,
            paths: StorePaths::default(),
            bearer_token: None,
        })
    }

    pub fn with_paths(mut self, paths: StorePaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, RemoteFailure> {
        self.base_url.join(path).map_err(|err| {
            RemoteFailure::transport(format!("invalid endpoint path '{path}': {err}"))
        })
    }

    async fn post_envelope<F>(
        &self,
        path: &str,
        form: &F,
    ) -> std::result::Result<StatusEnvelope, RemoteFailure>
    where
        F: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "posting appointment request");

        let mut request = self.http.post(url).form(form);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| RemoteFailure::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| RemoteFailure::transport(err.to_string()))?;

        match serde_json::from_slice::<StatusEnvelope>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                let message = if text.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    text
                };
                Err(RemoteFailure::http(status.as_u16(), message))
            }
            Err(err) => Err(RemoteFailure::transport(format!(
                "undecodable response body: {err}"
            ))),
        }
    }

    async fn post_transition(&self, path: &str, appointment_id: AppointmentId) -> RemoteOutcome<()> {
        let form = TransitionRequest { appointment_id };
        match self.post_envelope(path, &form).await {
            Ok(envelope) => envelope.into_ack(),
            Err(failure) => RemoteOutcome::Failure(failure),
        }
    }
}

#[async_trait]
impl AppointmentStore for HttpAppointmentStore {
    async fn fetch_pending(&self) -> RemoteOutcome<Vec<Appointment>> {
        match self.post_envelope(&self.paths.pending, NO_FIELDS).await {
            Ok(envelope) => envelope.into_appointments(),
            Err(failure) => RemoteOutcome::Failure(failure),
        }
    }

    async fn approve(&self, appointment_id: AppointmentId) -> RemoteOutcome<()> {
        self.post_transition(&self.paths.approve, appointment_id).await
    }

    async fn annul(&self, appointment_id: AppointmentId) -> RemoteOutcome<()> {
        self.post_transition(&self.paths.annul, appointment_id).await
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
