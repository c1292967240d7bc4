//! Terminal stand-in for the decision dialog.

use async_trait::async_trait;
use console_core::{DecisionRequest, DecisionResponse, DecisionSurface, SurfaceSizing};
use shared::domain::Appointment;
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout},
    sync::Mutex,
};
use tracing::{debug, warn};

use crate::table::render_details;

pub struct TerminalSurface<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
}

impl TerminalSurface<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> TerminalSurface<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }
}

/// Shorthands accepted at the prompt; anything else is passed through as-is.
fn interpret_answer(line: &str) -> Option<String> {
    let answer = line.trim();
    match answer {
        "" => None,
        "a" | "approve" => Some("approve".to_string()),
        "n" | "annul" => Some("annul".to_string()),
        other => Some(other.to_string()),
    }
}

impl<R, W> TerminalSurface<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn write_text(&self, text: &str) -> io::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.flush().await
    }

    async fn ask(&self, request: &DecisionRequest) -> io::Result<Option<String>> {
        self.write_text(&format!(
            "appointment {} is {} (code {}). [a]pprove, an[n]ul, or enter to dismiss: ",
            request.appointment_id,
            request.current_status,
            request.current_status_code()
        ))
        .await?;

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(interpret_answer(&line))
    }
}

#[async_trait]
impl<R, W> DecisionSurface for TerminalSurface<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn request_decision(&self, request: DecisionRequest) -> Option<DecisionResponse> {
        debug!(width = %request.sizing.width, "opening decision prompt");
        match self.ask(&request).await {
            Ok(answer) => answer.map(DecisionResponse::new),
            Err(err) => {
                warn!("decision prompt failed; treating as dismissed: {err}");
                None
            }
        }
    }

    async fn show_details(&self, appointment: Appointment, sizing: SurfaceSizing) {
        debug!(width = %sizing.width, "opening details view");
        if let Err(err) = self.write_text(&render_details(&appointment)).await {
            warn!("failed to print appointment details: {err}");
        }
    }
}
