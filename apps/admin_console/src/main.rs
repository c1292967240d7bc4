use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use console_core::{
    AppointmentsScreen, BootstrapReady, HttpAppointmentStore, ReloadOutcome, ScreenDependencies,
    SessionIdentity, StaticSessionGate, TransitionOutcome, WatchViewport,
};
use shared::domain::{AppointmentId, UserId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod prompt;
mod table;

use config::{load_settings, Settings};
use prompt::TerminalSurface;
use table::render_page;

#[derive(Parser, Debug)]
#[command(about = "Review pending appointments")]
struct Args {
    /// Config file; defaults to ./console.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Display width in pixels used to pick dialog sizing.
    #[arg(long)]
    width: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print pending appointments.
    List {
        #[arg(long)]
        filter: Option<String>,
        /// One-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Approve or annul one appointment through a prompt.
    Review { id: i64 },
    /// Print one appointment.
    Show { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let screen = build_screen(&settings, args.width)?;

    let (ready, loaded) = open_screen(&screen, settings.bootstrap_timeout_secs).await?;
    info!(
        operator = %ready.identity.display_name,
        handset = ready.viewport.handset,
        "console ready"
    );
    if let ReloadOutcome::Failed(failure) = &loaded {
        println!("Appointment list unavailable ({failure}); showing last known data.");
    }

    let result = run_command(&screen, &settings, args.command).await;
    screen.dispose().await;
    result
}

/// Bounds only the bootstrap; the first load runs outside the guard so a slow
/// backend degrades to stale data instead of a session error.
async fn open_screen(
    screen: &AppointmentsScreen,
    timeout_secs: u64,
) -> Result<(BootstrapReady, ReloadOutcome)> {
    let timeout = Duration::from_secs(timeout_secs);
    let Ok(ready) = tokio::time::timeout(timeout, screen.initialize()).await else {
        screen.dispose().await;
        bail!(
            "no confirmed session after {timeout_secs}s; set session_token in the config file or APP__SESSION_TOKEN"
        );
    };
    let loaded = screen.load().await;
    Ok((ready, loaded))
}

fn build_screen(settings: &Settings, width: Option<u32>) -> Result<Arc<AppointmentsScreen>> {
    let store = HttpAppointmentStore::new(&settings.api_url)?
        .with_bearer_token(settings.session_token.clone());

    let session = match settings.session_token {
        Some(_) => StaticSessionGate::confirmed(SessionIdentity {
            user_id: UserId(settings.operator_id),
            display_name: settings.operator_name.clone(),
        }),
        None => StaticSessionGate::anonymous(),
    };

    Ok(AppointmentsScreen::new(ScreenDependencies {
        viewport: Arc::new(WatchViewport::from_width(
            width.unwrap_or(settings.viewport_width),
        )),
        session: Arc::new(session),
        store: Arc::new(store),
        surface: Arc::new(TerminalSurface::stdio()),
    }))
}

async fn run_command(screen: &AppointmentsScreen, settings: &Settings, command: Command) -> Result<()> {
    let registry = screen.registry();
    match command {
        Command::List {
            filter,
            page,
            page_size,
        } => {
            if let Some(text) = &filter {
                registry.apply_text_filter(text).await;
            }
            let size = page_size.unwrap_or(settings.page_size);
            let page = registry.page(page.saturating_sub(1), size).await;
            print!("{}", render_page(&page, registry.filter().await.as_deref()));
        }
        Command::Review { id } => {
            let outcome = screen.workflow().review(AppointmentId(id)).await;
            match &outcome {
                TransitionOutcome::Applied { command, .. } => {
                    println!("Appointment {id}: {} applied.", command.action);
                }
                TransitionOutcome::Rejected { failure, .. } => {
                    println!("Appointment {id} unchanged: {failure}");
                }
                TransitionOutcome::Dismissed => println!("Dismissed; nothing changed."),
                TransitionOutcome::NotFound(_) => {
                    println!("Appointment {id} is not in the pending list.");
                }
                TransitionOutcome::Unrecognized(action) => {
                    println!("Unknown action \"{action}\"; nothing changed.");
                }
            }
            let page = registry.page(0, settings.page_size).await;
            print!("{}", render_page(&page, None));
        }
        Command::Show { id } => {
            if screen.workflow().show(AppointmentId(id)).await.is_none() {
                println!("Appointment {id} is not in the pending list.");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
