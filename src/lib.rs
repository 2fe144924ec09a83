pub mod db;
pub mod error;
pub mod settings;
pub mod sync;
pub mod timer;
mod utils;
pub mod web;

use std::io::Write;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use db::Database;
use settings::ServerSettings;
use sync::{ControlPoller, DisplayTicker, PollState};
use timer::{TimeFormatter, TimerController};
use web::AppState;

const USAGE: &str = "usage: streamtimer [serve | watch <session-id>]";

pub async fn run(args: Vec<String>) -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings = ServerSettings::load()?;
    let db = Database::new(settings.db_path.clone())
        .with_context(|| format!("Failed to open database at {}", settings.db_path.display()))?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["serve"] => serve(settings, db).await,
        ["watch", session_id] => watch(settings, db, session_id).await,
        _ => bail!(USAGE),
    }
}

async fn serve(settings: ServerSettings, db: Database) -> Result<()> {
    info!("StreamTimer starting up...");

    let state = AppState {
        controller: TimerController::new(db, TimeFormatter::local()),
        public_url: settings.public_base_url(),
    };
    let app = web::build_router(state, &settings.cors_origins);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    info!("Listening on {}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("StreamTimer stopped");
    Ok(())
}

/// Terminal display for one session: polls the store and redraws the
/// rendered timer in place until Ctrl+C.
async fn watch(settings: ServerSettings, db: Database, session_id: &str) -> Result<()> {
    let mut poller = ControlPoller::start(db, session_id.to_string(), settings.poll_interval());
    let mut ticker = DisplayTicker::start(poller.sessions(), TimeFormatter::local());
    let mut frames = ticker.frames();
    let mut state = poller.state();
    let mut stdout = std::io::stdout();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if let Some(frame) = frame {
                    let marker = if frame.expired { " (done)" } else { "" };
                    write!(stdout, "\r{}{}\x1b[K", frame.text, marker)?;
                    stdout.flush()?;
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                if let PollState::Failed { message, .. } = &*state.borrow_and_update() {
                    warn!("{message}");
                }
            }
        }
    }

    writeln!(stdout)?;
    ticker.stop().await?;
    poller.stop().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
