//! Control-side polling session.
//!
//! The control surface re-fetches its session on a fixed interval and treats
//! whatever the store returns as authoritative. Fetch failures are reported
//! through [`PollState::Failed`] but never stop the loop.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::db::{Database, TimerSession};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a poller reads sessions from.
pub trait SessionSource: Send + Sync + 'static {
    fn fetch(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Option<TimerSession>>> + Send;
}

impl SessionSource for Database {
    async fn fetch(&self, session_id: &str) -> Result<Option<TimerSession>> {
        self.get_timer_session(session_id).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Loading,
    Ready(TimerSession),
    /// The last fetch failed; polling continues.
    Failed {
        message: String,
        last_known: Option<TimerSession>,
    },
}

impl PollState {
    pub fn session(&self) -> Option<&TimerSession> {
        match self {
            PollState::Loading => None,
            PollState::Ready(session) => Some(session),
            PollState::Failed { last_known, .. } => last_known.as_ref(),
        }
    }
}

struct PollChannels {
    state: watch::Sender<PollState>,
    session: watch::Sender<Option<TimerSession>>,
}

impl PollChannels {
    /// Replaces local state with an authoritative record.
    fn accept(&self, fetched: TimerSession) {
        self.session.send_if_modified(|current| {
            if current.as_ref() == Some(&fetched) {
                false
            } else {
                *current = Some(fetched.clone());
                true
            }
        });
        self.state.send_replace(PollState::Ready(fetched));
    }

    fn fail(&self, message: String) {
        let last_known = self.session.borrow().clone();
        self.state.send_replace(PollState::Failed {
            message,
            last_known,
        });
    }
}

pub struct ControlPoller {
    session_id: String,
    channels: Arc<PollChannels>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl ControlPoller {
    pub fn start<S: SessionSource>(source: S, session_id: String, poll_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(PollState::Loading);
        let (session_tx, _) = watch::channel(None);
        let channels = Arc::new(PollChannels {
            state: state_tx,
            session: session_tx,
        });

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            source,
            session_id.clone(),
            poll_interval,
            channels.clone(),
            cancel_token.clone(),
        ));

        Self {
            session_id,
            channels,
            handle: Some(handle),
            cancel_token: Some(cancel_token),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> watch::Receiver<PollState> {
        self.channels.state.subscribe()
    }

    /// Snapshot feed suitable for a [`super::DisplayTicker`]; only publishes
    /// when the fetched record actually differs.
    pub fn sessions(&self) -> watch::Receiver<Option<TimerSession>> {
        self.channels.session.subscribe()
    }

    /// Feeds the response of a mutation back in without waiting for the next poll.
    pub fn reconcile(&self, session: TimerSession) {
        if session.id != self.session_id {
            log_warn!(
                "ignoring reconcile for session {} on poller for {}",
                session.id,
                self.session_id
            );
            return;
        }
        self.channels.accept(session);
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("control poller task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Drop for ControlPoller {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn poll_loop<S: SessionSource>(
    source: S,
    session_id: String,
    poll_interval: Duration,
    channels: Arc<PollChannels>,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match time::timeout(FETCH_TIMEOUT, source.fetch(&session_id)).await {
                    Ok(Ok(Some(session))) => channels.accept(session),
                    Ok(Ok(None)) => {
                        log_warn!("session {} not found; will retry", session_id);
                        channels.fail("Timer session not found".to_string());
                    }
                    Ok(Err(err)) => {
                        log_error!("failed to fetch session {}: {err:?}", session_id);
                        channels.fail(format!("Failed to fetch timer session: {err}"));
                    }
                    Err(_) => {
                        log_warn!(
                            "fetch timeout (> {}s) for session {}",
                            FETCH_TIMEOUT.as_secs(),
                            session_id
                        );
                        channels.fail("Timed out fetching timer session".to_string());
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("control poller for {} shutting down", session_id);
                break;
            }
        }
    }
}
