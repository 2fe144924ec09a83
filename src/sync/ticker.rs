//! Display-side ticking session.
//!
//! A [`DisplayTicker`] follows a session snapshot channel and republishes a
//! rendered frame at a fixed cadence. It owns its task: `stop` cancels and
//! joins it, and dropping the ticker cancels it too.

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::db::{TimerMode, TimerSession};
use crate::timer::{
    now_ms,
    render::{render, RenderedFrame},
    SessionPhase, TimeFormatter,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::{log_info, log_warn};

pub const FINE_TICK: Duration = Duration::from_millis(10);
pub const COARSE_TICK: Duration = Duration::from_millis(1000);

/// How often a session needs re-rendering; `None` when its text cannot change
/// until the session itself does.
pub fn tick_cadence(session: &TimerSession) -> Option<Duration> {
    match session.mode {
        TimerMode::Clock => Some(COARSE_TICK),
        TimerMode::Stopwatch | TimerMode::Countdown => {
            if SessionPhase::of(session) != SessionPhase::Running {
                None
            } else if session.show_milliseconds {
                Some(FINE_TICK)
            } else {
                Some(COARSE_TICK)
            }
        }
    }
}

pub struct DisplayTicker {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    frames: watch::Receiver<Option<RenderedFrame>>,
}

impl DisplayTicker {
    pub fn start(
        sessions: watch::Receiver<Option<TimerSession>>,
        formatter: TimeFormatter,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (frame_tx, frames) = watch::channel(None);

        let handle = tokio::spawn(ticker_loop(
            sessions,
            formatter,
            frame_tx,
            cancel_token.clone(),
        ));

        Self {
            handle: Some(handle),
            cancel_token: Some(cancel_token),
            frames,
        }
    }

    pub fn frames(&self) -> watch::Receiver<Option<RenderedFrame>> {
        self.frames.clone()
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
                .context("display ticker task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Drop for DisplayTicker {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

enum Wake {
    Cancelled,
    SessionChanged,
    Settled,
}

async fn ticker_loop(
    mut sessions: watch::Receiver<Option<TimerSession>>,
    formatter: TimeFormatter,
    frame_tx: watch::Sender<Option<RenderedFrame>>,
    cancel_token: CancellationToken,
) {
    loop {
        let current = sessions.borrow_and_update().clone();

        if let Some(session) = current {
            let wake = match tick_cadence(&session) {
                Some(period) => {
                    tick_until_change(
                        &session,
                        period,
                        &formatter,
                        &frame_tx,
                        &mut sessions,
                        &cancel_token,
                    )
                    .await
                }
                None => {
                    frame_tx.send_replace(Some(render(&session, now_ms(), &formatter)));
                    Wake::Settled
                }
            };

            match wake {
                Wake::Cancelled => break,
                Wake::SessionChanged => continue,
                // Nothing left to animate: hold the last frame.
                Wake::Settled => {}
            }
        }

        if !wait_for_change(&mut sessions, &cancel_token).await {
            break;
        }
    }

    log_info!("display ticker shutting down");
}

async fn tick_until_change(
    session: &TimerSession,
    period: Duration,
    formatter: &TimeFormatter,
    frame_tx: &watch::Sender<Option<RenderedFrame>>,
    sessions: &mut watch::Receiver<Option<TimerSession>>,
    cancel_token: &CancellationToken,
) -> Wake {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => return Wake::Cancelled,
            changed = sessions.changed() => {
                return match changed {
                    Ok(()) => Wake::SessionChanged,
                    Err(_) => {
                        log_warn!("session feed closed; stopping display ticker");
                        Wake::Cancelled
                    }
                };
            }
            _ = ticker.tick() => {
                let frame = render(session, now_ms(), formatter);
                let expired = frame.expired;
                frame_tx.send_replace(Some(frame));
                if expired {
                    log_info!("countdown {} expired; ticking paused", session.id);
                    return Wake::Settled;
                }
            }
        }
    }
}

/// Waits for the next session snapshot. `false` means shut down.
async fn wait_for_change(
    sessions: &mut watch::Receiver<Option<TimerSession>>,
    cancel_token: &CancellationToken,
) -> bool {
    tokio::select! {
        _ = cancel_token.cancelled() => false,
        changed = sessions.changed() => changed.is_ok(),
    }
}
