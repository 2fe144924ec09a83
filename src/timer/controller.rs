use log::info;

use crate::db::{Database, SessionPatch, TimerMode, TimerSession};
use crate::error::{SessionError, SessionResult};

use super::{
    format::TimeFormatter,
    machine::{self, TimerCommand},
    now_ms,
    render::{self, RenderedFrame},
};

/// Runs session operations against the store.
///
/// Commands are turned into patches by the state machine and written with a
/// single find-and-update; concurrent writers race and the last write wins.
#[derive(Clone)]
pub struct TimerController {
    db: Database,
    formatter: TimeFormatter,
}

impl TimerController {
    pub fn new(db: Database, formatter: TimeFormatter) -> Self {
        Self { db, formatter }
    }

    pub async fn create_session(&self, mode: &str) -> SessionResult<TimerSession> {
        let mode: TimerMode = mode.parse()?;
        let session = self.db.create_timer_session(mode).await?;
        info!("Created {} session {}", session.mode, session.id);
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> SessionResult<TimerSession> {
        self.db
            .get_timer_session(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub async fn patch_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> SessionResult<TimerSession> {
        self.db
            .patch_timer_session(session_id, patch)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub async fn run_command(
        &self,
        session_id: &str,
        command: TimerCommand,
    ) -> SessionResult<TimerSession> {
        self.run_command_at(session_id, command, now_ms()).await
    }

    pub async fn run_command_at(
        &self,
        session_id: &str,
        command: TimerCommand,
        at_ms: i64,
    ) -> SessionResult<TimerSession> {
        let session = self.get_session(session_id).await?;
        let patch = machine::apply(&session, &command, at_ms)?;
        if patch.is_empty() {
            return Ok(session);
        }

        let updated = self.patch_session(session_id, patch).await?;
        info!(
            "Applied {} to session {} (running: {})",
            command.name(),
            session_id,
            updated.is_running
        );
        Ok(updated)
    }

    pub async fn render(&self, session_id: &str) -> SessionResult<RenderedFrame> {
        let session = self.get_session(session_id).await?;
        Ok(render::render(&session, now_ms(), &self.formatter))
    }
}
