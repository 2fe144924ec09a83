use anyhow::{bail, Result};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_mode, parse_theme, theme_to_json, to_i64, to_u32, to_u64},
    models::{SessionPatch, TimerMode, TimerSession},
};
use crate::error::SessionError;

const SESSION_ID_LEN: usize = 10;
const MAX_ID_ATTEMPTS: usize = 5;

const SELECT_SESSION: &str = "SELECT id, mode, is_running, start_time, paused_at, duration_ms, show_milliseconds, font_size, theme, created_at, updated_at
     FROM timer_sessions
     WHERE id = ?1";

fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

fn row_to_session(row: &Row) -> Result<TimerSession> {
    let mode: String = row.get("mode")?;
    let duration_ms: Option<i64> = row.get("duration_ms")?;
    let font_size: i64 = row.get("font_size")?;
    let theme: String = row.get("theme")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(TimerSession {
        id: row.get("id")?,
        mode: parse_mode(&mode)?,
        is_running: row.get("is_running")?,
        start_time: row.get("start_time")?,
        paused_at: row.get("paused_at")?,
        duration: duration_ms
            .map(|ms| to_u64(ms, "duration_ms"))
            .transpose()?,
        show_milliseconds: row.get("show_milliseconds")?,
        font_size: to_u32(font_size, "font_size")?,
        theme: parse_theme(&theme)?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn load_session(conn: &Connection, session_id: &str) -> Result<Option<TimerSession>> {
    let mut stmt = conn.prepare(SELECT_SESSION)?;
    let mut rows = stmt.query(params![session_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_session(row)?)),
        None => Ok(None),
    }
}

fn write_session(conn: &Connection, session: &TimerSession) -> Result<()> {
    conn.execute(
        "UPDATE timer_sessions
         SET mode = ?1,
             is_running = ?2,
             start_time = ?3,
             paused_at = ?4,
             duration_ms = ?5,
             show_milliseconds = ?6,
             font_size = ?7,
             theme = ?8,
             updated_at = ?9
         WHERE id = ?10",
        params![
            session.mode.as_str(),
            session.is_running,
            session.start_time,
            session.paused_at,
            session.duration.map(to_i64).transpose()?,
            session.show_milliseconds,
            session.font_size,
            theme_to_json(&session.theme)?,
            session.updated_at.to_rfc3339(),
            session.id,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Allocates a fresh id and persists a session with the defaults for `mode`.
    pub async fn create_timer_session(&self, mode: TimerMode) -> Result<TimerSession> {
        self.execute(move |conn| {
            for _ in 0..MAX_ID_ATTEMPTS {
                let id = generate_session_id();
                let taken: Option<String> = conn
                    .query_row(
                        "SELECT id FROM timer_sessions WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if taken.is_some() {
                    continue;
                }

                let session = TimerSession::new(id, mode, Utc::now());
                conn.execute(
                    "INSERT INTO timer_sessions (id, mode, is_running, start_time, paused_at, duration_ms, show_milliseconds, font_size, theme, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        session.id,
                        session.mode.as_str(),
                        session.is_running,
                        session.start_time,
                        session.paused_at,
                        session.duration.map(to_i64).transpose()?,
                        session.show_milliseconds,
                        session.font_size,
                        theme_to_json(&session.theme)?,
                        session.created_at.to_rfc3339(),
                        session.updated_at.to_rfc3339(),
                    ],
                )?;
                return Ok(session);
            }

            bail!("failed to allocate a unique session id after {MAX_ID_ATTEMPTS} attempts")
        })
        .await
    }

    pub async fn get_timer_session(&self, session_id: &str) -> Result<Option<TimerSession>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| load_session(conn, &session_id)).await
    }

    /// Merges `patch` into the stored session and stamps `updated_at`.
    ///
    /// The merged record is validated before it is written; an invalid result
    /// leaves the row untouched. Returns `Ok(None)` for an unknown id.
    pub async fn patch_timer_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Option<TimerSession>, SessionError> {
        let session_id = session_id.to_string();
        let outcome = self
            .execute(move |conn| {
                // IMMEDIATE takes the write lock up front so another process
                // sharing the file cannot interleave between read and write.
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let Some(mut session) = load_session(&tx, &session_id)? else {
                    return Ok(Ok(None));
                };

                patch.apply_to(&mut session);
                if let Err(err) = session.validate() {
                    return Ok(Err(err));
                }

                session.updated_at = Utc::now();
                write_session(&tx, &session)?;
                tx.commit()?;
                Ok(Ok(Some(session)))
            })
            .await?;
        outcome
    }
}
