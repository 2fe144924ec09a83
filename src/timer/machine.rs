//! Session mutation protocol.
//!
//! Every user action is a [`TimerCommand`]; [`apply`] checks it against the
//! current session and returns the [`SessionPatch`] to persist. Nothing here
//! talks to storage.

use serde::{Deserialize, Serialize};

use crate::db::models::session::{validation, DEFAULT_COUNTDOWN_MS};
use crate::db::{SessionPatch, Theme, TimerMode, TimerSession};
use crate::error::{SessionError, SessionResult};

use super::state::SessionPhase;

/// Cosmetic settings; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_milliseconds: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    #[serde(rename_all = "camelCase")]
    SetCountdownDuration { duration_ms: u64 },
    #[serde(rename_all = "camelCase")]
    ChangeMode {
        mode: TimerMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },
    Configure(Appearance),
}

impl TimerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            TimerCommand::Start => "start",
            TimerCommand::Pause => "pause",
            TimerCommand::Reset => "reset",
            TimerCommand::SetCountdownDuration { .. } => "setCountdownDuration",
            TimerCommand::ChangeMode { .. } => "changeMode",
            TimerCommand::Configure(_) => "configure",
        }
    }
}

/// Computes the patch `command` produces for `session` at `now_ms`.
///
/// Commands whose effect is already in place (start while running, pause while
/// stopped, switching to the current mode) yield an empty patch.
pub fn apply(
    session: &TimerSession,
    command: &TimerCommand,
    now_ms: i64,
) -> SessionResult<SessionPatch> {
    match command {
        TimerCommand::Start => Ok(start(session, now_ms)),
        TimerCommand::Pause => Ok(pause(session, now_ms)),
        TimerCommand::Reset => Ok(SessionPatch::reset()),
        TimerCommand::SetCountdownDuration { duration_ms } => {
            set_countdown_duration(session, *duration_ms)
        }
        TimerCommand::ChangeMode { mode, duration_ms } => {
            change_mode(session, *mode, *duration_ms)
        }
        TimerCommand::Configure(appearance) => configure(appearance),
    }
}

fn start(session: &TimerSession, now_ms: i64) -> SessionPatch {
    let start_time = match SessionPhase::of(session) {
        SessionPhase::Running => return SessionPatch::default(),
        SessionPhase::Paused => match SessionPhase::elapsed_before_pause(session) {
            Some(elapsed) => now_ms.saturating_sub(elapsed),
            None => now_ms,
        },
        SessionPhase::Idle => now_ms,
    };

    SessionPatch {
        is_running: Some(true),
        start_time: Some(Some(start_time)),
        paused_at: Some(None),
        ..SessionPatch::default()
    }
}

fn pause(session: &TimerSession, now_ms: i64) -> SessionPatch {
    if SessionPhase::of(session) != SessionPhase::Running {
        return SessionPatch::default();
    }

    // pausedAt never precedes startTime, even with a skewed caller clock.
    let paused_at = session.start_time.map_or(now_ms, |start| now_ms.max(start));
    SessionPatch {
        is_running: Some(false),
        paused_at: Some(Some(paused_at)),
        ..SessionPatch::default()
    }
}

fn set_countdown_duration(session: &TimerSession, duration_ms: u64) -> SessionResult<SessionPatch> {
    if session.mode != TimerMode::Countdown {
        return Err(SessionError::InvalidConfiguration(format!(
            "cannot set a countdown duration on a {} session",
            session.mode
        )));
    }
    validate_duration(duration_ms)?;

    Ok(SessionPatch {
        duration: Some(Some(duration_ms)),
        ..SessionPatch::reset()
    })
}

fn change_mode(
    session: &TimerSession,
    mode: TimerMode,
    duration_ms: Option<u64>,
) -> SessionResult<SessionPatch> {
    if session.mode == mode {
        return Ok(SessionPatch::default());
    }

    let mut patch = SessionPatch {
        mode: Some(mode),
        ..SessionPatch::reset()
    };

    match mode {
        TimerMode::Countdown => {
            let duration = match duration_ms {
                Some(ms) => {
                    validate_duration(ms)?;
                    ms
                }
                None => DEFAULT_COUNTDOWN_MS,
            };
            patch.duration = Some(Some(duration));
        }
        TimerMode::Clock | TimerMode::Stopwatch => {
            if duration_ms.is_some() {
                return Err(SessionError::InvalidConfiguration(format!(
                    "a duration only applies to countdown, not {mode}"
                )));
            }
        }
    }

    Ok(patch)
}

fn configure(appearance: &Appearance) -> SessionResult<SessionPatch> {
    if let Some(size) = appearance.font_size {
        validation::validate_font_size(size)?;
    }
    if let Some(theme) = &appearance.theme {
        theme.validate()?;
    }

    Ok(SessionPatch {
        show_milliseconds: appearance.show_milliseconds,
        font_size: appearance.font_size,
        theme: appearance.theme.clone(),
        ..SessionPatch::default()
    })
}

fn validate_duration(duration_ms: u64) -> SessionResult<()> {
    if duration_ms == 0 {
        return Err(SessionError::InvalidConfiguration(
            "countdown duration must be greater than zero".into(),
        ));
    }
    if duration_ms > i64::MAX as u64 {
        return Err(SessionError::InvalidConfiguration(format!(
            "countdown duration {duration_ms} is too large"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::BaseTheme;
    use chrono::Utc;

    fn session(mode: TimerMode) -> TimerSession {
        TimerSession::new("machine".into(), mode, Utc::now())
    }

    fn run(session: &mut TimerSession, command: TimerCommand, now_ms: i64) -> SessionPatch {
        let patch = apply(session, &command, now_ms).unwrap();
        patch.apply_to(session);
        session.validate().unwrap();
        patch
    }

    #[test]
    fn start_from_idle_anchors_at_now() {
        let mut s = session(TimerMode::Stopwatch);
        run(&mut s, TimerCommand::Start, 1_000);
        assert!(s.is_running);
        assert_eq!(s.start_time, Some(1_000));
        assert_eq!(s.paused_at, None);
    }

    #[test]
    fn pause_then_resume_shifts_start() {
        let mut s = session(TimerMode::Stopwatch);
        run(&mut s, TimerCommand::Start, 1_000);
        run(&mut s, TimerCommand::Pause, 1_500);
        assert!(!s.is_running);
        assert_eq!(s.start_time, Some(1_000));
        assert_eq!(s.paused_at, Some(1_500));

        run(&mut s, TimerCommand::Start, 2_000);
        assert!(s.is_running);
        assert_eq!(s.start_time, Some(1_500));
        assert_eq!(s.paused_at, None);
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut s = session(TimerMode::Countdown);
        run(&mut s, TimerCommand::Start, 1_000);
        let patch = run(&mut s, TimerCommand::Start, 5_000);
        assert!(patch.is_empty());
        assert_eq!(s.start_time, Some(1_000));
    }

    #[test]
    fn pause_when_not_running_is_noop() {
        let mut s = session(TimerMode::Stopwatch);
        assert!(run(&mut s, TimerCommand::Pause, 1_000).is_empty());
        assert_eq!(s.paused_at, None);
    }

    #[test]
    fn pause_never_precedes_start() {
        let mut s = session(TimerMode::Stopwatch);
        run(&mut s, TimerCommand::Start, 5_000);
        run(&mut s, TimerCommand::Pause, 4_000);
        assert_eq!(s.paused_at, Some(5_000));
    }

    #[test]
    fn reset_clears_anchors_and_keeps_duration() {
        let mut s = session(TimerMode::Countdown);
        run(
            &mut s,
            TimerCommand::SetCountdownDuration { duration_ms: 60_000 },
            0,
        );
        run(&mut s, TimerCommand::Start, 1_000);
        run(&mut s, TimerCommand::Pause, 2_000);
        run(&mut s, TimerCommand::Reset, 3_000);

        assert!(!s.is_running);
        assert_eq!(s.start_time, None);
        assert_eq!(s.paused_at, None);
        assert_eq!(s.duration, Some(60_000));
    }

    #[test]
    fn set_duration_resets_running_countdown() {
        let mut s = session(TimerMode::Countdown);
        run(&mut s, TimerCommand::Start, 1_000);
        run(
            &mut s,
            TimerCommand::SetCountdownDuration { duration_ms: 900_000 },
            2_000,
        );
        assert!(!s.is_running);
        assert_eq!(s.start_time, None);
        assert_eq!(s.duration, Some(900_000));
    }

    #[test]
    fn set_duration_rejects_zero_and_wrong_mode() {
        let countdown = session(TimerMode::Countdown);
        assert!(matches!(
            apply(
                &countdown,
                &TimerCommand::SetCountdownDuration { duration_ms: 0 },
                0
            ),
            Err(SessionError::InvalidConfiguration(_))
        ));

        let stopwatch = session(TimerMode::Stopwatch);
        assert!(matches!(
            apply(
                &stopwatch,
                &TimerCommand::SetCountdownDuration { duration_ms: 1_000 },
                0
            ),
            Err(SessionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn change_mode_resets_and_defaults_countdown_duration() {
        let mut s = session(TimerMode::Stopwatch);
        run(&mut s, TimerCommand::Start, 1_000);
        run(
            &mut s,
            TimerCommand::ChangeMode {
                mode: TimerMode::Countdown,
                duration_ms: None,
            },
            2_000,
        );
        assert_eq!(s.mode, TimerMode::Countdown);
        assert!(!s.is_running);
        assert_eq!(s.start_time, None);
        assert_eq!(s.duration, Some(300_000));
    }

    #[test]
    fn change_mode_honours_supplied_duration() {
        let mut s = session(TimerMode::Clock);
        run(
            &mut s,
            TimerCommand::ChangeMode {
                mode: TimerMode::Countdown,
                duration_ms: Some(45_000),
            },
            0,
        );
        assert_eq!(s.duration, Some(45_000));
    }

    #[test]
    fn change_to_same_mode_is_noop() {
        let mut s = session(TimerMode::Stopwatch);
        run(&mut s, TimerCommand::Start, 1_000);
        let patch = run(
            &mut s,
            TimerCommand::ChangeMode {
                mode: TimerMode::Stopwatch,
                duration_ms: None,
            },
            2_000,
        );
        assert!(patch.is_empty());
        assert!(s.is_running);
    }

    #[test]
    fn configure_touches_cosmetics_only() {
        let mut s = session(TimerMode::Stopwatch);
        run(&mut s, TimerCommand::Start, 1_000);
        let patch = run(
            &mut s,
            TimerCommand::Configure(Appearance {
                show_milliseconds: Some(false),
                font_size: Some(96),
                theme: Some(Theme::Base(BaseTheme::GreenScreen)),
            }),
            2_000,
        );

        assert_eq!(patch.is_running, None);
        assert_eq!(patch.start_time, None);
        assert_eq!(patch.paused_at, None);
        assert!(s.is_running);
        assert_eq!(s.start_time, Some(1_000));
        assert_eq!(s.font_size, 96);
        assert!(!s.show_milliseconds);
    }

    #[test]
    fn configure_rejects_out_of_range_font() {
        let s = session(TimerMode::Clock);
        for size in [0, 23, 121, 1_000] {
            let command = TimerCommand::Configure(Appearance {
                font_size: Some(size),
                ..Appearance::default()
            });
            assert!(matches!(
                apply(&s, &command, 0),
                Err(SessionError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn start_on_expired_countdown_still_resumes() {
        let mut s = session(TimerMode::Countdown);
        run(&mut s, TimerCommand::Start, 0);
        run(&mut s, TimerCommand::Pause, 400_000);
        run(&mut s, TimerCommand::Start, 500_000);
        assert_eq!(s.start_time, Some(100_000));
    }

    #[test]
    fn commands_parse_from_tagged_json() {
        let command: TimerCommand =
            serde_json::from_str(r#"{"action": "setCountdownDuration", "durationMs": 900000}"#)
                .unwrap();
        assert_eq!(
            command,
            TimerCommand::SetCountdownDuration {
                duration_ms: 900_000
            }
        );

        let command: TimerCommand =
            serde_json::from_str(r#"{"action": "configure", "fontSize": 72}"#).unwrap();
        assert_eq!(command.name(), "configure");

        let command: TimerCommand =
            serde_json::from_str(r#"{"action": "changeMode", "mode": "clock"}"#).unwrap();
        assert_eq!(
            command,
            TimerCommand::ChangeMode {
                mode: TimerMode::Clock,
                duration_ms: None
            }
        );
    }
}
