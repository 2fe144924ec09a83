use serde::{Deserialize, Serialize};

use crate::db::TimerSession;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    /// Never started, or reset: no anchors.
    #[default]
    Idle,
    Running,
    /// Both anchors present, frozen at `paused_at`.
    Paused,
}

impl SessionPhase {
    pub fn of(session: &TimerSession) -> Self {
        match (session.is_running, session.start_time, session.paused_at) {
            (true, Some(_), _) => SessionPhase::Running,
            (false, Some(_), Some(_)) => SessionPhase::Paused,
            _ => SessionPhase::Idle,
        }
    }

    /// Time that had elapsed when the session was frozen, if it is paused.
    pub fn elapsed_before_pause(session: &TimerSession) -> Option<i64> {
        match (Self::of(session), session.start_time, session.paused_at) {
            (SessionPhase::Paused, Some(start), Some(paused)) => {
                Some(paused.saturating_sub(start).max(0))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TimerMode;
    use chrono::Utc;

    fn stopwatch() -> TimerSession {
        TimerSession::new("phase".into(), TimerMode::Stopwatch, Utc::now())
    }

    #[test]
    fn derives_phase_from_anchors() {
        let mut session = stopwatch();
        assert_eq!(SessionPhase::of(&session), SessionPhase::Idle);

        session.is_running = true;
        session.start_time = Some(1_000);
        assert_eq!(SessionPhase::of(&session), SessionPhase::Running);

        session.is_running = false;
        session.paused_at = Some(1_500);
        assert_eq!(SessionPhase::of(&session), SessionPhase::Paused);
        assert_eq!(SessionPhase::elapsed_before_pause(&session), Some(500));
    }

    #[test]
    fn stopped_without_paused_at_is_idle() {
        let mut session = stopwatch();
        session.start_time = Some(1_000);
        assert_eq!(SessionPhase::of(&session), SessionPhase::Idle);
        assert_eq!(SessionPhase::elapsed_before_pause(&session), None);
    }
}
