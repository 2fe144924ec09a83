//! Derives the displayed quantity from a session snapshot and a sampled `now`.
//!
//! Nothing here keeps state: the same `(session, now)` pair always yields the
//! same sample, and missing anchors fall back to the idle value instead of
//! failing.

use serde::Serialize;

use crate::db::{TimerMode, TimerSession};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClockSample {
    /// Elapsed ms (stopwatch), remaining ms (countdown) or the wall-clock
    /// instant itself (clock).
    pub display_ms: i64,
    /// A countdown has run down to zero. The caller decides whether to stop it.
    pub expired: bool,
}

impl ClockSample {
    fn value(display_ms: i64) -> Self {
        Self {
            display_ms,
            expired: false,
        }
    }
}

pub fn sample(session: &TimerSession, now_ms: i64) -> ClockSample {
    match session.mode {
        TimerMode::Clock => ClockSample::value(now_ms),
        TimerMode::Stopwatch => ClockSample::value(elapsed_ms(session, now_ms).unwrap_or(0)),
        TimerMode::Countdown => {
            let duration = session.duration.unwrap_or(0).min(i64::MAX as u64) as i64;
            match elapsed_ms(session, now_ms) {
                Some(elapsed) => {
                    let remaining = duration.saturating_sub(elapsed).max(0);
                    ClockSample {
                        display_ms: remaining,
                        expired: remaining == 0,
                    }
                }
                None => ClockSample::value(duration),
            }
        }
    }
}

/// Time accumulated since `start_time`, frozen at `paused_at` when stopped.
/// `None` when the anchors needed for the current run state are missing.
fn elapsed_ms(session: &TimerSession, now_ms: i64) -> Option<i64> {
    let start = session.start_time?;
    let end = if session.is_running {
        now_ms
    } else {
        session.paused_at?
    };
    Some(end.saturating_sub(start).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::machine::{apply, TimerCommand};
    use chrono::Utc;

    fn session(mode: TimerMode) -> TimerSession {
        TimerSession::new("clock-test".into(), mode, Utc::now())
    }

    fn running(mode: TimerMode, start: i64) -> TimerSession {
        let mut s = session(mode);
        s.is_running = true;
        s.start_time = Some(start);
        s
    }

    fn paused(mode: TimerMode, start: i64, paused_at: i64) -> TimerSession {
        let mut s = session(mode);
        s.start_time = Some(start);
        s.paused_at = Some(paused_at);
        s
    }

    #[test]
    fn fresh_countdown_shows_full_duration() {
        let s = session(TimerMode::Countdown);
        assert_eq!(
            sample(&s, 12_345),
            ClockSample {
                display_ms: 300_000,
                expired: false
            }
        );
    }

    #[test]
    fn clock_mode_passes_now_through() {
        let mut s = session(TimerMode::Clock);
        s.start_time = Some(1);
        s.paused_at = Some(2);
        assert_eq!(sample(&s, 1_700_000_000_000).display_ms, 1_700_000_000_000);
    }

    #[test]
    fn running_stopwatch_counts_from_start() {
        let s = running(TimerMode::Stopwatch, 1_000);
        assert_eq!(sample(&s, 1_500).display_ms, 500);
    }

    #[test]
    fn paused_stopwatch_ignores_now() {
        let s = paused(TimerMode::Stopwatch, 1_000, 1_500);
        assert_eq!(sample(&s, 9_999).display_ms, 500);
        assert_eq!(sample(&s, 1_500).display_ms, 500);
    }

    #[test]
    fn idle_stopwatch_is_zero() {
        let s = session(TimerMode::Stopwatch);
        assert_eq!(sample(&s, 5_000).display_ms, 0);
    }

    #[test]
    fn sampling_is_idempotent() {
        for s in [
            running(TimerMode::Stopwatch, 1_000),
            running(TimerMode::Countdown, 1_000),
            paused(TimerMode::Countdown, 1_000, 4_000),
            session(TimerMode::Clock),
        ] {
            assert_eq!(sample(&s, 7_777), sample(&s, 7_777));
        }
    }

    #[test]
    fn countdown_decreases_while_running() {
        let s = running(TimerMode::Countdown, 10_000);
        let mut previous = sample(&s, 10_000).display_ms;
        for now in (10_000..310_000).step_by(7_919) {
            let current = sample(&s, now).display_ms;
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn countdown_clamps_at_zero_and_reports_expiry() {
        let s = running(TimerMode::Countdown, 0);
        for now in [299_999, 300_000, 300_001, 10_000_000] {
            let sampled = sample(&s, now);
            assert!(sampled.display_ms >= 0);
            assert_eq!(sampled.expired, now >= 300_000);
        }
        assert_eq!(sample(&s, 299_999).display_ms, 1);
    }

    #[test]
    fn paused_countdown_shows_frozen_remaining() {
        let s = paused(TimerMode::Countdown, 1_000, 61_000);
        assert_eq!(sample(&s, 500_000).display_ms, 240_000);
        assert!(!sample(&s, 500_000).expired);
    }

    #[test]
    fn running_without_start_degrades_gracefully() {
        let mut s = session(TimerMode::Countdown);
        s.is_running = true;
        assert_eq!(sample(&s, 1_000).display_ms, 300_000);

        let mut s = session(TimerMode::Stopwatch);
        s.is_running = true;
        assert_eq!(sample(&s, 1_000).display_ms, 0);
    }

    #[test]
    fn now_before_start_does_not_go_negative() {
        let s = running(TimerMode::Stopwatch, 5_000);
        assert_eq!(sample(&s, 4_000).display_ms, 0);
    }

    #[test]
    fn resume_preserves_elapsed_stopwatch() {
        let s = paused(TimerMode::Stopwatch, 1_000, 1_500);
        let before = sample(&s, 1_500).display_ms;

        let mut resumed = s.clone();
        apply(&s, &TimerCommand::Start, 2_000)
            .unwrap()
            .apply_to(&mut resumed);

        assert_eq!(resumed.start_time, Some(1_500));
        assert_eq!(sample(&resumed, 2_000).display_ms, before);
        assert_eq!(sample(&resumed, 2_200).display_ms, 700);
    }

    #[test]
    fn resume_preserves_remaining_countdown() {
        for (start, paused_at, resume_at) in [(0, 0, 10), (1_000, 91_000, 500_000), (7, 299_000, 299_001)] {
            let s = paused(TimerMode::Countdown, start, paused_at);
            let before = sample(&s, paused_at);

            let mut resumed = s.clone();
            apply(&s, &TimerCommand::Start, resume_at)
                .unwrap()
                .apply_to(&mut resumed);

            assert_eq!(sample(&resumed, resume_at).display_ms, before.display_ms);
        }
    }

    #[test]
    fn reset_clears_back_to_idle_values() {
        let mut stopwatch = running(TimerMode::Stopwatch, 1_000);
        apply(&stopwatch, &TimerCommand::Reset, 9_000)
            .unwrap()
            .apply_to(&mut stopwatch);
        assert_eq!(sample(&stopwatch, 50_000).display_ms, 0);

        let mut countdown = paused(TimerMode::Countdown, 1_000, 2_000);
        apply(&countdown, &TimerCommand::Reset, 9_000)
            .unwrap()
            .apply_to(&mut countdown);
        assert_eq!(sample(&countdown, 50_000).display_ms, 300_000);
    }
}
