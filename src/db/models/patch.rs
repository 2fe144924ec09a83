//! Partial session update.
//!
//! Clearable anchors use `Option<Option<_>>`: the outer `None` leaves the
//! stored value alone, `Some(None)` clears it (JSON `null`).

use serde::{Deserialize, Deserializer, Serialize};

use super::session::{Theme, TimerMode, TimerSession};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TimerMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub paused_at: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Option<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_milliseconds: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Patch that stops the timer and drops both anchors.
    pub fn reset() -> Self {
        Self {
            is_running: Some(false),
            start_time: Some(None),
            paused_at: Some(None),
            ..Self::default()
        }
    }

    /// Merges the supplied fields into `session`; untouched fields keep their value.
    pub fn apply_to(&self, session: &mut TimerSession) {
        if let Some(mode) = self.mode {
            session.mode = mode;
        }
        if let Some(is_running) = self.is_running {
            session.is_running = is_running;
        }
        if let Some(start_time) = self.start_time {
            session.start_time = start_time;
        }
        if let Some(paused_at) = self.paused_at {
            session.paused_at = paused_at;
        }
        if let Some(duration) = self.duration {
            session.duration = duration;
        }
        if let Some(show) = self.show_milliseconds {
            session.show_milliseconds = show;
        }
        if let Some(size) = self.font_size {
            session.font_size = size;
        }
        if let Some(theme) = &self.theme {
            session.theme = theme.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn null_clears_and_missing_keeps() {
        let patch: SessionPatch =
            serde_json::from_str(r#"{"pausedAt": null, "isRunning": true}"#).unwrap();
        assert_eq!(patch.paused_at, Some(None));
        assert_eq!(patch.start_time, None);

        let mut session = TimerSession::new("abc".into(), TimerMode::Stopwatch, Utc::now());
        session.start_time = Some(1_000);
        session.paused_at = Some(1_500);
        patch.apply_to(&mut session);

        assert!(session.is_running);
        assert_eq!(session.start_time, Some(1_000));
        assert_eq!(session.paused_at, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<SessionPatch>(r#"{"id": "other"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn reset_serializes_nulls_for_anchors() {
        let value = serde_json::to_value(SessionPatch::reset()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"isRunning": false, "startTime": null, "pausedAt": null})
        );
    }
}
