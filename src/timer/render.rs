use serde::Serialize;

use crate::db::{Theme, TimerMode, TimerSession};

use super::{clock, format::TimeFormatter};

/// What a display surface shows for one sampled instant.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderedFrame {
    pub text: String,
    pub display_ms: i64,
    pub expired: bool,
    pub mode: TimerMode,
    pub font_size: u32,
    pub theme: Theme,
}

pub fn render(session: &TimerSession, now_ms: i64, formatter: &TimeFormatter) -> RenderedFrame {
    let sampled = clock::sample(session, now_ms);
    RenderedFrame {
        text: formatter.format(session.mode, sampled.display_ms, session.show_milliseconds),
        display_ms: sampled.display_ms,
        expired: sampled.expired,
        mode: session.mode,
        font_size: session.font_size,
        theme: session.theme.clone(),
    }
}
