use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

use crate::db::TimerMode;

const WALL_CLOCK_FORMAT: &str = "%I:%M:%S %p";
const WALL_CLOCK_UNAVAILABLE: &str = "--:--:--";

#[derive(Debug, Clone, Copy)]
enum WallZone {
    /// Host zone, resolved per instant so DST transitions apply.
    Local,
    Fixed(FixedOffset),
}

/// Turns sampled values into display text.
///
/// Clock mode renders a 12-hour wall time with second granularity and never
/// shows a sub-second suffix, whatever `show_milliseconds` says. Stopwatch and
/// countdown render `[HH:]MM:SS[.CC]`.
#[derive(Debug, Clone, Copy)]
pub struct TimeFormatter {
    zone: WallZone,
}

impl Default for TimeFormatter {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeFormatter {
    pub fn utc() -> Self {
        Self::with_offset(Utc.fix())
    }

    /// Wall-clock rendering in the host's time zone.
    pub fn local() -> Self {
        Self {
            zone: WallZone::Local,
        }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            zone: WallZone::Fixed(offset),
        }
    }

    /// `value_ms` is an epoch-ms instant in clock mode and a duration otherwise.
    pub fn format(&self, mode: TimerMode, value_ms: i64, show_milliseconds: bool) -> String {
        match mode {
            TimerMode::Clock => format_wall_clock(value_ms, self.offset_at(value_ms)),
            TimerMode::Stopwatch | TimerMode::Countdown => {
                format_duration(value_ms, show_milliseconds)
            }
        }
    }

    fn offset_at(&self, instant_ms: i64) -> FixedOffset {
        match self.zone {
            WallZone::Fixed(offset) => offset,
            WallZone::Local => match DateTime::from_timestamp_millis(instant_ms) {
                Some(instant) => Local.offset_from_utc_datetime(&instant.naive_utc()).fix(),
                None => Utc.fix(),
            },
        }
    }
}

pub fn format_wall_clock(instant_ms: i64, offset: FixedOffset) -> String {
    match DateTime::from_timestamp_millis(instant_ms) {
        Some(instant) => instant
            .with_timezone(&offset)
            .format(WALL_CLOCK_FORMAT)
            .to_string(),
        None => WALL_CLOCK_UNAVAILABLE.to_string(),
    }
}

pub fn format_duration(value_ms: i64, show_milliseconds: bool) -> String {
    let ms = value_ms.max(0) as u64;
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let centis = (ms % 1000) / 10;

    let mut formatted = String::new();
    if hours > 0 {
        formatted.push_str(&format!("{hours:02}:"));
    }
    formatted.push_str(&format!("{minutes:02}:{seconds:02}"));
    if show_milliseconds {
        formatted.push_str(&format!(".{centis:02}"));
    }
    formatted
}
