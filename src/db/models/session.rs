//! Timer session data models.
//!
//! `TimerSession` is the only persisted entity. Anchors (`start_time`,
//! `paused_at`) are epoch milliseconds so the display side can derive the
//! current value without any server-side ticking.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

pub const MIN_FONT_SIZE: u32 = 24;
pub const MAX_FONT_SIZE: u32 = 120;
pub const DEFAULT_FONT_SIZE: u32 = 48;
pub const DEFAULT_COUNTDOWN_MS: u64 = 5 * 60 * 1000;
pub const MAX_BORDER_WIDTH: u32 = 32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Clock,
    Stopwatch,
    Countdown,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Clock => "clock",
            TimerMode::Stopwatch => "stopwatch",
            TimerMode::Countdown => "countdown",
        }
    }

    /// Duration a freshly created (or freshly switched) session starts with.
    pub fn default_duration(&self) -> Option<u64> {
        match self {
            TimerMode::Countdown => Some(DEFAULT_COUNTDOWN_MS),
            TimerMode::Clock | TimerMode::Stopwatch => None,
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = SessionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "clock" => Ok(TimerMode::Clock),
            "stopwatch" => Ok(TimerMode::Stopwatch),
            "countdown" => Ok(TimerMode::Countdown),
            other => Err(SessionError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BaseTheme {
    Light,
    Dark,
    GreenScreen,
}

/// Palette for the extended theme variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomPalette {
    pub text_color: String,
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(default)]
    pub shadow: bool,
}

/// Rendering palette. Serialized either as a bare name (`"dark"`) or as
/// `{"custom": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Theme {
    Base(BaseTheme),
    Custom { custom: CustomPalette },
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Base(BaseTheme::Dark)
    }
}

impl Theme {
    pub fn validate(&self) -> Result<(), SessionError> {
        match self {
            Theme::Base(_) => Ok(()),
            Theme::Custom { custom } => {
                validation::validate_color(&custom.text_color)?;
                validation::validate_color(&custom.background_color)?;
                if let Some(border) = &custom.border_color {
                    validation::validate_color(border)?;
                }
                if let Some(width) = custom.border_width {
                    validation::validate_border_width(width)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub id: String,
    pub mode: TimerMode,
    pub is_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub show_milliseconds: bool,
    pub font_size: u32,
    #[serde(default)]
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimerSession {
    /// A session in its initial state: not running, no anchors.
    pub fn new(id: String, mode: TimerMode, now: DateTime<Utc>) -> Self {
        Self {
            id,
            mode,
            is_running: false,
            start_time: None,
            paused_at: None,
            duration: mode.default_duration(),
            show_milliseconds: true,
            font_size: DEFAULT_FONT_SIZE,
            theme: Theme::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the invariants every persisted record must satisfy.
    pub fn validate(&self) -> Result<(), SessionError> {
        validation::validate_font_size(self.font_size)?;
        self.theme.validate()?;

        if self.is_running {
            if self.start_time.is_none() {
                return Err(SessionError::InvalidConfiguration(
                    "a running session needs a startTime".into(),
                ));
            }
            if self.paused_at.is_some() {
                return Err(SessionError::InvalidConfiguration(
                    "a running session cannot carry pausedAt".into(),
                ));
            }
        } else if self.start_time.is_some() != self.paused_at.is_some() {
            // Stopped means either reset (no anchors) or paused (both).
            return Err(SessionError::InvalidConfiguration(
                "a stopped session needs both startTime and pausedAt, or neither".into(),
            ));
        }

        if let (Some(start), Some(paused)) = (self.start_time, self.paused_at) {
            if paused < start {
                return Err(SessionError::InvalidConfiguration(
                    "pausedAt must not precede startTime".into(),
                ));
            }
        }

        if self.mode == TimerMode::Countdown {
            match self.duration {
                Some(ms) if ms > 0 => {}
                _ => {
                    return Err(SessionError::InvalidConfiguration(
                        "countdown duration must be positive".into(),
                    ))
                }
            }
        }

        Ok(())
    }
}

pub mod validation {
    use super::{MAX_BORDER_WIDTH, MAX_FONT_SIZE, MIN_FONT_SIZE};
    use crate::error::SessionError;

    fn invalid(message: impl Into<String>) -> SessionError {
        SessionError::InvalidConfiguration(message.into())
    }

    pub fn validate_color(color: &str) -> Result<(), SessionError> {
        let Some(hex_part) = color.strip_prefix('#') else {
            return Err(invalid("Invalid color format. Must be hex (#RRGGBB)"));
        };

        if hex_part.len() != 6 && hex_part.len() != 8 {
            return Err(invalid(
                "Invalid color format. Must be hex (#RRGGBB or #RRGGBBAA)",
            ));
        }

        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("Invalid color format. Must be hex (#RRGGBB)"));
        }

        Ok(())
    }

    pub fn validate_font_size(size: u32) -> Result<(), SessionError> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
            return Err(invalid(format!(
                "Invalid font size {size}. Must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}"
            )));
        }
        Ok(())
    }

    pub fn validate_border_width(width: u32) -> Result<(), SessionError> {
        if width > MAX_BORDER_WIDTH {
            return Err(invalid(format!(
                "Invalid border width {width}. Must be at most {MAX_BORDER_WIDTH}"
            )));
        }
        Ok(())
    }
}
