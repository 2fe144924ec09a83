use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CountdownPreset {
    pub label: &'static str,
    pub duration_ms: u64,
}

pub const COUNTDOWN_PRESETS: [CountdownPreset; 4] = [
    CountdownPreset {
        label: "5 min",
        duration_ms: 5 * 60 * 1000,
    },
    CountdownPreset {
        label: "15 min",
        duration_ms: 15 * 60 * 1000,
    },
    CountdownPreset {
        label: "30 min",
        duration_ms: 30 * 60 * 1000,
    },
    CountdownPreset {
        label: "1 hour",
        duration_ms: 60 * 60 * 1000,
    },
];

/// Custom duration from the hours/minutes/seconds form. `None` when it adds up
/// to zero, which the control panel ignores.
pub fn duration_from_parts(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    let total_secs = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    let total_ms = total_secs.checked_mul(1000)?;
    (total_ms > 0).then_some(total_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_ascending() {
        assert!(COUNTDOWN_PRESETS
            .windows(2)
            .all(|pair| pair[0].duration_ms < pair[1].duration_ms));
        assert_eq!(COUNTDOWN_PRESETS[0].duration_ms, 300_000);
    }

    #[test]
    fn custom_duration_adds_parts() {
        assert_eq!(duration_from_parts(0, 5, 0), Some(300_000));
        assert_eq!(duration_from_parts(1, 2, 3), Some(3_723_000));
    }

    #[test]
    fn zero_or_overflowing_duration_is_rejected() {
        assert_eq!(duration_from_parts(0, 0, 0), None);
        assert_eq!(duration_from_parts(u64::MAX, 0, 0), None);
    }
}
