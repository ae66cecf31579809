//! Shared formatting helpers for CLI commands.

use std::fmt::Display;

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Formats a duration as `Xh Ym`, or `Ym` under an hour.
///
/// Negative durations render as `0m`.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats a duration as a `HH:MM:SS` clock.
pub fn format_clock(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

/// Formats an instant as `YYYY-MM-DD HH:MM` in `tz`.
pub fn format_time<Tz>(timestamp: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp
        .with_timezone(tz)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Truncates to `width` characters, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    // By characters, not bytes, so multi-byte names cannot split.
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(59)), "0m");
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::minutes(150)), "2h 30m");
        assert_eq!(format_duration(Duration::minutes(-5)), "0m");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::seconds(0)), "00:00:00");
        assert_eq!(format_clock(Duration::seconds(3725)), "01:02:05");
    }

    #[test]
    fn test_format_time_in_utc() {
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 10, 9, 5, 0).unwrap();
        assert_eq!(format_time(timestamp, &Utc), "2025-03-10 09:05");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Société Générale", 10), "Société...");
    }
}
