//! # Time Formatting
//!
//! Contest durations are rendered as `HH:MM:SS`. Negative durations keep the
//! same layout behind a leading minus sign.

use chrono::{Local, TimeZone};

/// Left-pads a number with zeroes to at least two digits.
pub fn pad_number(num: i64) -> String {
    format!("{:02}", num)
}

/// Formats a duration in seconds as `HH:MM:SS`.
///
/// Hours are not wrapped, so a duration longer than 99 hours simply gets a
/// wider hour field.
pub fn time_to_string(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let magnitude = seconds.unsigned_abs();
    let secs = magnitude % 60;
    let minutes = (magnitude / 60) % 60;
    let hours = magnitude / 3600;
    format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, secs)
}

/// Formats a Unix timestamp as the local wall-clock time `HH:MM:SS`.
///
/// Returns an empty string for timestamps outside chrono's range.
pub fn epoch_time_to_string(epoch_seconds: i64) -> String {
    match Local.timestamp_opt(epoch_seconds, 0).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positive_durations() {
        assert_eq!(time_to_string(3661), "01:01:01");
        assert_eq!(time_to_string(5), "00:00:05");
        assert_eq!(time_to_string(0), "00:00:00");
        assert_eq!(time_to_string(100 * 3600), "100:00:00");
    }

    #[test]
    fn formats_negative_durations_with_sign() {
        assert_eq!(time_to_string(-5), "-00:00:05");
        assert_eq!(time_to_string(-3661), "-01:01:01");
    }

    #[test]
    fn wall_clock_has_three_fields() {
        let s = epoch_time_to_string(1_700_000_000);
        assert_eq!(s.len(), 8);
        assert_eq!(s.matches(':').count(), 2);
    }

    #[test]
    fn pads_single_digits() {
        assert_eq!(pad_number(7), "07");
        assert_eq!(pad_number(42), "42");
        assert_eq!(pad_number(123), "123");
    }
}
