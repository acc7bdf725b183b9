//! Track duration formatting
//!
//! The label's metadata sheets write durations as `M.SS` (minutes, a dot,
//! zero-padded seconds), e.g. 3 minutes 7 seconds is `3.07`. Fractions of a
//! second are truncated, never rounded up.

/// Format seconds as `M.SS`
///
/// Negative and non-finite inputs are treated as zero.
///
/// # Examples
///
/// ```
/// use relm_common::human_time::format_minutes_seconds;
///
/// assert_eq!(format_minutes_seconds(187.9), "3.07");
/// assert_eq!(format_minutes_seconds(59.0), "0.59");
/// assert_eq!(format_minutes_seconds(3600.0), "60.00");
/// ```
pub fn format_minutes_seconds(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    format!("{}.{:02}", whole / 60, whole % 60)
}

/// Round a duration to hundredths of a second, as stored in the session
pub fn round_hundredths(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative() {
        assert_eq!(format_minutes_seconds(0.0), "0.00");
        assert_eq!(format_minutes_seconds(-12.0), "0.00");
        assert_eq!(format_minutes_seconds(f64::NAN), "0.00");
    }

    #[test]
    fn test_truncates_fraction() {
        assert_eq!(format_minutes_seconds(120.99), "2.00");
        assert_eq!(format_minutes_seconds(61.5), "1.01");
    }

    #[test]
    fn test_long_tracks_keep_counting_minutes() {
        assert_eq!(format_minutes_seconds(754.0), "12.34");
    }

    #[test]
    fn test_round_hundredths() {
        assert_eq!(round_hundredths(187.456), 187.46);
        assert_eq!(round_hundredths(2.0), 2.0);
    }
}
