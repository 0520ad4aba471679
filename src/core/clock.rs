use chrono::{DateTime, Local};
use std::fmt::Write;

/// Source of wall-clock time for record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Render a timestamp with a strftime-style pattern.
///
/// Falls back to RFC 3339 when the pattern contains unknown specifiers.
pub fn format_timestamp(at: &DateTime<Local>, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", at.format(pattern)).is_err() {
        return at.to_rfc3339();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_locale_style() {
        let at = Local.with_ymd_and_hms(2024, 1, 5, 9, 4, 3).unwrap();
        assert_eq!(format_timestamp(&at, "%Y/%-m/%-d %-H:%M:%S"), "2024/1/5 9:04:03");
    }

    #[test]
    fn test_format_timestamp_invalid_pattern_falls_back() {
        let at = Local.with_ymd_and_hms(2024, 1, 5, 9, 4, 3).unwrap();
        assert_eq!(format_timestamp(&at, "%Q"), at.to_rfc3339());
    }

    #[test]
    fn test_fixed_clock() {
        let at = Local.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(FixedClock(at).now(), at);
    }
}
