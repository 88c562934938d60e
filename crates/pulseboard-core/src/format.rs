//! Human-readable timestamps and durations for the views.

use chrono::{DateTime, Utc};

/// "just now", "5m ago", "3h ago", "2d ago", then the calendar date
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - ts).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    ts.format("%Y-%m-%d").to_string()
}

/// "now", "in 5m", "in 3h", "in 2d", then the calendar date
pub fn time_until(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (ts - now).num_seconds();
    if secs <= 0 {
        return "now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("in {}m", mins.max(1));
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("in {}h", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("in {}d", days);
    }
    ts.format("%Y-%m-%d").to_string()
}

pub fn format_duration(ms: u64) -> String {
    if ms == 0 {
        return String::new();
    }
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    format!("{}m {}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_time() {
        let now = now();
        assert_eq!(relative_time(now - Duration::seconds(30), now), "just now");
        assert_eq!(relative_time(now + Duration::seconds(30), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(relative_time(now - Duration::days(10), now), "2026-03-05");
    }

    #[test]
    fn test_time_until() {
        let now = now();
        assert_eq!(time_until(now - Duration::minutes(1), now), "now");
        assert_eq!(time_until(now + Duration::seconds(20), now), "in 1m");
        assert_eq!(time_until(now + Duration::minutes(45), now), "in 45m");
        assert_eq!(time_until(now + Duration::hours(23), now), "in 23h");
        assert_eq!(time_until(now + Duration::days(6), now), "in 6d");
        assert_eq!(time_until(now + Duration::days(30), now), "2026-04-14");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "");
        assert_eq!(format_duration(4_500), "4s");
        assert_eq!(format_duration(125_000), "2m 5s");
    }
}
