//! Formatting helpers shared across UIs.

use chrono::{DateTime, Local, Utc};

/// Format a timestamp in the local timezone (e.g., "2025-01-15 11:30:00").
pub fn format_local_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    format_relative_time_from(ts, Utc::now())
}

fn format_relative_time_from(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Shorten a long address for headers ("0x1234…abcd").
pub fn abbreviate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 14 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time_from(now + Duration::seconds(5), now), "just now");
        assert_eq!(format_relative_time_from(now - Duration::seconds(30), now), "30s ago");
        assert_eq!(format_relative_time_from(now - Duration::minutes(2), now), "2m ago");
        assert_eq!(format_relative_time_from(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time_from(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_relative_time_from(now - Duration::days(30), now), "May 02");
    }

    #[test]
    fn test_local_timestamp_shape() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        let formatted = format_local_timestamp(ts);
        assert_eq!(formatted.len(), "2025-01-15 10:30:00".len());
        assert!(formatted.ends_with(":00"));
    }

    #[test]
    fn test_abbreviate_address() {
        assert_eq!(
            abbreviate_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234…5678"
        );
        assert_eq!(abbreviate_address("0xABC"), "0xABC");
    }
}
