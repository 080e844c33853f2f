//! Human-readable formatting for sizes and upload timestamps.

use chrono::{DateTime, Datelike, Duration, Utc};

const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count with binary (1024) steps, e.g. `1536 -> "1.5 KB"`.
///
/// Trailing zeros are dropped, so exact multiples print without decimals.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut rendered = format!("{:.*}", decimals, value);
    if rendered.contains('.') {
        rendered = rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }
    format!("{} {}", rendered, UNITS[unit])
}

/// Relative label for an upload time: "Today at 14:05", "Yesterday at 09:30",
/// "Mar 4" within the current year, "Mar 4, 2023" otherwise.
pub fn format_upload_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let day = at.date_naive();
    let today = now.date_naive();

    if day == today {
        return format!("Today at {}", at.format("%H:%M"));
    }
    if today
        .checked_sub_signed(Duration::days(1))
        .is_some_and(|yesterday| yesterday == day)
    {
        return format!("Yesterday at {}", at.format("%H:%M"));
    }
    if day.year() == today.year() {
        return at.format("%b %-d").to_string();
    }
    at.format("%b %-d, %Y").to_string()
}

/// Share of the quota in use, as a percentage capped at 100.
pub fn storage_usage_percent(used: u64, limit: u64) -> Option<f64> {
    if limit == 0 {
        return None;
    }
    Some(((used as f64 / limit as f64) * 100.0).min(100.0))
}
