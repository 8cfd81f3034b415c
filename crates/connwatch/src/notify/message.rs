use chrono::{DateTime, TimeDelta, Utc};

use crate::SUBJECT_TAG;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f UTC";

/// A composed subject + body pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

pub fn down_notification(down_at: DateTime<Utc>, reason: &str) -> Notification {
    Notification {
        subject: format!("{SUBJECT_TAG} Connection appears DOWN"),
        body: format!(
            "Connection appears to be down since {} ({reason})",
            format_timestamp(down_at)
        ),
    }
}

pub fn up_notification(down_at: DateTime<Utc>, up_at: DateTime<Utc>) -> Notification {
    Notification {
        subject: format!("{SUBJECT_TAG} Connection appears UP"),
        body: format!(
            "It was down since {} and lasted for {}",
            format_timestamp(down_at),
            format_duration(up_at - down_at)
        ),
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// Compact human duration, e.g. `1h2m3.5s`. Negative spans render as `0s`.
pub fn format_duration(span: TimeDelta) -> String {
    let total_ms = span.num_milliseconds().max(0);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if millis == 0 {
        out.push_str(&format!("{seconds}s"));
    } else {
        let fraction = format!("{millis:03}");
        out.push_str(&format!("{seconds}.{}s", fraction.trim_end_matches('0')));
    }
    out
}
