use chrono::{DateTime, Utc};

pub fn time_millis() -> i64 {
    let time: DateTime<chrono::Utc> = Utc::now();
    time.timestamp_millis()
}

/// Milliseconds in a trailing 24 hour window, used by the alert rules.
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;
