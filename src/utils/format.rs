use chrono::{DateTime, Utc};

const HASHRATE_UNITS: [&str; 6] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s"];

pub fn format_hashrate(hashes_per_sec: i64) -> String {
    let mut value = hashes_per_sec as f64;
    if value.abs() < 1_000.0 {
        return format!("{} H/s", hashes_per_sec);
    }
    let mut unit = 0;
    while value.abs() >= 1_000.0 && unit < HASHRATE_UNITS.len() - 1 {
        value /= 1_000.0;
        unit += 1;
    }
    format!("{:.2} {}", value, HASHRATE_UNITS[unit])
}

/// Groups digits in threes, e.g. `1234567` -> `1,234,567`.
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_timestamp_ms(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => millis.to_string(),
    }
}

/// Compact remaining time, e.g. `5d 0h 0m`. Leading zero units are dropped;
/// anything under a minute is shown in seconds.
pub fn format_countdown(millis: i64) -> String {
    let secs = millis.max(0) / 1_000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Age of `then` as seen from `now`, both unix millis.
pub fn format_ago(now: i64, then: i64) -> String {
    let secs = now.saturating_sub(then) / 1_000;
    if secs <= 0 {
        "just now".to_string()
    } else if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3_600)
    }
}
