//! Elapsed-time formatting for the status display.

use crate::types::Timestamp;

/// Format a number of seconds as `H h M m S s`, dropping leading zero units.
///
/// Examples: `45s`, `2m 5s`, `1h 1m 5s`, `1h 0m 0s`. `None` and negative
/// durations render as `N/A`.
pub fn format_duration(secs: Option<i64>) -> String {
    let secs = match secs {
        Some(s) if s >= 0 => s,
        _ => return "N/A".to_string(),
    };

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Elapsed seconds for an execution: `now - started_at` while in progress,
/// `ended_at - started_at` once terminal. `None` when the start time is
/// unknown.
pub fn elapsed_secs(
    started_at: Option<Timestamp>,
    ended_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<i64> {
    let start = started_at?;
    let end = ended_at.unwrap_or(now);
    Some(end.signed_duration_since(start).num_seconds())
}
