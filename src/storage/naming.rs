//! Log file naming
//!
//! Files are named `<prefix>.<YYYY-MM-DD_HH-MM-SS>.log` from local time at
//! second resolution. A sequence number is only inserted by the `suffix`
//! collision policy: `<prefix>.<timestamp>.<n>.log`.

use chrono::{DateTime, Local};

/// strftime pattern for the timestamp part of a file name
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub const EXTENSION: &str = "log";

pub fn timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn file_name(prefix: &str, at: &DateTime<Local>, seq: Option<u32>) -> String {
    let ts = timestamp(at);
    match seq {
        Some(n) => format!("{prefix}.{ts}.{n}.{EXTENSION}"),
        None => format!("{prefix}.{ts}.{EXTENSION}"),
    }
}
