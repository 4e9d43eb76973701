//! Logger module
//!
//! Provides logging utilities for the relay including:
//! - Server lifecycle logging
//! - Per-request content-type/content-length lines
//! - Access logging with multiple formats
//! - Error and warning logging, optionally to files

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::error::RelayError;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

/// Severity, lower is more severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" | "trace" => Some(Self::Debug),
            _ => None,
        }
    }
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

fn enabled(level: Level) -> bool {
    level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = Level::parse(&config.logging.level).unwrap_or(Level::Info);
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);

    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )?;

    if Level::parse(&config.logging.level).is_none() {
        log_warning(&format!(
            "Unknown log level '{}', using info",
            config.logging.level
        ));
    }
    Ok(())
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info(&format!("Starting HTTP server on {addr}"));
    if enabled(Level::Debug) {
        write_info(&format!("[CONFIG] Logs directory: {}", config.storage.dir));
        write_info(&format!(
            "[CONFIG] Collision policy: {}",
            config.storage.collision.as_str()
        ));
        write_info(&format!(
            "[CONFIG] Fault policy: {}",
            config.http.fault_policy.as_str()
        ));
        write_info(&format!(
            "[CONFIG] Serving model: {}",
            if config.server.sequential {
                "sequential"
            } else {
                "task per connection"
            }
        ));
    }
}

/// One line per request, emitted before the body is read
pub fn log_request_info(content_type: Option<&str>, content_length: u64) {
    if enabled(Level::Info) {
        write_info(&request_info_line(content_type, content_length));
    }
}

pub fn request_info_line(content_type: Option<&str>, content_length: u64) -> String {
    format!(
        "content-type: {}; content-length: {content_length}",
        content_type.unwrap_or("-")
    )
}

pub fn log_body_persisted(path: &Path, len: usize) {
    if enabled(Level::Debug) {
        write_info(&format!("[Store] Wrote {len} bytes to {}", path.display()));
    }
}

pub fn log_fault(err: &RelayError, policy: &str) {
    write_error(&format!("[ERROR] {}: {err} (fault policy: {policy})", err.kind()));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    if enabled(Level::Debug) {
        write_info(&format!("[Connection] Accepted from: {peer_addr}"));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(Level::Info) {
        write_info(message);
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_bind_failed(err: &RelayError) {
    log_error(&err.to_string());
}

pub fn log_shutdown(reason: &str, in_flight: usize) {
    write_info(&format!(
        "[Shutdown] {reason}; socket closed, {in_flight} connection(s) in flight"
    ));
}
