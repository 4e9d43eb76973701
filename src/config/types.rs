// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Serve one connection at a time, in accept order
    pub sequential: bool,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_grace: u64,
}

/// Where and how request bodies are written
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Target directory, must already exist
    pub dir: String,
    /// File name prefix, e.g. `socket_server` in `socket_server.<ts>.log`
    pub prefix: String,
    pub collision: CollisionPolicy,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub fault_policy: FaultPolicy,
    /// Upper bound on the declared Content-Length (unbounded if not set)
    pub max_body_size: Option<u64>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Per-connection timeout in seconds (no timeout if not set)
    pub connection_timeout: Option<u64>,
    pub max_connections: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}

/// What to do when two requests map to the same file name
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Truncate and rewrite; the later request wins
    Overwrite,
    /// Append `.1`, `.2`, ... before the extension until the name is free
    Suffix,
}

impl CollisionPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Suffix => "suffix",
        }
    }
}

/// Reaction to a request-level fault (bad length, short read, write failure)
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Reply with an error status and keep serving
    Respond,
    /// Tear the connection down without a response
    Drop,
    /// Tear the connection down and stop the server
    Exit,
}

impl FaultPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Respond => "respond",
            Self::Drop => "drop",
            Self::Exit => "exit",
        }
    }
}
