//! Error types for the relay.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;

/// Every way a request or the server itself can fail.
#[derive(Error, Debug)]
pub enum RelayError {
    /// `Content-Length` missing or not a base-10 integer.
    #[error("malformed Content-Length: {0}")]
    MalformedLength(String),

    /// Declared length exceeds `http.max_body_size`.
    #[error("request body too large: {declared} bytes (max: {max})")]
    BodyTooLarge { declared: u64, max: u64 },

    /// The connection ended or failed before the declared bytes arrived.
    #[error("short read: expected {expected} bytes, {reason}")]
    ShortRead { expected: u64, reason: String },

    /// The body could not be persisted.
    #[error("failed to write {}: {source}", .path.display())]
    FilesystemFault {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The listening socket could not be set up.
    #[error("failed to bind {addr}: {source}")]
    BindFault {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Host and port do not form a socket address.
    #[error("invalid address {0}")]
    InvalidAddress(String),

    /// A request fault stopped the server under the `exit` fault policy.
    #[error("server stopped after fatal request fault: {0}")]
    Fatal(String),
}

impl RelayError {
    /// Status code sent when the fault is answered instead of dropped.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MalformedLength(_) => 411,
            Self::BodyTooLarge { .. } => 413,
            Self::ShortRead { .. } => 400,
            Self::FilesystemFault { .. }
            | Self::BindFault { .. }
            | Self::InvalidAddress(_)
            | Self::Fatal(_) => 500,
        }
    }

    /// Short name used in log lines.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedLength(_) => "MalformedLength",
            Self::BodyTooLarge { .. } => "BodyTooLarge",
            Self::ShortRead { .. } => "ShortRead",
            Self::FilesystemFault { .. } => "FilesystemFault",
            Self::BindFault { .. } => "BindFault",
            Self::InvalidAddress(_) => "InvalidAddress",
            Self::Fatal(_) => "Fatal",
        }
    }
}
