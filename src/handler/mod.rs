//! Request handler module
//!
//! A single handler: every POST body becomes one file on disk.

pub mod relay;

// Re-export main entry point
pub use relay::handle_request;
