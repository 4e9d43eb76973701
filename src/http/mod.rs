//! HTTP protocol layer module
//!
//! Header parsing and response builders, kept apart from the handler logic.

pub mod headers;
pub mod response;

// Re-export commonly used types
pub use response::{build_405_response, build_fault_response, build_ok_response};
