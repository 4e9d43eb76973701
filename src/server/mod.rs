// Server module entry point
// Binds the listener, builds shared state and runs the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::config::{AppState, Config};
use crate::error::RelayError;
use crate::logger;

pub use listener::bind_listener;
pub use server_loop::start_server_loop;

/// Bind the configured address and serve until SIGINT/SIGTERM.
///
/// Fails with `BindFault` before entering the loop when the address is
/// unavailable. Must run inside a `LocalSet`.
pub async fn run(config: Config) -> Result<(), RelayError> {
    let addr = config.get_socket_addr()?;
    let listener = bind_listener(addr)?;

    let state = Arc::new(AppState::new(&config));
    if !state.store.dir_exists() {
        logger::log_warning(&format!(
            "Logs directory '{}' does not exist; request bodies cannot be stored until it is created",
            state.store.dir().display()
        ));
    }

    logger::log_server_start(&addr, &config);
    start_server_loop(listener, state, signal::shutdown_signal()).await
}
