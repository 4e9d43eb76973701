// Server loop module
// Accepts connections until shutdown, then releases the socket and drains

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::{serve_connection, try_admit};
use crate::config::AppState;
use crate::error::RelayError;
use crate::logger;

/// Why the accept loop stopped
enum Stop {
    Signal,
    Fatal,
}

/// Accept loop.
///
/// Sequential mode awaits each connection before accepting the next, so
/// requests are handled strictly in accept order. Otherwise every connection
/// runs in its own task on the current `LocalSet`.
///
/// Returns `Ok(())` when `shutdown` resolves and `RelayError::Fatal` when a
/// handler raised a fatal fault.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RelayError> {
    tokio::pin!(shutdown);
    let sequential = state.config.server.sequential;

    let stop = loop {
        // Stop conditions are polled first so a queued connection is never
        // served after a fatal fault
        let (stream, peer_addr) = tokio::select! {
            biased;
            () = state.fatal_signal.notified() => break Stop::Fatal,
            () = &mut shutdown => break Stop::Signal,
            accept_result = listener.accept() => match accept_result {
                Ok(conn) => conn,
                Err(e) => {
                    logger::log_error(&format!("Failed to accept connection: {e}"));
                    continue;
                }
            },
        };

        let Some(guard) = try_admit(&state, &peer_addr) else {
            drop(stream);
            continue;
        };

        let conn = serve_connection(stream, peer_addr, Arc::clone(&state), guard);
        if sequential {
            tokio::select! {
                () = conn => {}
                () = &mut shutdown => break Stop::Signal,
            }
        } else {
            tokio::task::spawn_local(conn);
        }
    };

    // Stop accepting and release the bound socket before draining
    drop(listener);

    match stop {
        Stop::Signal => {
            logger::log_shutdown("Shutdown requested", state.connection_count());
            drain(&state).await;
            Ok(())
        }
        Stop::Fatal => {
            let reason = state
                .fatal_reason()
                .unwrap_or_else(|| "unknown fault".to_string());
            logger::log_shutdown(&format!("Fatal fault: {reason}"), state.connection_count());
            Err(RelayError::Fatal(reason))
        }
    }
}

/// Wait for in-flight connections, at most `server.shutdown_grace` seconds
async fn drain(state: &AppState) {
    let deadline =
        tokio::time::Instant::now() + Duration::from_secs(state.config.server.shutdown_grace);

    while state.connection_count() > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Grace period elapsed with {} connection(s) still open",
                state.connection_count()
            ));
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
