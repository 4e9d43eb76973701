// Connection module
// Admission control and serving of a single TCP connection

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppState, FaultPolicy};
use crate::handler;
use crate::logger;

/// Holds one slot of the active connection count; released on drop,
/// including when a connection future is cancelled at shutdown.
pub struct ConnectionGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Count a new connection, or refuse it when `max_connections` is reached.
pub fn try_admit(state: &AppState, peer_addr: &SocketAddr) -> Option<ConnectionGuard> {
    // Increment counter first, then check limit
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            return None;
        }
    }

    logger::log_connection_accepted(peer_addr);
    Some(ConnectionGuard {
        counter: Arc::clone(&state.active_connections),
    })
}

/// Serve one admitted connection to completion.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive (always off when serving sequentially)
/// 3. Serves the connection with the relay handler
/// 4. Applies the optional connection timeout
/// 5. Releases the connection slot when done
pub async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    _guard: ConnectionGuard,
) {
    let io = TokioIo::new(stream);

    // A kept-alive connection would hold the sequential loop forever
    let keep_alive = state.config.performance.keep_alive && !state.config.server.sequential;
    let mut builder = http1::Builder::new();
    builder.keep_alive(keep_alive);

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
    );

    match state.config.performance.connection_timeout {
        Some(secs) => {
            let limit = Duration::from_secs(secs);
            match tokio::time::timeout(limit, conn).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => connection_failed(&state, &err),
                Err(_) => logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {secs} seconds"
                )),
            }
        }
        None => {
            if let Err(err) = conn.await {
                connection_failed(&state, &err);
            }
        }
    }
}

/// Malformed requests are rejected by hyper before the handler sees them
/// (for example a non-numeric `Content-Length`). hyper has already answered
/// 400, but the `exit` policy must still stop the server.
fn connection_failed(state: &AppState, err: &hyper::Error) {
    logger::log_connection_error(err);
    if err.is_parse() && state.config.http.fault_policy == FaultPolicy::Exit {
        state.raise_fatal(format!("malformed request: {err}"));
    }
}
