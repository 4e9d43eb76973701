// End-to-end tests: a real listener on 127.0.0.1, raw HTTP/1.1 over TCP

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, LocalSet};

use super::{bind_listener, run, start_server_loop};
use crate::config::{AppState, CollisionPolicy, Config, FaultPolicy, Overrides};
use crate::error::RelayError;

struct TestServer {
    addr: SocketAddr,
    logs: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), RelayError>>,
}

impl TestServer {
    fn files(&self) -> Vec<PathBuf> {
        list_files(self.logs.path())
    }

    async fn stop(mut self) -> Result<(), RelayError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap()
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

fn test_config(logs: &Path) -> Config {
    let overrides = Overrides {
        host: Some("127.0.0.1".to_string()),
        port: Some(0),
        logs_dir: Some(logs.to_str().unwrap().to_string()),
        ..Overrides::default()
    };
    let mut cfg = Config::load_from("does-not-exist/post_logger", &overrides).unwrap();
    cfg.server.shutdown_grace = 1;
    cfg
}

/// Must be called inside a `LocalSet`
fn start(configure: impl FnOnce(&mut Config)) -> TestServer {
    let logs = tempfile::tempdir().unwrap();
    let mut cfg = test_config(logs.path());
    configure(&mut cfg);

    let listener = bind_listener(cfg.get_socket_addr().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(&cfg));

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::task::spawn_local(start_server_loop(listener, state, async move {
        let _ = rx.await;
    }));

    TestServer {
        addr,
        logs,
        shutdown: Some(tx),
        handle,
    }
}

fn post(body: &[u8]) -> Vec<u8> {
    let mut req = format!(
        "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    req.extend_from_slice(body);
    req
}

/// Send raw request bytes and read until the server closes the connection
async fn exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf)).await;
    assert!(read.is_ok(), "server did not close the connection");
    String::from_utf8_lossy(&buf).into_owned()
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or("")
}

#[tokio::test]
async fn test_post_hello_world() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});

            let resp = exchange(server.addr, &post(b"hello world")).await;
            assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
            assert!(resp.to_ascii_lowercase().contains("content-type: text/html"));

            let files = server.files();
            assert_eq!(files.len(), 1);
            let name = files[0].file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("socket_server.") && name.ends_with(".log"));
            assert_eq!(std::fs::read(&files[0]).unwrap(), b"hello world");

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_empty_body_creates_empty_file() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});

            let resp = exchange(server.addr, &post(b"")).await;
            assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");

            let files = server.files();
            assert_eq!(files.len(), 1);
            assert_eq!(std::fs::metadata(&files[0]).unwrap().len(), 0);

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_binary_body_is_stored_verbatim() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});
            let body: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

            let resp = exchange(server.addr, &post(&body)).await;
            assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
            assert_eq!(std::fs::read(&server.files()[0]).unwrap(), body);

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_suffix_policy_keeps_every_body() {
    LocalSet::new()
        .run_until(async {
            let server = start(|cfg| cfg.storage.collision = CollisionPolicy::Suffix);

            for body in [&b"first"[..], b"second", b"third"] {
                let resp = exchange(server.addr, &post(body)).await;
                assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
            }

            let mut stored: Vec<Vec<u8>> = server
                .files()
                .iter()
                .map(|p| std::fs::read(p).unwrap())
                .collect();
            stored.sort();
            assert_eq!(stored, vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]);

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_missing_length_responds_411_without_file() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});

            let req = b"POST / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
            let resp = exchange(server.addr, req).await;
            assert!(status_line(&resp).starts_with("HTTP/1.1 411"));
            assert!(server.files().is_empty());

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_missing_length_drop_policy_sends_nothing() {
    LocalSet::new()
        .run_until(async {
            let server = start(|cfg| cfg.http.fault_policy = FaultPolicy::Drop);

            let req = b"POST / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
            let resp = exchange(server.addr, req).await;
            assert!(resp.is_empty(), "unexpected response: {resp}");
            assert!(server.files().is_empty());

            // The server keeps serving after a dropped request
            let resp = exchange(server.addr, &post(b"still up")).await;
            assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");
            assert_eq!(server.files().len(), 1);

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_exit_policy_stops_server() {
    LocalSet::new()
        .run_until(async {
            let server = start(|cfg| cfg.http.fault_policy = FaultPolicy::Exit);
            let addr = server.addr;

            let req = b"POST / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
            let resp = exchange(addr, req).await;
            assert!(resp.is_empty());

            let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
                .await
                .expect("server did not stop")
                .unwrap();
            assert!(matches!(result, Err(RelayError::Fatal(_))));
            assert!(TcpStream::connect(addr).await.is_err());
        })
        .await;
}

const NON_NUMERIC_LENGTH: &[u8] =
    b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: abc\r\nConnection: close\r\n\r\nhello";

#[tokio::test]
async fn test_non_numeric_length_is_rejected_by_parser() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});

            let resp = exchange(server.addr, NON_NUMERIC_LENGTH).await;
            assert!(status_line(&resp).starts_with("HTTP/1.1 400"), "unexpected response: {resp}");
            assert!(server.files().is_empty());

            let resp = exchange(server.addr, &post(b"still up")).await;
            assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_non_numeric_length_exit_policy_stops_server() {
    LocalSet::new()
        .run_until(async {
            let server = start(|cfg| cfg.http.fault_policy = FaultPolicy::Exit);
            let addr = server.addr;

            let _ = exchange(addr, NON_NUMERIC_LENGTH).await;

            let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
                .await
                .expect("server did not stop")
                .unwrap();
            assert!(matches!(result, Err(RelayError::Fatal(_))));
            assert!(server.logs.path().read_dir().unwrap().next().is_none());
            assert!(TcpStream::connect(addr).await.is_err());
        })
        .await;
}

#[tokio::test]
async fn test_short_read_writes_no_file() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});

            let mut stream = TcpStream::connect(server.addr).await.unwrap();
            stream
                .write_all(b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 20\r\n\r\nshort")
                .await
                .unwrap();
            stream.shutdown().await.unwrap();

            let mut buf = Vec::new();
            let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf)).await;
            let resp = String::from_utf8_lossy(&buf);
            assert!(status_line(&resp).starts_with("HTTP/1.1 400"), "unexpected response: {resp}");
            assert!(server.files().is_empty());

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    LocalSet::new()
        .run_until(async {
            let server = start(|cfg| cfg.http.max_body_size = Some(4));

            // Body bytes are never sent: the limit is checked against the header
            let req = b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\nConnection: close\r\n\r\n";
            let resp = exchange(server.addr, req).await;
            assert!(status_line(&resp).starts_with("HTTP/1.1 413"));
            assert!(server.files().is_empty());

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_get_is_not_allowed() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});

            let req = b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
            let resp = exchange(server.addr, req).await;
            assert!(status_line(&resp).starts_with("HTTP/1.1 405"));
            assert!(resp.to_ascii_lowercase().contains("allow: post"));
            assert!(server.files().is_empty());

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_sequential_mode_serves_in_accept_order() {
    LocalSet::new()
        .run_until(async {
            let server = start(|cfg| {
                cfg.server.sequential = true;
                cfg.storage.collision = CollisionPolicy::Suffix;
            });

            // First client sends headers and only part of its body
            let mut slow = TcpStream::connect(server.addr).await.unwrap();
            slow.write_all(b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4\r\n\r\nsl")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;

            // Second client is not served while the first one stalls
            let addr = server.addr;
            let fast = tokio::task::spawn_local(async move { exchange(addr, &post(b"fast")).await });
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert!(!fast.is_finished());
            assert!(server.files().is_empty());

            slow.write_all(b"ow").await.unwrap();
            let mut buf = Vec::new();
            slow.read_to_end(&mut buf).await.unwrap();
            assert!(String::from_utf8_lossy(&buf).starts_with("HTTP/1.1 200 OK"));

            let resp = fast.await.unwrap();
            assert_eq!(status_line(&resp), "HTTP/1.1 200 OK");

            let mut stored: Vec<Vec<u8>> = server
                .files()
                .iter()
                .map(|p| std::fs::read(p).unwrap())
                .collect();
            stored.sort();
            assert_eq!(stored, vec![b"fast".to_vec(), b"slow".to_vec()]);

            server.stop().await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_shutdown_releases_socket() {
    LocalSet::new()
        .run_until(async {
            let server = start(|_| {});
            let addr = server.addr;

            server.stop().await.unwrap();
            assert!(TcpStream::connect(addr).await.is_err());
        })
        .await;
}

#[tokio::test]
async fn test_port_in_use_fails_before_serving() {
    let holder = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let taken = holder.local_addr().unwrap();

    let logs = tempfile::tempdir().unwrap();
    let mut cfg = test_config(logs.path());
    cfg.server.port = taken.port();

    let result = tokio::time::timeout(Duration::from_secs(5), run(cfg))
        .await
        .expect("run entered the serve loop");
    assert!(matches!(result, Err(RelayError::BindFault { .. })));
}

#[tokio::test]
async fn test_fatal_fault_wins_over_queued_connection() {
    LocalSet::new()
        .run_until(async {
            let logs = tempfile::tempdir().unwrap();
            let cfg = test_config(logs.path());
            let listener = bind_listener(cfg.get_socket_addr().unwrap()).unwrap();
            let addr = listener.local_addr().unwrap();
            let state = Arc::new(AppState::new(&cfg));

            // Connection sits in the accept queue when the loop starts
            let mut queued = TcpStream::connect(addr).await.unwrap();
            queued.write_all(&post(b"too late")).await.unwrap();
            state.raise_fatal("earlier request fault".to_string());

            let result = start_server_loop(listener, Arc::clone(&state), std::future::pending::<()>()).await;
            assert!(matches!(result, Err(RelayError::Fatal(reason)) if reason == "earlier request fault"));

            let mut buf = Vec::new();
            let _ = tokio::time::timeout(Duration::from_secs(5), queued.read_to_end(&mut buf)).await;
            assert!(!String::from_utf8_lossy(&buf).starts_with("HTTP/1.1 200"));
            assert!(list_files(logs.path()).is_empty());
        })
        .await;
}
