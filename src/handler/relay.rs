//! POST body relay
//!
//! Turns one POST request into one file under the logs directory and one
//! response. Request faults are routed through the configured fault policy.

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Method, Request, Response};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppState, FaultPolicy};
use crate::error::{RelayError, Result};
use crate::http::{self, headers};
use crate::logger::{self, AccessLogEntry};

pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>> {
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().to_string(),
    );
    entry.http_version = version_label(req.version()).to_string();

    if *req.method() != Method::POST {
        logger::log_warning(&format!("Method not allowed: {}", req.method()));
        let resp = http::build_405_response();
        finish(&state, entry, resp.status().as_u16(), started);
        return Ok(resp);
    }

    match relay_body(req, &state, &mut entry).await {
        Ok(_) => {
            let resp = http::build_ok_response();
            finish(&state, entry, resp.status().as_u16(), started);
            Ok(resp)
        }
        Err(err) => {
            let policy = state.config.http.fault_policy;
            logger::log_fault(&err, policy.as_str());
            match policy {
                FaultPolicy::Respond => {
                    let resp = http::build_fault_response(&err);
                    finish(&state, entry, resp.status().as_u16(), started);
                    Ok(resp)
                }
                FaultPolicy::Drop => {
                    finish(&state, entry, 0, started);
                    Err(err)
                }
                FaultPolicy::Exit => {
                    finish(&state, entry, 0, started);
                    state.raise_fatal(err.to_string());
                    Err(err)
                }
            }
        }
    }
}

/// Read exactly `Content-Length` bytes and persist them.
/// Nothing touches the filesystem until the whole body is in memory.
async fn relay_body(
    req: Request<Incoming>,
    state: &AppState,
    entry: &mut AccessLogEntry,
) -> Result<PathBuf> {
    let content_type = headers::content_type(req.headers());
    entry.content_type = content_type.as_ref().map(|ct| ct.value.clone());

    let length = headers::content_length(req.headers())?;
    entry.content_length = Some(length);

    if let Some(max) = state.config.http.max_body_size {
        if length > max {
            return Err(RelayError::BodyTooLarge {
                declared: length,
                max,
            });
        }
    }

    logger::log_request_info(entry.content_type.as_deref(), length);

    let body = read_body(req.into_body(), length).await?;
    let path = state.store.persist(&body).await?;
    logger::log_body_persisted(&path, body.len());

    entry.file = Some(path.display().to_string());
    Ok(path)
}

async fn read_body(body: Incoming, expected: u64) -> Result<Bytes> {
    let bytes = body
        .collect()
        .await
        .map_err(|e| RelayError::ShortRead {
            expected,
            reason: e.to_string(),
        })?
        .to_bytes();

    if bytes.len() as u64 != expected {
        return Err(RelayError::ShortRead {
            expected,
            reason: format!("received {} bytes", bytes.len()),
        });
    }
    Ok(bytes)
}

fn finish(state: &AppState, mut entry: AccessLogEntry, status: u16, started: Instant) {
    if !state.config.logging.access_log {
        return;
    }
    entry.status = status;
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    logger::log_access(&entry, &state.config.logging.access_log_format);
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
