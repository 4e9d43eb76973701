//! HTTP response building module
//!
//! The success response is fixed and never derived from the request.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::error::RelayError;

/// Content type of the (empty) success response
pub const OK_CONTENT_TYPE: &str = "text/html";

/// Build the 200 reply sent once a body has been persisted
pub fn build_ok_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", OK_CONTENT_TYPE)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "POST")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build the error reply for a request fault under the `respond` policy
pub fn build_fault_response(err: &RelayError) -> Response<Full<Bytes>> {
    let status = err.status_code();
    let body = format!("{status} {}\n", err.kind());

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Connection", "close")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            let mut resp = Response::new(Full::new(Bytes::new()));
            *resp.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
