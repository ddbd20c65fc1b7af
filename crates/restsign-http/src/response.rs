//! Responses produced by the signing layer itself.

use bytes::Bytes;
use restsign_auth::SignError;

use crate::trace::TraceContext;

/// Header reporting which server instance answered.
pub const SERVER_HEADER: &str = "Rest-Server";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Convert a [`SignError`] into its plain-text rejection response.
///
/// # Examples
///
/// ```
/// use restsign_auth::SignError;
/// use restsign_http::response::rejection_response;
///
/// let response = rejection_response(&SignError::SignatureMissing);
/// assert_eq!(response.status().as_u16(), 416);
/// assert_eq!(response.body().as_ref(), b"signature missed");
/// ```
#[must_use]
pub fn rejection_response(err: &SignError) -> http::Response<Bytes> {
    let mut response = http::Response::new(Bytes::from_static(err.reason().as_bytes()));
    *response.status_mut() = err.status();
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(TEXT_PLAIN),
    );
    response
}

/// Produce a health check response.
#[must_use]
pub fn health_check_response() -> http::Response<Bytes> {
    let body = serde_json::json!({ "status": "running", "service": "restsign" });
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_string()))
        .expect("static health response should be valid")
}

/// Echo the trace id and report the server identity on a response.
pub fn add_common_headers(
    response: &mut http::Response<Bytes>,
    trace: &TraceContext,
    trace_header: &str,
    server_name: &str,
) {
    let headers = response.headers_mut();

    if let (Ok(name), Ok(value)) = (
        http::HeaderName::from_bytes(trace_header.as_bytes()),
        http::HeaderValue::from_str(trace.trace_id().as_str()),
    ) {
        headers.insert(name, value);
    }

    if let Ok(value) = http::HeaderValue::from_str(server_name) {
        headers.insert(SERVER_HEADER, value);
    }
}
