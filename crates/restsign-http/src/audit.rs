//! Structured audit logging of signed requests and their responses.
//!
//! Audit records go to the `restsign::audit` target at INFO, keyed by trace id.
//! The canonical string is logged in its abbreviated form only; the sign
//! string never reaches a log. Bodies are logged only for textual content
//! types and capped in length.

use restsign_auth::{Abbreviation, SignatureResult};
use tracing::{Level, info, warn};

use crate::request::content_type;
use crate::trace::TraceContext;

/// Log target of audit records.
pub const AUDIT_TARGET: &str = "restsign::audit";

/// Placeholder for a request body that is not logged.
pub const EMPTY_BODY: &str = "(empty)";

/// Placeholder for a response body that is not logged.
pub const IGNORED_BODY: &str = " ignored";

/// Whether audit records would be emitted at all.
#[must_use]
pub fn audit_enabled() -> bool {
    tracing::enabled!(target: AUDIT_TARGET, Level::INFO)
}

/// Whether a body of this content type is safe to render as text.
///
/// JSON, XML and `text/*` are textual; so is a missing content type.
#[must_use]
pub fn is_textual(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return false;
    };
    let suffix_textual = mime
        .suffix()
        .is_some_and(|suffix| suffix == mime::JSON || suffix == mime::XML);

    mime.type_() == mime::TEXT
        || mime.subtype() == mime::JSON
        || mime.subtype() == mime::XML
        || suffix_textual
}

/// Render a request body for the audit log.
///
/// Empty and non-textual bodies render as [`EMPTY_BODY`].
#[must_use]
pub fn request_body_text(content_type: Option<&str>, body: &[u8], cap: usize) -> String {
    if body.is_empty() || !is_textual(content_type) {
        return EMPTY_BODY.to_owned();
    }
    Abbreviation::new(cap)
        .apply(&String::from_utf8_lossy(body))
        .into_owned()
}

/// Render a response body for the audit log.
///
/// Non-textual and HTML bodies are replaced with a placeholder.
#[must_use]
pub fn response_body_text(content_type: Option<&str>, body: &[u8], cap: usize) -> String {
    if !is_textual(content_type) {
        return IGNORED_BODY.to_owned();
    }
    let text = String::from_utf8_lossy(body);
    if text.contains("<html>") {
        return IGNORED_BODY.to_owned();
    }
    Abbreviation::new(cap).apply(&text).into_owned()
}

/// Render response headers as `name=v1,v2&name=v` followed by the content type.
#[must_use]
pub fn render_headers(headers: &http::HeaderMap) -> String {
    let mut rendered = String::new();
    for name in headers.keys() {
        if name == http::header::CONTENT_TYPE {
            continue;
        }
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .collect();
        rendered.push_str(name.as_str());
        rendered.push('=');
        rendered.push_str(&values.join(","));
        rendered.push('&');
    }
    rendered.push_str("Content-Type=");
    rendered.push_str(content_type(headers).unwrap_or_default());
    rendered
}

/// Record an inbound request.
pub fn log_request(trace: &TraceContext, canonical: &str, body: &str) {
    info!(
        target: AUDIT_TARGET,
        trace_id = %trace.trace_id(),
        started = %trace.started().to_rfc3339(),
        canonical,
        body,
        "request"
    );
}

/// Record the outcome of a signature check.
pub fn log_verification(trace: &TraceContext, result: &SignatureResult) {
    if result.valid {
        info!(
            target: AUDIT_TARGET,
            trace_id = %trace.trace_id(),
            reason = %result.reason,
            "signature verified"
        );
    } else {
        warn!(
            target: AUDIT_TARGET,
            trace_id = %trace.trace_id(),
            reason = %result.reason,
            provided = result.provided.as_deref().unwrap_or_default(),
            "signature rejected"
        );
    }
}

/// Record the response sent for a request.
pub fn log_response(trace: &TraceContext, response: &http::Response<bytes::Bytes>, cap: usize) {
    if !audit_enabled() {
        return;
    }
    let headers = response.headers();
    info!(
        target: AUDIT_TARGET,
        trace_id = %trace.trace_id(),
        status = response.status().as_u16(),
        elapsed_ms = trace.elapsed_ms(),
        headers = %render_headers(headers),
        body = %response_body_text(content_type(headers), response.body(), cap),
        "response"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_classify_textual_content_types() {
        assert!(is_textual(None));
        assert!(is_textual(Some("application/json")));
        assert!(is_textual(Some("application/json; charset=utf-8")));
        assert!(is_textual(Some("application/problem+json")));
        assert!(is_textual(Some("text/plain")));
        assert!(is_textual(Some("application/xml")));
        assert!(!is_textual(Some("image/png")));
        assert!(!is_textual(Some("application/octet-stream")));
        assert!(!is_textual(Some("multipart/form-data; boundary=x")));
    }

    #[test]
    fn test_should_render_request_bodies() {
        assert_eq!(request_body_text(None, b"", 10), EMPTY_BODY);
        assert_eq!(request_body_text(Some("text/plain"), b"hello", 10), "hello");
        assert_eq!(
            request_body_text(Some("application/json"), b"0123456789abc", 10),
            "0123456..."
        );
        assert_eq!(request_body_text(Some("image/png"), b"\x89PNG", 10), EMPTY_BODY);
    }

    #[test]
    fn test_should_ignore_html_and_binary_responses() {
        assert_eq!(
            response_body_text(Some("text/html"), b"<html><body/></html>", 100),
            IGNORED_BODY
        );
        assert_eq!(
            response_body_text(Some("application/octet-stream"), b"\x00", 100),
            IGNORED_BODY
        );
        assert_eq!(response_body_text(Some("application/json"), b"{}", 100), "{}");
    }

    #[test]
    fn test_should_render_headers_with_trailing_content_type() {
        let mut headers = http::HeaderMap::new();
        headers.append("x-a", http::HeaderValue::from_static("1"));
        headers.append("x-a", http::HeaderValue::from_static("2"));
        headers.insert("content-type", http::HeaderValue::from_static("text/plain"));
        headers.insert("hici", http::HeaderValue::from_static("t"));
        assert_eq!(render_headers(&headers), "x-a=1,2&hici=t&Content-Type=text/plain");
    }

    #[test]
    fn test_should_render_missing_content_type_as_empty() {
        let headers = http::HeaderMap::new();
        assert_eq!(render_headers(&headers), "Content-Type=");
    }
}
