//! Snapshot extraction from HTTP requests.
//!
//! Converts collected request parts and body into the [`RequestSnapshot`] the
//! canonicalizer consumes:
//!
//! - URL: scheme, authority (or `Host` header) and path, without the query
//! - Headers: every value in transport order
//! - Parameters: decoded query pairs, urlencoded form fields and multipart
//!   text fields
//! - JSON body: raw text of `POST` requests whose content type contains
//!   `application/json`
//! - Files: multipart parts carrying a filename

use restsign_auth::{RequestSnapshot, SignError};
use tracing::debug;

use crate::multipart::{extract_boundary, parse_multipart};

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_AUTHORITY: &str = "localhost";

/// Build the snapshot of a request whose body has been collected.
///
/// # Errors
///
/// Returns [`SignError::UnreadableBody`] if a JSON body is not valid UTF-8 and
/// [`SignError::MalformedMultipartFile`] if a multipart body cannot be parsed.
pub fn build_snapshot(
    parts: &http::request::Parts,
    body: &[u8],
) -> Result<RequestSnapshot, SignError> {
    let mut snapshot = RequestSnapshot::new(parts.method.as_str(), request_url(parts));

    let query = parts.uri.query();
    if let Some(query) = query {
        snapshot = snapshot.with_query(query);
    }

    for name in parts.headers.keys() {
        for value in parts.headers.get_all(name) {
            snapshot = snapshot.with_header(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
    }

    if let Some(query) = query {
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            snapshot = snapshot.with_param(name, value);
        }
    }

    let Some(content_type) = content_type(&parts.headers) else {
        return Ok(snapshot);
    };
    let lower = content_type.to_ascii_lowercase();

    if lower.starts_with("application/x-www-form-urlencoded") {
        for (name, value) in form_urlencoded::parse(body) {
            snapshot = snapshot.with_param(name, value);
        }
    } else if lower.starts_with("multipart/form-data") {
        let boundary = extract_boundary(content_type)?;
        let form = parse_multipart(body, &boundary)?;
        debug!(
            fields = form.fields.len(),
            files = form.files.len(),
            "parsed multipart request"
        );
        for (name, value) in form.fields {
            snapshot = snapshot.with_param(name, value);
        }
        for (name, data) in form.files {
            snapshot = snapshot.with_file(name, data);
        }
    } else if parts.method == http::Method::POST && lower.contains("application/json") {
        let text = std::str::from_utf8(body)
            .map_err(|e| SignError::UnreadableBody(format!("JSON body is not UTF-8: {e}")))?;
        snapshot = snapshot.with_json_body(text);
    }

    Ok(snapshot)
}

/// Reconstruct the request URL without its query string.
///
/// Origin-form request targets take the authority from the `Host` header.
#[must_use]
pub fn request_url(parts: &http::request::Parts) -> String {
    let scheme = parts.uri.scheme_str().unwrap_or(DEFAULT_SCHEME);
    let authority = parts
        .uri
        .authority()
        .map(http::uri::Authority::as_str)
        .or_else(|| {
            parts
                .headers
                .get(http::header::HOST)
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or(DEFAULT_AUTHORITY);

    format!("{scheme}://{authority}{}", parts.uri.path())
}

/// The request or response content type, if present and readable.
#[must_use]
pub fn content_type(headers: &http::HeaderMap) -> Option<&str> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}
