//! Dispatch of authenticated requests to the application handler.
//!
//! The signing layer owns the request until verification succeeds; only then
//! is it handed to a [`SignedHandler`]. Handlers return fully buffered
//! responses so the audit logger can record them.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::Serialize;

/// Trait the application behind the signing layer must implement.
///
/// The trait uses boxed futures so it can be used with `Arc<H>` in the service
/// layer.
pub trait SignedHandler: Send + Sync + 'static {
    /// Handle an authenticated request and produce an HTTP response.
    fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = http::Response<Bytes>> + Send>>;
}

/// Dispatch an authenticated request to the handler.
pub async fn dispatch_request<H: SignedHandler>(
    handler: &H,
    parts: http::request::Parts,
    body: Bytes,
) -> http::Response<Bytes> {
    tracing::debug!(method = %parts.method, path = parts.uri.path(), "dispatching signed request");
    handler.handle(parts, body).await
}

#[derive(Debug, Serialize)]
struct Echo {
    method: String,
    path: String,
    query: Option<String>,
    body_len: usize,
    body: Option<String>,
}

/// A handler that describes the request it received as JSON.
///
/// Useful for exercising the signing layer without an application behind it.
#[derive(Debug, Clone, Default)]
pub struct EchoHandler;

impl SignedHandler for EchoHandler {
    fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = http::Response<Bytes>> + Send>> {
        Box::pin(async move {
            let echo = Echo {
                method: parts.method.to_string(),
                path: parts.uri.path().to_owned(),
                query: parts.uri.query().map(ToOwned::to_owned),
                body_len: body.len(),
                body: std::str::from_utf8(&body).ok().map(ToOwned::to_owned),
            };
            match serde_json::to_vec(&echo) {
                Ok(json) => http::Response::builder()
                    .status(http::StatusCode::OK)
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Bytes::from(json))
                    .expect("static echo response should be valid"),
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize echo response");
                    let mut response = http::Response::new(Bytes::new());
                    *response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                    response
                }
            }
        })
    }
}
