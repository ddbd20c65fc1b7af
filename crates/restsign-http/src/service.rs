//! The signing HTTP service implementing hyper's `Service` trait.
//!
//! [`SignHttpService`] wraps a [`SignedHandler`] and handles:
//!
//! 1. Health check interception (`GET /health`, `GET /_health`)
//! 2. Trace id resolution
//! 3. Request body collection
//! 4. Snapshot extraction and canonicalization
//! 5. Audit logging of the request
//! 6. Signature verification on routes that require it
//! 7. Dispatch to the [`SignedHandler`]
//! 8. Common response headers (trace id, `Rest-Server`) and response audit
//!
//! Canonicalization is skipped entirely when the route does not require a
//! signature and audit logging is disabled.

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::service::Service;
use restsign_auth::{Abbreviation, Canonicalizer, HeaderFilter, SignError, verify};
use restsign_core::{RestSignConfig, SharedSecret};
use tracing::{debug, error, warn};

use crate::audit;
use crate::body::SignResponseBody;
use crate::dispatch::{SignedHandler, dispatch_request};
use crate::policy::SigningPolicy;
use crate::request::{build_snapshot, content_type};
use crate::response::{add_common_headers, health_check_response, rejection_response};
use crate::trace::TraceContext;

/// Configuration for the signing HTTP service.
#[derive(Debug, Clone)]
pub struct SignHttpConfig {
    /// Builds canonical strings; carries the signature header name.
    pub canonicalizer: Canonicalizer,
    /// Shared HMAC secret.
    pub secret: Option<SharedSecret>,
    /// Which routes require a signature.
    pub policy: SigningPolicy,
    /// Header carrying the trace id.
    pub trace_header: String,
    /// Value of the `Rest-Server` response header.
    pub server_name: String,
    /// Maximum number of body characters written to the audit log.
    pub body_log_max: usize,
}

impl Default for SignHttpConfig {
    fn default() -> Self {
        Self {
            canonicalizer: Canonicalizer::default(),
            secret: None,
            policy: SigningPolicy::default(),
            trace_header: "hici".to_owned(),
            server_name: "restsign".to_owned(),
            body_log_max: 4096,
        }
    }
}

impl SignHttpConfig {
    /// Build the service configuration from the global configuration.
    #[must_use]
    pub fn from_config(config: &RestSignConfig) -> Self {
        let canonicalizer = Canonicalizer::new(HeaderFilter::new(config.signature_header.as_str()))
            .with_delimiter(config.delimiter)
            .with_abbreviation(Abbreviation::new(config.abbreviate_max))
            .with_digest(config.file_digest);

        Self {
            canonicalizer,
            secret: config.secret.clone(),
            policy: SigningPolicy::from_config(config),
            trace_header: config.trace_header.clone(),
            server_name: config.server_name.clone(),
            body_log_max: config.body_log_max,
        }
    }

    fn signature_header(&self) -> &str {
        self.canonicalizer.filter().signature_header()
    }
}

/// The signing HTTP service that implements hyper's `Service` trait.
///
/// # Type Parameters
///
/// - `H`: The application handler implementing [`SignedHandler`].
#[derive(Debug)]
pub struct SignHttpService<H: SignedHandler> {
    handler: Arc<H>,
    config: Arc<SignHttpConfig>,
}

impl<H: SignedHandler> SignHttpService<H> {
    /// Create a new service with the given handler and configuration.
    #[must_use]
    pub fn new(handler: H, config: SignHttpConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            config: Arc::new(config),
        }
    }
}

impl<H: SignedHandler> Clone for SignHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H, B> Service<http::Request<B>> for SignHttpService<H>
where
    H: SignedHandler,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
{
    type Response = http::Response<SignResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            if is_health_check(req.method(), req.uri().path()) {
                return Ok(health_check_response().map(SignResponseBody::from_bytes));
            }

            let trace = TraceContext::from_headers(req.headers(), &config.trace_header);

            let mut response = process_request(req, handler.as_ref(), &config, &trace).await;
            add_common_headers(
                &mut response,
                &trace,
                &config.trace_header,
                &config.server_name,
            );
            audit::log_response(&trace, &response, config.body_log_max);

            Ok(response.map(SignResponseBody::from_bytes))
        })
    }
}

/// Process a request through the signing pipeline.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    config: &SignHttpConfig,
    trace: &TraceContext,
) -> http::Response<Bytes>
where
    H: SignedHandler,
    B: http_body::Body,
    B::Error: Display,
{
    let (parts, incoming) = req.into_parts();
    let signing_required = config.policy.signing_required(parts.uri.path());
    debug!(
        method = %parts.method,
        uri = %parts.uri,
        trace_id = %trace.trace_id(),
        signing_required,
        "processing request"
    );

    let body = match incoming.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!(error = %err, trace_id = %trace.trace_id(), "failed to collect request body");
            return rejection_response(&SignError::UnreadableBody(err.to_string()));
        }
    };

    if signing_required || audit::audit_enabled() {
        if let Err(err) = authenticate(&parts, &body, config, trace, signing_required) {
            warn!(error = %err, trace_id = %trace.trace_id(), "request rejected");
            return rejection_response(&err);
        }
    }

    dispatch_request(handler, parts, body).await
}

/// Canonicalize the request, record it, and verify its signature if required.
fn authenticate(
    parts: &http::request::Parts,
    body: &Bytes,
    config: &SignHttpConfig,
    trace: &TraceContext,
    signing_required: bool,
) -> Result<(), SignError> {
    let snapshot = build_snapshot(parts, body)?;
    let canonical = config.canonicalizer.canonicalize(&snapshot);

    if audit::audit_enabled() {
        let body_text =
            audit::request_body_text(content_type(&parts.headers), body, config.body_log_max);
        audit::log_request(trace, &canonical.log_string, &body_text);
    }

    if !signing_required {
        return Ok(());
    }

    let Some(secret) = config.secret.as_ref() else {
        error!(trace_id = %trace.trace_id(), "signing required but no shared secret configured");
        return Err(SignError::SignatureMismatch);
    };

    let provided = parts
        .headers
        .get(config.signature_header())
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let result = verify(&canonical.sign_string, provided.as_deref(), secret);
    audit::log_verification(trace, &result);
    result.into_result()
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/health" || path == "/_health")
}
