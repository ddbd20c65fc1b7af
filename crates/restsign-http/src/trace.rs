//! Per-request trace context.
//!
//! Every request carries a trace id in the `hici` header. A caller-supplied id
//! is reused so log lines correlate across services; otherwise a fresh UUID is
//! generated. The id is echoed on the response.

use std::time::Instant;

use chrono::{DateTime, Utc};
use restsign_core::TraceId;

/// Trace id and timing of one request.
#[derive(Debug, Clone)]
pub struct TraceContext {
    trace_id: TraceId,
    started_at: Instant,
    started: DateTime<Utc>,
}

impl TraceContext {
    /// Start tracing a request, reusing the id in `trace_header` if present.
    ///
    /// Empty or non-ASCII header values are ignored.
    #[must_use]
    pub fn from_headers(headers: &http::HeaderMap, trace_header: &str) -> Self {
        let trace_id = headers
            .get(trace_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(TraceId::generate, TraceId::new);

        Self::with_id(trace_id)
    }

    /// Start tracing with an explicit id.
    #[must_use]
    pub fn with_id(trace_id: TraceId) -> Self {
        Self {
            trace_id,
            started_at: Instant::now(),
            started: Utc::now(),
        }
    }

    /// The trace id.
    #[must_use]
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// Wall-clock time the request arrived.
    #[must_use]
    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    /// Milliseconds elapsed since the request arrived.
    #[must_use]
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}
