//! Response body type supporting buffered and empty modes.
//!
//! Responses are fully buffered before they leave the service so the audit
//! logger can render them.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Response body supporting buffered and empty modes.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
#[derive(Debug, Default)]
pub enum SignResponseBody {
    /// Buffered body: handler output, rejection reasons, health payloads.
    Buffered(Full<Bytes>),
    /// Empty body for responses without content.
    #[default]
    Empty,
}

impl SignResponseBody {
    /// Create a body from bytes. Empty input yields [`SignResponseBody::Empty`].
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        if data.is_empty() {
            Self::Empty
        } else {
            Self::Buffered(Full::new(data))
        }
    }
}

impl http_body::Body for SignResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
