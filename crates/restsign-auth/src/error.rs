//! Error types for request signing.
//!
//! [`SignError`] covers both expected, caller-facing outcomes (a missing or
//! wrong signature) and I/O faults hit while reading the request. Each variant
//! maps to a stable HTTP status and plain-text reason so client SDKs can tell
//! them apart.

use http::StatusCode;

/// Errors that can occur while canonicalizing or verifying a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    /// The signature header is absent or empty.
    #[error("signature missed")]
    SignatureMissing,

    /// The computed signature does not match the provided one.
    #[error("invalid signature")]
    SignatureMismatch,

    /// An uploaded file part could not be read.
    #[error("malformed multipart file: {0}")]
    MalformedMultipartFile(String),

    /// The textual or JSON request body could not be read.
    #[error("unreadable request body: {0}")]
    UnreadableBody(String),
}

impl SignError {
    /// The HTTP status returned to the caller.
    ///
    /// Signature failures use `416`; I/O faults use `400`.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SignatureMissing | Self::SignatureMismatch => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::MalformedMultipartFile(_) | Self::UnreadableBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The stable plain-text reason written to the response body.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::SignatureMissing => "signature missed",
            Self::SignatureMismatch => "invalid signature",
            Self::MalformedMultipartFile(_) => "malformed multipart file",
            Self::UnreadableBody(_) => "unreadable request body",
        }
    }
}
