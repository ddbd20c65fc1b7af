//! HMAC-SHA256 signature computation and verification.
//!
//! The signature is `base64(HMAC-SHA256(shared_secret, canonical_sign_string))`
//! using the standard, padded base64 alphabet. Verification distinguishes a
//! missing signature from a wrong one; both deny the request but are reported
//! differently.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use hmac::{Hmac, KeyInit, Mac};
use restsign_core::SharedSecret;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::Canonicalizer;
use crate::error::SignError;
use crate::snapshot::RequestSnapshot;

type HmacSha256 = Hmac<Sha256>;

/// Outcome category of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureReason {
    /// No signature was supplied.
    Missing,
    /// A signature was supplied but does not match.
    Mismatch,
    /// The signature matches.
    Ok,
}

impl SignatureReason {
    /// Uppercase label used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "MISSING",
            Self::Mismatch => "MISMATCH",
            Self::Ok => "OK",
        }
    }
}

impl std::fmt::Display for SignatureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of verifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResult {
    /// The signature computed from the canonical string.
    pub expected: String,
    /// The signature supplied by the caller, if any.
    pub provided: Option<String>,
    /// Whether the request is authentic.
    pub valid: bool,
    /// Why the result is what it is.
    pub reason: SignatureReason,
}

impl SignatureResult {
    /// Convert into a `Result`, mapping each failure to its [`SignError`].
    pub fn into_result(self) -> Result<(), SignError> {
        match self.reason {
            SignatureReason::Ok => Ok(()),
            SignatureReason::Missing => Err(SignError::SignatureMissing),
            SignatureReason::Mismatch => Err(SignError::SignatureMismatch),
        }
    }
}

/// Compute the base64 HMAC-SHA256 signature of a canonical string.
///
/// # Examples
///
/// ```
/// use restsign_auth::compute_signature;
/// use restsign_core::SharedSecret;
///
/// let signature = compute_signature(&SharedSecret::from("k"), "");
/// assert_eq!(signature, "i7mQxAp9YcuXWXqUISUCW+UKyL63RDbjc1uYiTp/ZiA=");
/// ```
#[must_use]
pub fn compute_signature(secret: &SharedSecret, canonical: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can accept keys of any length");
    mac.update(canonical.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Verify a caller-supplied signature against a canonical sign string.
///
/// An absent or empty signature yields [`SignatureReason::Missing`]. The
/// comparison runs in constant time.
#[must_use]
pub fn verify(canonical: &str, provided: Option<&str>, secret: &SharedSecret) -> SignatureResult {
    let expected = compute_signature(secret, canonical);
    let provided = provided.filter(|p| !p.is_empty());

    let Some(provided) = provided else {
        debug!("signature header missing");
        return SignatureResult {
            expected,
            provided: None,
            valid: false,
            reason: SignatureReason::Missing,
        };
    };

    let valid: bool = provided.as_bytes().ct_eq(expected.as_bytes()).into();
    let reason = if valid {
        SignatureReason::Ok
    } else {
        debug!(%expected, provided, "signature mismatch");
        SignatureReason::Mismatch
    };

    SignatureResult {
        expected,
        provided: Some(provided.to_owned()),
        valid,
        reason,
    }
}

/// Compute the signature header value a client must send for `snapshot`.
///
/// The snapshot must not carry the signature header itself; it would be
/// excluded by the filter anyway.
#[must_use]
pub fn sign_snapshot(
    snapshot: &RequestSnapshot,
    canonicalizer: &Canonicalizer,
    secret: &SharedSecret,
) -> String {
    let pair = canonicalizer.canonicalize(snapshot);
    compute_signature(secret, &pair.sign_string)
}
