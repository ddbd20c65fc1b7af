//! Header exclusion rules for the canonical string.
//!
//! Transport and negotiation headers are rewritten by clients, proxies and
//! runtimes without changing the caller's intent, so they never participate in
//! signing. The signature header is excluded as well since it cannot sign
//! itself.

/// Headers excluded from signing regardless of configuration.
pub const EXCLUDED_HEADERS: [&str; 6] = [
    "accept-encoding",
    "user-agent",
    "host",
    "connection",
    "content-length",
    "content-type",
];

/// Default name of the header carrying the signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "hisv";

/// Decides which headers participate in the canonical string.
///
/// Matching is ASCII case-insensitive.
///
/// # Examples
///
/// ```
/// use restsign_auth::HeaderFilter;
///
/// let filter = HeaderFilter::default();
/// assert!(filter.is_signed("X-Client"));
/// assert!(!filter.is_signed("User-Agent"));
/// assert!(!filter.is_signed("HISV"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFilter {
    signature_header: String,
}

impl HeaderFilter {
    /// Create a filter excluding the given signature header in addition to
    /// the fixed transport headers.
    #[must_use]
    pub fn new(signature_header: impl Into<String>) -> Self {
        Self {
            signature_header: signature_header.into().to_ascii_lowercase(),
        }
    }

    /// The (lowercased) signature header name.
    #[must_use]
    pub fn signature_header(&self) -> &str {
        &self.signature_header
    }

    /// Whether the header participates in signing.
    #[must_use]
    pub fn is_signed(&self, name: &str) -> bool {
        !name.eq_ignore_ascii_case(&self.signature_header)
            && !EXCLUDED_HEADERS
                .iter()
                .any(|excluded| name.eq_ignore_ascii_case(excluded))
    }
}

impl Default for HeaderFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNATURE_HEADER)
    }
}
