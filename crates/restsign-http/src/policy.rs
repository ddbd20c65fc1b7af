//! Per-route signature enforcement.
//!
//! Rules match path prefixes on segment boundaries. The longest matching
//! prefix decides; when a required and an exempt prefix have the same length,
//! signing is required.

use restsign_core::RestSignConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathRule {
    prefix: String,
    required: bool,
}

/// Decides whether a request path must carry a valid signature.
///
/// # Examples
///
/// ```
/// use restsign_http::SigningPolicy;
///
/// let policy = SigningPolicy::new(true).exempt("/public");
/// assert!(policy.signing_required("/orders"));
/// assert!(!policy.signing_required("/public/logo.png"));
/// assert!(policy.signing_required("/publicity"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningPolicy {
    default_required: bool,
    rules: Vec<PathRule>,
}

impl SigningPolicy {
    /// Create a policy whose unmatched paths follow `default_required`.
    #[must_use]
    pub fn new(default_required: bool) -> Self {
        Self {
            default_required,
            rules: Vec::new(),
        }
    }

    /// Build the policy described by the configuration.
    #[must_use]
    pub fn from_config(config: &RestSignConfig) -> Self {
        let policy = config
            .sign_paths
            .iter()
            .fold(Self::new(config.sign_default), |p, prefix| p.require(prefix.as_str()));
        config
            .exempt_paths
            .iter()
            .fold(policy, |p, prefix| p.exempt(prefix.as_str()))
    }

    /// Require signing under `prefix`.
    #[must_use]
    pub fn require(mut self, prefix: impl Into<String>) -> Self {
        self.rules.push(PathRule {
            prefix: prefix.into(),
            required: true,
        });
        self
    }

    /// Exempt `prefix` from signing.
    #[must_use]
    pub fn exempt(mut self, prefix: impl Into<String>) -> Self {
        self.rules.push(PathRule {
            prefix: prefix.into(),
            required: false,
        });
        self
    }

    /// Whether requests to `path` must be signed.
    #[must_use]
    pub fn signing_required(&self, path: &str) -> bool {
        self.rules
            .iter()
            .filter(|rule| prefix_matches(&rule.prefix, path))
            .max_by_key(|rule| (rule.prefix.len(), rule.required))
            .map_or(self.default_required, |rule| rule.required)
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
