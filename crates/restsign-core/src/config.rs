//! Configuration management for RestSign.
//!
//! All configuration is driven by environment variables. Values are read once
//! at startup and shared read-only by every request.

use crate::error::{RestSignError, RestSignResult};
use crate::types::{DigestAlgorithm, SharedSecret};

/// Smallest usable abbreviation cap: one character plus the `...` marker.
const MIN_ABBREVIATE_MAX: usize = 4;

/// Global configuration for RestSign.
#[derive(Debug, Clone)]
pub struct RestSignConfig {
    /// Bind address for the server.
    pub listen: String,
    /// Log level.
    pub log_level: String,
    /// Shared HMAC secret. Required whenever any route can require signing.
    pub secret: Option<SharedSecret>,
    /// Name of the request header carrying the signature.
    pub signature_header: String,
    /// Name of the request/response header carrying the trace id.
    pub trace_header: String,
    /// Reserved delimiter character of the canonical string.
    pub delimiter: char,
    /// Maximum length of a value in the logged canonical string.
    pub abbreviate_max: usize,
    /// Maximum number of characters of a request/response body that is logged.
    pub body_log_max: usize,
    /// Digest applied to uploaded files.
    pub file_digest: DigestAlgorithm,
    /// Whether signing is required when no path rule matches.
    pub sign_default: bool,
    /// Path prefixes that require signing.
    pub sign_paths: Vec<String>,
    /// Path prefixes exempt from signing.
    pub exempt_paths: Vec<String>,
    /// Server identity reported in the `Rest-Server` response header.
    pub server_name: String,
}

impl Default for RestSignConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            secret: None,
            signature_header: "hisv".to_owned(),
            trace_header: "hici".to_owned(),
            delimiter: '$',
            abbreviate_max: 100,
            body_log_max: 4096,
            file_digest: DigestAlgorithm::Md5,
            sign_default: false,
            sign_paths: Vec::new(),
            exempt_paths: Vec::new(),
            server_name: "restsign".to_owned(),
        }
    }
}

impl RestSignConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> RestSignResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their default. The resulting configuration is validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RestSignResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("RESTSIGN_LISTEN") {
            config.listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("RESTSIGN_SECRET").filter(|v| !v.is_empty()) {
            config.secret = Some(SharedSecret::new(v));
        }
        if let Some(v) = lookup("RESTSIGN_SIGNATURE_HEADER") {
            config.signature_header = v.to_ascii_lowercase();
        }
        if let Some(v) = lookup("RESTSIGN_TRACE_HEADER") {
            config.trace_header = v.to_ascii_lowercase();
        }
        if let Some(v) = lookup("RESTSIGN_DELIMITER") {
            config.delimiter = parse_delimiter(&v)?;
        }
        if let Some(v) = lookup("RESTSIGN_ABBREVIATE_MAX") {
            config.abbreviate_max = parse_usize("RESTSIGN_ABBREVIATE_MAX", &v)?;
        }
        if let Some(v) = lookup("RESTSIGN_BODY_LOG_MAX") {
            config.body_log_max = parse_usize("RESTSIGN_BODY_LOG_MAX", &v)?;
        }
        if let Some(v) = lookup("RESTSIGN_FILE_DIGEST") {
            config.file_digest = v
                .parse()
                .map_err(|e| RestSignError::Config(format!("RESTSIGN_FILE_DIGEST: {e}")))?;
        }
        if let Some(v) = lookup("RESTSIGN_SIGN_DEFAULT") {
            config.sign_default = parse_bool(&v);
        }
        if let Some(v) = lookup("RESTSIGN_SIGN_PATHS") {
            config.sign_paths = parse_list(&v);
        }
        if let Some(v) = lookup("RESTSIGN_EXEMPT_PATHS") {
            config.exempt_paths = parse_list(&v);
        }
        if let Some(v) = lookup("RESTSIGN_SERVER_NAME").or_else(|| lookup("HOSTNAME")) {
            config.server_name = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Whether any route can end up requiring a signature.
    #[must_use]
    pub fn signing_possible(&self) -> bool {
        self.sign_default || !self.sign_paths.is_empty()
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> RestSignResult<()> {
        if self.abbreviate_max < MIN_ABBREVIATE_MAX {
            return Err(RestSignError::Config(format!(
                "abbreviate max must be at least {MIN_ABBREVIATE_MAX}, got {}",
                self.abbreviate_max
            )));
        }
        if self.signature_header.is_empty() || self.trace_header.is_empty() {
            return Err(RestSignError::Config(
                "signature and trace header names must not be empty".to_owned(),
            ));
        }
        if self.signing_possible() && self.secret.is_none() {
            return Err(RestSignError::Config(
                "RESTSIGN_SECRET is required when any route requires signing".to_owned(),
            ));
        }
        Ok(())
    }
}

fn parse_delimiter(raw: &str) -> RestSignResult<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_alphanumeric() && !c.is_whitespace() => Ok(c),
        _ => Err(RestSignError::Config(format!(
            "RESTSIGN_DELIMITER must be a single non-alphanumeric character, got {raw:?}"
        ))),
    }
}

fn parse_usize(key: &str, raw: &str) -> RestSignResult<usize> {
    raw.trim()
        .parse()
        .map_err(|_| RestSignError::Config(format!("{key} must be a number, got {raw:?}")))
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw, "1" | "true" | "yes" | "TRUE" | "YES")
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = RestSignConfig::default();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.signature_header, "hisv");
        assert_eq!(config.trace_header, "hici");
        assert_eq!(config.delimiter, '$');
        assert!(!config.sign_default);
        assert!(config.secret.is_none());
    }

    #[test]
    fn test_should_load_overrides_from_lookup() {
        let config = RestSignConfig::from_lookup(lookup_from(&[
            ("RESTSIGN_SECRET", "k"),
            ("RESTSIGN_SIGN_DEFAULT", "true"),
            ("RESTSIGN_SIGN_PATHS", "/orders, /files"),
            ("RESTSIGN_EXEMPT_PATHS", "/orders/public"),
            ("RESTSIGN_SIGNATURE_HEADER", "X-Sign"),
            ("RESTSIGN_DELIMITER", "|"),
            ("RESTSIGN_ABBREVIATE_MAX", "16"),
            ("RESTSIGN_FILE_DIGEST", "sha256"),
            ("HOSTNAME", "node-1"),
        ]))
        .unwrap();

        assert_eq!(config.secret, Some(SharedSecret::from("k")));
        assert!(config.sign_default);
        assert_eq!(config.sign_paths, vec!["/orders", "/files"]);
        assert_eq!(config.exempt_paths, vec!["/orders/public"]);
        assert_eq!(config.signature_header, "x-sign");
        assert_eq!(config.delimiter, '|');
        assert_eq!(config.abbreviate_max, 16);
        assert_eq!(config.file_digest, DigestAlgorithm::Sha256);
        assert_eq!(config.server_name, "node-1");
    }

    #[test]
    fn test_should_require_secret_when_signing_possible() {
        let result = RestSignConfig::from_lookup(lookup_from(&[("RESTSIGN_SIGN_PATHS", "/a")]));
        assert!(matches!(result, Err(RestSignError::Config(_))));
    }

    #[test]
    fn test_should_allow_missing_secret_when_signing_disabled() {
        let config = RestSignConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(!config.signing_possible());
    }

    #[test]
    fn test_should_reject_invalid_delimiter() {
        for raw in ["", "ab", "a", " "] {
            let result = RestSignConfig::from_lookup(lookup_from(&[("RESTSIGN_DELIMITER", raw)]));
            assert!(result.is_err(), "delimiter {raw:?} should be rejected");
        }
    }

    #[test]
    fn test_should_reject_tiny_abbreviate_max() {
        let result =
            RestSignConfig::from_lookup(lookup_from(&[("RESTSIGN_ABBREVIATE_MAX", "3")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_should_reject_unknown_digest() {
        let result = RestSignConfig::from_lookup(lookup_from(&[("RESTSIGN_FILE_DIGEST", "crc")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_should_prefer_explicit_server_name_over_hostname() {
        let config = RestSignConfig::from_lookup(lookup_from(&[
            ("RESTSIGN_SERVER_NAME", "api-7"),
            ("HOSTNAME", "node-1"),
        ]))
        .unwrap();
        assert_eq!(config.server_name, "api-7");
    }
}
