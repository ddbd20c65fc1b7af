//! Canonical string construction for request signing.
//!
//! The canonical string is the exact message fed to HMAC-SHA256. Clients
//! compute it independently, so every byte matters:
//!
//! ```text
//! METHOD$URL[?RAW_QUERY]$
//! header-name$value$...$            for every header kept by the HeaderFilter
//! param-name$value$...$             for every parameter, sorted by name,
//!                                   skipping names present in RAW_QUERY
//! ```
//!
//! Headers keep transport order. The raw query string is copied verbatim, never
//! re-encoded or reordered, and the parameters it carries are left out of the
//! parameter pass because the URL already binds them.
//!
//! The same traversal writes a second, log-safe string in which every value is
//! abbreviated. Method, URL, names and delimiters are identical in both.

use std::collections::BTreeMap;

use restsign_core::DigestAlgorithm;
use tracing::debug;

use crate::abbreviate::Abbreviation;
use crate::digest::digest_files;
use crate::filter::HeaderFilter;
use crate::snapshot::RequestSnapshot;

/// Default delimiter between canonical tokens.
pub const DEFAULT_DELIMITER: char = '$';

/// Synthetic parameter name carrying a raw JSON body.
pub const JSON_PARAM: &str = "_json";

/// The two renderings of one canonicalization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPair {
    /// Full-fidelity string fed to the HMAC. Never logged.
    pub sign_string: String,
    /// Same structure with abbreviated values. Safe to persist.
    pub log_string: String,
}

/// Builds canonical strings from request snapshots.
///
/// A `Canonicalizer` is immutable and shared by all requests.
///
/// # Examples
///
/// ```
/// use restsign_auth::{Canonicalizer, RequestSnapshot};
///
/// let snapshot = RequestSnapshot::new("POST", "http://host/orders")
///     .with_header("X-Client", "abc")
///     .with_param("qty", "2");
///
/// let pair = Canonicalizer::default().canonicalize(&snapshot);
/// assert_eq!(pair.sign_string, "POST$http://host/orders$X-Client$abc$qty$2$");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalizer {
    delimiter: char,
    filter: HeaderFilter,
    abbreviation: Abbreviation,
    digest: DigestAlgorithm,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            filter: HeaderFilter::default(),
            abbreviation: Abbreviation::default(),
            digest: DigestAlgorithm::default(),
        }
    }
}

impl Canonicalizer {
    /// Create a canonicalizer with the default delimiter, abbreviation and digest.
    #[must_use]
    pub fn new(filter: HeaderFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Use a different reserved delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Use a different abbreviation policy for the log string.
    #[must_use]
    pub fn with_abbreviation(mut self, abbreviation: Abbreviation) -> Self {
        self.abbreviation = abbreviation;
        self
    }

    /// Use a different file digest algorithm.
    #[must_use]
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// The reserved delimiter.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The header filter.
    #[must_use]
    pub fn filter(&self) -> &HeaderFilter {
        &self.filter
    }

    /// The log abbreviation policy.
    #[must_use]
    pub fn abbreviation(&self) -> Abbreviation {
        self.abbreviation
    }

    /// Canonicalize a snapshot into its sign and log renderings.
    #[must_use]
    pub fn canonicalize(&self, snapshot: &RequestSnapshot) -> CanonicalPair {
        let mut sink = DualSink::new(self.delimiter, self.abbreviation);

        self.append_method_and_url(&mut sink, snapshot);
        self.append_headers(&mut sink, snapshot);
        self.append_params(&mut sink, snapshot);

        let pair = sink.finish();
        debug!(canonical = %pair.log_string, "built canonical request");
        pair
    }

    /// Build the sorted parameter map used by the parameter pass.
    ///
    /// Seeded from query and body parameters, then `_json` for JSON bodies,
    /// then one digest entry per multipart file field. Later sources replace
    /// earlier entries of the same name.
    #[must_use]
    pub fn collect_params(&self, snapshot: &RequestSnapshot) -> BTreeMap<String, Vec<String>> {
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, values) in snapshot.params() {
            params
                .entry(name.clone())
                .or_default()
                .extend(values.iter().cloned());
        }

        if let Some(json) = snapshot.json_body().filter(|json| !json.is_empty()) {
            params.insert(JSON_PARAM.to_owned(), vec![json.to_owned()]);
        }

        for (field, files) in snapshot.files() {
            let joined = digest_files(files, self.digest, self.delimiter);
            params.insert(field.clone(), vec![joined]);
        }

        params
    }

    fn append_method_and_url(&self, sink: &mut DualSink, snapshot: &RequestSnapshot) {
        sink.token(snapshot.method());
        sink.delimit();

        sink.token(snapshot.url());
        if let Some(query) = snapshot.query() {
            sink.token("?");
            sink.token(query);
        }
        sink.delimit();
    }

    fn append_headers(&self, sink: &mut DualSink, snapshot: &RequestSnapshot) {
        for (name, values) in snapshot.headers() {
            if !self.filter.is_signed(name) {
                continue;
            }
            sink.token(name);
            sink.delimit();
            for value in values {
                sink.value(value);
                sink.delimit();
            }
        }
    }

    fn append_params(&self, sink: &mut DualSink, snapshot: &RequestSnapshot) {
        let query = snapshot.query();
        for (name, values) in self.collect_params(snapshot) {
            if is_query_parameter(query, &name) {
                continue;
            }
            sink.token(&name);
            sink.delimit();
            for value in &values {
                sink.value(value);
                sink.delimit();
            }
        }
    }
}

/// Whether `name` is bound by the raw query string.
///
/// Only the first occurrence of `name` is considered. It must start the query
/// or follow `&`, and be followed by `=` or end the query. A bare name in the
/// middle of the query (`flag&a=1`) does not count, and neither does a later
/// occurrence after an earlier substring hit (`xstatus=1&status=2`).
///
/// # Examples
///
/// ```
/// use restsign_auth::canonical::is_query_parameter;
///
/// assert!(is_query_parameter(Some("status=open&flag"), "status"));
/// assert!(is_query_parameter(Some("status=open&flag"), "flag"));
/// assert!(!is_query_parameter(Some("flag&a=1"), "flag"));
/// assert!(!is_query_parameter(Some("xstatus=1&status=2"), "status"));
/// assert!(!is_query_parameter(None, "status"));
/// ```
#[must_use]
pub fn is_query_parameter(query: Option<&str>, name: &str) -> bool {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return false;
    };
    let Some(index) = query.find(name) else {
        return false;
    };

    let bytes = query.as_bytes();
    if index > 0 && bytes[index - 1] != b'&' {
        return false;
    }

    let offset = index + name.len();
    offset >= bytes.len() || bytes[offset] == b'='
}

/// Writes every token to the sign and log strings in lock-step.
///
/// Structural tokens go to both unchanged; values are abbreviated on the log
/// side only.
struct DualSink {
    sign: String,
    log: String,
    delimiter: char,
    abbreviation: Abbreviation,
}

impl DualSink {
    fn new(delimiter: char, abbreviation: Abbreviation) -> Self {
        Self {
            sign: String::new(),
            log: String::new(),
            delimiter,
            abbreviation,
        }
    }

    fn token(&mut self, token: &str) {
        self.sign.push_str(token);
        self.log.push_str(token);
    }

    fn value(&mut self, value: &str) {
        self.sign.push_str(value);
        self.log.push_str(&self.abbreviation.apply(value));
    }

    fn delimit(&mut self) {
        self.sign.push(self.delimiter);
        self.log.push(self.delimiter);
    }

    fn finish(self) -> CanonicalPair {
        CanonicalPair {
            sign_string: self.sign,
            log_string: self.log,
        }
    }
}
