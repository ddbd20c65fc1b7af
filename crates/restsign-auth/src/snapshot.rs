//! The immutable request view consumed by the canonicalizer.
//!
//! A [`RequestSnapshot`] is assembled once per request by the transport layer
//! from already-buffered data. Headers and parameters are ordered multi-maps:
//! repeated names are grouped under their first occurrence and values keep
//! arrival order.

use bytes::Bytes;

/// An ordered multi-map entry: a name and its values in arrival order.
pub type MultiEntry<V> = (String, Vec<V>);

/// Immutable view of one inbound request.
///
/// # Examples
///
/// ```
/// use restsign_auth::RequestSnapshot;
///
/// let snapshot = RequestSnapshot::new("POST", "http://host/orders")
///     .with_header("X-Client", "abc")
///     .with_param("qty", "2")
///     .with_json_body(r#"{"id":1}"#);
///
/// assert_eq!(snapshot.method(), "POST");
/// assert_eq!(snapshot.json_body(), Some(r#"{"id":1}"#));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSnapshot {
    method: String,
    url: String,
    query: Option<String>,
    headers: Vec<MultiEntry<String>>,
    params: Vec<MultiEntry<String>>,
    json_body: Option<String>,
    files: Vec<MultiEntry<Bytes>>,
}

impl RequestSnapshot {
    /// Start a snapshot from the method and the request URL without its query.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the raw, undecoded query string. An empty query counts as absent.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    /// Append a header value, grouping it under an existing entry of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        push_entry(&mut self.headers, name.into(), value.into());
        self
    }

    /// Append a decoded query or body parameter value.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        push_entry(&mut self.params, name.into(), value.into());
        self
    }

    /// Attach the raw JSON body text.
    #[must_use]
    pub fn with_json_body(mut self, body: impl Into<String>) -> Self {
        self.json_body = Some(body.into());
        self
    }

    /// Append an uploaded file payload under a multipart field name.
    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, data: impl Into<Bytes>) -> Self {
        push_entry(&mut self.files, field.into(), data.into());
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request URL including scheme, host and path, without the query.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Headers in transport order.
    #[must_use]
    pub fn headers(&self) -> &[MultiEntry<String>] {
        &self.headers
    }

    /// Values of the first header matching `name` case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Query and body parameters in arrival order.
    #[must_use]
    pub fn params(&self) -> &[MultiEntry<String>] {
        &self.params
    }

    /// The raw JSON body, present only for JSON POST requests.
    #[must_use]
    pub fn json_body(&self) -> Option<&str> {
        self.json_body.as_deref()
    }

    /// Uploaded files grouped by multipart field name.
    #[must_use]
    pub fn files(&self) -> &[MultiEntry<Bytes>] {
        &self.files
    }

    /// Whether the request carried multipart file uploads.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }
}

fn push_entry<V>(entries: &mut Vec<MultiEntry<V>>, name: String, value: V) {
    if let Some((_, values)) = entries.iter_mut().find(|(n, _)| *n == name) {
        values.push(value);
    } else {
        entries.push((name, vec![value]));
    }
}
