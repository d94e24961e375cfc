//! Plain-data model of an HTTP exchange.
//!
//! # Design
//! Requests and responses are described as plain owned data — no sockets, no
//! streams, no runtime types. Header maps use lower-cased keys throughout so
//! lookups never have to worry about case. Body parts keep the chunk
//! boundaries and encoding labels they were captured with, because playback
//! must hand them back one at a time in the original order.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use url::Url;

use crate::error::ConfigError;

/// Header (and trailer) map with lower-cased names.
pub type Headers = BTreeMap<String, String>;

/// Lower-case header names, keeping values as-is.
pub fn lowercase_headers<'a, I>(pairs: I) -> Headers
where
    I: IntoIterator<Item = &'a (String, String)>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
        .collect()
}

/// One body part: the bytes plus the encoding label it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyChunk {
    pub data: Bytes,
    pub encoding: Option<String>,
}

impl BodyChunk {
    pub fn new(data: impl Into<Bytes>, encoding: Option<&str>) -> Self {
        Self {
            data: data.into(),
            encoding: encoding.map(str::to_string),
        }
    }
}

impl From<&str> for BodyChunk {
    fn from(text: &str) -> Self {
        Self {
            data: Bytes::copy_from_slice(text.as_bytes()),
            encoding: None,
        }
    }
}

impl From<Bytes> for BodyChunk {
    fn from(data: Bytes) -> Self {
        Self { data, encoding: None }
    }
}

impl From<Vec<u8>> for BodyChunk {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            encoding: None,
        }
    }
}

/// Concatenate body chunks into one string, lossily decoding as UTF-8.
pub fn concat_lossy(chunks: &[BodyChunk]) -> String {
    let mut text = String::new();
    for chunk in chunks {
        text.push_str(&String::from_utf8_lossy(&chunk.data));
    }
    text
}

/// Escape a body string to the comparable form stored in fixtures.
///
/// Quotes, backslashes, newlines and the Unicode line separators become
/// escape sequences; everything else passes through unchanged.
pub fn escape_text(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\'' => escaped.push_str("\\'"),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// The comparable string form of a request body: chunks concatenated, then
/// escaped. Fixture bodies store this form, so equality here is fixture
/// equality.
pub fn comparable_body(chunks: &[BodyChunk]) -> String {
    escape_text(&concat_lossy(chunks))
}

/// Default port for a scheme: 443 for https, 80 otherwise.
pub fn default_port(scheme: &str) -> u16 {
    if scheme == "https" {
        443
    } else {
        80
    }
}

/// Path plus query string, the form request matching runs against.
pub(crate) fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// The target of a request, broken into the parts matching cares about.
///
/// `path` includes the query string. `port` is always concrete; scheme
/// defaults are applied when the value is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    pub scheme: String,
    pub hostname: String,
    pub port: u16,
    pub path: String,
}

impl RequestUrl {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let url =
            Url::parse(input).map_err(|e| ConfigError::InvalidUrl(format!("{input}: {e}")))?;
        let scheme = url.scheme().to_string();
        let port = url.port().unwrap_or_else(|| default_port(&scheme));
        Ok(Self {
            hostname: url.host_str().unwrap_or("localhost").to_string(),
            path: path_and_query(&url),
            scheme,
            port,
        })
    }
}

impl fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The port is always concrete by construction, so always render it —
        // the fully-formatted target a client would actually have dialed.
        write!(f, "{}://{}:{}{}", self.scheme, self.hostname, self.port, self.path)
    }
}

/// A client request in its normalized form, as handlers see it.
///
/// Derived once per call and immutable afterwards: upper-cased method,
/// lower-cased header and trailer names, body parts in write order.
/// Trailers matter to passthrough transports, which forward them with the
/// real request.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub url: RequestUrl,
    pub method: String,
    pub headers: Headers,
    pub body: Option<Vec<BodyChunk>>,
    pub trailers: Headers,
}

/// A fully-materialized response: the captured-transaction shape produced by
/// fixtures and passthrough transports alike.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub version: String,
    pub status_code: u16,
    pub status_message: String,
    pub headers: Headers,
    pub raw_headers: Vec<String>,
    pub body: Vec<BodyChunk>,
    pub trailers: Headers,
    pub raw_trailers: Vec<String>,
}

impl Default for CapturedResponse {
    fn default() -> Self {
        Self {
            version: "1.1".to_string(),
            status_code: 200,
            status_message: String::new(),
            headers: Headers::new(),
            raw_headers: Vec::new(),
            body: Vec::new(),
            trailers: Headers::new(),
            raw_trailers: Vec::new(),
        }
    }
}
