//! Fixture matcher: map normalized requests to canned responses.
//!
//! # Design
//! A [`Matcher`] is built once from a request template and a response
//! template, then reused for every match attempt. Matching short-circuits in
//! a fixed order: hostname, then path (exact or pattern), then method, then a
//! header subset check, then exact body equality in the escaped comparable
//! form. The bound response is normalized at construction (version 1.1,
//! status 200, lower-cased header keys, body copied) and never mutated —
//! every successful match hands out a fresh reference to the same frozen
//! value.

use std::sync::Arc;

use regex::Regex;
use url::Url;

use crate::chain::{Decision, Handler};
use crate::error::ConfigError;
use crate::http::{self, BodyChunk, CapturedResponse, Headers, NormalizedRequest};

/// What a fixture matches against: a literal URL or a path pattern bound to
/// a hostname. Mutually exclusive by construction.
#[derive(Debug, Clone)]
pub enum TargetTemplate {
    /// A URL string; hostname, port and path are taken from it.
    Url(String),

    /// A path pattern, optionally bound to one hostname.
    Pattern {
        hostname: Option<String>,
        pattern: Regex,
    },
}

/// The request side of a fixture, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RequestTemplate {
    pub target: Option<TargetTemplate>,
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// The response side of a fixture. Every field is optional; defaults are
/// applied when the matcher is built.
#[derive(Debug, Clone, Default)]
pub struct ResponseTemplate {
    pub version: Option<String>,
    pub status_code: Option<u16>,
    pub status_message: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<BodyChunk>,
    pub trailers: Vec<(String, String)>,
}

/// A compact fixture description: either a `path` shorthand under a fixed
/// host, or a full `request` template. Exactly one of the two must be set.
#[derive(Default)]
pub struct Mapping {
    pub path: Option<String>,
    pub method: Option<String>,
    pub request: Option<MappingRequest>,
    pub response: Option<ResponseTemplate>,
}

/// The `request` half of a full fixture description.
pub struct MappingRequest {
    pub url: MappingUrl,
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// A fixture URL: literal, or a wildcard path pattern.
pub enum MappingUrl {
    Literal(String),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
enum Target {
    Exact {
        hostname: Option<String>,
        port: Option<u16>,
        path: Option<String>,
    },
    Pattern {
        hostname: Option<String>,
        pattern: Regex,
    },
}

/// Predicate plus frozen response, built from one fixture.
#[derive(Debug, Clone)]
pub struct Matcher {
    target: Target,
    method: String,
    headers: Headers,
    body: Option<String>,
    response: Arc<CapturedResponse>,
}

impl Matcher {
    /// Build a matcher from a request template and a response template.
    ///
    /// Fails with [`ConfigError::MissingTarget`] when the request template
    /// names neither a URL nor a pattern.
    pub fn new(request: RequestTemplate, response: ResponseTemplate) -> Result<Self, ConfigError> {
        let target = match request.target {
            None => return Err(ConfigError::MissingTarget),
            Some(TargetTemplate::Pattern { hostname, pattern }) => {
                Target::Pattern { hostname, pattern }
            }
            Some(TargetTemplate::Url(raw)) => {
                let url =
                    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(format!("{raw}: {e}")))?;
                Target::Exact {
                    hostname: url.host_str().map(str::to_string),
                    // The parser drops scheme-default ports; a port written
                    // out in the fixture URL still constrains matching.
                    port: url.port().or_else(|| explicit_port(&raw)),
                    path: Some(http::path_and_query(&url)),
                }
            }
        };

        Ok(Self {
            target,
            method: request
                .method
                .unwrap_or_else(|| "GET".to_string())
                .to_ascii_uppercase(),
            headers: http::lowercase_headers(&request.headers),
            body: request.body,
            response: Arc::new(normalize_response(response)),
        })
    }

    /// Build a matcher from a compact fixture description bound to `host`.
    ///
    /// Literal paths and URLs resolve against `http://{host}/`; a pattern URL
    /// builds a wildcard matcher bound to that host. Exactly one of `path` /
    /// `request` must be present.
    pub fn from_mapping(host: &str, mapping: Mapping) -> Result<Self, ConfigError> {
        let request = match (mapping.path, mapping.request) {
            (Some(_), Some(_)) | (None, None) => return Err(ConfigError::MappingTarget),
            (Some(path), None) => RequestTemplate {
                target: Some(TargetTemplate::Url(resolve_against(host, &path)?)),
                method: mapping.method,
                ..RequestTemplate::default()
            },
            (None, Some(request)) => {
                let target = match request.url {
                    MappingUrl::Pattern(pattern) => TargetTemplate::Pattern {
                        hostname: Some(host.to_string()),
                        pattern,
                    },
                    MappingUrl::Literal(url) => {
                        TargetTemplate::Url(resolve_against(host, &url)?)
                    }
                };
                RequestTemplate {
                    target: Some(target),
                    method: request.method,
                    headers: request.headers,
                    body: request.body,
                }
            }
        };

        Self::new(request, mapping.response.unwrap_or_default())
    }

    /// Quick and effective matching.
    pub fn matches(&self, request: &NormalizedRequest) -> bool {
        match &self.target {
            Target::Pattern { hostname, pattern } => {
                if let Some(hostname) = hostname {
                    if *hostname != request.url.hostname {
                        return false;
                    }
                }
                if !pattern.is_match(&request.url.path) {
                    return false;
                }
            }
            Target::Exact {
                hostname,
                port,
                path,
            } => {
                if let Some(hostname) = hostname {
                    if *hostname != request.url.hostname {
                        return false;
                    }
                }
                if let Some(port) = port {
                    if *port != request.url.port {
                        return false;
                    }
                }
                if let Some(path) = path {
                    if *path != request.url.path {
                        return false;
                    }
                }
            }
        }

        if self.method != request.method {
            return false;
        }

        // Subset check: extra request headers are fine.
        for (name, value) in &self.headers {
            if request.headers.get(name) != Some(value) {
                return false;
            }
        }

        if let Some(expected) = &self.body {
            match &request.body {
                Some(chunks) => {
                    if http::comparable_body(chunks) != *expected {
                        return false;
                    }
                }
                None => return false,
            }
        }

        true
    }

    /// The bound response when the predicate holds, `None` otherwise.
    /// No mutation; safe to call repeatedly and concurrently.
    pub fn lookup(&self, request: &NormalizedRequest) -> Option<Arc<CapturedResponse>> {
        self.matches(request).then(|| Arc::clone(&self.response))
    }

    pub fn response(&self) -> &Arc<CapturedResponse> {
        &self.response
    }
}

impl Handler for Matcher {
    fn call(&self, request: &NormalizedRequest) -> Decision {
        match self.lookup(request) {
            Some(response) => Decision::Respond(response),
            None => Decision::Pass,
        }
    }
}

fn normalize_response(template: ResponseTemplate) -> CapturedResponse {
    CapturedResponse {
        version: template.version.unwrap_or_else(|| "1.1".to_string()),
        status_code: template.status_code.unwrap_or(200),
        status_message: template.status_message.unwrap_or_default(),
        headers: http::lowercase_headers(&template.headers),
        raw_headers: Vec::new(),
        body: template.body,
        trailers: http::lowercase_headers(&template.trailers),
        raw_trailers: Vec::new(),
    }
}

fn resolve_against(host: &str, reference: &str) -> Result<String, ConfigError> {
    let base = Url::parse(&format!("http://{host}/"))
        .map_err(|e| ConfigError::InvalidUrl(format!("{host}: {e}")))?;
    let url = base
        .join(reference)
        .map_err(|e| ConfigError::InvalidUrl(format!("{reference}: {e}")))?;
    // Serialization drops scheme-default ports; splice an explicitly written
    // one back so it survives into the matcher.
    if url.port().is_none() {
        if let Some(port) = explicit_port(reference) {
            return Ok(format!(
                "{}://{}:{}{}",
                url.scheme(),
                url.host_str().unwrap_or("localhost"),
                port,
                http::path_and_query(&url)
            ));
        }
    }
    Ok(url.to_string())
}

/// Port written out in a URL's authority, even when it is the scheme
/// default the parser normalizes away. `None` for relative references and
/// portless authorities.
fn explicit_port(raw: &str) -> Option<u16> {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let (_, port) = host.rsplit_once(':')?;
    // A colon inside an IPv6 literal is not a port separator.
    if port.is_empty() || port.contains(']') {
        return None;
    }
    port.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestUrl;

    fn get(url: &str) -> NormalizedRequest {
        NormalizedRequest {
            url: RequestUrl::parse(url).unwrap(),
            method: "GET".to_string(),
            headers: Headers::new(),
            body: None,
            trailers: Headers::new(),
        }
    }

    fn url_template(url: &str) -> RequestTemplate {
        RequestTemplate {
            target: Some(TargetTemplate::Url(url.to_string())),
            ..RequestTemplate::default()
        }
    }

    #[test]
    fn requires_a_target() {
        let err = Matcher::new(RequestTemplate::default(), ResponseTemplate::default());
        assert_eq!(err.unwrap_err(), ConfigError::MissingTarget);
    }

    #[test]
    fn exact_url_matches_hostname_and_path() {
        let matcher =
            Matcher::new(url_template("http://api.test/status"), ResponseTemplate::default())
                .unwrap();

        assert!(matcher.matches(&get("http://api.test/status")));
        assert!(!matcher.matches(&get("http://api.test/other")));
        assert!(!matcher.matches(&get("http://other.test/status")));
    }

    #[test]
    fn method_defaults_to_get_and_compares_case_insensitively() {
        let matcher = Matcher::new(
            RequestTemplate {
                method: Some("post".to_string()),
                ..url_template("http://api.test/todos")
            },
            ResponseTemplate::default(),
        )
        .unwrap();

        let mut request = get("http://api.test/todos");
        request.method = "POST".to_string();
        assert!(matcher.matches(&request));
        assert!(!matcher.matches(&get("http://api.test/todos")));

        let default_get =
            Matcher::new(url_template("http://api.test/todos"), ResponseTemplate::default())
                .unwrap();
        assert!(default_get.matches(&get("http://api.test/todos")));
    }

    #[test]
    fn explicit_port_must_match() {
        let matcher =
            Matcher::new(url_template("http://api.test:3000/x"), ResponseTemplate::default())
                .unwrap();

        assert!(matcher.matches(&get("http://api.test:3000/x")));
        assert!(!matcher.matches(&get("http://api.test:4000/x")));
    }

    #[test]
    fn explicit_default_port_must_still_match() {
        let matcher =
            Matcher::new(url_template("http://api.test:80/x"), ResponseTemplate::default())
                .unwrap();

        assert!(matcher.matches(&get("http://api.test/x")));
        assert!(!matcher.matches(&get("http://api.test:3000/x")));
    }

    #[test]
    fn portless_url_matches_any_port() {
        let matcher =
            Matcher::new(url_template("http://api.test/x"), ResponseTemplate::default()).unwrap();

        assert!(matcher.matches(&get("http://api.test/x")));
        assert!(matcher.matches(&get("http://api.test:3000/x")));
    }

    #[test]
    fn mapping_url_keeps_an_explicit_default_port() {
        let matcher = Matcher::from_mapping(
            "api.test",
            Mapping {
                request: Some(MappingRequest {
                    url: MappingUrl::Literal("http://api.test:80/x".to_string()),
                    method: None,
                    headers: Vec::new(),
                    body: None,
                }),
                ..Mapping::default()
            },
        )
        .unwrap();

        assert!(matcher.matches(&get("http://api.test/x")));
        assert!(!matcher.matches(&get("http://api.test:3000/x")));
    }

    #[test]
    fn pattern_matches_path_regardless_of_query() {
        let matcher = Matcher::new(
            RequestTemplate {
                target: Some(TargetTemplate::Pattern {
                    hostname: Some("api.test".to_string()),
                    pattern: Regex::new(r"^/todos/\d+").unwrap(),
                }),
                ..RequestTemplate::default()
            },
            ResponseTemplate::default(),
        )
        .unwrap();

        assert!(matcher.matches(&get("http://api.test/todos/42")));
        assert!(matcher.matches(&get("http://api.test/todos/42?verbose=1")));
        assert!(!matcher.matches(&get("http://api.test/users/42")));
        assert!(!matcher.matches(&get("http://other.test/todos/42")));
    }

    #[test]
    fn header_match_is_a_subset_check() {
        let matcher = Matcher::new(
            RequestTemplate {
                headers: vec![("X-Test".to_string(), "1".to_string())],
                ..url_template("http://api.test/x")
            },
            ResponseTemplate::default(),
        )
        .unwrap();

        let mut request = get("http://api.test/x");
        request.headers.insert("x-test".to_string(), "1".to_string());
        request.headers.insert("x-extra".to_string(), "ignored".to_string());
        assert!(matcher.matches(&request));

        request.headers.insert("x-test".to_string(), "2".to_string());
        assert!(!matcher.matches(&request));

        assert!(!matcher.matches(&get("http://api.test/x")));
    }

    #[test]
    fn body_match_is_exact() {
        let matcher = Matcher::new(
            RequestTemplate {
                body: Some("hello".to_string()),
                ..url_template("http://api.test/x")
            },
            ResponseTemplate::default(),
        )
        .unwrap();

        let mut request = get("http://api.test/x");
        request.body = Some(vec![BodyChunk::from("hel"), BodyChunk::from("lo")]);
        assert!(matcher.matches(&request));

        request.body = Some(vec![BodyChunk::from("hello there")]);
        assert!(!matcher.matches(&request));

        // A template that requires a body rejects bodiless requests.
        assert!(!matcher.matches(&get("http://api.test/x")));
    }

    #[test]
    fn template_without_body_matches_any_body() {
        let matcher =
            Matcher::new(url_template("http://api.test/x"), ResponseTemplate::default()).unwrap();

        let mut request = get("http://api.test/x");
        assert!(matcher.matches(&request));
        request.body = Some(vec![BodyChunk::from("anything")]);
        assert!(matcher.matches(&request));
    }

    #[test]
    fn response_is_normalized_and_frozen() {
        let matcher = Matcher::new(
            url_template("http://api.test/x"),
            ResponseTemplate {
                status_code: Some(204),
                headers: vec![("X-Served-By".to_string(), "rewind".to_string())],
                ..ResponseTemplate::default()
            },
        )
        .unwrap();

        let response = matcher.lookup(&get("http://api.test/x")).unwrap();
        assert_eq!(response.status_code, 204);
        assert_eq!(response.version, "1.1");
        assert_eq!(response.headers.get("x-served-by").map(String::as_str), Some("rewind"));

        // Repeated lookups return references to the same frozen value.
        let again = matcher.lookup(&get("http://api.test/x")).unwrap();
        assert!(Arc::ptr_eq(&response, &again));
    }

    #[test]
    fn lookup_misses_return_none() {
        let matcher =
            Matcher::new(url_template("http://api.test/x"), ResponseTemplate::default()).unwrap();
        assert!(matcher.lookup(&get("http://api.test/y")).is_none());
    }

    #[test]
    fn mapping_requires_exactly_one_of_path_and_request() {
        let neither = Matcher::from_mapping("api.test", Mapping::default());
        assert_eq!(neither.unwrap_err(), ConfigError::MappingTarget);

        let both = Matcher::from_mapping(
            "api.test",
            Mapping {
                path: Some("/status".to_string()),
                request: Some(MappingRequest {
                    url: MappingUrl::Literal("/status".to_string()),
                    method: None,
                    headers: Vec::new(),
                    body: None,
                }),
                ..Mapping::default()
            },
        );
        assert_eq!(both.unwrap_err(), ConfigError::MappingTarget);
    }

    #[test]
    fn mapping_path_shorthand_resolves_against_host() {
        let matcher = Matcher::from_mapping(
            "api.test",
            Mapping {
                path: Some("/status".to_string()),
                response: Some(ResponseTemplate {
                    status_code: Some(204),
                    ..ResponseTemplate::default()
                }),
                ..Mapping::default()
            },
        )
        .unwrap();

        let response = matcher.lookup(&get("http://api.test/status")).unwrap();
        assert_eq!(response.status_code, 204);
        assert!(matcher.lookup(&get("http://other.test/status")).is_none());
    }

    #[test]
    fn mapping_pattern_binds_the_given_host() {
        let matcher = Matcher::from_mapping(
            "api.test",
            Mapping {
                request: Some(MappingRequest {
                    url: MappingUrl::Pattern(Regex::new(r"^/v\d+/").unwrap()),
                    method: None,
                    headers: Vec::new(),
                    body: None,
                }),
                ..Mapping::default()
            },
        )
        .unwrap();

        assert!(matcher.matches(&get("http://api.test/v2/todos")));
        assert!(!matcher.matches(&get("http://other.test/v2/todos")));
    }

    #[test]
    fn mapping_full_url_keeps_its_own_host() {
        let matcher = Matcher::from_mapping(
            "api.test",
            Mapping {
                request: Some(MappingRequest {
                    url: MappingUrl::Literal("http://cdn.test/asset".to_string()),
                    method: None,
                    headers: Vec::new(),
                    body: None,
                }),
                ..Mapping::default()
            },
        )
        .unwrap();

        assert!(matcher.matches(&get("http://cdn.test/asset")));
        assert!(!matcher.matches(&get("http://api.test/asset")));
    }
}
