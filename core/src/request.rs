//! Playback request: an HTTP client request that never touches the network.
//!
//! # Design
//! A [`PlaybackRequest`] collects method, URL, headers and body parts, then
//! on [`end`] runs the handler chain exactly once with its normalized form.
//! The state machine is explicit: Building until `end`, Ended afterwards,
//! settled only through the returned [`Settlement`] future. Settlement is
//! computed synchronously but delivered on a later scheduling turn — the
//! future yields once before resolving, so callers never observe the outcome
//! inside the call that ended the request, whatever that outcome is.
//!
//! [`end`]: PlaybackRequest::end

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use bytes::Bytes;

use crate::chain::{Chain, DispatchOutcome};
use crate::defer::Deferred;
use crate::error::{ConfigError, RequestError};
use crate::http::{self, BodyChunk, Headers, NormalizedRequest, RequestUrl};
use crate::response::PlaybackResponse;

/// Stand-in for a client agent: only the protocol it would dial with.
#[derive(Debug, Clone, Default)]
pub struct Agent {
    pub protocol: Option<String>,
}

/// Conventional HTTP client options. Everything is optional; defaults follow
/// what a real client would do: method GET, path `/`, protocol `http:` (or
/// the agent's), port 80/443 per scheme, host `localhost`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<String>,
    /// Host name, optionally with an embedded `:port`.
    pub host: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    /// Scheme with or without the trailing colon, e.g. `https:`.
    pub protocol: Option<String>,
    pub headers: Vec<(String, String)>,
    pub auth: Option<String>,
    pub agent: Option<Agent>,
}

/// An HTTP client request that captures what was sent and plays back a
/// response from the handler chain.
pub struct PlaybackRequest {
    chain: Arc<Chain>,
    method: String,
    url: RequestUrl,
    headers: Headers,
    auth: Option<String>,
    agent: Option<Agent>,
    trailers: Headers,
    body: Option<Vec<BodyChunk>>,
    ended: bool,
}

impl PlaybackRequest {
    pub fn new(options: RequestOptions, chain: Arc<Chain>) -> Self {
        let method = options
            .method
            .unwrap_or_else(|| "GET".to_string())
            .to_ascii_uppercase();
        let protocol = options
            .protocol
            .or_else(|| options.agent.as_ref().and_then(|agent| agent.protocol.clone()))
            .unwrap_or_else(|| "http:".to_string());
        let scheme = protocol.trim_end_matches(':').to_string();

        let host = options
            .host
            .or(options.hostname)
            .unwrap_or_else(|| "localhost".to_string());
        let (hostname, embedded_port) = match host.split_once(':') {
            Some((name, port)) => (name.to_string(), port.parse().ok()),
            None => (host, None),
        };
        let hostname = if hostname.is_empty() {
            "localhost".to_string()
        } else {
            hostname
        };
        let port = options
            .port
            .or(embedded_port)
            .unwrap_or_else(|| http::default_port(&scheme));

        Self {
            chain,
            method,
            url: RequestUrl {
                scheme,
                hostname,
                port,
                path: options.path.unwrap_or_else(|| "/".to_string()),
            },
            headers: http::lowercase_headers(&options.headers),
            auth: options.auth,
            agent: options.agent,
            trailers: Headers::new(),
            body: None,
            ended: false,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &RequestUrl {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn auth(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Set a header; the name is lower-cased, the value coerced to a string.
    pub fn set_header(&mut self, name: &str, value: impl ToString) -> Result<(), ConfigError> {
        if self.ended {
            return Err(ConfigError::AlreadyEnded);
        }
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn remove_header(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.ended {
            return Err(ConfigError::AlreadyEnded);
        }
        self.headers.remove(&name.to_ascii_lowercase());
        Ok(())
    }

    pub fn add_trailers(&mut self, trailers: impl IntoIterator<Item = (String, String)>) {
        for (name, value) in trailers {
            self.trailers.insert(name.to_ascii_lowercase(), value);
        }
    }

    /// Append a body part.
    pub fn write(
        &mut self,
        chunk: impl Into<Bytes>,
        encoding: Option<&str>,
    ) -> Result<(), ConfigError> {
        if self.ended {
            return Err(ConfigError::AlreadyEnded);
        }
        self.body
            .get_or_insert_with(Vec::new)
            .push(BodyChunk::new(chunk, encoding));
        Ok(())
    }

    /// Accepted for interface parity: the transaction is materialized before
    /// any decision exists, so there is no in-flight I/O to cancel.
    pub fn abort(&mut self) {}

    /// No transport underneath means no real timer: the returned future
    /// completes on the next turn and never aborts pending work.
    pub fn set_timeout(&self, _msec: u64) -> Deferred {
        Deferred::new()
    }

    /// The request as handlers see it.
    pub fn normalized(&self) -> NormalizedRequest {
        NormalizedRequest {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            trailers: self.trailers.clone(),
        }
    }

    /// Finalize the request, optionally appending a last body chunk.
    ///
    /// The first call dispatches the chain exactly once and returns the
    /// [`Settlement`] that will deliver the outcome on a later scheduling
    /// turn. Further calls are no-ops and return `None`.
    pub fn end(&mut self, data: Option<BodyChunk>) -> Option<Settlement> {
        if self.ended {
            return None;
        }
        if let Some(chunk) = data {
            self.body.get_or_insert_with(Vec::new).push(chunk);
        }
        self.ended = true;

        let outcome = match self.chain.dispatch(&self.normalized()) {
            DispatchOutcome::Response(captured) => Ok(PlaybackResponse::new(&captured)),
            DispatchOutcome::Error(error) => Err(RequestError::Handler(error)),
            DispatchOutcome::NoMatch => Err(RequestError::Refused {
                method: self.method.clone(),
                url: self.url.to_string(),
            }),
        };
        Some(Settlement {
            delay: Deferred::new(),
            outcome: Some(outcome),
        })
    }
}

/// The pending outcome of an ended request.
///
/// Resolves to the playback response, a handler error, or the synthetic
/// refusal — never on its first poll.
#[derive(Debug)]
pub struct Settlement {
    delay: Deferred,
    outcome: Option<Result<PlaybackResponse, RequestError>>,
}

impl Future for Settlement {
    type Output = Result<PlaybackResponse, RequestError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        ready!(Pin::new(&mut this.delay).poll(cx));
        Poll::Ready(this.outcome.take().expect("settlement polled after completion"))
    }
}
