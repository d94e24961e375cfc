//! Error types for fixture playback.
//!
//! # Design
//! Three kinds of failure, matching who has to deal with them:
//! `ConfigError` is synchronous and programmer-facing — a fixture or request
//! was built wrong, and construction aborts immediately. `HandlerError` wraps
//! whatever a handler or transport produced and travels through the chain
//! unchanged. `RequestError` is what a settled request reports: either a
//! handler failure or a synthetic connection refusal because nothing in the
//! chain answered. Refusal gets a dedicated variant because callers branch
//! on it.

use std::error::Error;
use std::fmt;
use std::io;

/// Fail-fast construction and usage errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A fixture template carried neither a URL nor a path pattern.
    MissingTarget,

    /// A fixture description specified both `path` and `request`, or neither.
    MappingTarget,

    /// A fixture URL did not parse.
    InvalidUrl(String),

    /// A request was mutated after `end` was called.
    AlreadyEnded,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingTarget => {
                write!(f, "fixture needs a URL or a path pattern to match requests against")
            }
            ConfigError::MappingTarget => {
                write!(f, "fixture must specify either a path or a request, not both")
            }
            ConfigError::InvalidUrl(detail) => {
                write!(f, "invalid fixture URL: {detail}")
            }
            ConfigError::AlreadyEnded => {
                write!(f, "request already ended")
            }
        }
    }
}

impl Error for ConfigError {}

/// An error produced by a handler or a passthrough transport.
///
/// Opaque to the chain: dispatch stops and the error is delivered to the
/// caller unchanged.
pub struct HandlerError(Box<dyn Error + Send + Sync>);

impl HandlerError {
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self(error.into())
    }

    /// Build a handler error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }

    pub fn inner(&self) -> &(dyn Error + Send + Sync) {
        self.0.as_ref()
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        let inner: &(dyn Error + 'static) = self.0.as_ref();
        Some(inner)
    }
}

/// Terminal failure reported when a request settles.
#[derive(Debug)]
pub enum RequestError {
    /// A handler in the chain failed; carried unchanged.
    Handler(HandlerError),

    /// No handler produced a result, so the exchange never happened.
    Refused { method: String, url: String },
}

impl RequestError {
    pub fn is_refused(&self) -> bool {
        matches!(self, RequestError::Refused { .. })
    }

    /// The `io::ErrorKind` a real socket would have reported.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            RequestError::Refused { .. } => io::ErrorKind::ConnectionRefused,
            RequestError::Handler(_) => io::ErrorKind::Other,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Handler(error) => fmt::Display::fmt(error, f),
            RequestError::Refused { method, url } => {
                write!(f, "{method} {url} refused: no recorded fixture and no network access")
            }
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RequestError::Handler(error) => error.source(),
            RequestError::Refused { .. } => None,
        }
    }
}
