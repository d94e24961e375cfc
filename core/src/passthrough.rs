//! Passthrough: delegate selected requests to a real network caller.
//!
//! # Design
//! The actual round trip is the host's job — this crate never touches a
//! socket. A [`Transport`] executes one normalized request and returns the
//! fully-captured transaction; [`PassThrough`] wraps a transport in a
//! [`Handler`] gated by an allow rule, so it slots into the chain next to
//! fixture matchers. Requests the rule rejects pass to the next handler;
//! transport errors short-circuit the chain like any other handler failure.

use std::sync::Arc;

use crate::chain::{Decision, Handler};
use crate::error::HandlerError;
use crate::http::{CapturedResponse, NormalizedRequest};

/// Executes one real HTTP round trip and captures the whole transaction.
pub trait Transport: Send + Sync {
    fn round_trip(&self, request: &NormalizedRequest) -> Result<CapturedResponse, HandlerError>;
}

impl<F> Transport for F
where
    F: Fn(&NormalizedRequest) -> Result<CapturedResponse, HandlerError> + Send + Sync,
{
    fn round_trip(&self, request: &NormalizedRequest) -> Result<CapturedResponse, HandlerError> {
        self(request)
    }
}

enum AllowRule {
    All,
    Host(String),
    Fixed(bool),
    Predicate(Box<dyn Fn(&NormalizedRequest) -> bool + Send + Sync>),
}

/// Handler that forwards allowed requests to a [`Transport`].
pub struct PassThrough<T> {
    transport: T,
    allow: AllowRule,
}

impl<T: Transport> PassThrough<T> {
    /// Forward every request.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            allow: AllowRule::All,
        }
    }

    /// Forward only requests for one hostname.
    pub fn for_host(transport: T, hostname: impl Into<String>) -> Self {
        Self {
            transport,
            allow: AllowRule::Host(hostname.into()),
        }
    }

    /// Forward everything or nothing, fixed at construction.
    pub fn enabled(transport: T, enabled: bool) -> Self {
        Self {
            transport,
            allow: AllowRule::Fixed(enabled),
        }
    }

    /// Forward requests the predicate accepts.
    pub fn when(
        transport: T,
        predicate: impl Fn(&NormalizedRequest) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            transport,
            allow: AllowRule::Predicate(Box::new(predicate)),
        }
    }

    fn allowed(&self, request: &NormalizedRequest) -> bool {
        match &self.allow {
            AllowRule::All => true,
            AllowRule::Host(hostname) => *hostname == request.url.hostname,
            AllowRule::Fixed(enabled) => *enabled,
            AllowRule::Predicate(predicate) => predicate(request),
        }
    }
}

impl<T: Transport> Handler for PassThrough<T> {
    fn call(&self, request: &NormalizedRequest) -> Decision {
        if !self.allowed(request) {
            return Decision::Pass;
        }
        match self.transport.round_trip(request) {
            Ok(captured) => Decision::Respond(Arc::new(captured)),
            Err(error) => Decision::Fail(error),
        }
    }
}
