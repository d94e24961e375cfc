//! Processing chain: pass each request through an ordered list of handlers.
//!
//! # Design
//! Each handler looks at the normalized request and returns a [`Decision`]:
//! respond with a captured transaction, fail with an error, or pass to the
//! next handler. The chain is a plain vector traversed front to back —
//! `append` pushes to the tail (the new handler runs after everything already
//! in the chain), `prepend` inserts at the head (the new handler runs first).
//! Dispatch keeps no state on the chain itself, so any number of requests can
//! walk the same chain at the same time.

use std::sync::Arc;

use crate::error::HandlerError;
use crate::http::{CapturedResponse, NormalizedRequest};

/// What a handler decided about one request.
#[derive(Debug)]
pub enum Decision {
    /// Answer the request with this captured transaction; dispatch stops.
    Respond(Arc<CapturedResponse>),

    /// Fail the request with this error; dispatch stops.
    Fail(HandlerError),

    /// Defer to the next handler in the chain.
    Pass,
}

/// Decides, per request, whether to answer, fail, or defer.
pub trait Handler: Send + Sync {
    fn call(&self, request: &NormalizedRequest) -> Decision;
}

/// Adapt a closure into a [`Handler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&NormalizedRequest) -> Decision + Send + Sync,
{
    HandlerFn(f)
}

/// A [`Handler`] backed by a closure. Built with [`handler_fn`].
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&NormalizedRequest) -> Decision + Send + Sync,
{
    fn call(&self, request: &NormalizedRequest) -> Decision {
        (self.0)(request)
    }
}

/// The result of running a request through the whole chain.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Some handler answered.
    Response(Arc<CapturedResponse>),

    /// Some handler failed; the error short-circuited the chain.
    Error(HandlerError),

    /// Every handler passed — no fixture and no passthrough applied.
    NoMatch,
}

/// Ordered sequence of handlers consulted per request.
#[derive(Default)]
pub struct Chain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler at the tail: it runs after every handler already in the
    /// chain, and before anything appended later.
    pub fn append(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Add a handler at the head: it runs before every handler currently in
    /// the chain.
    pub fn prepend(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.insert(0, Arc::new(handler));
        self
    }

    /// Remove all handlers.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the request through the handlers in order. The first `Respond` or
    /// `Fail` wins; if every handler passes, the outcome is `NoMatch`. The
    /// chain itself raises no errors.
    pub fn dispatch(&self, request: &NormalizedRequest) -> DispatchOutcome {
        for handler in &self.handlers {
            match handler.call(request) {
                Decision::Pass => continue,
                Decision::Respond(response) => return DispatchOutcome::Response(response),
                Decision::Fail(error) => return DispatchOutcome::Error(error),
            }
        }
        DispatchOutcome::NoMatch
    }
}
