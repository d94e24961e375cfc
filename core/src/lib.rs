//! HTTP interception and fixture playback for tests.
//!
//! # Overview
//! Test code builds a [`PlaybackRequest`] the way it would build any HTTP
//! client request — method, URL, headers, body parts — and ends it. Instead
//! of dialing out, the request runs a [`Chain`] of handlers: fixture
//! [`Matcher`]s answer from recorded responses, a [`PassThrough`] may
//! delegate to a real caller, and when nothing answers the request settles
//! with a synthetic connection refusal. The caller sees the same
//! asynchronous lifecycle a live exchange would have produced, down to the
//! outcome never arriving on the turn that sent the request.
//!
//! # Design
//! - No real I/O anywhere in this crate: responses are plain captured data,
//!   and the one genuine-I/O seam ([`Transport`]) is injected by the host.
//! - Playback is deterministic: fixtures are frozen at registration and the
//!   chain keeps no per-request state, so concurrent requests are
//!   independent.
//! - The asynchronous contract is explicit: [`Settlement`] and [`Deferred`]
//!   always yield to the scheduler once before resolving.
//! - Address resolution for intercepted hosts is an injected
//!   [`LocalhostResolver`], not a process-wide patch.

pub mod chain;
pub mod defer;
pub mod error;
pub mod http;
pub mod matcher;
pub mod passthrough;
pub mod request;
pub mod resolve;
pub mod response;

pub use chain::{handler_fn, Chain, Decision, DispatchOutcome, Handler, HandlerFn};
pub use defer::Deferred;
pub use error::{ConfigError, HandlerError, RequestError};
pub use http::{BodyChunk, CapturedResponse, Headers, NormalizedRequest, RequestUrl};
pub use matcher::{
    Mapping, MappingRequest, MappingUrl, Matcher, RequestTemplate, ResponseTemplate,
    TargetTemplate,
};
pub use passthrough::{PassThrough, Transport};
pub use request::{Agent, PlaybackRequest, RequestOptions, Settlement};
pub use resolve::{AddressFamily, LocalhostResolver};
pub use response::{PlaybackResponse, Pull};
