//! Playback response: an HTTP client response replayed from a captured
//! transaction.
//!
//! # Design
//! Status, headers and trailers are an immutable snapshot taken at
//! construction. The body is consumed destructively through [`pull`]: each
//! pull removes and returns the next chunk; exhaustion yields [`Pull::End`]
//! once, then the terminal [`Pull::Closed`], mirroring the lifecycle of a
//! real transport stream. Nothing is produced before it is pulled, and a
//! drained response cannot be rewound — build a fresh one from the same
//! captured transaction to replay it again.
//!
//! [`pull`]: PlaybackResponse::pull

use std::collections::VecDeque;

use crate::defer::Deferred;
use crate::http::{BodyChunk, CapturedResponse, Headers};

/// One step of pull-based body consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pull {
    /// The next body chunk, in original capture order.
    Chunk(BodyChunk),

    /// End of stream; delivered exactly once after the last chunk.
    End,

    /// Terminal signal following end-of-stream.
    Closed,
}

/// An HTTP client response played back from a captured transaction.
#[derive(Debug, Clone)]
pub struct PlaybackResponse {
    version: String,
    status_code: u16,
    status_message: String,
    headers: Headers,
    raw_headers: Vec<String>,
    trailers: Headers,
    raw_trailers: Vec<String>,
    body: VecDeque<BodyChunk>,
    drained: bool,
}

impl PlaybackResponse {
    pub fn new(captured: &CapturedResponse) -> Self {
        let status_message = if captured.status_message.is_empty() {
            reason_phrase(captured.status_code).unwrap_or("").to_string()
        } else {
            captured.status_message.clone()
        };
        Self {
            version: captured.version.clone(),
            status_code: captured.status_code,
            status_message,
            headers: captured.headers.clone(),
            raw_headers: captured.raw_headers.clone(),
            trailers: captured.trailers.clone(),
            raw_trailers: captured.raw_trailers.clone(),
            body: captured.body.iter().cloned().collect(),
            drained: false,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn version_major(&self) -> u16 {
        self.version
            .split('.')
            .next()
            .and_then(|part| part.parse().ok())
            .unwrap_or(1)
    }

    pub fn version_minor(&self) -> u16 {
        self.version
            .split('.')
            .nth(1)
            .and_then(|part| part.parse().ok())
            .unwrap_or(0)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn raw_headers(&self) -> &[String] {
        &self.raw_headers
    }

    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn raw_trailers(&self) -> &[String] {
        &self.raw_trailers
    }

    /// Remove and return the next body chunk; then `End` once, then `Closed`.
    pub fn pull(&mut self) -> Pull {
        if let Some(chunk) = self.body.pop_front() {
            return Pull::Chunk(chunk);
        }
        if !self.drained {
            self.drained = true;
            Pull::End
        } else {
            Pull::Closed
        }
    }

    /// Accepted for interface parity; there is no transport underneath, so
    /// the returned future completes on the next turn and aborts nothing.
    pub fn set_timeout(&self, _msec: u64) -> Deferred {
        Deferred::new()
    }
}

/// Canonical reason phrase for a status code, when there is one.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        412 => "Precondition Failed",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return None,
    };
    Some(phrase)
}
