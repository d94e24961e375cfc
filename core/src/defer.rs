//! One-turn deferral.
//!
//! Playback computes its results synchronously, but clients of a real HTTP
//! exchange expect to hear back on a later scheduling turn — code that
//! registers a completion listener right after sending must still see it
//! fire. [`Deferred`] makes that contract explicit: it wakes itself and
//! yields to the scheduler exactly once before completing. Settlement and
//! the no-op timeouts are both built on it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future that completes on its second poll, never its first.
#[derive(Debug, Default)]
pub struct Deferred {
    yielded: bool,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Future for Deferred {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
