//! One-shot asynchronous results
//!
//! A [`Deferred`] is handed back as soon as a call is issued and resolves
//! exactly once, when the spawned work finishes. Dropping it does not cancel
//! that work.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::error::ApiError;

/// Result of a spawned call, resolved exactly once
#[derive(Debug)]
#[must_use = "a Deferred does nothing unless awaited"]
pub struct Deferred<T> {
    receiver: oneshot::Receiver<Result<T, ApiError>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Runs `work` as an independent task on the current tokio runtime
    ///
    /// Outside a runtime, `work` is dropped without running and the result
    /// resolves to [`ApiError::NoRuntime`].
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    // Receiver may already be gone; the work still ran to completion
                    let _ = sender.send(work.await);
                });
            }
            Err(e) => {
                let _ = sender.send(Err(ApiError::NoRuntime(e.to_string())));
            }
        }
        Self { receiver }
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ApiError::Abandoned)))
    }
}
