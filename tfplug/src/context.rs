//! Request-scoped context and cancellation
//!
//! Every protocol call gets a `Context` derived from the server's root
//! context. StopProvider cancels the root, which cancels every outstanding
//! request; a deadline cancels a single request.

use crate::error::{Result, TfplugError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

/// Context carries request-scoped values like cancellation signals and timeouts
/// Pass this as first parameter to async trait methods
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: Uuid,
    operation: String,
    deadline: Option<Instant>,
    done: watch::Sender<bool>,
    parent: Option<Context>,
}

impl Context {
    pub fn new() -> Self {
        Self::build("", None, None)
    }

    fn build(operation: &str, deadline: Option<Instant>, parent: Option<Context>) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                request_id: Uuid::new_v4(),
                operation: operation.to_string(),
                deadline,
                done,
                parent,
            }),
        }
    }

    /// Derives a context for one operation; cancelling the parent cancels it
    pub fn child(&self, operation: &str) -> Self {
        Self::build(operation, self.inner.deadline, Some(self.clone()))
    }

    /// Same request with an added deadline; the earlier deadline wins
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self::build(&self.inner.operation, Some(deadline), Some(self.clone()))
    }

    pub fn request_id(&self) -> Uuid {
        self.inner.request_id
    }

    pub fn operation(&self) -> &str {
        &self.inner.operation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn cancel(&self) {
        self.inner.done.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
            || self.inner.deadline.is_some_and(|d| Instant::now() >= d)
            || self.inner.parent.as_ref().is_some_and(Context::is_cancelled)
    }

    /// Resolves once this context or any ancestor is cancelled or expires
    pub fn cancelled(&self) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut done = self.inner.done.subscribe();
            let own = async move {
                let _ = done.wait_for(|cancelled| *cancelled).await;
            };
            let expiry = async {
                match self.inner.deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                    None => std::future::pending().await,
                }
            };
            let parent = async {
                match &self.inner.parent {
                    Some(parent) => parent.cancelled().await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = own => {}
                _ = expiry => {}
                _ = parent => {}
            }
        })
    }

    /// Runs `fut` inside this context's span unless cancelled first
    pub async fn run<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(TfplugError::Cancelled);
        }
        let fut = fut.instrument(self.span());
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(TfplugError::Cancelled),
            output = fut => Ok(output),
        }
    }

    /// Span carrying the request id and operation for log correlation
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.inner.request_id,
            operation = %self.inner.operation
        )
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.inner.request_id)
            .field("operation", &self.inner.operation)
            .field("deadline", &self.inner.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
