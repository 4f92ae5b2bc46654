use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{self, Either};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reason a [`Context`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Cancelled => write!(f, "context cancelled"),
            ContextError::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for ContextError {}

/// Cancellation and deadline signal handed to every task run.
///
/// Clones share the same cancellation state. Derived contexts (`with_cancel`,
/// `with_deadline`, `with_timeout`) are cancelled together with their parent,
/// but cancelling a derived context leaves the parent untouched.
///
/// Runners never look at the context themselves: observing it is up to each
/// task.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a context that is done at `deadline` or earlier if the parent's
    /// deadline comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel this context, its clones and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        let cancelled = pin!(self.token.cancelled());
        let Some(deadline) = self.deadline else {
            cancelled.await;
            return ContextError::Cancelled;
        };

        let expired = pin!(tokio::time::sleep_until(deadline));
        match future::select(cancelled, expired).await {
            Either::Left(_) => ContextError::Cancelled,
            Either::Right(_) => ContextError::DeadlineExceeded,
        }
    }

    /// Drive `fut` to completion unless the context is done first.
    pub async fn until_done<F: Future>(&self, fut: F) -> Result<F::Output, ContextError> {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            output = fut => Ok(output),
        }
    }
}
