//! Cancellation and deadlines for store calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::GraphError;
use crate::error::{Result, SyncError};

/// Caller-provided cancellation signal plus an optional deadline.
///
/// Each store call is run through [`CancelScope::run`]: it is not started
/// once the scope is done, and an in-flight call is abandoned when the
/// token fires or the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelScope {
    /// A scope that only ends when cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow an existing token, e.g. a child of a service shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::new().deadline_at(deadline)
    }

    /// Set or tighten the deadline. A later deadline than the current one is ignored.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Err if the scope is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(SyncError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run one store call under this scope.
    pub async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, GraphError>>,
    {
        self.check()?;

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(SyncError::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => Err(SyncError::DeadlineExceeded),
                    res = call => res.map_err(SyncError::from),
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(SyncError::Cancelled),
                    res = call => res.map_err(SyncError::from),
                }
            }
        }
    }
}
