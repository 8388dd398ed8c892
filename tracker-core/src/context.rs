//! Cancellation context for ledger operations
//!
//! A [`Context`] is handed to every ledger call. It only matters while the
//! caller is queued on an account lock: once the lock is held the update
//! runs to completion regardless of the context.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Cancellation token plus optional deadline
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Context that never fires on its own
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one cancelled by a signal handler
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Child context that also fires once `timeout` has elapsed
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context that also fires at `deadline`.
    ///
    /// An earlier deadline inherited from `self` is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Child context cancelled together with `self`
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context has been cancelled or its deadline has passed
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or the deadline passes
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Drive `fut` unless the context fires first.
    ///
    /// `fut` must be cancel-safe: it is dropped when the context wins.
    pub(crate) async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        if self.is_done() {
            return Err(Error::OperationCancelled);
        }

        tokio::select! {
            biased;
            out = fut => Ok(out),
            _ = self.done() => Err(Error::OperationCancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_future() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert_eq!(ctx.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancelled_context_rejects() {
        let ctx = Context::background();
        ctx.cancel();
        assert!(ctx.is_done());

        let result = ctx.run(async { 7 }).await;
        assert!(matches!(result, Err(Error::OperationCancelled)));
    }

    #[tokio::test]
    async fn test_timeout_fires_while_pending() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(Error::OperationCancelled)));
        assert!(ctx.is_done());
    }

    #[tokio::test]
    async fn test_parent_cancel_reaches_child() {
        let parent = Context::background();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        parent.cancel();
        assert!(child.is_done());
        assert!(grandchild.is_done());
    }

    #[tokio::test]
    async fn test_child_cancel_leaves_parent() {
        let parent = Context::background();
        let child = parent.child();

        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let base = Context::background().with_timeout(Duration::from_secs(1));
        let narrowed = base.with_timeout(Duration::from_secs(60));
        assert_eq!(narrowed.deadline(), base.deadline());
    }
}
