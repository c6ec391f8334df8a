use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::{BlobResult, BlobStoreError, CancelReason};

/// Per-call cancellation and deadline carried into every store operation.
///
/// File I/O cannot be interrupted mid-syscall, so stores only consult the
/// context at boundaries: before touching the filesystem, and before a write
/// is committed.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Wraps a token owned elsewhere, e.g. a server's shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    /// Derives a context that is canceled with this one and additionally
    /// expires at `deadline`. The earlier of the two deadlines wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Canceling the child leaves `self` untouched.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.reason().is_some()
    }

    /// Returns `Canceled` once the token fires or the deadline has passed.
    pub fn check(&self) -> BlobResult<()> {
        match self.reason() {
            Some(reason) => Err(BlobStoreError::Canceled(reason)),
            None => Ok(()),
        }
    }

    fn reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Some(CancelReason::DeadlineExceeded)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel_propagates_to_children_only() {
        let parent = Context::background();
        let child = parent.child();

        child.cancel();
        assert!(child.check().unwrap_err().is_canceled());
        assert!(!parent.is_done());

        let child = parent.child();
        parent.cancel();
        assert!(child.is_done());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::background().with_deadline(Instant::now() - Duration::from_millis(1));
        match ctx.check() {
            Err(BlobStoreError::Canceled(CancelReason::DeadlineExceeded)) => {}
            other => panic!("expected deadline exceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let outer = Context::background().with_deadline(now + Duration::from_secs(1));
        let inner = outer.with_deadline(now + Duration::from_secs(60));
        assert_eq!(inner.deadline(), Some(now + Duration::from_secs(1)));
    }
}
