//! Convergence helper for idempotent remote operations.
//!
//! The organization rejects overlapping writes with a concurrent-modification
//! error and reports already-applied changes as distinct errors. Both are
//! expected while converging on a desired state, so [`retry_until_converged`]
//! folds them into a [`Convergence`] outcome and only surfaces real failures.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use org_activator_model::{RemoteError, RemoteErrorKind};
use tracing::debug;

/// Backoff and attempt limit for [`retry_until_converged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait after each concurrent-modification rejection.
    pub backoff: Duration,
    /// Total attempts allowed; `None` keeps retrying while contended.
    pub max_attempts: Option<NonZeroU32>,
}

impl RetryPolicy {
    /// Default wait between contended attempts.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

    /// Retry for as long as the remote side reports contention.
    #[must_use]
    pub fn unbounded(backoff: Duration) -> Self {
        Self {
            backoff,
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` contended attempts.
    #[must_use]
    pub fn bounded(backoff: Duration, max_attempts: NonZeroU32) -> Self {
        Self {
            backoff,
            max_attempts: Some(max_attempts),
        }
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.get())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Self::DEFAULT_BACKOFF)
    }
}

/// How an operation reached the desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The final call succeeded.
    Applied {
        /// Calls made, including contended ones.
        attempts: u32,
    },
    /// The remote side reported the state was already in place.
    AlreadyApplied {
        /// Calls made, including contended ones.
        attempts: u32,
    },
}

impl Convergence {
    /// Number of calls made.
    #[must_use]
    pub fn attempts(self) -> u32 {
        match self {
            Self::Applied { attempts } | Self::AlreadyApplied { attempts } => attempts,
        }
    }
}

/// Invoke `operation` until it succeeds or reports the state already holds.
///
/// Concurrent-modification errors sleep `policy.backoff` and retry the same
/// operation. When the attempt limit is hit the last contention error is
/// returned. Any other error is returned immediately.
///
/// # Errors
/// Returns the first error that is neither already-in-desired-state nor
/// concurrent-modification, or the last contention error once attempts run out.
pub async fn retry_until_converged<F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<Convergence, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), RemoteError>>,
{
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        match operation().await {
            Ok(()) => return Ok(Convergence::Applied { attempts }),
            Err(e) if e.is(RemoteErrorKind::AlreadyInDesiredState) => {
                return Ok(Convergence::AlreadyApplied { attempts });
            }
            Err(e) if e.is(RemoteErrorKind::ConcurrentModification) => {
                if policy.exhausted(attempts) {
                    return Err(e);
                }
                debug!(
                    operation = e.operation(),
                    attempts,
                    backoff_ms = u64::try_from(policy.backoff.as_millis()).unwrap_or(u64::MAX),
                    "concurrent modification in progress, retrying",
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn contention() -> RemoteError {
        RemoteError::new(
            "EnablePolicyType",
            "ConcurrentModificationException",
            "AWS Organizations can't complete your request because it conflicts with another attempt",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_through_contention() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let outcome = retry_until_converged(RetryPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 3 { Err(contention()) } else { Ok(()) } }
        })
        .await
        .unwrap();

        assert_eq!(outcome, Convergence::Applied { attempts: 4 });
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_should_short_circuit_when_already_applied() {
        let calls = AtomicU32::new(0);

        let outcome = retry_until_converged(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(RemoteError::new(
                    "EnablePolicyType",
                    "PolicyTypeAlreadyEnabledException",
                    "already enabled",
                ))
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, Convergence::AlreadyApplied { attempts: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_should_propagate_unrecoverable_error() {
        let calls = AtomicU32::new(0);

        let err = retry_until_converged(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<(), _>(RemoteError::new(
                    "EnablePolicyType",
                    "AccessDeniedException",
                    "denied",
                ))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.code(), "AccessDeniedException");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_should_not_treat_invalid_operation_as_converged() {
        let err = retry_until_converged(RetryPolicy::default(), || async {
            Err::<(), _>(RemoteError::new(
                "DeactivateOrganizationsAccess",
                "InvalidOperationException",
                "not active",
            ))
        })
        .await
        .unwrap_err();

        assert!(err.is(RemoteErrorKind::InvalidOperation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_give_up_when_bounded() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::bounded(Duration::from_millis(100), NonZeroU32::new(3).unwrap());

        let err = retry_until_converged(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(contention()) }
        })
        .await
        .unwrap_err();

        assert!(err.is(RemoteErrorKind::ConcurrentModification));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
