//! Bounded convergence polling.
//!
//! Cloud APIs acknowledge a mutating call long before the mutation is
//! observable. [`retry_until`] repeatedly evaluates a caller-supplied
//! predicate until it reports success, fails hard, or the attempt budget
//! runs out. Resource operations use it to block after a create or delete
//! call until the resource is externally observable in the intended state.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// The state a convergence wait is driving towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTarget {
    Created,
    Deleted,
}

impl StateTarget {
    /// Whether the target state is "the resource exists".
    pub fn exists(self) -> bool {
        matches!(self, StateTarget::Created)
    }
}

impl fmt::Display for StateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateTarget::Created => write!(f, "created"),
            StateTarget::Deleted => write!(f, "deleted"),
        }
    }
}

/// Attempt budget for a convergence wait.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay between attempts.
    pub interval: Duration,
    /// Maximum number of predicate evaluations.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    /// Sized for cloud-API propagation latency: 2s between attempts,
    /// two minutes total.
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 60)
    }
}

/// Polls `predicate` until it succeeds, fails hard, or the budget is spent.
///
/// The predicate returns `Ok(true)` on success, `Ok(false)` to keep
/// retrying, and `Err(_)` for a fatal condition that aborts the wait
/// immediately. An exhausted budget yields `Ok(false)`; the caller must
/// translate that into its own convergence error (the "did not become
/// created/deleted" taxonomy), since only it knows the intended state.
///
/// The loop keeps no state outside its own frame, so dropping the future
/// (request cancellation, deadline) stops polling at the next await point
/// without stranding any bookkeeping.
pub async fn retry_until<F, Fut, E>(policy: RetryPolicy, mut predicate: F) -> Result<bool, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    for attempt in 1..=policy.max_attempts {
        if predicate().await? {
            return Ok(true);
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Ok(false)
}
