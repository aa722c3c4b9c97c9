//! Bounded-failure polling combinator
//!
//! Repeats an operation on a fixed interval until it reports a value, the
//! cancellation token fires, or the operation has failed more times than
//! the policy allows. "Not ready yet" results are never counted against
//! the budget: only errors are.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{Error, Result};

/// Interval and failure tolerance for [`poll_with_budget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before every attempt, including the first
    pub interval: Duration,
    /// Failures tolerated; the next one ends polling with an error
    pub max_failures: usize,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_failures: usize) -> Self {
        Self {
            interval,
            max_failures,
        }
    }
}

impl From<&crate::config::PropagationConfig> for PollPolicy {
    fn from(config: &crate::config::PropagationConfig) -> Self {
        Self::new(config.poll_interval(), config.max_query_failures)
    }
}

/// How a polling loop ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The operation produced a value
    Ready(T),
    /// The cancellation token fired first
    Cancelled,
}

/// Count of failed attempts within one polling call
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureBudget {
    limit: usize,
    used: usize,
}

impl FailureBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Record one failure; returns `false` once the budget is exceeded
    pub fn record_failure(&mut self) -> bool {
        self.used += 1;
        self.used <= self.limit
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

/// Poll `attempt` until it yields a value
///
/// Every iteration first waits `policy.interval`, racing the wait against
/// `cancel`. A cancelled token ends the loop before the next attempt is
/// made. `Ok(None)` from the attempt means "not yet" and polling goes on;
/// `Err` consumes failure budget and polling goes on while budget remains.
/// The budget is never replenished by a later success.
///
/// # Errors
///
/// Returns `Error::PropagationUnconfirmed` once more than
/// `policy.max_failures` attempts have failed.
pub async fn poll_with_budget<T, F, Fut>(
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let mut budget = FailureBudget::new(policy.max_failures);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }

        match attempt().await {
            Ok(Some(value)) => return Ok(PollOutcome::Ready(value)),
            Ok(None) => {}
            Err(e) => {
                if !budget.record_failure() {
                    return Err(Error::PropagationUnconfirmed {
                        failures: budget.used(),
                        last_error: e.to_string(),
                    });
                }
                warn!(
                    "Attempt failed ({}/{} failures tolerated): {}",
                    budget.used(),
                    policy.max_failures,
                    e
                );
            }
        }
    }
}
