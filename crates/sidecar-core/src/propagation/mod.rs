//! Propagation waiter
//!
//! Polls the directory service until a submitted change is confirmed
//! applied. "Still pending" is retried without limit; only cancellation or
//! the provider confirming ends the wait. Failed status queries are
//! tolerated up to the policy's budget, after which the wait fails with
//! `Error::PropagationUnconfirmed`: the record state can no longer be
//! determined and the process must not carry on as if it could.

pub mod retry;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::record::{ChangeHandle, PropagationStatus};
use crate::traits::DirectoryService;

pub use retry::{FailureBudget, PollOutcome, PollPolicy, poll_with_budget};

/// How a propagation wait ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The provider reported the change as applied
    InSync,
    /// The caller's cancellation token fired first
    Cancelled,
}

/// Waits for submitted changes to propagate
pub struct PropagationWaiter {
    directory: Arc<dyn DirectoryService>,
    policy: PollPolicy,
}

impl PropagationWaiter {
    pub fn new(directory: Arc<dyn DirectoryService>, policy: PollPolicy) -> Self {
        Self { directory, policy }
    }

    /// Wait until `handle` is in sync or `cancel` fires
    ///
    /// The query-failure budget starts fresh on every call.
    ///
    /// # Errors
    ///
    /// `Error::PropagationUnconfirmed` when more than
    /// `policy.max_failures` status queries fail within this call.
    pub async fn await_sync(
        &self,
        handle: &ChangeHandle,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        debug!(
            "Waiting for change {} to propagate (interval={:?})",
            handle, self.policy.interval
        );

        let outcome = poll_with_budget(self.policy, cancel, || self.check(handle)).await?;

        match outcome {
            PollOutcome::Ready(()) => {
                info!(
                    "{} change {} completed",
                    self.directory.provider_name(),
                    handle
                );
                Ok(WaitOutcome::InSync)
            }
            PollOutcome::Cancelled => {
                info!(
                    "Cancelled, stop waiting for change {} to propagate",
                    handle
                );
                Ok(WaitOutcome::Cancelled)
            }
        }
    }

    /// One status query; `Some(())` once in sync
    async fn check(&self, handle: &ChangeHandle) -> Result<Option<()>> {
        match self.directory.query_change_status(handle).await {
            Ok(PropagationStatus::InSync) => Ok(Some(())),
            Ok(status) => {
                info!(
                    "Change {} not yet propagated (status = {})...",
                    handle, status
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Failed getting status of change {}: {}", handle, e);
                Err(e)
            }
        }
    }
}
