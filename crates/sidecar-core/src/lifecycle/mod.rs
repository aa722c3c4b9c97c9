//! Record lifecycle state machine
//!
//! The LifecycleManager is responsible for:
//! - Publishing the record (optional setup delay, upsert, wait for sync)
//! - Retracting the record (delete, wait for sync, drain the TTL)
//! - Running one of the three lifecycle modes
//!
//! ## Phases
//!
//! ```text
//!  Idle ──publish──▶ Publishing ──in sync──▶ Published
//!                        │                       │
//!                        ├─submit failed─▶ Failed│
//!                        │                       │
//!                        └─cancelled (stays)     │
//!                                                ▼
//!                                  retract ──▶ Retracting ──in sync + TTL──▶ Retracted
//! ```
//!
//! ## Failure Asymmetry
//!
//! A failed publish submission is logged and absorbed: the sidecar keeps
//! running so that teardown still happens at shutdown. A failed retract
//! submission is fatal, because silently leaving the record behind during
//! a deliberate shutdown is worse than a loud exit. Exhausting the status
//! query budget is fatal on both paths.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{RunMode, SidecarConfig};
use crate::error::{Error, Result};
use crate::propagation::{PollPolicy, PropagationWaiter, WaitOutcome};
use crate::record::{ChangeRequest, RecordSpec};
use crate::shutdown::ShutdownTrigger;
use crate::traits::DirectoryService;

/// Where the record is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    #[default]
    Idle,
    Publishing,
    Published,
    Retracting,
    Retracted,
    Failed,
}

/// How a publish call ended without a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The upsert was confirmed in sync
    Published,
    /// The lifecycle token fired while waiting for propagation
    Cancelled,
    /// The directory rejected the upsert (logged, not fatal)
    SubmissionFailed,
}

/// Drives the record through publish and retract
///
/// One manager handles one record for one process run.
pub struct LifecycleManager {
    directory: Arc<dyn DirectoryService>,
    spec: RecordSpec,
    setup_delay: Duration,
    waiter: PropagationWaiter,
    phase: LifecyclePhase,
}

impl LifecycleManager {
    /// Create a lifecycle manager
    ///
    /// # Parameters
    ///
    /// - `directory`: Directory service holding the record
    /// - `spec`: The record to manage
    /// - `setup_delay`: Sleep before the first publish
    /// - `policy`: Propagation polling policy
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        spec: RecordSpec,
        setup_delay: Duration,
        policy: PollPolicy,
    ) -> Self {
        let waiter = PropagationWaiter::new(Arc::clone(&directory), policy);
        Self {
            directory,
            spec,
            setup_delay,
            waiter,
            phase: LifecyclePhase::Idle,
        }
    }

    /// Create a lifecycle manager from configuration and the resolved address
    pub fn from_config(
        directory: Arc<dyn DirectoryService>,
        config: &SidecarConfig,
        address: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;

        let address = address.into();
        if address.trim().is_empty() {
            return Err(Error::address("resolved address is empty"));
        }

        let spec = RecordSpec::new(
            config.record_name.clone(),
            config.hosted_zone.clone(),
            address,
            config.ttl_secs,
        );

        Ok(Self::new(
            directory,
            spec,
            config.setup_delay(),
            PollPolicy::from(&config.propagation),
        ))
    }

    pub fn spec(&self) -> &RecordSpec {
        &self.spec
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Publish the record
    ///
    /// Sleeps the setup delay, submits an upsert and waits for it to
    /// propagate, watching `cancel` while waiting. The setup delay itself
    /// is not interrupted by `cancel`.
    ///
    /// # Errors
    ///
    /// Only `Error::PropagationUnconfirmed`. A rejected submission is
    /// reported as [`PublishOutcome::SubmissionFailed`].
    pub async fn publish(&mut self, cancel: &CancellationToken) -> Result<PublishOutcome> {
        self.phase = LifecyclePhase::Publishing;
        info!(
            "Setting up {} DNS record {}",
            self.directory.provider_name(),
            self.spec
        );

        if !self.setup_delay.is_zero() {
            info!(
                "Waiting {} seconds before setting up DNS (setup delay)",
                self.setup_delay.as_secs()
            );
            tokio::time::sleep(self.setup_delay).await;
            info!("Finished waiting");
        }

        let request = ChangeRequest::upsert(&self.spec);
        let handle = match self.directory.submit_change(&request).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to create DNS record: {}", e);
                self.phase = LifecyclePhase::Failed;
                return Ok(PublishOutcome::SubmissionFailed);
            }
        };

        info!("Request sent to {} ({})...", self.directory.provider_name(), handle);

        match self.waiter.await_sync(&handle, cancel).await {
            Ok(WaitOutcome::InSync) => {
                self.phase = LifecyclePhase::Published;
                info!("Published {}", self.spec);
                Ok(PublishOutcome::Published)
            }
            Ok(WaitOutcome::Cancelled) => Ok(PublishOutcome::Cancelled),
            Err(e) => {
                self.phase = LifecyclePhase::Failed;
                Err(e)
            }
        }
    }

    /// Retract the record and drain its TTL
    ///
    /// Waits on a fresh token that nothing cancels, so teardown runs to
    /// completion once started. After the delete is in sync, sleeps the
    /// full record TTL so caches still holding the address expire before
    /// this returns.
    ///
    /// # Errors
    ///
    /// - `Error::RetractFailed` if the delete cannot be submitted
    /// - `Error::PropagationUnconfirmed` if its status cannot be confirmed
    pub async fn retract(&mut self) -> Result<()> {
        self.phase = LifecyclePhase::Retracting;
        info!(
            "Tearing down {} DNS record {}",
            self.directory.provider_name(),
            self.spec
        );

        let request = ChangeRequest::delete(&self.spec);
        let handle = match self.directory.submit_change(&request).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to delete DNS record: {}", e);
                self.phase = LifecyclePhase::Failed;
                return Err(Error::RetractFailed(Box::new(e)));
            }
        };

        info!("Request sent to {} ({})...", self.directory.provider_name(), handle);

        let teardown = CancellationToken::new();
        if let Err(e) = self.waiter.await_sync(&handle, &teardown).await {
            self.phase = LifecyclePhase::Failed;
            return Err(e);
        }

        let ttl = Duration::from_secs(u64::from(self.spec.ttl_secs()));
        info!(
            "Waiting for DNS TTL to expire ({} seconds)",
            self.spec.ttl_secs()
        );
        tokio::time::sleep(ttl).await;
        info!("DNS TTL expiry finished");

        self.phase = LifecyclePhase::Retracted;
        Ok(())
    }

    /// Run one lifecycle mode to completion
    ///
    /// - `PublishOnly`: publish and return
    /// - `RetractOnly`: retract and return
    /// - `Full`: publish watching the shutdown token, block until the
    ///   trigger fires, then retract
    ///
    /// The trigger is only consulted in `Full` mode. Arming it with OS
    /// signals is the caller's job.
    pub async fn run(&mut self, mode: RunMode, shutdown: &ShutdownTrigger) -> Result<()> {
        info!("Running in {} mode", mode);

        match mode {
            RunMode::PublishOnly => {
                self.publish(&CancellationToken::new()).await?;
            }
            RunMode::RetractOnly => {
                self.retract().await?;
            }
            RunMode::Full => {
                let lifecycle = shutdown.token();
                match self.publish(&lifecycle).await? {
                    PublishOutcome::Published => info!("Waiting for shutdown signal"),
                    PublishOutcome::Cancelled => {}
                    PublishOutcome::SubmissionFailed => {
                        info!("Record not published, waiting for shutdown signal anyway")
                    }
                }

                lifecycle.cancelled().await;
                self.retract().await?;
            }
        }

        info!("Lifecycle finished ({:?})", self.phase);
        Ok(())
    }
}
