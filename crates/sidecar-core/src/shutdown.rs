//! Shutdown trigger
//!
//! Turns SIGTERM/SIGINT into a single cancellation of the lifecycle token.
//! The first signal cancels; later signals are logged and otherwise
//! ignored, so a second Ctrl-C during teardown cannot cut cleanup short.
//! Teardown itself never watches this token.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Owner of the lifecycle cancellation token
///
/// Clones share the same token.
#[derive(Debug, Clone, Default)]
pub struct ShutdownTrigger {
    token: CancellationToken,
}

impl ShutdownTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lifecycle token consumers wait on
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fire the trigger
    ///
    /// Only the first call has an effect.
    pub fn trigger(&self, reason: &str) {
        if self.token.is_cancelled() {
            warn!("Received {} while shutting down, ignoring", reason);
            return;
        }
        info!("Received {}, starting shutdown", reason);
        self.token.cancel();
    }

    /// Resolves once the trigger has fired
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }

    /// Install termination signal handlers feeding this trigger
    ///
    /// Handlers are installed before this returns, so a signal arriving
    /// right after is not lost. Must be called from within a tokio runtime.
    /// Abort the returned task once the lifecycle has finished.
    #[cfg(unix)]
    pub fn arm(&self) -> Result<JoinHandle<()>> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let trigger = self.clone();

        Ok(tokio::spawn(async move {
            loop {
                let name = tokio::select! {
                    Some(()) = sigterm.recv() => "SIGTERM",
                    Some(()) = sigint.recv() => "SIGINT",
                    else => break,
                };
                trigger.trigger(name);
            }
        }))
    }

    /// Install the Ctrl-C handler feeding this trigger
    ///
    /// Fallback for non-Unix platforms.
    #[cfg(not(unix))]
    pub fn arm(&self) -> Result<JoinHandle<()>> {
        let trigger = self.clone();

        Ok(tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                trigger.trigger("SIGINT");
            }
        }))
    }
}
