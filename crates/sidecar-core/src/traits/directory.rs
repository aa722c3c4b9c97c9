// # Directory Service Trait
//
// Defines the narrow capability the lifecycle needs from a DNS provider.
//
// ## Implementations
//
// - Route 53: `sidecar-provider-route53` crate
// - In-memory: `sidecar_core::directory::MemoryDirectory` (tests, embedding)
//
// ## Usage
//
// ```rust,ignore
// use sidecar_core::record::{ChangeRequest, RecordSpec};
// use sidecar_core::DirectoryService;
//
// async fn publish(directory: &dyn DirectoryService, spec: &RecordSpec) -> sidecar_core::Result<()> {
//     let handle = directory.submit_change(&ChangeRequest::upsert(spec)).await?;
//     let status = directory.query_change_status(&handle).await?;
//     println!("{handle}: {status}");
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::{ChangeHandle, ChangeRequest, PropagationStatus};

/// Trait for DNS directory service implementations
///
/// The provider is the source of truth for whether the record exists.
/// Implementations are stateless proxies to it.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Constraints
///
/// - One API call per method invocation; no retry or backoff. The
///   propagation waiter owns retry policy for status queries, and the
///   lifecycle decides which submission failures are fatal.
/// - No background tasks.
/// - Never log credentials.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Submit a record change
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeHandle)`: Identifier to poll with [`query_change_status`]
    /// - `Err(Error::Submission)`: The provider rejected or failed the change
    ///
    /// [`query_change_status`]: DirectoryService::query_change_status
    async fn submit_change(&self, request: &ChangeRequest) -> Result<ChangeHandle, crate::Error>;

    /// Query the propagation status of a previously submitted change
    ///
    /// # Returns
    ///
    /// - `Ok(PropagationStatus)`: Current status; anything short of fully
    ///   applied is reported as `Pending`
    /// - `Err(Error::Query)`: The status could not be determined
    async fn query_change_status(
        &self,
        handle: &ChangeHandle,
    ) -> Result<PropagationStatus, crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
