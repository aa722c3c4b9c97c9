// # Address Source Trait
//
// Defines how the sidecar learns the address it publishes.
//
// ## Implementations
//
// All in the `sidecar-ip-metadata` crate:
// - Explicit literal from configuration
// - Cloud instance metadata service
// - Container task metadata endpoint
//
// Resolution runs once at startup, before any DNS action. A failure is a
// configuration or environment problem, never retried.

use async_trait::async_trait;

/// Trait for address source implementations
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Resolve the address to publish
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: An IPv4 literal
    /// - `Err(Error::AddressUnavailable)`: The source could not produce one
    async fn resolve(&self) -> Result<String, crate::Error>;

    /// Source name (for logging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing address sources from configuration
pub trait AddressSourceFactory: Send + Sync {
    /// Create an AddressSource instance from configuration
    fn create(
        &self,
        config: &crate::config::AddressSourceConfig,
    ) -> Result<Box<dyn AddressSource>, crate::Error>;
}
