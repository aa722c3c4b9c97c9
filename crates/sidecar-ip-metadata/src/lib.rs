// # Metadata Address Sources
//
// This crate provides the address sources for the sidecar.
//
// ## Sources
//
// - `InstanceMetadataSource`: cloud instance metadata service (IMDSv2,
//   falling back to v1), `public-ipv4` or `local-ipv4`
// - `TaskMetadataSource`: container task metadata endpoint from
//   `ECS_CONTAINER_METADATA_URI_V4` / `ECS_CONTAINER_METADATA_URI`
// - `ExplicitAddress`: literal from configuration
//
// ## Architecture
//
// Every source resolves exactly once, at startup, with a short timeout and
// no retry. A failure here means the environment or configuration is wrong,
// and the sidecar exits before touching DNS.

mod explicit;
mod instance;
mod task;

#[cfg(test)]
mod test_server;

pub use explicit::ExplicitAddress;
pub use instance::InstanceMetadataSource;
pub use task::{TaskMetadata, TaskMetadataSource, TaskNetwork};

use sidecar_core::config::AddressSourceConfig;
use sidecar_core::traits::{AddressSource, AddressSourceFactory};
use sidecar_core::Result;

/// Factory for creating address sources from configuration
pub struct MetadataFactory;

impl AddressSourceFactory for MetadataFactory {
    fn create(&self, config: &AddressSourceConfig) -> Result<Box<dyn AddressSource>> {
        config.validate()?;

        match config {
            AddressSourceConfig::InstanceMetadata { path } => {
                Ok(Box::new(InstanceMetadataSource::from_env(path.clone())?))
            }
            AddressSourceConfig::TaskMetadata => Ok(Box::new(TaskMetadataSource::from_env()?)),
            AddressSourceConfig::Explicit { address } => {
                Ok(Box::new(ExplicitAddress::new(address.clone())))
            }
        }
    }
}

/// Resolve the address described by `config`
///
/// Convenience wrapper: build the source with [`MetadataFactory`] and
/// resolve it once.
pub async fn resolve_address(config: &AddressSourceConfig) -> Result<String> {
    let source = MetadataFactory.create(config)?;
    let address = source.resolve().await?;
    tracing::info!("Resolved address {} from {}", address, source.source_name());
    Ok(address)
}
