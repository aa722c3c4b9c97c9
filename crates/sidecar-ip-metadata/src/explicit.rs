//! Literal address from configuration

use async_trait::async_trait;
use sidecar_core::traits::AddressSource;
use sidecar_core::{Error, Result};

/// Publishes the configured string as given
///
/// No validation beyond non-emptiness: whatever the operator configured
/// is what the directory service gets to judge.
#[derive(Debug, Clone)]
pub struct ExplicitAddress {
    address: String,
}

impl ExplicitAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl AddressSource for ExplicitAddress {
    async fn resolve(&self) -> Result<String> {
        if self.address.trim().is_empty() {
            return Err(Error::address("Configured address is empty"));
        }
        Ok(self.address.clone())
    }

    fn source_name(&self) -> &'static str {
        "explicit"
    }
}
