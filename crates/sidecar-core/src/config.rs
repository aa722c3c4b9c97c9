//! Configuration types for the sidecar
//!
//! This module defines the validated configuration the lifecycle runs from.
//! The binary materializes it from flags and environment variables; the
//! core never reads the process environment for these values itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main sidecar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarConfig {
    /// Fully-qualified record name to publish
    #[serde(default = "default_record_name")]
    pub record_name: String,

    /// Hosted zone identifier
    #[serde(default = "default_hosted_zone")]
    pub hosted_zone: String,

    /// Record TTL in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u32,

    /// Where the published address comes from
    #[serde(default)]
    pub address_source: AddressSourceConfig,

    /// Delay before the first publish (in seconds)
    ///
    /// Gives health checks and other startup work time to settle before
    /// the name is advertised.
    #[serde(default = "default_setup_delay_secs")]
    pub setup_delay_secs: u64,

    /// Which lifecycle mode to run
    #[serde(default)]
    pub mode: RunMode,

    /// Propagation polling settings
    #[serde(default)]
    pub propagation: PropagationConfig,
}

impl SidecarConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            record_name: default_record_name(),
            hosted_zone: default_hosted_zone(),
            ttl_secs: default_ttl_secs(),
            address_source: AddressSourceConfig::default(),
            setup_delay_secs: default_setup_delay_secs(),
            mode: RunMode::default(),
            propagation: PropagationConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_record_name(&self.record_name)?;

        if self.hosted_zone.trim().is_empty() {
            return Err(crate::Error::config("Hosted zone ID cannot be empty"));
        }

        self.address_source.validate()?;
        self.propagation.validate()?;

        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_secs))
    }

    pub fn setup_delay(&self) -> Duration {
        Duration::from_secs(self.setup_delay_secs)
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that a record name looks like a DNS name
///
/// Basic RFC 1035 shape checks; a single trailing dot is accepted.
fn validate_record_name(name: &str) -> Result<(), crate::Error> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);

    if trimmed.is_empty() {
        return Err(crate::Error::config("Record name cannot be empty"));
    }

    if trimmed.len() > 253 {
        return Err(crate::Error::config(format!(
            "Record name too long: {} chars (max 253)",
            trimmed.len()
        )));
    }

    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Record name has empty label: '{}'",
                name
            )));
        }
        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Record name label too long: '{}' ({} chars, max 63)",
                label,
                label.len()
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*')
        {
            return Err(crate::Error::config(format!(
                "Record name label contains invalid characters: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Address source selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressSourceConfig {
    /// Cloud instance metadata service
    InstanceMetadata {
        /// Metadata path under `meta-data/` (e.g. "public-ipv4")
        path: String,
    },

    /// Container task metadata endpoint (URI taken from the environment)
    TaskMetadata,

    /// Literal address from configuration
    Explicit {
        /// The address to publish, as given
        address: String,
    },
}

/// Metadata path for the instance's public address
pub const PUBLIC_IPV4_PATH: &str = "public-ipv4";

/// Metadata path for the instance's private address
pub const LOCAL_IPV4_PATH: &str = "local-ipv4";

impl AddressSourceConfig {
    /// Validate the address source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AddressSourceConfig::InstanceMetadata { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Instance metadata path cannot be empty"));
                }
                Ok(())
            }
            AddressSourceConfig::Explicit { address } => {
                if address.trim().is_empty() {
                    return Err(crate::Error::config("Explicit address cannot be empty"));
                }
                Ok(())
            }
            AddressSourceConfig::TaskMetadata => Ok(()),
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &'static str {
        match self {
            AddressSourceConfig::InstanceMetadata { .. } => "instance-metadata",
            AddressSourceConfig::TaskMetadata => "task-metadata",
            AddressSourceConfig::Explicit { .. } => "explicit",
        }
    }
}

impl Default for AddressSourceConfig {
    fn default() -> Self {
        AddressSourceConfig::InstanceMetadata {
            path: PUBLIC_IPV4_PATH.to_string(),
        }
    }
}

/// Parses the `ipaddress` option
///
/// Recognized selectors pick a metadata source; any other non-empty value
/// is taken as the literal address.
impl FromStr for AddressSourceConfig {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err(crate::Error::config("IP address option cannot be empty")),
            "public-ipv4" | "primary-interface-metadata" => Ok(Self::InstanceMetadata {
                path: PUBLIC_IPV4_PATH.to_string(),
            }),
            "local-ipv4" => Ok(Self::InstanceMetadata {
                path: LOCAL_IPV4_PATH.to_string(),
            }),
            "ecs" | "container-task-metadata" => Ok(Self::TaskMetadata),
            literal => Ok(Self::Explicit {
                address: literal.to_string(),
            }),
        }
    }
}

impl fmt::Display for AddressSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSourceConfig::InstanceMetadata { path } => {
                write!(f, "instance-metadata:{}", path)
            }
            AddressSourceConfig::TaskMetadata => f.write_str("task-metadata"),
            AddressSourceConfig::Explicit { address } => f.write_str(address),
        }
    }
}

/// Lifecycle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Publish the record and exit
    PublishOnly,
    /// Retract the record and exit
    RetractOnly,
    /// Publish, wait for a shutdown signal, then retract
    #[default]
    Full,
}

impl RunMode {
    /// Select the mode from the `register` / `unregister` switches
    ///
    /// `register` wins when both are set.
    pub fn from_flags(register: bool, unregister: bool) -> Self {
        match (register, unregister) {
            (true, unregister) => {
                if unregister {
                    tracing::warn!("Both register and unregister set, running publish-only");
                }
                RunMode::PublishOnly
            }
            (false, true) => RunMode::RetractOnly,
            (false, false) => RunMode::Full,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::PublishOnly => f.write_str("publish-only"),
            RunMode::RetractOnly => f.write_str("retract-only"),
            RunMode::Full => f.write_str("full"),
        }
    }
}

/// Propagation polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Interval between status queries (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Failed status queries tolerated within one wait
    ///
    /// One more failure than this is fatal.
    #[serde(default = "default_max_query_failures")]
    pub max_query_failures: usize,
}

impl PropagationConfig {
    /// Validate the polling configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_query_failures: default_max_query_failures(),
        }
    }
}

fn default_record_name() -> String {
    "my.example.com".to_string()
}

fn default_hosted_zone() -> String {
    "Z2AAAABCDEFGT4".to_string()
}

fn default_ttl_secs() -> u32 {
    10
}

fn default_setup_delay_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_query_failures() -> usize {
    3
}
