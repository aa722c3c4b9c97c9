//! Record data model
//!
//! The sidecar manages exactly one weighted `A` record per process. Its
//! shape is fixed for the lifetime of a run: [`RecordSpec`] is built once
//! from configuration plus the resolved address and then only read.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record type published by the sidecar
pub const RECORD_TYPE: &str = "A";

/// Weight given to every published record
///
/// All sidecars sharing a name publish with the same weight, so resolvers
/// spread answers evenly across live instances.
pub const RECORD_WEIGHT: i64 = 100;

/// Comment attached to publish requests
pub const PUBLISH_COMMENT: &str = "route53-sidecar";

/// The single address record managed by one sidecar run
///
/// The set identifier is always the address itself, so sibling records
/// under the same name (one per instance) never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    name: String,
    zone_id: String,
    address: String,
    ttl_secs: u32,
}

impl RecordSpec {
    /// Create a record spec
    ///
    /// # Parameters
    ///
    /// - `name`: Fully-qualified record name (e.g. "web.example.com")
    /// - `zone_id`: Provider identifier of the zone holding the record
    /// - `address`: IPv4 literal the record points to
    /// - `ttl_secs`: Record TTL in seconds
    pub fn new(
        name: impl Into<String>,
        zone_id: impl Into<String>,
        address: impl Into<String>,
        ttl_secs: u32,
    ) -> Self {
        Self {
            name: name.into(),
            zone_id: zone_id.into(),
            address: address.into(),
            ttl_secs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn ttl_secs(&self) -> u32 {
        self.ttl_secs
    }

    pub fn record_type(&self) -> &'static str {
        RECORD_TYPE
    }

    pub fn weight(&self) -> i64 {
        RECORD_WEIGHT
    }

    /// Identifier distinguishing this record among weighted siblings
    pub fn set_identifier(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for RecordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} => {}", RECORD_TYPE, self.name, self.address)
    }
}

/// What a change request does to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    /// Create the record, or overwrite it if it already exists
    Upsert,
    /// Remove the record
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Upsert => f.write_str("UPSERT"),
            ChangeAction::Delete => f.write_str("DELETE"),
        }
    }
}

/// A single change submitted to the directory service
///
/// Built fresh for every publish or retract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub action: ChangeAction,
    pub spec: RecordSpec,
    pub comment: Option<String>,
}

impl ChangeRequest {
    /// Upsert request used when publishing
    pub fn upsert(spec: &RecordSpec) -> Self {
        Self {
            action: ChangeAction::Upsert,
            spec: spec.clone(),
            comment: Some(PUBLISH_COMMENT.to_string()),
        }
    }

    /// Delete request used when retracting
    pub fn delete(spec: &RecordSpec) -> Self {
        Self {
            action: ChangeAction::Delete,
            spec: spec.clone(),
            comment: None,
        }
    }
}

/// Opaque provider identifier of a submitted change
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeHandle(String);

impl ChangeHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Propagation state of a submitted change
///
/// Provider-specific intermediate statuses all map to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationStatus {
    Pending,
    InSync,
}

impl fmt::Display for PropagationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationStatus::Pending => f.write_str("PENDING"),
            PropagationStatus::InSync => f.write_str("INSYNC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_identifier_is_the_address() {
        let spec = RecordSpec::new("web.example.com", "Z123", "10.0.0.5", 30);
        assert_eq!(spec.set_identifier(), spec.address());
        assert_eq!(spec.record_type(), "A");
        assert_eq!(spec.weight(), 100);
    }

    #[test]
    fn upsert_carries_comment_and_delete_does_not() {
        let spec = RecordSpec::new("web.example.com", "Z123", "10.0.0.5", 30);

        let upsert = ChangeRequest::upsert(&spec);
        assert_eq!(upsert.action, ChangeAction::Upsert);
        assert_eq!(upsert.comment.as_deref(), Some(PUBLISH_COMMENT));

        let delete = ChangeRequest::delete(&spec);
        assert_eq!(delete.action, ChangeAction::Delete);
        assert_eq!(delete.comment, None);
        assert_eq!(delete.spec, spec);
    }

    #[test]
    fn display_is_readable() {
        let spec = RecordSpec::new("web.example.com", "Z123", "10.0.0.5", 30);
        assert_eq!(spec.to_string(), "A web.example.com => 10.0.0.5");
        assert_eq!(ChangeHandle::new("/change/C1").to_string(), "/change/C1");
    }
}
