// # Route 53 Directory Service
//
// This crate provides the Route 53 implementation of `DirectoryService`.
//
// ## Architectural Constraints
//
// The provider is isolated, stateless and single-shot:
// - One API call per trait method
// - No retry, backoff or polling (owned by `PropagationWaiter`)
// - No decision about which failures are fatal (owned by `LifecycleManager`)
// - No background tasks
//
// ## Security Requirements
//
// - Credentials come from the standard AWS provider chain only
// - Credentials NEVER appear in logs
//
// ## API Reference
//
// - Submit: `ChangeResourceRecordSets` on the hosted zone, one change per call
// - Poll: `GetChange` with the change ID returned by the submission;
//   `INSYNC` means applied on all authoritative servers

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_route53::Client;
use aws_sdk_route53::error::{BuildError, DisplayErrorContext};
use aws_sdk_route53::types::{
    Change, ChangeAction as Route53Action, ChangeBatch, ChangeStatus, ResourceRecord,
    ResourceRecordSet, RrType,
};
use sidecar_core::record::{ChangeAction, ChangeHandle, ChangeRequest, PropagationStatus};
use sidecar_core::traits::DirectoryService;
use sidecar_core::{Error, Result};

/// Region used when none is configured; Route 53 is a global service
const FALLBACK_REGION: &str = "us-east-1";

/// Route 53 directory service
#[derive(Clone)]
pub struct Route53Directory {
    client: Client,
}

impl std::fmt::Debug for Route53Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Directory")
            .field("credentials", &"<REDACTED>")
            .finish()
    }
}

impl Route53Directory {
    /// Wrap an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a directory from the default AWS configuration chain
    ///
    /// Region falls back to `us-east-1` when the environment names none.
    pub async fn from_env() -> Self {
        let region = RegionProviderChain::default_provider().or_else(FALLBACK_REGION);
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

/// Map a change action to its Route 53 counterpart
pub fn route53_action(action: ChangeAction) -> Route53Action {
    match action {
        ChangeAction::Upsert => Route53Action::Upsert,
        ChangeAction::Delete => Route53Action::Delete,
    }
}

/// Map a Route 53 change status
///
/// Anything other than `INSYNC` is still pending.
pub fn propagation_status(status: &ChangeStatus) -> PropagationStatus {
    match status {
        ChangeStatus::Insync => PropagationStatus::InSync,
        _ => PropagationStatus::Pending,
    }
}

/// Build the change batch for a request
///
/// One weighted `A` record set: weight and set identifier let several
/// sidecars publish the same name side by side.
pub fn change_batch(request: &ChangeRequest) -> Result<ChangeBatch> {
    let spec = &request.spec;
    let invalid = |e: BuildError| Error::submission(format!("Invalid change request: {}", e));

    let record = ResourceRecord::builder()
        .value(spec.address())
        .build()
        .map_err(invalid)?;

    let record_set = ResourceRecordSet::builder()
        .name(spec.name())
        .r#type(RrType::A)
        .ttl(i64::from(spec.ttl_secs()))
        .weight(spec.weight())
        .set_identifier(spec.set_identifier())
        .resource_records(record)
        .build()
        .map_err(invalid)?;

    let change = Change::builder()
        .action(route53_action(request.action))
        .resource_record_set(record_set)
        .build()
        .map_err(invalid)?;

    ChangeBatch::builder()
        .changes(change)
        .set_comment(request.comment.clone())
        .build()
        .map_err(invalid)
}

#[async_trait]
impl DirectoryService for Route53Directory {
    async fn submit_change(&self, request: &ChangeRequest) -> Result<ChangeHandle> {
        tracing::debug!(
            "Submitting {} for {} in zone {}",
            request.action,
            request.spec,
            request.spec.zone_id()
        );

        let batch = change_batch(request)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(request.spec.zone_id())
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| Error::submission(DisplayErrorContext(&e).to_string()))?;

        let info = output
            .change_info()
            .ok_or_else(|| Error::submission("Response carried no change info"))?;

        Ok(ChangeHandle::new(info.id()))
    }

    async fn query_change_status(&self, handle: &ChangeHandle) -> Result<PropagationStatus> {
        let output = self
            .client
            .get_change()
            .id(handle.as_str())
            .send()
            .await
            .map_err(|e| Error::query(DisplayErrorContext(&e).to_string()))?;

        let info = output
            .change_info()
            .ok_or_else(|| Error::query("Response carried no change info"))?;

        Ok(propagation_status(info.status()))
    }

    fn provider_name(&self) -> &'static str {
        "route53"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidecar_core::record::{PUBLISH_COMMENT, RecordSpec};

    fn spec() -> RecordSpec {
        RecordSpec::new("cname.nextjs.internal.", "Z2AAAABCDEFGT4", "1.2.3.4", 10)
    }

    #[test]
    fn actions_map_one_to_one() {
        assert_eq!(route53_action(ChangeAction::Upsert), Route53Action::Upsert);
        assert_eq!(route53_action(ChangeAction::Delete), Route53Action::Delete);
    }

    #[test]
    fn only_insync_is_in_sync() {
        assert_eq!(
            propagation_status(&ChangeStatus::Insync),
            PropagationStatus::InSync
        );
        assert_eq!(
            propagation_status(&ChangeStatus::Pending),
            PropagationStatus::Pending
        );
    }

    #[test]
    fn upsert_batch_carries_comment() {
        let batch = change_batch(&ChangeRequest::upsert(&spec())).unwrap();

        assert_eq!(batch.comment(), Some(PUBLISH_COMMENT));
        assert_eq!(batch.changes().len(), 1);
        assert_eq!(batch.changes()[0].action(), &Route53Action::Upsert);
    }

    #[test]
    fn delete_batch_has_no_comment() {
        let batch = change_batch(&ChangeRequest::delete(&spec())).unwrap();

        assert_eq!(batch.comment(), None);
        assert_eq!(batch.changes()[0].action(), &Route53Action::Delete);
    }
}
