// # Memory Directory
//
// In-memory implementation of DirectoryService.
//
// ## Purpose
//
// Stands in for a real DNS provider in tests and embedded use. Changes are
// applied to an in-memory record table the moment they are submitted and
// then report `Pending` for a configurable number of status queries before
// turning `InSync`, which is how real providers behave from the caller's
// point of view.
//
// ## Provider Semantics Reproduced
//
// - Records are keyed by (name, set identifier), like weighted record sets
// - Upsert creates or overwrites
// - Delete of a record that does not exist (or whose contents differ) is
//   rejected at submission time
//
// ## Scripted Failures
//
// `fail_next_submits(n)` and `fail_next_queries(n)` make the next `n`
// calls of that kind return an error, for exercising retry budgets and
// the publish/retract failure asymmetry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::Error;
use crate::record::{ChangeAction, ChangeHandle, ChangeRequest, PropagationStatus, RecordSpec};
use crate::traits::DirectoryService;

/// In-memory directory service
///
/// Cloning yields a handle to the same directory, so a test can keep one
/// clone for inspection while the lifecycle owns another.
///
/// # Example
///
/// ```rust,no_run
/// use sidecar_core::directory::MemoryDirectory;
/// use sidecar_core::record::{ChangeRequest, PropagationStatus, RecordSpec};
/// use sidecar_core::DirectoryService;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let directory = MemoryDirectory::new();
///     let spec = RecordSpec::new("web.example.com", "Z1", "10.0.0.5", 10);
///
///     let handle = directory.submit_change(&ChangeRequest::upsert(&spec)).await?;
///     let status = directory.query_change_status(&handle).await?;
///     assert_eq!(status, PropagationStatus::InSync);
///     assert!(directory.contains("web.example.com", "10.0.0.5"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<(String, String), RecordSpec>,
    pending: HashMap<String, usize>,
    submitted: Vec<ChangeRequest>,
    next_change_id: usize,
    propagation_delay: usize,
    submit_failures: usize,
    query_failures: usize,
    query_count: usize,
}

impl MemoryDirectory {
    /// Create an empty directory whose changes are immediately in sync
    pub fn new() -> Self {
        Self::default()
    }

    /// Report each change as pending for `polls` queries before in sync
    pub fn with_propagation_delay(self, polls: usize) -> Self {
        self.state().propagation_delay = polls;
        self
    }

    /// Make the next `n` submissions fail
    pub fn fail_next_submits(&self, n: usize) {
        self.state().submit_failures = n;
    }

    /// Make the next `n` status queries fail
    pub fn fail_next_queries(&self, n: usize) {
        self.state().query_failures = n;
    }

    /// All change requests submitted so far, including failed ones
    pub fn submitted(&self) -> Vec<ChangeRequest> {
        self.state().submitted.clone()
    }

    /// Records currently present
    pub fn records(&self) -> Vec<RecordSpec> {
        self.state().records.values().cloned().collect()
    }

    /// Whether a record with this name and set identifier exists
    pub fn contains(&self, name: &str, set_identifier: &str) -> bool {
        self.state()
            .records
            .contains_key(&(name.to_string(), set_identifier.to_string()))
    }

    /// Number of status queries received
    pub fn query_count(&self) -> usize {
        self.state().query_count
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DirectoryService for MemoryDirectory {
    async fn submit_change(&self, request: &ChangeRequest) -> Result<ChangeHandle, Error> {
        let mut state = self.state();
        state.submitted.push(request.clone());

        if state.submit_failures > 0 {
            state.submit_failures -= 1;
            return Err(Error::submission("injected submission failure"));
        }

        let spec = &request.spec;
        let key = (spec.name().to_string(), spec.set_identifier().to_string());

        match request.action {
            ChangeAction::Upsert => {
                state.records.insert(key, spec.clone());
            }
            ChangeAction::Delete => {
                if state.records.get(&key) != Some(spec) {
                    return Err(Error::submission(format!(
                        "Tried to delete resource record set [name='{}', type='A', set-identifier='{}'] but it was not found",
                        spec.name(),
                        spec.set_identifier()
                    )));
                }
                state.records.remove(&key);
            }
        }

        state.next_change_id += 1;
        let id = format!("/change/MEM{:06}", state.next_change_id);
        let delay = state.propagation_delay;
        state.pending.insert(id.clone(), delay);

        Ok(ChangeHandle::new(id))
    }

    async fn query_change_status(&self, handle: &ChangeHandle) -> Result<PropagationStatus, Error> {
        let mut state = self.state();
        state.query_count += 1;

        if state.query_failures > 0 {
            state.query_failures -= 1;
            return Err(Error::query("injected query failure"));
        }

        match state.pending.get_mut(handle.as_str()) {
            None => Err(Error::query(format!("No such change: {}", handle))),
            Some(0) => Ok(PropagationStatus::InSync),
            Some(remaining) => {
                *remaining -= 1;
                Ok(PropagationStatus::Pending)
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
