//! Test doubles and common utilities for lifecycle contract tests
//!
//! The scripted directory plays back a fixed sequence of status query
//! results and records every call, so tests can assert on ordering and on
//! exactly what was submitted.

#![allow(dead_code)]

use sidecar_core::error::{Error, Result};
use sidecar_core::record::{
    ChangeAction, ChangeHandle, ChangeRequest, PropagationStatus, RecordSpec,
};
use sidecar_core::traits::DirectoryService;
use sidecar_core::{LifecycleManager, PollPolicy};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Poll interval used throughout the contract tests
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Query failures tolerated within one wait
pub const MAX_QUERY_FAILURES: usize = 3;

/// One scripted status query response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStep {
    Fail,
    Pending,
    InSync,
}

/// A call observed by the scripted directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Submit(ChangeRequest),
    Query(ChangeHandle),
}

/// A DirectoryService that follows a script and records calls
///
/// Once the query script runs out every query answers `fallback`
/// (`InSync` unless changed).
#[derive(Clone)]
pub struct ScriptedDirectory {
    calls: Arc<Mutex<Vec<Call>>>,
    queries: Arc<Mutex<VecDeque<QueryStep>>>,
    fallback: Arc<Mutex<QueryStep>>,
    submit_failures: Arc<Mutex<usize>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(QueryStep::InSync)),
            submit_failures: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue query responses to play back in order
    pub fn with_queries(self, steps: impl IntoIterator<Item = QueryStep>) -> Self {
        self.queries.lock().unwrap().extend(steps);
        self
    }

    /// Answer every unscripted query with `step`
    pub fn with_fallback(self, step: QueryStep) -> Self {
        *self.fallback.lock().unwrap() = step;
        self
    }

    /// Make the next `n` submissions fail
    pub fn failing_submits(self, n: usize) -> Self {
        *self.submit_failures.lock().unwrap() = n;
        self
    }

    /// Queue more query responses after construction
    pub fn push_queries(&self, steps: impl IntoIterator<Item = QueryStep>) {
        self.queries.lock().unwrap().extend(steps);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<ChangeRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Submit(request) => Some(request),
                Call::Query(_) => None,
            })
            .collect()
    }

    pub fn submitted_actions(&self) -> Vec<ChangeAction> {
        self.submitted().iter().map(|r| r.action).collect()
    }

    pub fn query_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Query(_)))
            .count()
    }
}

#[async_trait::async_trait]
impl DirectoryService for ScriptedDirectory {
    async fn submit_change(&self, request: &ChangeRequest) -> Result<ChangeHandle> {
        self.calls.lock().unwrap().push(Call::Submit(request.clone()));

        let mut failures = self.submit_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(Error::submission(
                "InvalidChangeBatch: conflicting RRSet of type CNAME with the same DNS name already exists",
            ));
        }

        let id = format!("/change/SCRIPTED{}", self.calls.lock().unwrap().len());
        Ok(ChangeHandle::new(id))
    }

    async fn query_change_status(&self, handle: &ChangeHandle) -> Result<PropagationStatus> {
        self.calls.lock().unwrap().push(Call::Query(handle.clone()));

        let step = self
            .queries
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(*self.fallback.lock().unwrap());

        match step {
            QueryStep::Fail => Err(Error::query("Throttling: Rate exceeded")),
            QueryStep::Pending => Ok(PropagationStatus::Pending),
            QueryStep::InSync => Ok(PropagationStatus::InSync),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// The record every contract test manages
pub fn test_spec(ttl_secs: u32) -> RecordSpec {
    RecordSpec::new("cname.nextjs.internal.", "Z2AAAABCDEFGT4", "1.2.3.4", ttl_secs)
}

/// A lifecycle manager with no setup delay over `directory`
pub fn lifecycle(directory: &ScriptedDirectory, ttl_secs: u32) -> LifecycleManager {
    LifecycleManager::new(
        Arc::new(directory.clone()),
        test_spec(ttl_secs),
        Duration::ZERO,
        PollPolicy::new(POLL_INTERVAL, MAX_QUERY_FAILURES),
    )
}
