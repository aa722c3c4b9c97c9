//! Container task metadata source
//!
//! The container agent exposes a metadata document for each container at
//! a URL published in the container's environment. The document lists the
//! task's network attachments; the first IPv4 address of the first network
//! is the one published.
//!
//! A task whose desired status is `STOPPED` is being torn down, so
//! resolution fails instead of advertising an instance that is going away.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sidecar_core::traits::AddressSource;
use sidecar_core::{Error, Result};

/// Environment variable holding the v4 metadata endpoint
pub const METADATA_URI_V4_ENV: &str = "ECS_CONTAINER_METADATA_URI_V4";

/// Environment variable holding the legacy (v3) metadata endpoint
pub const METADATA_URI_ENV: &str = "ECS_CONTAINER_METADATA_URI";

/// Request timeout, same as for the instance metadata service
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Desired status of a task that is shutting down
const STOPPED: &str = "STOPPED";

/// The subset of the container metadata document the sidecar reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskMetadata {
    #[serde(rename = "DesiredStatus", default)]
    pub desired_status: String,

    #[serde(rename = "Networks", default)]
    pub networks: Vec<TaskNetwork>,
}

/// One network attachment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskNetwork {
    #[serde(rename = "IPv4Addresses", default)]
    pub ipv4_addresses: Vec<String>,
}

impl TaskMetadata {
    /// Parse a metadata document
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::address(format!("Malformed task metadata document: {}", e)))
    }

    pub fn is_stopping(&self) -> bool {
        self.desired_status.eq_ignore_ascii_case(STOPPED)
    }

    /// The address to publish
    ///
    /// The desired status is checked first: a stopping task fails even if
    /// it still reports addresses.
    pub fn primary_ipv4(&self) -> Result<&str> {
        if self.is_stopping() {
            return Err(Error::address(
                "Container task is being stopped, refusing to publish",
            ));
        }

        let network = self
            .networks
            .first()
            .ok_or_else(|| Error::address("Task metadata lists no networks"))?;

        network
            .ipv4_addresses
            .first()
            .map(String::as_str)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::address("First task network has no IPv4 address"))
    }
}

/// Address from the container task metadata endpoint
#[derive(Debug, Clone)]
pub struct TaskMetadataSource {
    uri: String,
    client: reqwest::Client,
}

impl TaskMetadataSource {
    /// Create a source reading the document at `uri`
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a source from the process environment
    ///
    /// Prefers the v4 endpoint variable, falling back to the legacy one.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a source using `lookup` to read environment variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        [METADATA_URI_V4_ENV, METADATA_URI_ENV]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|uri| !uri.trim().is_empty())
            .map(Self::new)
            .ok_or_else(|| {
                Error::address(format!(
                    "Neither {} nor {} is set",
                    METADATA_URI_V4_ENV, METADATA_URI_ENV
                ))
            })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Fetch and parse the metadata document
    pub async fn fetch(&self) -> Result<TaskMetadata> {
        let response = self
            .client
            .get(&self.uri)
            .send()
            .await
            .map_err(|e| Error::address(format!("Failed to fetch task metadata: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::address(format!(
                "Failed to fetch task metadata: HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::address(format!("Failed to read task metadata: {}", e)))?;

        TaskMetadata::from_json(&body)
    }
}

#[async_trait]
impl AddressSource for TaskMetadataSource {
    async fn resolve(&self) -> Result<String> {
        tracing::info!("Fetching IP address from task metadata");

        let metadata = self.fetch().await?;
        let address = metadata.primary_ipv4()?;

        Ok(address.to_string())
    }

    fn source_name(&self) -> &'static str {
        "task-metadata"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve;

    #[tokio::test]
    async fn running_task_yields_first_address() {
        let server = serve(|_| {
            (
                200,
                r#"{"DesiredStatus":"RUNNING","Networks":[{"IPv4Addresses":["10.0.0.5"]}]}"#
                    .to_string(),
            )
        })
        .await;

        let address = TaskMetadataSource::new(&server.url).resolve().await.unwrap();

        assert_eq!(address, "10.0.0.5");
    }

    #[tokio::test]
    async fn stopped_task_fails_regardless_of_addresses() {
        let server = serve(|_| {
            (
                200,
                r#"{"DesiredStatus":"STOPPED","Networks":[{"IPv4Addresses":["10.0.0.5"]}]}"#
                    .to_string(),
            )
        })
        .await;

        let result = TaskMetadataSource::new(&server.url).resolve().await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::AddressUnavailable(_)));
        assert!(err.to_string().contains("stopped"));
    }

    #[tokio::test]
    async fn document_without_status_is_accepted() {
        let server = serve(|_| {
            (
                200,
                r#"{"Name":"curl","Networks":[{"IPv4Addresses":["127.0.0.1"]}]}"#.to_string(),
            )
        })
        .await;

        let address = TaskMetadataSource::new(&server.url).resolve().await.unwrap();

        assert_eq!(address, "127.0.0.1");
    }

    #[tokio::test]
    async fn malformed_document_is_unavailable() {
        let server = serve(|_| (200, "<html>oops</html>".to_string())).await;

        let result = TaskMetadataSource::new(&server.url).resolve().await;

        assert!(matches!(result, Err(Error::AddressUnavailable(_))));
    }

    #[test]
    fn missing_networks_or_addresses_are_unavailable() {
        let no_networks = TaskMetadata::from_json(r#"{"DesiredStatus":"RUNNING"}"#).unwrap();
        assert!(no_networks.primary_ipv4().is_err());

        let no_addresses =
            TaskMetadata::from_json(r#"{"Networks":[{"IPv4Addresses":[]}]}"#).unwrap();
        assert!(no_addresses.primary_ipv4().is_err());
    }

    #[test]
    fn stopped_status_is_case_insensitive() {
        let metadata = TaskMetadata::from_json(r#"{"DesiredStatus":"stopped"}"#).unwrap();
        assert!(metadata.is_stopping());
    }

    #[test]
    fn v4_uri_takes_precedence() {
        let source = TaskMetadataSource::from_lookup(|key| match key {
            METADATA_URI_V4_ENV => Some("http://169.254.170.2/v4/abc".to_string()),
            METADATA_URI_ENV => Some("http://169.254.170.2/v3/abc".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(source.uri(), "http://169.254.170.2/v4/abc");
    }

    #[test]
    fn legacy_uri_is_used_when_v4_is_empty() {
        let source = TaskMetadataSource::from_lookup(|key| match key {
            METADATA_URI_V4_ENV => Some(String::new()),
            METADATA_URI_ENV => Some("http://169.254.170.2/v3/abc".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(source.uri(), "http://169.254.170.2/v3/abc");
    }

    #[test]
    fn missing_uri_is_unavailable() {
        let result = TaskMetadataSource::from_lookup(|_| None);
        assert!(matches!(result, Err(Error::AddressUnavailable(_))));
    }
}
