//! Cloud instance metadata source
//!
//! Reads the instance's address from the link-local metadata service
//! using the session-token protocol (IMDSv2): a `PUT` obtains a token, and
//! the metadata `GET` presents it. If the service refuses to hand out a
//! token (e.g. IMDSv2 disabled behind an old proxy), the read is retried
//! once without one.

use std::time::Duration;

use async_trait::async_trait;
use sidecar_core::traits::AddressSource;
use sidecar_core::{Error, Result};

/// Default metadata service endpoint
pub const DEFAULT_ENDPOINT: &str = "http://169.254.169.254";

/// Default metadata service endpoint in IPv6 endpoint mode
pub const DEFAULT_IPV6_ENDPOINT: &str = "http://[fd00:ec2::254]";

/// Environment variable overriding the metadata endpoint
pub const ENDPOINT_ENV: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";

/// Environment variable selecting the default endpoint (`IPv4` or `IPv6`)
pub const ENDPOINT_MODE_ENV: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT_MODE";

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

const TOKEN_PATH: &str = "/latest/api/token";
const METADATA_PREFIX: &str = "/latest/meta-data/";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_SECS: u32 = 21600;

/// Address from the instance metadata service
#[derive(Debug, Clone)]
pub struct InstanceMetadataSource {
    endpoint: String,
    path: String,
    client: reqwest::Client,
}

impl InstanceMetadataSource {
    /// Create a source reading `path` from the service at `endpoint`
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Base URL (e.g. "http://169.254.169.254")
    /// - `path`: Metadata key (e.g. "public-ipv4", "local-ipv4")
    pub fn new(endpoint: impl Into<String>, path: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            path: path.into().trim_start_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a source using the endpoint settings from the environment
    pub fn from_env(path: impl Into<String>) -> Result<Self> {
        Self::from_lookup(path, |key| std::env::var(key).ok())
    }

    /// Create a source using `lookup` to read environment variables
    ///
    /// An explicit endpoint wins; otherwise the endpoint mode picks the
    /// IPv4 or IPv6 default.
    pub fn from_lookup<F>(path: impl Into<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = lookup(ENDPOINT_ENV).filter(|e| !e.trim().is_empty());
        let endpoint = match explicit {
            Some(endpoint) => endpoint.trim().to_string(),
            None => default_endpoint(lookup(ENDPOINT_MODE_ENV).as_deref())?.to_string(),
        };
        Ok(Self::new(endpoint, path))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Obtain a session token; `None` if the service declines to issue one
    async fn fetch_token(&self) -> Result<Option<String>> {
        let response = self
            .client
            .put(format!("{}{}", self.endpoint, TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECS.to_string())
            .send()
            .await
            .map_err(|e| Error::address(format!("Instance metadata service unreachable: {}", e)))?;

        if !response.status().is_success() {
            tracing::debug!(
                "Metadata token request refused ({}), falling back to unauthenticated read",
                response.status()
            );
            return Ok(None);
        }

        let token = response
            .text()
            .await
            .map_err(|e| Error::address(format!("Failed to read metadata token: {}", e)))?;

        Ok(Some(token.trim().to_string()))
    }
}

/// Default endpoint for an endpoint mode setting
fn default_endpoint(mode: Option<&str>) -> Result<&'static str> {
    match mode.map(str::trim) {
        None | Some("") => Ok(DEFAULT_ENDPOINT),
        Some(mode) if mode.eq_ignore_ascii_case("ipv4") => Ok(DEFAULT_ENDPOINT),
        Some(mode) if mode.eq_ignore_ascii_case("ipv6") => Ok(DEFAULT_IPV6_ENDPOINT),
        Some(mode) => Err(Error::config(format!(
            "{} must be IPv4 or IPv6, got '{}'",
            ENDPOINT_MODE_ENV, mode
        ))),
    }
}

#[async_trait]
impl AddressSource for InstanceMetadataSource {
    async fn resolve(&self) -> Result<String> {
        tracing::info!(
            "Fetching IP address from instance metadata ({} at {})",
            self.path,
            self.endpoint()
        );

        let token = self.fetch_token().await?;

        let mut request = self
            .client
            .get(format!("{}{}{}", self.endpoint, METADATA_PREFIX, self.path));
        if let Some(token) = &token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|e| {
            Error::address(format!(
                "Unable to retrieve {} from instance metadata: {}",
                self.path, e
            ))
        })?;

        if !response.status().is_success() {
            return Err(Error::address(format!(
                "Unable to retrieve {} from instance metadata: HTTP {}",
                self.path,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::address(format!("Failed to read instance metadata: {}", e)))?;

        let address = body.trim();
        if address.is_empty() {
            return Err(Error::address(format!(
                "Instance metadata returned an empty {}",
                self.path
            )));
        }

        Ok(address.to_string())
    }

    fn source_name(&self) -> &'static str {
        "instance-metadata"
    }
}
