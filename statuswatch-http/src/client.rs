//! HTTP client for the device hub's `about` API.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use statuswatch_types::{
    unquote, ConnectionInfo, DeviceVersion, OsRelease, OsStatus, SystemInfo, VersionInfo,
};

use crate::error::SourceError;

/// Client for the hub's status queries.
///
/// Each concern is a `GET {endpoint}/about?query={concern}` returning a
/// small JSON object. The client carries its own request timeout so a
/// stalled hub cannot hold a poll slot past the client bound.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: Client,
    endpoint: String,
}

impl HubClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> HubClientBuilder {
        HubClientBuilder::default()
    }

    /// OS identity: name and installed version, both unquoted.
    pub async fn os_info(&self) -> Result<OsRelease, SourceError> {
        let payload: OsInfoPayload = self.get_json("os-info").await?;
        parse_os_info(payload)
    }

    /// Installed/repository version pair with download state.
    pub async fn update_info(&self) -> Result<VersionInfo, SourceError> {
        let payload: UpdatePayload = self.get_json("update-info").await?;
        parse_update(payload)
    }

    /// Everything the update watcher needs in one call.
    pub async fn os_status(&self) -> Result<OsStatus, SourceError> {
        let release = self.os_info().await?;
        let info = self.update_info().await?;
        Ok(OsStatus {
            name: release.name,
            info,
        })
    }

    /// Current device connection state.
    pub async fn connection(&self) -> Result<ConnectionInfo, SourceError> {
        self.get_json("android-connection").await
    }

    /// Whether stash data is available to fetch.
    pub async fn stash(&self) -> Result<bool, SourceError> {
        let payload: StashPayload = self.get_json("stash").await?;
        Ok(payload.data_available)
    }

    /// Free-form module-name to value map for the system-info panel.
    pub async fn system_info(&self) -> Result<SystemInfo, SourceError> {
        self.get_json("system-info").await
    }

    /// Capability probe: whether the stash feature is online.
    pub async fn stash_capability(&self) -> Result<bool, SourceError> {
        let payload: CapabilitiesPayload = self.get_json("capabilities").await?;
        Ok(payload.stash)
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(&self, query: &str) -> Result<T, SourceError> {
        let url = format!("{}/about?query={}", self.endpoint, query);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }
}

/// Builder for [`HubClient`].
#[derive(Debug, Default)]
pub struct HubClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl HubClientBuilder {
    /// Set the hub endpoint (e.g. "http://localhost:8000").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> HubClient {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        HubClient {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| "http://127.0.0.1:8000".to_string()),
        }
    }
}

/// OS identity as delivered by the hub: fields straight out of the
/// os-release file, quotes included.
#[derive(Debug, Deserialize)]
struct OsInfoPayload {
    #[serde(rename = "NAME")]
    name: Option<String>,
    #[serde(rename = "VERSION_ID")]
    version: Option<String>,
}

fn parse_os_info(payload: OsInfoPayload) -> Result<OsRelease, SourceError> {
    let name = payload.name.ok_or(SourceError::MissingField("NAME"))?;
    let version = payload
        .version
        .ok_or(SourceError::MissingField("VERSION_ID"))?;
    Ok(OsRelease {
        name: unquote(&name).to_string(),
        version: DeviceVersion::parse(&version),
    })
}

/// Update query payload: `versionNum` is the installed version,
/// `version` the latest in the repository.
#[derive(Debug, Deserialize)]
struct UpdatePayload {
    #[serde(rename = "versionNum")]
    current: Option<String>,
    #[serde(rename = "version")]
    repo: Option<String>,
    #[serde(default)]
    downloaded: bool,
}

fn parse_update(payload: UpdatePayload) -> Result<VersionInfo, SourceError> {
    let current = payload
        .current
        .ok_or(SourceError::MissingField("versionNum"))?;
    let repo = payload.repo.ok_or(SourceError::MissingField("version"))?;
    Ok(VersionInfo {
        current: DeviceVersion::parse(&current),
        repo: DeviceVersion::parse(&repo),
        downloaded: payload.downloaded,
    })
}

#[derive(Debug, Deserialize)]
struct StashPayload {
    #[serde(rename = "dataAvailable", default)]
    data_available: bool,
}

#[derive(Debug, Deserialize)]
struct CapabilitiesPayload {
    #[serde(default)]
    stash: bool,
}
