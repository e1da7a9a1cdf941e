//! Per-concern `StateSource` adapters over [`HubClient`].
//!
//! One source type per concern; each carries its own clone of the
//! (cheaply cloneable) client and a description for log output.

use async_trait::async_trait;

use statuswatch_engine::StateSource;
use statuswatch_types::{ConnectionInfo, OsStatus, SystemInfo};

use crate::client::HubClient;

/// Polls the device connection state.
#[derive(Debug, Clone)]
pub struct ConnectionSource {
    client: HubClient,
    description: String,
}

impl ConnectionSource {
    pub fn new(client: HubClient) -> Self {
        let description = format!("connection: {}", client.endpoint());
        Self {
            client,
            description,
        }
    }
}

#[async_trait]
impl StateSource for ConnectionSource {
    type Value = ConnectionInfo;

    async fn fetch(&self) -> anyhow::Result<ConnectionInfo> {
        Ok(self.client.connection().await?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Polls OS identity plus the installed/repository version pair.
#[derive(Debug, Clone)]
pub struct OsSource {
    client: HubClient,
    description: String,
}

impl OsSource {
    pub fn new(client: HubClient) -> Self {
        let description = format!("os: {}", client.endpoint());
        Self {
            client,
            description,
        }
    }
}

#[async_trait]
impl StateSource for OsSource {
    type Value = OsStatus;

    async fn fetch(&self) -> anyhow::Result<OsStatus> {
        Ok(self.client.os_status().await?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Polls stash data availability.
#[derive(Debug, Clone)]
pub struct StashSource {
    client: HubClient,
    description: String,
}

impl StashSource {
    pub fn new(client: HubClient) -> Self {
        let description = format!("stash: {}", client.endpoint());
        Self {
            client,
            description,
        }
    }
}

#[async_trait]
impl StateSource for StashSource {
    type Value = bool;

    async fn fetch(&self) -> anyhow::Result<bool> {
        Ok(self.client.stash().await?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Polls the free-form system-info map.
#[derive(Debug, Clone)]
pub struct SystemInfoSource {
    client: HubClient,
    description: String,
}

impl SystemInfoSource {
    pub fn new(client: HubClient) -> Self {
        let description = format!("system-info: {}", client.endpoint());
        Self {
            client,
            description,
        }
    }
}

#[async_trait]
impl StateSource for SystemInfoSource {
    type Value = SystemInfo;

    async fn fetch(&self) -> anyhow::Result<SystemInfo> {
        Ok(self.client.system_info().await?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
