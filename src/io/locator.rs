//! Device location lookup
//!
//! The HTTP locator asks a device directory for the account's devices and
//! picks the first one whose display name matches the configured device and
//! which currently reports a location.

use crate::domain::types::Coordinates;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("device directory request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("device directory returned status {0}")]
    Status(u16),
    #[error("{0}")]
    Other(String),
}

/// Resolves the user's current coordinates.
///
/// `Ok(None)` means no matching device has a location right now, which is
/// not an error.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Option<Coordinates>, ProviderError>;
}

/// Device directory response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub content: Vec<DeviceRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "deviceDisplayName", default)]
    pub display_name: String,
    #[serde(default)]
    pub location: Option<DeviceLocation>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// First device named `device_name` that carries a location
pub fn locate_device(devices: &[DeviceRecord], device_name: &str) -> Option<Coordinates> {
    devices
        .iter()
        .filter(|d| d.display_name == device_name)
        .find_map(|d| d.location)
        .map(|loc| Coordinates::new(loc.latitude, loc.longitude))
}

#[derive(Debug, Clone)]
pub struct DeviceLocatorConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_name: String,
    pub timeout: Duration,
}

pub struct HttpDeviceLocator {
    config: DeviceLocatorConfig,
    client: reqwest::Client,
}

impl HttpDeviceLocator {
    pub fn new(config: DeviceLocatorConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn basic_auth_header(&self) -> Option<String> {
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                let credentials = format!("{}:{}", username, password);
                Some(format!("Basic {}", STANDARD.encode(credentials.as_bytes())))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl LocationProvider for HttpDeviceLocator {
    async fn current_location(&self) -> Result<Option<Coordinates>, ProviderError> {
        let mut request = self.client.get(&self.config.url).header("Accept", "application/json");
        if let Some(auth) = self.basic_auth_header() {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let devices: DeviceList = serde_json::from_slice(&response.bytes().await?)
            .map_err(|e| ProviderError::Other(format!("invalid device list: {}", e)))?;
        debug!(devices = devices.content.len(), "device_list_received");

        let location = locate_device(&devices.content, &self.config.device_name);
        info!(
            device = %self.config.device_name,
            found = location.is_some(),
            "device_location_resolved"
        );
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<DeviceRecord> {
        let json = r#"{"content": [
            {"deviceDisplayName": "MacBook Pro", "location": {"latitude": 1.0, "longitude": 2.0}},
            {"deviceDisplayName": "iPhone SE", "location": null},
            {"deviceDisplayName": "iPhone SE", "location": {"latitude": 35.0, "longitude": 139.0}},
            {"deviceDisplayName": "iPhone SE", "location": {"latitude": 0.0, "longitude": 0.0}}
        ]}"#;
        serde_json::from_str::<DeviceList>(json).unwrap().content
    }

    #[test]
    fn test_locate_first_matching_device_with_location() {
        let location = locate_device(&devices(), "iPhone SE").unwrap();
        assert_eq!(location, Coordinates::new(35.0, 139.0));
    }

    #[test]
    fn test_locate_absent_device() {
        assert!(locate_device(&devices(), "iPad").is_none());
        assert!(locate_device(&[], "iPhone SE").is_none());
    }

    #[test]
    fn test_locate_device_without_location() {
        let json = r#"{"content": [{"deviceDisplayName": "iPhone SE"}]}"#;
        let list: DeviceList = serde_json::from_str(json).unwrap();
        assert!(locate_device(&list.content, "iPhone SE").is_none());
    }

    #[test]
    fn test_basic_auth_header() {
        let locator = HttpDeviceLocator::new(DeviceLocatorConfig {
            url: "http://localhost/devices".to_string(),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            device_name: "iPhone SE".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(locator.basic_auth_header().as_deref(), Some("Basic dXNlcjpwYXNz"));
    }
}
