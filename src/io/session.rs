//! Remote game session
//!
//! `SessionConnector::login` yields a fresh `GameSession` owned by a single
//! pipeline run. Session state (current location, auth token) is mutated by
//! the run and must not be shared between concurrent runs.
//!
//! The HTTP implementation talks JSON to a session gateway:
//! - `POST {base}/login` -> `{"token": "..."}`
//! - `POST {base}/location`
//! - `GET {base}/inventory`
//! - `GET {base}/heartbeat`

use crate::domain::types::Coordinates;
use crate::domain::upstream::{HeartbeatBlob, InventoryBlob};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Ptc,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Ptc => "ptc",
        }
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(AuthProvider::Google),
            "ptc" => Ok(AuthProvider::Ptc),
            other => Err(format!("unknown auth provider {:?}", other)),
        }
    }
}

/// Where the session starts before the real location is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StartLocation {
    Name { name: String },
    Coords { latitude: f64, longitude: f64 },
}

#[derive(Clone, Serialize)]
pub struct SessionCredentials {
    pub username: String,
    pub password: String,
    pub provider: AuthProvider,
    #[serde(rename = "location")]
    pub start: StartLocation,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .field("start", &self.start)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login rejected with status {0}")]
    Rejected(u16),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum LocationUpdateError {
    #[error("location update failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("location update rejected with status {0}")]
    Rejected(u16),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("fetch rejected with status {0}")]
    Rejected(u16),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait SessionConnector: Send + Sync {
    type Session: GameSession;

    async fn login(&self, credentials: &SessionCredentials) -> Result<Self::Session, AuthError>;
}

#[async_trait]
pub trait GameSession: Send {
    async fn set_location(&mut self, coords: Coordinates) -> Result<(), LocationUpdateError>;
    async fn fetch_inventory(&mut self) -> Result<InventoryBlob, FetchError>;
    async fn heartbeat(&mut self) -> Result<HeartbeatBlob, FetchError>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

pub struct HttpSessionConnector {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSessionConnector {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client })
    }
}

#[async_trait]
impl SessionConnector for HttpSessionConnector {
    type Session = HttpGameSession;

    async fn login(&self, credentials: &SessionCredentials) -> Result<Self::Session, AuthError> {
        let url = format!("{}/login", self.base_url);
        let body = serde_json::to_vec(credentials).map_err(|e| AuthError::Other(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected(status.as_u16()));
        }

        let login: LoginResponse = serde_json::from_slice(&response.bytes().await?)
            .map_err(|e| AuthError::Other(format!("invalid login response: {}", e)))?;

        info!(provider = %credentials.provider.as_str(), username = %credentials.username, "session_logged_in");

        Ok(HttpGameSession {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            token: login.token,
            location: None,
        })
    }
}

pub struct HttpGameSession {
    base_url: String,
    client: reqwest::Client,
    token: String,
    location: Option<Coordinates>,
}

impl HttpGameSession {
    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Rejected(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        debug!(path = %path, bytes = bytes.len(), "session_response");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl GameSession for HttpGameSession {
    async fn set_location(&mut self, coords: Coordinates) -> Result<(), LocationUpdateError> {
        let url = format!("{}/location", self.base_url);
        let body = serde_json::to_vec(&coords).map_err(|e| LocationUpdateError::Other(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LocationUpdateError::Rejected(status.as_u16()));
        }

        self.location = Some(coords);
        Ok(())
    }

    async fn fetch_inventory(&mut self) -> Result<InventoryBlob, FetchError> {
        self.get_json("inventory").await
    }

    async fn heartbeat(&mut self) -> Result<HeartbeatBlob, FetchError> {
        self.get_json("heartbeat").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_provider_parse() {
        assert_eq!("google".parse::<AuthProvider>().unwrap(), AuthProvider::Google);
        assert_eq!(" PTC ".parse::<AuthProvider>().unwrap(), AuthProvider::Ptc);
        assert!("facebook".parse::<AuthProvider>().is_err());
    }

    #[test]
    fn test_credentials_wire_format() {
        let credentials = SessionCredentials {
            username: "ash".to_string(),
            password: "pikachu".to_string(),
            provider: AuthProvider::Google,
            start: StartLocation::Name { name: "Yokohama".to_string() },
        };

        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json["provider"], "google");
        assert_eq!(json["location"]["type"], "name");
        assert_eq!(json["location"]["name"], "Yokohama");
    }

    #[test]
    fn test_start_location_coords() {
        let start = StartLocation::Coords { latitude: 35.0, longitude: 139.0 };
        let json = serde_json::to_value(&start).unwrap();
        assert_eq!(json["type"], "coords");
        assert_eq!(json["latitude"], 35.0);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = SessionCredentials {
            username: "ash".to_string(),
            password: "pikachu".to_string(),
            provider: AuthProvider::Ptc,
            start: StartLocation::Name { name: "Yokohama".to_string() },
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("pikachu"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_connector_trims_trailing_slash() {
        let connector = HttpSessionConnector::new("http://localhost:9200/session/", Duration::from_secs(1)).unwrap();
        assert_eq!(connector.base_url, "http://localhost:9200/session");
    }
}
