//! Configuration loading from TOML files and environment overrides
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! After the file is loaded, `RADAR_*` environment variables override
//! individual values (credentials are usually supplied this way).

use crate::io::locator::DeviceLocatorConfig;
use crate::io::session::{AuthProvider, SessionCredentials, StartLocation};
use crate::io::webhook::{Destination, DestinationError, MessageTemplate, DEFAULT_ICON_EMOJI, DEFAULT_TEXT_TEMPLATE};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct LocatorConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub device_name: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_provider")]
    pub provider: AuthProvider,
    /// Named place the session starts at before the device location is set
    #[serde(default = "default_start_location")]
    pub location: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Destination encoded as `<base_url>@<channel>`
    pub webhook: String,
    #[serde(default = "default_icon_emoji")]
    pub icon_emoji: String,
    #[serde(default = "default_text_template")]
    pub text_template: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesConfig {
    pub table: String,
    /// Optional localised display names
    #[serde(default)]
    pub names: Option<String>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_provider() -> AuthProvider {
    AuthProvider::Google
}

fn default_start_location() -> String {
    "Yokohama".to_string()
}

fn default_icon_emoji() -> String {
    DEFAULT_ICON_EMOJI.to_string()
}

fn default_text_template() -> String {
    DEFAULT_TEXT_TEMPLATE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub locator: LocatorConfig,
    pub session: SessionConfig,
    pub notify: NotifyConfig,
    pub species: SpeciesConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    locator_url: String,
    locator_username: Option<String>,
    locator_password: Option<String>,
    device_name: String,
    locator_timeout_ms: u64,
    session_url: String,
    session_username: String,
    session_password: String,
    session_provider: AuthProvider,
    session_location: String,
    session_timeout_ms: u64,
    webhook: String,
    icon_emoji: String,
    text_template: String,
    notify_timeout_ms: u64,
    species_table: String,
    species_names: Option<String>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locator_url: "http://localhost:9200/devices".to_string(),
            locator_username: None,
            locator_password: None,
            device_name: "iPhone SE".to_string(),
            locator_timeout_ms: default_timeout_ms(),
            session_url: "http://localhost:9200/session".to_string(),
            session_username: "USER".to_string(),
            session_password: "PASS".to_string(),
            session_provider: AuthProvider::Google,
            session_location: default_start_location(),
            session_timeout_ms: default_timeout_ms(),
            webhook: String::new(),
            icon_emoji: default_icon_emoji(),
            text_template: default_text_template(),
            notify_timeout_ms: default_timeout_ms(),
            species_table: "data/species.json".to_string(),
            species_names: Some("data/species.ja.json".to_string()),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from an explicit argument or environment
    pub fn resolve_config_path(arg: Option<&str>) -> String {
        if let Some(path) = arg {
            return path.to_string();
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        // Default to dev.toml
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            locator_url: toml_config.locator.url,
            locator_username: toml_config.locator.username,
            locator_password: toml_config.locator.password,
            device_name: toml_config.locator.device_name,
            locator_timeout_ms: toml_config.locator.timeout_ms,
            session_url: toml_config.session.url,
            session_username: toml_config.session.username,
            session_password: toml_config.session.password,
            session_provider: toml_config.session.provider,
            session_location: toml_config.session.location,
            session_timeout_ms: toml_config.session.timeout_ms,
            webhook: toml_config.notify.webhook,
            icon_emoji: toml_config.notify.icon_emoji,
            text_template: toml_config.notify.text_template,
            notify_timeout_ms: toml_config.notify.timeout_ms,
            species_table: toml_config.species.table,
            species_names: toml_config.species.names,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Apply `RADAR_*` overrides from the process environment
    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RADAR_DEVICE_NAME") {
            self.device_name = v;
        }
        if let Some(v) = lookup("RADAR_LOCATOR_URL") {
            self.locator_url = v;
        }
        if let Some(v) = lookup("RADAR_LOCATOR_USERNAME") {
            self.locator_username = Some(v);
        }
        if let Some(v) = lookup("RADAR_LOCATOR_PASSWORD") {
            self.locator_password = Some(v);
        }
        if let Some(v) = lookup("RADAR_SESSION_URL") {
            self.session_url = v;
        }
        if let Some(v) = lookup("RADAR_SESSION_USERNAME") {
            self.session_username = v;
        }
        if let Some(v) = lookup("RADAR_SESSION_PASSWORD") {
            self.session_password = v;
        }
        if let Some(v) = lookup("RADAR_SESSION_PROVIDER") {
            self.session_provider = v
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid RADAR_SESSION_PROVIDER")?;
        }
        if let Some(v) = lookup("RADAR_SESSION_LOCATION") {
            self.session_location = v;
        }
        if let Some(v) = lookup("RADAR_WEBHOOK") {
            self.webhook = v;
        }
        Ok(self)
    }

    /// Parse the webhook destination (`<base_url>@<channel>`)
    pub fn destination(&self) -> Result<Destination, DestinationError> {
        Destination::parse(&self.webhook)
    }

    pub fn message_template(&self) -> MessageTemplate {
        MessageTemplate { icon_emoji: self.icon_emoji.clone(), text_template: self.text_template.clone() }
    }

    pub fn session_credentials(&self) -> SessionCredentials {
        SessionCredentials {
            username: self.session_username.clone(),
            password: self.session_password.clone(),
            provider: self.session_provider,
            start: StartLocation::Name { name: self.session_location.clone() },
        }
    }

    pub fn locator_config(&self) -> DeviceLocatorConfig {
        DeviceLocatorConfig {
            url: self.locator_url.clone(),
            username: self.locator_username.clone(),
            password: self.locator_password.clone(),
            device_name: self.device_name.clone(),
            timeout: Duration::from_millis(self.locator_timeout_ms),
        }
    }

    /// Species table path; relative paths are taken from the config file's
    /// directory
    pub fn species_table_path(&self) -> PathBuf {
        self.resolve_relative(&self.species_table)
    }

    pub fn species_names_path(&self) -> Option<PathBuf> {
        self.species_names.as_deref().map(|p| self.resolve_relative(p))
    }

    fn resolve_relative(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() || self.config_file == "default" {
            return path.to_path_buf();
        }
        match Path::new(&self.config_file).parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    // Getters for config fields
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn locator_url(&self) -> &str {
        &self.locator_url
    }

    pub fn session_url(&self) -> &str {
        &self.session_url
    }

    pub fn session_provider(&self) -> AuthProvider {
        self.session_provider
    }

    pub fn session_location(&self) -> &str {
        &self.session_location
    }

    pub fn session_timeout_ms(&self) -> u64 {
        self.session_timeout_ms
    }

    pub fn webhook(&self) -> &str {
        &self.webhook
    }

    pub fn notify_timeout_ms(&self) -> u64 {
        self.notify_timeout_ms
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device_name(), "iPhone SE");
        assert_eq!(config.session_provider(), AuthProvider::Google);
        assert_eq!(config.session_location(), "Yokohama");
        assert_eq!(config.webhook(), "");
        assert_eq!(config.message_template(), MessageTemplate::default());
    }

    #[test]
    fn test_default_has_no_destination() {
        assert!(Config::default().destination().is_err());
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        assert_eq!(Config::resolve_config_path(Some("config/prod.toml")), "config/prod.toml");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides(lookup(&[
                ("RADAR_DEVICE_NAME", "iPhone 15"),
                ("RADAR_SESSION_USERNAME", "ash"),
                ("RADAR_SESSION_PASSWORD", "pikachu"),
                ("RADAR_SESSION_PROVIDER", "ptc"),
                ("RADAR_SESSION_LOCATION", "Kyoto"),
                ("RADAR_WEBHOOK", "https://hooks.example/abc@ash"),
            ]))
            .unwrap();

        assert_eq!(config.device_name(), "iPhone 15");
        let credentials = config.session_credentials();
        assert_eq!(credentials.username, "ash");
        assert_eq!(credentials.password, "pikachu");
        assert_eq!(credentials.provider, AuthProvider::Ptc);
        assert_eq!(credentials.start, StartLocation::Name { name: "Kyoto".to_string() });

        let destination = config.destination().unwrap();
        assert_eq!(destination.base_url(), "https://hooks.example/abc");
        assert_eq!(destination.channel(), "@ash");
    }

    #[test]
    fn test_invalid_provider_override() {
        let result = Config::default().with_overrides(lookup(&[("RADAR_SESSION_PROVIDER", "myspace")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_no_overrides_is_identity() {
        let config = Config::default().with_overrides(|_| None).unwrap();
        assert_eq!(config.device_name(), Config::default().device_name());
        assert_eq!(config.locator_url(), Config::default().locator_url());
    }

    #[test]
    fn test_species_paths_default_relative() {
        let config = Config::default();
        assert_eq!(config.species_table_path(), PathBuf::from("data/species.json"));
        assert_eq!(config.species_names_path(), Some(PathBuf::from("data/species.ja.json")));
    }

    #[test]
    fn test_locator_config() {
        let config = Config::default()
            .with_overrides(lookup(&[("RADAR_LOCATOR_USERNAME", "me"), ("RADAR_LOCATOR_PASSWORD", "pw")]))
            .unwrap();
        let locator = config.locator_config();
        assert_eq!(locator.username.as_deref(), Some("me"));
        assert_eq!(locator.password.as_deref(), Some("pw"));
        assert_eq!(locator.timeout, Duration::from_millis(10_000));
    }
}
