//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `locator` - device directory lookup for the user's current location
//! - `session` - remote game session (login, location, inventory, heartbeat)
//! - `webhook` - notification delivery to the messaging webhook

pub mod locator;
pub mod session;
pub mod webhook;

// Re-export commonly used types
pub use locator::{DeviceLocatorConfig, HttpDeviceLocator, LocationProvider};
pub use session::{
    AuthProvider, GameSession, HttpSessionConnector, SessionConnector, SessionCredentials, StartLocation,
};
pub use webhook::{Destination, MessageTemplate, NotificationDispatcher, ReqwestTransport, WebhookTransport};
