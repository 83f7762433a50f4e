//! Domain models - core types shared by every pipeline stage
//!
//! This module contains the canonical data types used throughout the system:
//! - `types` - ids, coordinates, sightings, candidates, outcomes, stages
//! - `species` - immutable species metadata table
//! - `upstream` - raw inventory and heartbeat payloads from the game session

pub mod species;
pub mod types;
pub mod upstream;

// Re-export commonly used types at module level
pub use species::{Species, SpeciesTable, SpeciesTableError};
pub use types::{Coordinates, NotificationCandidate, NotificationOutcome, Sighting, SpeciesId, Stage};
pub use upstream::{HeartbeatBlob, InventoryBlob};
