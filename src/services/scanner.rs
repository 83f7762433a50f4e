//! Proximity scanner - turns a heartbeat into an ordered list of sightings
//!
//! Sampling policy, kept as observable behavior:
//! - only the first (nearest) entity reported by a cell is considered
//! - cells are walked from the last index to the first
//!
//! Both follow from the upstream heartbeat layout and should be revisited if
//! that format changes.

use crate::domain::species::SpeciesTable;
use crate::domain::types::{Sighting, SpeciesId};
use crate::domain::upstream::HeartbeatBlob;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("species {species} reported in cell {cell} is missing from the species table")]
    UnknownSpecies { species: SpeciesId, cell: usize },
}

pub struct ProximityScanner {
    species: Arc<SpeciesTable>,
}

impl ProximityScanner {
    pub fn new(species: Arc<SpeciesTable>) -> Self {
        Self { species }
    }

    /// Consume one heartbeat and emit one sighting per populated cell
    pub fn scan(&self, heartbeat: HeartbeatBlob) -> Result<Vec<Sighting>, ScanError> {
        let mut sightings = Vec::new();

        for (cell, map_cell) in heartbeat.cells.into_iter().enumerate().rev() {
            let Some(primary) = map_cell.nearby.first() else {
                continue;
            };

            let species = self
                .species
                .resolve(primary.species)
                .ok_or(ScanError::UnknownSpecies { species: primary.species, cell })?;

            debug!(cell = cell, species_id = %species.id, name = %species.name, "sighting");

            sightings.push(Sighting {
                entity_id: species.id,
                display_name: species.name.clone(),
                image_url: species.image_url.clone(),
                raw_cell_index: cell,
            });
        }

        Ok(sightings)
    }
}
