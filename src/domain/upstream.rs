//! Raw payloads reported by the remote game session
//!
//! Field names follow the upstream wire format. Anything not listed here is
//! ignored on decode.

use crate::domain::types::{deserialize_species_id, SpeciesId};
use serde::{Deserialize, Serialize};

/// Inventory response (`GetInventory`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryBlob {
    #[serde(default)]
    pub inventory_delta: InventoryDelta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryDelta {
    #[serde(default)]
    pub inventory_items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default)]
    pub inventory_item_data: InventoryItemData,
}

/// One inventory item. Only collection entries matter here; other item
/// kinds (items, candies, eggs...) decode to `collection_entry: None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemData {
    #[serde(rename = "pokedex_entry", default, skip_serializing_if = "Option::is_none")]
    pub collection_entry: Option<CollectionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEntry {
    #[serde(rename = "pokedex_entry_number", deserialize_with = "deserialize_species_id")]
    pub species: SpeciesId,
}

impl InventoryBlob {
    /// Convenience for fixtures: an inventory holding exactly these entries
    pub fn with_collected(ids: &[i32]) -> Self {
        let inventory_items = ids
            .iter()
            .map(|&id| InventoryItem {
                inventory_item_data: InventoryItemData {
                    collection_entry: Some(CollectionEntry { species: SpeciesId(id) }),
                },
            })
            .collect();
        Self { inventory_delta: InventoryDelta { inventory_items } }
    }
}

/// Heartbeat (proximity poll) response, partitioned into map cells
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatBlob {
    #[serde(default)]
    pub cells: Vec<MapCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapCell {
    #[serde(rename = "NearbyPokemon", default)]
    pub nearby: Vec<NearbyEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyEntity {
    #[serde(rename = "PokedexNumber", deserialize_with = "deserialize_species_id")]
    pub species: SpeciesId,
}

impl HeartbeatBlob {
    /// Convenience for fixtures: one cell per slice, each listing its entities
    pub fn from_cells(cells: &[&[i32]]) -> Self {
        let cells = cells
            .iter()
            .map(|ids| MapCell {
                nearby: ids.iter().map(|&id| NearbyEntity { species: SpeciesId(id) }).collect(),
            })
            .collect();
        Self { cells }
    }
}
