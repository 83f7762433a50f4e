//! Collection snapshot - "have I already collected species X?"
//!
//! Built once per run from the session inventory, read-only afterwards.

use crate::domain::types::SpeciesId;
use crate::domain::upstream::InventoryBlob;
use rustc_hash::FxHashSet;

/// Point-in-time view of the user's already-collected species
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    /// Collected ids in inventory order
    entries: Vec<SpeciesId>,
    index: FxHashSet<SpeciesId>,
}

impl CollectionSnapshot {
    /// Extract every inventory entry carrying collection metadata.
    /// Entries without it are simply not collected yet.
    pub fn build(inventory: &InventoryBlob) -> Self {
        let entries: Vec<SpeciesId> = inventory
            .inventory_delta
            .inventory_items
            .iter()
            .filter_map(|item| item.inventory_item_data.collection_entry.as_ref())
            .map(|entry| entry.species)
            .collect();
        Self::from_ids(entries)
    }

    pub fn from_ids(entries: Vec<SpeciesId>) -> Self {
        let index = entries.iter().copied().collect();
        Self { entries, index }
    }

    /// Total over every id; unknown ids are simply not contained
    #[inline]
    pub fn contains(&self, id: SpeciesId) -> bool {
        self.index.contains(&id)
    }

    pub fn entries(&self) -> &[SpeciesId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::upstream::{InventoryDelta, InventoryItem, InventoryItemData};
    use proptest::prelude::*;

    #[test]
    fn test_build_skips_items_without_entry() {
        let mut inventory = InventoryBlob::with_collected(&[1, 4]);
        inventory.inventory_delta.inventory_items.insert(
            1,
            InventoryItem { inventory_item_data: InventoryItemData { collection_entry: None } },
        );

        let snapshot = CollectionSnapshot::build(&inventory);
        assert_eq!(snapshot.entries(), &[SpeciesId(1), SpeciesId(4)]);
        assert!(snapshot.contains(SpeciesId(1)));
        assert!(snapshot.contains(SpeciesId(4)));
        assert!(!snapshot.contains(SpeciesId(2)));
    }

    #[test]
    fn test_empty_inventory() {
        let inventory = InventoryBlob { inventory_delta: InventoryDelta::default() };
        let snapshot = CollectionSnapshot::build(&inventory);
        assert!(snapshot.is_empty());
        assert!(!snapshot.contains(SpeciesId(1)));
    }

    #[test]
    fn test_contains_extreme_ids() {
        let snapshot = CollectionSnapshot::build(&InventoryBlob::with_collected(&[1]));
        assert!(!snapshot.contains(SpeciesId(0)));
        assert!(!snapshot.contains(SpeciesId(-1)));
        assert!(!snapshot.contains(SpeciesId(i32::MAX)));
        assert!(!snapshot.contains(SpeciesId(i32::MIN)));
    }

    proptest! {
        /// contains agrees with a linear scan of the inventory for any id
        #[test]
        fn prop_contains_matches_inventory(
            collected in proptest::collection::vec(any::<i32>(), 0..40),
            probe in any::<i32>(),
        ) {
            let snapshot = CollectionSnapshot::build(&InventoryBlob::with_collected(&collected));
            prop_assert_eq!(snapshot.contains(SpeciesId(probe)), collected.contains(&probe));
        }
    }
}
