//! Sighting filter - drops everything already in the collection

use crate::domain::types::{NotificationCandidate, Sighting};
use crate::services::collection::CollectionSnapshot;

pub struct SightingFilter;

impl SightingFilter {
    /// Stable filter: keeps discovery order, removes collected species
    pub fn filter(sightings: Vec<Sighting>, snapshot: &CollectionSnapshot) -> Vec<NotificationCandidate> {
        sightings
            .into_iter()
            .filter(|s| !snapshot.contains(s.entity_id))
            .map(NotificationCandidate::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SpeciesId;
    use proptest::prelude::*;

    fn sighting(id: i32, cell: usize) -> Sighting {
        Sighting {
            entity_id: SpeciesId(id),
            display_name: format!("species-{}", id),
            image_url: format!("http://img.example/{}.png", id),
            raw_cell_index: cell,
        }
    }

    fn ids(candidates: &[NotificationCandidate]) -> Vec<i32> {
        candidates.iter().map(|c| c.entity_id().0).collect()
    }

    #[test]
    fn test_removes_collected_keeps_order() {
        let snapshot = CollectionSnapshot::from_ids(vec![SpeciesId(1), SpeciesId(3)]);
        let sightings = vec![sighting(5, 4), sighting(1, 3), sighting(2, 2), sighting(3, 1), sighting(4, 0)];

        let candidates = SightingFilter::filter(sightings, &snapshot);
        assert_eq!(ids(&candidates), vec![5, 2, 4]);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = CollectionSnapshot::default();
        assert!(SightingFilter::filter(vec![], &empty).is_empty());

        let candidates = SightingFilter::filter(vec![sighting(1, 0), sighting(1, 1)], &empty);
        assert_eq!(ids(&candidates), vec![1, 1]);
    }

    #[test]
    fn test_everything_collected() {
        let snapshot = CollectionSnapshot::from_ids(vec![SpeciesId(1), SpeciesId(2)]);
        let candidates = SightingFilter::filter(vec![sighting(2, 0), sighting(1, 1)], &snapshot);
        assert!(candidates.is_empty());
    }

    proptest! {
        /// Output is exactly the uncollected sightings, in input order
        #[test]
        fn prop_filter_is_stable_subsequence(
            seen in proptest::collection::vec(0i32..20, 0..30),
            collected in proptest::collection::vec(0i32..20, 0..20),
        ) {
            let snapshot = CollectionSnapshot::from_ids(collected.iter().copied().map(SpeciesId).collect());
            let sightings: Vec<Sighting> =
                seen.iter().enumerate().map(|(cell, &id)| sighting(id, cell)).collect();

            let candidates = SightingFilter::filter(sightings.clone(), &snapshot);

            let expected: Vec<&Sighting> =
                sightings.iter().filter(|s| !collected.contains(&s.entity_id.0)).collect();
            let actual: Vec<&Sighting> = candidates.iter().map(|c| c.sighting()).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
