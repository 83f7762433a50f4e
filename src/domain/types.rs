//! Shared types for the discovery pipeline

use serde::{Deserialize, Deserializer, Serialize};

/// Newtype wrapper for species (entity type) ids to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SpeciesId(pub i32);

impl std::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deserialize a species id that upstream may encode as either a JSON
/// integer or a numeric string (`16` or `"16"`).
pub(crate) fn deserialize_species_id<'de, D>(deserializer: D) -> Result<SpeciesId, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct SpeciesIdVisitor;

    impl<'de> Visitor<'de> for SpeciesIdVisitor {
        type Value = SpeciesId;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer or numeric string species id")
        }

        fn visit_str<E>(self, value: &str) -> Result<SpeciesId, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<i32>()
                .map(SpeciesId)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_i64<E>(self, value: i64) -> Result<SpeciesId, E>
        where
            E: de::Error,
        {
            i32::try_from(value)
                .map(SpeciesId)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
        }

        fn visit_u64<E>(self, value: u64) -> Result<SpeciesId, E>
        where
            E: de::Error,
        {
            i32::try_from(value)
                .map(SpeciesId)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
        }
    }

    deserializer.deserialize_any(SpeciesIdVisitor)
}

/// Geographic position of the user, produced once per run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// One entity observed near the user at scan time
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    pub entity_id: SpeciesId,
    pub display_name: String,
    pub image_url: String,
    /// Index of the heartbeat cell that reported this entity
    pub raw_cell_index: usize,
}

/// A sighting known not to be in the collection snapshot.
///
/// Only `SightingFilter` constructs candidates, so holding one is proof the
/// entity was absent from the snapshot it was filtered against.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationCandidate {
    sighting: Sighting,
}

impl NotificationCandidate {
    pub(crate) fn new(sighting: Sighting) -> Self {
        Self { sighting }
    }

    pub fn sighting(&self) -> &Sighting {
        &self.sighting
    }

    pub fn entity_id(&self) -> SpeciesId {
        self.sighting.entity_id
    }

    pub fn display_name(&self) -> &str {
        &self.sighting.display_name
    }

    pub fn image_url(&self) -> &str {
        &self.sighting.image_url
    }
}

/// Per-candidate delivery result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub species_id: SpeciesId,
    pub delivered: bool,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn delivered(species_id: SpeciesId) -> Self {
        Self { species_id, delivered: true, retryable: false, error: None }
    }

    pub fn rejected(species_id: SpeciesId, error: String) -> Self {
        Self { species_id, delivered: false, retryable: false, error: Some(error) }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveLocation,
    InitializeSession,
    FetchCollection,
    ScanProximity,
    FilterCandidates,
    DispatchAll,
}

impl Stage {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResolveLocation => "resolve_location",
            Stage::InitializeSession => "initialize_session",
            Stage::FetchCollection => "fetch_collection",
            Stage::ScanProximity => "scan_proximity",
            Stage::FilterCandidates => "filter_candidates",
            Stage::DispatchAll => "dispatch_all",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
