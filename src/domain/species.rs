//! Static species metadata table
//!
//! Loaded once at startup and shared read-only (`Arc<SpeciesTable>`) with the
//! proximity scanner. An optional localisation file overrides display names.

use crate::domain::types::SpeciesId;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Display metadata for one species
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    #[serde(rename = "img")]
    pub image_url: String,
}

#[derive(Debug, Error)]
pub enum SpeciesTableError {
    #[error("failed to read species file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse species file {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("duplicate species id {0}")]
    DuplicateId(SpeciesId),
    #[error("invalid species id key {0:?} in names file")]
    InvalidNameKey(String),
}

/// Immutable id → species lookup
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    entries: FxHashMap<SpeciesId, Species>,
}

impl SpeciesTable {
    /// Build a table from already-parsed entries
    pub fn from_entries(entries: Vec<Species>) -> Result<Self, SpeciesTableError> {
        let mut map = FxHashMap::default();
        for species in entries {
            let id = species.id;
            if map.insert(id, species).is_some() {
                return Err(SpeciesTableError::DuplicateId(id));
            }
        }
        Ok(Self { entries: map })
    }

    /// Load the table from a JSON array file, optionally applying a
    /// localised names file (`{"<id>": "<name>"}`).
    pub fn load(table_path: &Path, names_path: Option<&Path>) -> Result<Self, SpeciesTableError> {
        let entries: Vec<Species> = read_json(table_path)?;
        let mut table = Self::from_entries(entries)?;

        if let Some(names_path) = names_path {
            let names: HashMap<String, String> = read_json(names_path)?;
            table.apply_names(names)?;
        }

        Ok(table)
    }

    /// Override display names; ids not present in the table are ignored
    pub fn apply_names(&mut self, names: HashMap<String, String>) -> Result<(), SpeciesTableError> {
        for (key, name) in names {
            let id = key
                .trim()
                .parse::<i32>()
                .map(SpeciesId)
                .map_err(|_| SpeciesTableError::InvalidNameKey(key.clone()))?;
            if let Some(species) = self.entries.get_mut(&id) {
                species.name = name;
            }
        }
        Ok(())
    }

    pub fn resolve(&self, id: SpeciesId) -> Option<&Species> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SpeciesTableError> {
    let content = fs::read_to_string(path)
        .map_err(|source| SpeciesTableError::Read { path: path.display().to_string(), source })?;
    serde_json::from_str(&content)
        .map_err(|source| SpeciesTableError::Parse { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const TABLE: &str = r#"[
        {"id": 1, "name": "Bulbasaur", "img": "http://img.example/001.png"},
        {"id": 16, "name": "Pidgey", "img": "http://img.example/016.png"}
    ]"#;

    #[test]
    fn test_load_and_resolve() {
        let table_file = write_temp(TABLE);
        let table = SpeciesTable::load(table_file.path(), None).unwrap();

        assert_eq!(table.len(), 2);
        let pidgey = table.resolve(SpeciesId(16)).unwrap();
        assert_eq!(pidgey.name, "Pidgey");
        assert_eq!(pidgey.image_url, "http://img.example/016.png");
        assert!(table.resolve(SpeciesId(999)).is_none());
    }

    #[test]
    fn test_localised_names_override() {
        let table_file = write_temp(TABLE);
        let names_file = write_temp(r#"{"16": "ポッポ", "250": "ホウオウ"}"#);
        let table = SpeciesTable::load(table_file.path(), Some(names_file.path())).unwrap();

        assert_eq!(table.resolve(SpeciesId(16)).unwrap().name, "ポッポ");
        assert_eq!(table.resolve(SpeciesId(1)).unwrap().name, "Bulbasaur");
        assert!(table.resolve(SpeciesId(250)).is_none());
    }

    #[test]
    fn test_invalid_name_key() {
        let table_file = write_temp(TABLE);
        let names_file = write_temp(r#"{"pidgey": "ポッポ"}"#);
        let err = SpeciesTable::load(table_file.path(), Some(names_file.path())).unwrap_err();
        assert!(matches!(err, SpeciesTableError::InvalidNameKey(ref k) if k == "pidgey"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let table_file = write_temp(
            r#"[{"id": 1, "name": "A", "img": "a"}, {"id": 1, "name": "B", "img": "b"}]"#,
        );
        let err = SpeciesTable::load(table_file.path(), None).unwrap_err();
        assert!(matches!(err, SpeciesTableError::DuplicateId(SpeciesId(1))));
    }

    #[test]
    fn test_missing_file() {
        let err = SpeciesTable::load(Path::new("/nonexistent/species.json"), None).unwrap_err();
        assert!(matches!(err, SpeciesTableError::Read { .. }));
    }
}
