//! Document-number → storage-path index.
//!
//! A YAML list of `{id, file}` entries kept next to the output files. The
//! ingestion driver updates it after every successful write; the remote
//! lookup resolves references through the published copy of the same file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

pub const INDEX_FILE: &str = "index.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub file: String,
}

#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Load the index from `path`; a missing file is an empty index.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let entries = serde_yaml::from_str(&content).map_err(|e| StoreError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self { entries })
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let content = serde_yaml::to_string(&self.entries)
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        fs::write(path, content).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse an index fetched from the published data repository.
    pub fn from_yaml(content: &str) -> Result<Self, StoreError> {
        let entries =
            serde_yaml::from_str(content).map_err(|e| StoreError::Encode(e.to_string()))?;
        Ok(Self { entries })
    }

    pub fn add_or_update(&mut self, id: &str, file: &str) {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.file = file.to_string(),
            None => self.entries.push(IndexEntry {
                id: id.to_string(),
                file: file.to_string(),
            }),
        }
    }

    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    /// Resolve a reference to an entry: exact id match or prefix match,
    /// lowest-sorting id wins when several qualify.
    pub fn find(&self, reference: &str) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.id == reference || entry.id.starts_with(reference))
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    pub fn entries(&self) -> &[IndexEntry] {
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

    #[test]
    fn add_or_update_replaces_in_place() {
        let mut index = Index::default();
        index.add_or_update("TS 00.00:REL-99/1.0.0", "TS_00.00_REL-99_1.0.0.yaml");
        index.add_or_update("TS 00.00:REL-99/1.0.0", "TS_00.00_REL-99_1.0.0.xml");
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries()[0].file, "TS_00.00_REL-99_1.0.0.xml");
    }

    #[test]
    fn find_prefers_lowest_sorting_id() {
        let mut index = Index::default();
        index.add_or_update("TS 24.228:REL-5/5.6.0", "b.yaml");
        index.add_or_update("TS 24.228:REL-5/5.5.0", "a.yaml");
        index.add_or_update("TS 24.229:REL-5/5.5.0", "c.yaml");

        let entry = index.find("TS 24.228").unwrap();
        assert_eq!(entry.file, "a.yaml");
        assert!(index.find("TS 99.99").is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);

        let mut index = Index::default();
        index.add_or_update("TS 00.00:REL-99/1.0.0", "TS_00.00_REL-99_1.0.0.yaml");
        index.add_or_update("TR 21.900:REL-99/3.0.0", "TR_21.900_REL-99_3.0.0.yaml");
        index.save(&path).unwrap();

        let loaded = Index::load(&path).unwrap();
        assert_eq!(loaded.entries(), index.entries());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = Index::load(&dir.path().join(INDEX_FILE)).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn remove_all_empties_the_index() {
        let mut index = Index::default();
        index.add_or_update("a", "a.yaml");
        index.remove_all();
        assert!(index.is_empty());
    }
}
