//! Persistence backends for the mock store. The store hands over the whole
//! document on every mutation; a backend never sees partial changes.

use crate::db::Document;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid store document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

pub trait Storage: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet
    fn load(&self) -> Result<Option<Document>, StorageError>;
    fn save(&self, document: &Document) -> Result<(), StorageError>;
}

///Persists the document as one pretty-printed JSON file, rewritten in full on each save
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Option<Document>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let document = serde_json::from_str(&raw)?;
        Ok(Some(document))
    }

    fn save(&self, document: &Document) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryStorage;


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserStats};
    use chrono::Utc;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("db.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn saved_document_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("db.json"));
        let mut document = Document::default();
        document.users.push(User {
            id: "user-1".into(),
            email: "ana@example.com".into(),
            name: "ana".into(),
            avatar: None,
            stats: UserStats::empty(Utc::now()),
        });
        storage.save(&document).unwrap();

        assert_eq!(storage.load().unwrap(), Some(document));
    }

    #[test]
    fn file_has_the_three_collections() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("db.json"));
        storage.save(&Document::default()).unwrap();

        let raw = fs::read_to_string(storage.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "cards": [], "users": [], "batches": [] })
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{ not json").unwrap();
        let storage = JsonFileStorage::new(path);
        assert!(matches!(
            storage.load(),
            Err(StorageError::InvalidDocument(_))
        ));
    }
}
