//! On-device stores: a directory of JSON files, and an in-memory map.

#[cfg(test)]
#[path = "local_test.rs"]
mod local_test;

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use super::{LocalStore, StoreError, validate_key};

const ACTIVE_FILE: &str = ".active";

/// `<root>/<collection>/<id>.json`, plus `<root>/<collection>/.active`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Directories are created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf, StoreError> {
        validate_key(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> Result<PathBuf, StoreError> {
        validate_key(id)?;
        Ok(self.collection_dir(collection)?.join(format!("{id}.json")))
    }
}

impl LocalStore for FileStore {
    fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.document_path(collection, id)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(&path, &bytes)?;
        tracing::debug!(collection, id, bytes = bytes.len(), "local write");
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let path = self.document_path(collection, id)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let path = self.document_path(collection, id)?;
        let existed = match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if self.active(collection)?.as_deref() == Some(id) {
            self.set_active(collection, None)?;
        }
        Ok(existed)
    }

    fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.collection_dir(collection)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn set_active(&self, collection: &str, id: Option<&str>) -> Result<(), StoreError> {
        let path = self.collection_dir(collection)?.join(ACTIVE_FILE);
        match id {
            Some(id) => {
                validate_key(id)?;
                write_atomic(&path, id.as_bytes())?;
            }
            None => match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    fn active(&self, collection: &str) -> Result<Option<String>, StoreError> {
        let path = self.collection_dir(collection)?.join(ACTIVE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let id = text.trim();
                Ok(if id.is_empty() { None } else { Some(id.to_owned()) })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write through a sibling temp file so readers never see a partial document.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[derive(Debug, Default)]
struct MemoryInner {
    documents: BTreeMap<(String, String), Value>,
    active: HashMap<String, String>,
}

/// Process-local store for tests and offline tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryStore {
    fn put(&self, collection: &str, id: &str, value: &Value) -> Result<(), StoreError> {
        validate_key(collection)?;
        validate_key(id)?;
        self.lock().documents.insert((collection.to_owned(), id.to_owned()), value.clone());
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().documents.get(&(collection.to_owned(), id.to_owned())).cloned())
    }

    fn remove(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let existed = inner.documents.remove(&(collection.to_owned(), id.to_owned())).is_some();
        if inner.active.get(collection).map(String::as_str) == Some(id) {
            inner.active.remove(collection);
        }
        Ok(existed)
    }

    fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()
            .documents
            .keys()
            .filter(|(c, _)| c == collection)
            .map(|(_, id)| id.clone())
            .collect())
    }

    fn set_active(&self, collection: &str, id: Option<&str>) -> Result<(), StoreError> {
        validate_key(collection)?;
        let mut inner = self.lock();
        match id {
            Some(id) => {
                validate_key(id)?;
                inner.active.insert(collection.to_owned(), id.to_owned());
            }
            None => {
                inner.active.remove(collection);
            }
        }
        Ok(())
    }

    fn active(&self, collection: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().active.get(collection).cloned())
    }
}
