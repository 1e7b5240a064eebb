//! JSON document store for the patient collection.
//!
//! The whole collection is read and written as one unit. Nothing is cached
//! between calls: every `load` re-reads the backing document.

mod ids;

pub use ids::*;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::models::{PatientId, PatientRecord};

/// Patients keyed by ID, iterated in ascending ID order.
pub type Collection = BTreeMap<PatientId, PatientRecord>;

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("data file {} is corrupted: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode collection for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to {action} for {}: {source}", path.display())]
    Write {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle on a single backing document.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a store for the document at `path`. The file need not exist.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full collection. A missing document is an empty collection.
    pub fn load(&self) -> StoreResult<Collection> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no backing document, starting empty");
                return Ok(Collection::new());
            }
            Err(source) => {
                return Err(StoreError::Unreadable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let collection: Collection =
            serde_json::from_slice(&data).map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), count = collection.len(), "loaded collection");
        Ok(collection)
    }

    /// Replace the backing document with `collection`.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the target, so readers see either the old or the new document.
    pub fn save(&self, collection: &Collection) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(collection).map_err(|source| StoreError::Encode {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| self.write_error("create temporary file", e))?;
        tmp.write_all(&bytes)
            .map_err(|e| self.write_error("write temporary file", e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| self.write_error("sync temporary file", e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error("replace document", e.error))?;

        debug!(path = %self.path.display(), count = collection.len(), "saved collection");
        Ok(())
    }

    fn write_error(&self, action: &'static str, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            action,
            source,
        }
    }
}
