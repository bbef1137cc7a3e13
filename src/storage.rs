use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::types::Document;

const DATA_DIR: &str = ".rabbit-ideas-mcp";
const DATA_FILE: &str = "rabbit-ideas-storage.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage document {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The JSON file holding every idea and the cached repository status.
///
/// The store keeps no copy of the document in memory; every operation goes
/// through [`DocumentStore::load`] and [`DocumentStore::save`]. There is no
/// locking, so two processes (or two concurrent calls) that update the file
/// at the same time race and the last writer wins.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    storage_path: PathBuf,
}

impl DocumentStore {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    /// `~/.rabbit-ideas-mcp/rabbit-ideas-storage.json`, or the working
    /// directory when no home directory is known.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(DATA_DIR))
            .unwrap_or_else(|| PathBuf::from(DATA_DIR))
            .join(DATA_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Creates the document with the empty initial shape if it does not exist.
    /// Returns `true` when a new file was written. An existing file is never
    /// touched, even if it is corrupt.
    pub fn ensure_exists(&self) -> Result<bool, StorageError> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.storage_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let content = serde_json::to_string_pretty(&Document::default())?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        tracing::info!(path = %self.storage_path.display(), "created idea storage");
        Ok(true)
    }

    /// Reads the document, surfacing missing files and parse failures.
    pub fn try_load(&self) -> Result<Document, StorageError> {
        let contents = fs::read_to_string(&self.storage_path)?;
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.storage_path.clone(),
            source,
        })
    }

    /// Reads the document, falling back to the empty initial shape when the
    /// file is missing or unreadable.
    pub fn load(&self) -> Document {
        match self.try_load() {
            Ok(doc) => doc,
            Err(StorageError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Document::default(),
            Err(e) => {
                tracing::warn!(error = %e, "idea storage unreadable, starting from an empty document");
                Document::default()
            }
        }
    }

    /// Replaces the file with `doc`, written to a temporary file in the same
    /// directory and renamed into place so readers never see a partial write.
    pub fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let dir = match self.parent_dir() {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let content = serde_json::to_string_pretty(doc)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.storage_path).map_err(|e| e.error)?;
        tracing::debug!(
            path = %self.storage_path.display(),
            ideas = doc.suggested_ideas.len(),
            "saved idea storage"
        );
        Ok(())
    }

    /// Load, apply `mutate`, and save only when `mutate` succeeds.
    pub fn update<T, E>(&self, mutate: impl FnOnce(&mut Document) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let mut doc = self.load();
        let out = mutate(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.storage_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}
