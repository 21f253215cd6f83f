//! File-backed store
//!
//! All tables live in one JSON document. Each mutating call rewrites the
//! document through a temporary file in the same directory followed by a
//! rename, so readers never observe a half-written file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::tables::Tables;
use crate::error::StoreError;

/// Record store persisted to a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = Self::load(&path)?;

        tracing::debug!(
            "Opened record store {} ({} local, {} repos)",
            path.display(),
            tables.local.len(),
            tables.repos.len()
        );

        Ok(Self {
            path,
            tables: Mutex::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Tables, StoreError> {
        if !path.exists() {
            return Ok(Tables::new());
        }

        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(tables).map_err(StoreError::Serialize)?;
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(write_err)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        temp.write_all(&content).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;

        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&tables))
    }

    /// Apply `f` to a copy, commit it to disk, then publish it in memory.
    /// A failed commit leaves both the file and the in-memory view untouched.
    fn write(&self, f: impl FnOnce(&mut Tables)) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = tables.clone();
        f(&mut next);

        if next == *tables {
            return Ok(());
        }

        self.save(&next)?;
        *tables = next;
        Ok(())
    }
}

impl_record_store!(FileStore);
