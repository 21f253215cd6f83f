//! Filesystem-backed registry
//!
//! Reads the host module directory directly. Each subdirectory holding a
//! valid `module.prop` is an installed module; marker files next to it
//! carry the host-side status.
//!
//! ```text
//! /data/adb/modules/
//! ├── zygisk_lsposed/
//! │   ├── module.prop
//! │   └── disable        # optional markers: disable, remove, update
//! └── shamiko/
//!     └── module.prop
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{read_package_metadata, ModuleRegistry};
use crate::error::RegistryError;
use crate::module::{Module, ModuleStatus, MODULE_PROP};

pub struct FsModuleRegistry {
    modules_dir: PathBuf,
}

impl FsModuleRegistry {
    pub fn new(modules_dir: impl Into<PathBuf>) -> Self {
        Self {
            modules_dir: modules_dir.into(),
        }
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    fn scan(modules_dir: &Path) -> Result<Vec<Module>, RegistryError> {
        if !modules_dir.is_dir() {
            return Err(RegistryError::Unavailable(format!(
                "module directory {} does not exist",
                modules_dir.display()
            )));
        }

        let read_err = |source: std::io::Error| RegistryError::Io {
            path: modules_dir.to_path_buf(),
            source,
        };

        let mut modules = Vec::new();
        for entry in std::fs::read_dir(modules_dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            match Self::read_module_dir(&path) {
                Ok(module) => modules.push(module),
                Err(e) => tracing::warn!("Skipping module directory {}: {}", path.display(), e),
            }
        }

        modules.sort_by(|a, b| a.id.cmp(&b.id));
        modules.dedup_by(|a, b| a.id == b.id);
        Ok(modules)
    }

    fn read_module_dir(dir: &Path) -> Result<Module, RegistryError> {
        let prop_path = dir.join(MODULE_PROP);
        let content = std::fs::read_to_string(&prop_path).map_err(|source| RegistryError::Io {
            path: prop_path.clone(),
            source,
        })?;

        let module = Module::from_prop(&content)?
            .installed()
            .with_status(status_from_markers(dir));
        Ok(module)
    }

    /// Identity is the `id` in `module.prop`, not the directory name.
    ///
    /// The directory named after `id` is tried first; a module living under
    /// another directory name is found by a full scan.
    fn find_by_id(modules_dir: &Path, id: &str) -> Result<Option<Module>, RegistryError> {
        let plain_name = id != "." && id != ".." && !id.contains(['/', '\\']);
        let dir = modules_dir.join(id);

        if plain_name && dir.join(MODULE_PROP).is_file() {
            match Self::read_module_dir(&dir) {
                Ok(module) if module.id == id => return Ok(Some(module)),
                Ok(module) => tracing::debug!(
                    "Directory {} holds module {}, scanning for {}",
                    dir.display(),
                    module.id,
                    id
                ),
                Err(e) => tracing::warn!("Skipping module directory {}: {}", dir.display(), e),
            }
        }

        Ok(Self::scan(modules_dir)?.into_iter().find(|m| m.id == id))
    }
}

/// `remove` wins over `disable`, which wins over `update`
fn status_from_markers(dir: &Path) -> ModuleStatus {
    if dir.join("remove").exists() {
        ModuleStatus::Removing
    } else if dir.join("disable").exists() {
        ModuleStatus::Disabled
    } else if dir.join("update").exists() {
        ModuleStatus::Updating
    } else {
        ModuleStatus::Enabled
    }
}

#[async_trait]
impl ModuleRegistry for FsModuleRegistry {
    async fn list_installed_modules(&self) -> Result<Vec<Module>, RegistryError> {
        let modules_dir = self.modules_dir.clone();
        tokio::task::spawn_blocking(move || Self::scan(&modules_dir))
            .await
            .map_err(|e| RegistryError::Unavailable(format!("scan task failed: {e}")))?
    }

    async fn module_metadata(&self, path: &Path) -> Option<Module> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_package_metadata(&path))
            .await
            .ok()
            .flatten()
    }

    async fn installed_module_by_id(&self, id: &str) -> Result<Option<Module>, RegistryError> {
        if id.is_empty() {
            return Ok(None);
        }

        let modules_dir = self.modules_dir.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || Self::find_by_id(&modules_dir, &id))
            .await
            .map_err(|e| RegistryError::Unavailable(format!("read task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
