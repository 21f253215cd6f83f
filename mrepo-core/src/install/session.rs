//! Install sessions: resolve a reference into a validated package path

use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::{ContentReference, InstallTrigger};
use crate::error::{InstallError, ResolveError};
use crate::module::Module;
use crate::registry::ModuleRegistry;

/// Fixed name of the materialized copy inside the session directory
pub const MATERIALIZED_FILE: &str = "tmp.zip";

const SESSION_DIR_PREFIX: &str = "mrepo-install-";

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPackage {
    /// Validated package file
    pub path: PathBuf,

    /// `true` when `path` is the original location, `false` for a copy in
    /// the session's temporary directory
    pub is_real: bool,

    /// Metadata the registry read from the package
    pub module: Module,
}

/// One install attempt
///
/// Owns a private temporary directory that is removed when the session is
/// dropped, whichever way the attempt ended. Only one resolution should be
/// in flight per session since the materialized copy has a fixed name.
pub struct InstallSession {
    registry: Arc<dyn ModuleRegistry>,
    tmp: TempDir,
}

impl InstallSession {
    /// Create a session whose temporary directory lives under `tmp_parent`
    pub fn new(registry: Arc<dyn ModuleRegistry>, tmp_parent: &Path) -> Result<Self, ResolveError> {
        let storage_err = |source: io::Error| ResolveError::TempStorage {
            path: tmp_parent.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(tmp_parent).map_err(storage_err)?;
        let tmp = tempfile::Builder::new()
            .prefix(SESSION_DIR_PREFIX)
            .tempdir_in(tmp_parent)
            .map_err(storage_err)?;

        tracing::debug!("Install session directory: {}", tmp.path().display());
        Ok(Self { registry, tmp })
    }

    pub fn tmp_dir(&self) -> &Path {
        self.tmp.path()
    }

    /// Where a non-addressable reference gets copied to
    pub fn materialized_path(&self) -> PathBuf {
        self.tmp.path().join(MATERIALIZED_FILE)
    }

    /// Turn `reference` into a validated package path
    ///
    /// The original location is used when it resolves and the registry
    /// recognizes it. Otherwise the reference is copied in full into the
    /// session directory and the copy is validated instead.
    pub async fn resolve(
        &self,
        reference: Arc<dyn ContentReference>,
    ) -> Result<ResolvedPackage, ResolveError> {
        match self.resolve_direct(reference.as_ref()).await {
            Ok(package) => {
                tracing::info!("Resolved {} in place: {}", reference.uri(), package.path.display());
                return Ok(package);
            }
            Err(e) => tracing::debug!("{}, materializing a copy", e),
        }

        let uri = reference.uri().to_string();
        let path = self.materialize(reference).await?;

        match self.registry.module_metadata(&path).await {
            Some(module) => {
                tracing::info!("Resolved {} via copy: {}", uri, path.display());
                Ok(ResolvedPackage {
                    path,
                    is_real: false,
                    module,
                })
            }
            None => {
                tracing::warn!("Not a recognizable module package: {}", uri);
                Err(ResolveError::NotAPackage { uri })
            }
        }
    }

    /// Resolve, then hand the package to `trigger`
    ///
    /// A resolution failure never reaches the trigger.
    pub async fn run(
        &self,
        reference: Arc<dyn ContentReference>,
        trigger: &dyn InstallTrigger,
    ) -> Result<ResolvedPackage, InstallError> {
        let package = self.resolve(reference).await?;

        tracing::debug!("Handing {} to {} trigger", package.module.id, trigger.name());
        trigger.install(&package).await?;

        Ok(package)
    }

    async fn resolve_direct(
        &self,
        reference: &dyn ContentReference,
    ) -> Result<ResolvedPackage, ResolveError> {
        let unresolvable = || ResolveError::ReferenceUnresolvable {
            uri: reference.uri().to_string(),
        };

        let path = reference.resolve_path().ok_or_else(unresolvable)?;
        let module = self
            .registry
            .module_metadata(&path)
            .await
            .ok_or_else(unresolvable)?;

        Ok(ResolvedPackage {
            path,
            is_real: true,
            module,
        })
    }

    async fn materialize(&self, reference: Arc<dyn ContentReference>) -> Result<PathBuf, ResolveError> {
        let target = self.materialized_path();
        let uri = reference.uri().to_string();
        let task_target = target.clone();

        tokio::task::spawn_blocking(move || copy_reference(reference.as_ref(), &task_target))
            .await
            .map_err(|e| ResolveError::CopyFailed {
                uri,
                path: target.clone(),
                source: io::Error::other(e),
            })??;

        Ok(target)
    }
}

/// Copy the whole reference into `target`, replacing what was there
fn copy_reference(reference: &dyn ContentReference, target: &Path) -> Result<u64, ResolveError> {
    let mut reader = reference
        .open()
        .map_err(|source| ResolveError::StreamOpenFailed {
            uri: reference.uri().to_string(),
            source,
        })?;

    let copy_err = |source: io::Error| ResolveError::CopyFailed {
        uri: reference.uri().to_string(),
        path: target.to_path_buf(),
        source,
    };

    let result = File::create(target).and_then(|mut file| {
        let bytes = io::copy(&mut reader, &mut file)?;
        file.sync_all()?;
        Ok(bytes)
    });

    match result {
        Ok(bytes) => {
            tracing::debug!("Copied {} bytes to {}", bytes, target.display());
            Ok(bytes)
        }
        Err(source) => {
            // never leave a partial copy behind for a later validation
            let _ = std::fs::remove_file(target);
            Err(copy_err(source))
        }
    }
}
