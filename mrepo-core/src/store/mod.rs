//! Local Record Store
//!
//! The persisted mapping the UI observes. It has no logic of its own beyond
//! CRUD by key over three tables:
//!
//! ```text
//! local      id          -> Module            (installed modules)
//! updatable  id          -> bool              (update tag, kept apart so it
//!                                              survives upserts and can be
//!                                              cleared independently)
//! repos      url         -> RepoEntity
//! online     (url, id)   -> OnlineModule
//! ```
//!
//! Every call is its own commit. Nothing here spans calls.

use crate::catalog::OnlineModule;
use crate::error::StoreError;
use crate::module::Module;

/// CRUD contract of the Local Record Store
pub trait RecordStore: Send + Sync {
    /// Insert new or overwrite existing modules, keyed by id. Update tags
    /// are left as they are.
    fn upsert_local(&self, modules: &[Module]) -> Result<(), StoreError>;

    fn local_all(&self) -> Result<Vec<LocalModuleRecord>, StoreError>;

    fn local_by_id(&self, id: &str) -> Result<Option<LocalModuleRecord>, StoreError>;

    fn delete_local(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Set or clear the update tag of each `(id, tag)` pair
    fn set_updatable_tags(&self, tags: &[(String, bool)]) -> Result<(), StoreError>;

    fn clear_updatable_tags(&self, ids: &[String]) -> Result<(), StoreError>;

    fn upsert_repo(&self, repo: &RepoEntity) -> Result<(), StoreError>;

    fn repo_all(&self) -> Result<Vec<RepoEntity>, StoreError>;

    fn repo_by_url(&self, url: &str) -> Result<Option<RepoEntity>, StoreError>;

    /// Remove a repository together with its online records
    fn delete_repo(&self, url: &str) -> Result<(), StoreError>;

    fn insert_online(&self, repo_url: &str, modules: &[OnlineModule]) -> Result<(), StoreError>;

    fn delete_online_by_url(&self, repo_url: &str) -> Result<(), StoreError>;

    fn online_all(&self) -> Result<Vec<OnlineModuleRecord>, StoreError>;
}

/// Implement [`RecordStore`] for an adapter exposing inherent
/// `read(|&Tables| ..)` and `write(|&mut Tables| ..)` methods.
///
/// Adapters only decide where the tables live and how a write is committed;
/// the record semantics all live in `Tables`. Declared ahead of the adapter
/// modules so they see it in textual scope.
macro_rules! impl_record_store {
    ($store:ty) => {
        impl $crate::store::RecordStore for $store {
            fn upsert_local(
                &self,
                modules: &[$crate::module::Module],
            ) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.upsert_local(modules))
            }

            fn local_all(
                &self,
            ) -> Result<Vec<$crate::store::LocalModuleRecord>, $crate::error::StoreError> {
                self.read(|tables| tables.local_all())
            }

            fn local_by_id(
                &self,
                id: &str,
            ) -> Result<Option<$crate::store::LocalModuleRecord>, $crate::error::StoreError> {
                self.read(|tables| tables.local_by_id(id))
            }

            fn delete_local(&self, ids: &[String]) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.delete_local(ids))
            }

            fn set_updatable_tags(
                &self,
                tags: &[(String, bool)],
            ) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.set_updatable_tags(tags))
            }

            fn clear_updatable_tags(&self, ids: &[String]) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.clear_updatable_tags(ids))
            }

            fn upsert_repo(
                &self,
                repo: &$crate::store::RepoEntity,
            ) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.upsert_repo(repo))
            }

            fn repo_all(&self) -> Result<Vec<$crate::store::RepoEntity>, $crate::error::StoreError> {
                self.read(|tables| tables.repo_all())
            }

            fn repo_by_url(
                &self,
                url: &str,
            ) -> Result<Option<$crate::store::RepoEntity>, $crate::error::StoreError> {
                self.read(|tables| tables.repo_by_url(url))
            }

            fn delete_repo(&self, url: &str) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.delete_repo(url))
            }

            fn insert_online(
                &self,
                repo_url: &str,
                modules: &[$crate::catalog::OnlineModule],
            ) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.insert_online(repo_url, modules))
            }

            fn delete_online_by_url(&self, repo_url: &str) -> Result<(), $crate::error::StoreError> {
                self.write(|tables| tables.delete_online_by_url(repo_url))
            }

            fn online_all(
                &self,
            ) -> Result<Vec<$crate::store::OnlineModuleRecord>, $crate::error::StoreError> {
                self.read(|tables| tables.online_all())
            }
        }
    };
}

mod file;
mod memory;
mod records;
mod tables;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use records::{LocalModuleRecord, OnlineModuleRecord, RepoEntity};

