//! In-process store, used by tests and ephemeral sessions

use std::sync::RwLock;

use super::tables::Tables;
use crate::error::StoreError;

/// Record store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&tables))
    }

    fn write(&self, f: impl FnOnce(&mut Tables)) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        f(&mut tables);
        Ok(())
    }
}

impl_record_store!(MemoryStore);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use crate::store::{RecordStore, RepoEntity};

    #[test]
    fn test_local_crud() {
        let store = MemoryStore::new();
        store
            .upsert_local(&[Module::new("a", "1", 1), Module::new("b", "1", 1)])
            .unwrap();
        assert_eq!(store.local_all().unwrap().len(), 2);

        store.delete_local(&["a".to_string()]).unwrap();
        let ids: Vec<_> = store
            .local_all()
            .unwrap()
            .into_iter()
            .map(|r| r.module.id)
            .collect();
        assert_eq!(ids, vec!["b"]);
        assert!(store.local_by_id("a").unwrap().is_none());
    }

    #[test]
    fn test_repo_upsert_replaces() {
        let store = MemoryStore::new();
        let mut repo = RepoEntity::new("https://example.invalid/").unwrap();
        store.upsert_repo(&repo).unwrap();

        repo.enable = false;
        store.upsert_repo(&repo).unwrap();

        let repos = store.repo_all().unwrap();
        assert_eq!(repos.len(), 1);
        assert!(!repos[0].enable);
    }
}
