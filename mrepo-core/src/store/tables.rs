//! In-memory table set shared by all store adapters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{LocalModuleRecord, OnlineModuleRecord, RepoEntity};
use crate::catalog::OnlineModule;
use crate::module::Module;

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tables {
    #[serde(default = "schema_version")]
    pub version: u32,

    #[serde(default)]
    pub local: BTreeMap<String, Module>,

    #[serde(default)]
    pub updatable: BTreeMap<String, bool>,

    #[serde(default)]
    pub repos: BTreeMap<String, RepoEntity>,

    /// repo url -> module id -> offer
    #[serde(default)]
    pub online: BTreeMap<String, BTreeMap<String, OnlineModule>>,
}

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Tables {
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION,
            ..Self::default()
        }
    }

    pub fn upsert_local(&mut self, modules: &[Module]) {
        for module in modules {
            self.local.insert(module.id.clone(), module.clone());
        }
    }

    pub fn local_all(&self) -> Vec<LocalModuleRecord> {
        self.local.values().map(|m| self.local_record(m)).collect()
    }

    pub fn local_by_id(&self, id: &str) -> Option<LocalModuleRecord> {
        self.local.get(id).map(|m| self.local_record(m))
    }

    /// Join a stored module with its tag; `has_update` mirrors the tag
    fn local_record(&self, module: &Module) -> LocalModuleRecord {
        let updatable_tag = self.updatable.get(&module.id).copied().unwrap_or(false);
        let mut module = module.clone();
        module.state.has_update = updatable_tag;

        LocalModuleRecord {
            module,
            updatable_tag,
        }
    }

    pub fn delete_local(&mut self, ids: &[String]) {
        for id in ids {
            self.local.remove(id);
        }
    }

    /// Tags only attach to recorded modules; a tag for an id deleted in the
    /// meantime is discarded.
    pub fn set_updatable_tags(&mut self, tags: &[(String, bool)]) {
        for (id, tag) in tags {
            if *tag && self.local.contains_key(id) {
                self.updatable.insert(id.clone(), true);
            } else {
                self.updatable.remove(id);
            }
        }
    }

    pub fn clear_updatable_tags(&mut self, ids: &[String]) {
        for id in ids {
            self.updatable.remove(id);
        }
    }

    pub fn upsert_repo(&mut self, repo: &RepoEntity) {
        self.repos.insert(repo.url.clone(), repo.clone());
    }

    pub fn repo_all(&self) -> Vec<RepoEntity> {
        self.repos.values().cloned().collect()
    }

    pub fn repo_by_url(&self, url: &str) -> Option<RepoEntity> {
        self.repos.get(url).cloned()
    }

    pub fn delete_repo(&mut self, url: &str) {
        self.repos.remove(url);
        self.online.remove(url);
    }

    pub fn insert_online(&mut self, repo_url: &str, modules: &[OnlineModule]) {
        let partition = self.online.entry(repo_url.to_string()).or_default();
        for module in modules {
            partition.insert(module.id.clone(), module.clone());
        }
    }

    pub fn delete_online_by_url(&mut self, repo_url: &str) {
        self.online.remove(repo_url);
    }

    pub fn online_all(&self) -> Vec<OnlineModuleRecord> {
        self.online
            .iter()
            .flat_map(|(url, partition)| {
                partition.values().map(move |module| OnlineModuleRecord {
                    repo_url: url.clone(),
                    module: module.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(id: &str, version_code: i64) -> OnlineModule {
        OnlineModule {
            id: id.to_string(),
            name: id.to_string(),
            version: format!("v{version_code}"),
            version_code,
            author: String::new(),
            description: String::new(),
            zip_url: format!("https://example.invalid/{id}.zip"),
            changelog: None,
        }
    }

    #[test]
    fn test_upsert_keeps_updatable_tag() {
        let mut tables = Tables::new();
        tables.upsert_local(&[Module::new("a", "1", 1)]);
        tables.set_updatable_tags(&[("a".to_string(), true)]);

        tables.upsert_local(&[Module::new("a", "2", 2)]);

        let record = tables.local_by_id("a").unwrap();
        assert_eq!(record.module.version_code, 2);
        assert!(record.updatable_tag);
        assert!(record.module.state.has_update);
    }

    #[test]
    fn test_cleared_tag_does_not_resurface() {
        let mut tables = Tables::new();
        tables.upsert_local(&[Module::new("a", "1", 1)]);
        tables.set_updatable_tags(&[("a".to_string(), true)]);

        tables.delete_local(&["a".to_string()]);
        tables.clear_updatable_tags(&["a".to_string()]);
        tables.upsert_local(&[Module::new("a", "1", 1)]);

        assert!(!tables.local_by_id("a").unwrap().updatable_tag);
    }

    #[test]
    fn test_tag_for_deleted_module_is_discarded() {
        let mut tables = Tables::new();
        tables.upsert_local(&[Module::new("a", "1", 1)]);
        let tags = vec![("a".to_string(), true)];

        tables.delete_local(&["a".to_string()]);
        tables.clear_updatable_tags(&["a".to_string()]);
        tables.set_updatable_tags(&tags);
        tables.upsert_local(&[Module::new("a", "1", 1)]);

        assert!(!tables.local_by_id("a").unwrap().updatable_tag);
        assert!(tables.updatable.is_empty());
    }

    #[test]
    fn test_online_partitions_by_repo() {
        let mut tables = Tables::new();
        tables.insert_online("https://r1.invalid/", &[offer("x", 1), offer("y", 1)]);
        tables.insert_online("https://r2.invalid/", &[offer("x", 2)]);
        assert_eq!(tables.online_all().len(), 3);

        tables.delete_online_by_url("https://r1.invalid/");
        let remaining = tables.online_all();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].repo_url, "https://r2.invalid/");
    }

    #[test]
    fn test_delete_repo_drops_its_offers() {
        let mut tables = Tables::new();
        let repo = RepoEntity::new("https://r1.invalid/").unwrap();
        tables.upsert_repo(&repo);
        tables.insert_online(&repo.url, &[offer("x", 1)]);

        tables.delete_repo(&repo.url);

        assert!(tables.repo_all().is_empty());
        assert!(tables.online_all().is_empty());
    }
}
