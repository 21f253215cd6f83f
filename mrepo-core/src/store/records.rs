//! Persisted record types

use serde::{Deserialize, Serialize};

use crate::catalog::{FetchedCatalog, OnlineModule};
use crate::error::StoreError;
use crate::module::Module;

/// A module known to exist on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalModuleRecord {
    #[serde(flatten)]
    pub module: Module,

    /// Set when a newer remote version was observed. Never touched by
    /// install detection.
    #[serde(default)]
    pub updatable_tag: bool,
}

impl LocalModuleRecord {
    pub fn id(&self) -> &str {
        &self.module.id
    }
}

/// A configured remote repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoEntity {
    /// Unique key
    pub url: String,

    /// Display name, taken from the catalog document when it has one
    #[serde(default)]
    pub name: String,

    /// Disabled repositories are skipped by sync and catalog aggregation
    #[serde(default = "default_enable")]
    pub enable: bool,

    /// Last successfully fetched raw catalog document
    #[serde(default)]
    pub modules_json: Option<String>,

    /// When the cached document was fetched (RFC 3339)
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_enable() -> bool {
    true
}

impl RepoEntity {
    /// Create an enabled repository with no cached catalog
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(StoreError::Invalid(format!(
                "Repository URL must start with http:// or https://: {url}"
            )));
        }

        Ok(Self {
            url: url.to_string(),
            name: url.to_string(),
            enable: true,
            modules_json: None,
            updated_at: None,
        })
    }

    /// Copy of this repository carrying a freshly fetched catalog
    pub fn with_catalog(&self, catalog: &FetchedCatalog) -> Self {
        let mut repo = self.clone();
        if let Some(name) = catalog.document.name.as_ref().filter(|n| !n.is_empty()) {
            repo.name = name.clone();
        }
        repo.modules_json = Some(catalog.raw.clone());
        repo.updated_at = Some(chrono::Utc::now().to_rfc3339());
        repo
    }
}

/// "Module X is offered by repository Y at version Z"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineModuleRecord {
    pub repo_url: String,

    #[serde(flatten)]
    pub module: OnlineModule,
}

impl OnlineModuleRecord {
    pub fn id(&self) -> &str {
        &self.module.id
    }
}
