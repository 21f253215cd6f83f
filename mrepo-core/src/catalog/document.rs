//! Catalog document parsing (`json/modules.json`)
//!
//! A repository publishes one document listing every module it offers,
//! each with its current version and a download reference.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Path of the catalog document relative to a repository url
pub const MODULES_JSON: &str = "json/modules.json";

/// A repository catalog document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    /// Repository display name
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub metadata: Option<CatalogMetadata>,

    /// Module offers, in document order
    #[serde(default)]
    pub modules: Vec<OnlineModule>,
}

/// Document-level metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    #[serde(default)]
    pub version: i64,

    /// Generation time in seconds since the Unix epoch
    #[serde(default)]
    pub timestamp: f64,
}

/// One module offer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineModule {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub version_code: i64,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub description: String,

    /// Download reference for the package
    #[serde(default)]
    pub zip_url: String,

    #[serde(default)]
    pub changelog: Option<String>,
}

impl CatalogDocument {
    /// Parse a raw document
    ///
    /// Offers without an id are dropped. When an id appears more than once,
    /// the offer with the highest `versionCode` wins and keeps the position
    /// of the first occurrence.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut document: CatalogDocument = serde_json::from_str(content)?;
        document.normalize();
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn normalize(&mut self) {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut kept: Vec<OnlineModule> = Vec::with_capacity(self.modules.len());

        for module in self.modules.drain(..) {
            if module.id.trim().is_empty() {
                tracing::debug!("Dropping catalog offer without id: {:?}", module.name);
                continue;
            }

            match positions.get(&module.id) {
                Some(&pos) => {
                    if module.version_code > kept[pos].version_code {
                        kept[pos] = module;
                    }
                }
                None => {
                    positions.insert(module.id.clone(), kept.len());
                    kept.push(module);
                }
            }
        }

        self.modules = kept;
    }

    /// Number of offered modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn get(&self, id: &str) -> Option<&OnlineModule> {
        self.modules.iter().find(|m| m.id == id)
    }
}

impl OnlineModule {
    /// Truncate description to first line
    pub fn short_description(&self) -> &str {
        self.description
            .lines()
            .next()
            .unwrap_or(&self.description)
            .trim()
    }

    /// Case-insensitive match against id, name and description
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.id.to_lowercase().contains(&query)
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}
