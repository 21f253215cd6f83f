//! Module description (`module.prop`)
//!
//! A module is identified by its `id`. Two modules with the same id but a
//! different `version_code` are revisions of the same logical package.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Name of the property file every module carries
pub const MODULE_PROP: &str = "module.prop";

/// Host-side lifecycle status, mirrored from marker files in the module directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleStatus {
    #[default]
    Enabled,
    /// `disable` marker present
    Disabled,
    /// `remove` marker present, removal pending on next boot
    Removing,
    /// `update` marker present, new revision pending on next boot
    Updating,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Enabled => "enabled",
            ModuleStatus::Disabled => "disabled",
            ModuleStatus::Removing => "removing",
            ModuleStatus::Updating => "updating",
        }
    }
}

/// Installation and update flags of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleState {
    pub is_installed: bool,
    #[serde(default)]
    pub has_update: bool,
}

/// A package description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
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
    #[serde(default)]
    pub status: ModuleStatus,
    #[serde(default)]
    pub state: ModuleState,
}

impl Module {
    /// Create a bare module with the given identity and revision
    pub fn new(id: impl Into<String>, version: impl Into<String>, version_code: i64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: version.into(),
            version_code,
            author: String::new(),
            description: String::new(),
            status: ModuleStatus::default(),
            state: ModuleState::default(),
        }
    }

    /// Parse the contents of a `module.prop` file
    ///
    /// `id` is mandatory. A missing `versionCode` is treated as 0, a
    /// malformed one is an error. Unknown keys are ignored.
    pub fn from_prop(content: &str) -> Result<Self, RegistryError> {
        let mut id = None;
        let mut module = Module::new("", "", 0);
        let mut name = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "id" => id = Some(value.to_string()),
                "name" => name = Some(value.to_string()),
                "version" => module.version = value.to_string(),
                "versionCode" => {
                    module.version_code = value.parse().map_err(|_| {
                        RegistryError::InvalidProp(format!("versionCode '{value}' is not an integer"))
                    })?;
                }
                "author" => module.author = value.to_string(),
                "description" => module.description = value.to_string(),
                _ => {}
            }
        }

        let id = id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RegistryError::InvalidProp("missing 'id'".to_string()))?;

        module.name = name.unwrap_or_else(|| id.clone());
        module.id = id;
        Ok(module)
    }

    /// Mark this module as present on the host
    pub fn installed(mut self) -> Self {
        self.state.is_installed = true;
        self
    }

    pub fn with_status(mut self, status: ModuleStatus) -> Self {
        self.status = status;
        self
    }
}
