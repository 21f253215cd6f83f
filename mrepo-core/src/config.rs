//! MRepo configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. An explicit path (`mrepo --config <path>`)
//! 2. `<config dir>/config.yaml`, e.g. `~/.config/mrepo/config.yaml`
//! 3. Built-in defaults
//!
//! Every field is optional:
//!
//! ```yaml
//! modules_dir: /data/adb/modules
//! store_path: /home/me/.local/share/mrepo/records.json
//! tmp_dir: /tmp
//! install_command: [magisk, --install-module]
//! http:
//!   timeout_seconds: 30
//!   user_agent: mrepo/0.1.0
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default host module directory
pub const DEFAULT_MODULES_DIR: &str = "/data/adb/modules";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Record store file name inside the data directory
pub const STORE_FILE: &str = "records.json";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrepoConfig {
    /// Directory the filesystem registry scans for installed modules
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,

    /// Record store file
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Parent of per-session private temporary directories
    #[serde(default = "std::env::temp_dir")]
    pub tmp_dir: PathBuf,

    /// Command prefix the install trigger runs; the package path is appended
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,

    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (clamped to a minimum of 5)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MODULES_DIR)
}

fn default_store_path() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| std::env::temp_dir().join("mrepo"))
        .join(STORE_FILE)
}

fn default_install_command() -> Vec<String> {
    vec!["magisk".to_string(), "--install-module".to_string()]
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("mrepo/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for MrepoConfig {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            store_path: default_store_path(),
            tmp_dir: std::env::temp_dir(),
            install_command: default_install_command(),
            http: HttpConfig::default(),
        }
    }
}

impl MrepoConfig {
    /// Load from an explicit path, or from the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => match config_dir() {
                Some(dir) => Self::load_from_path(&dir.join(CONFIG_FILE)),
                None => {
                    tracing::debug!("No config directory available, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load from a specific path; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Self = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.install_command.is_empty() {
            anyhow::bail!("install_command must name at least a program");
        }
        Ok(())
    }
}

/// Per-user configuration directory
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "sanmer", "mrepo")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .or_else(|| dirs::config_dir().map(|d| d.join("mrepo")))
}

/// Per-user data directory (record store)
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "sanmer", "mrepo")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .or_else(|| dirs::data_dir().map(|d| d.join("mrepo")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MrepoConfig::default();
        assert_eq!(config.modules_dir, PathBuf::from(DEFAULT_MODULES_DIR));
        assert_eq!(config.install_command, vec!["magisk", "--install-module"]);
        assert_eq!(config.http.timeout_seconds, 30);
        assert!(config.http.user_agent.starts_with("mrepo/"));
        assert!(config.store_path.ends_with(STORE_FILE));
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = MrepoConfig::load_from_path(&temp_dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, MrepoConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "modules_dir: /tmp/modules\nhttp:\n  timeout_seconds: 10\n",
        )
        .unwrap();

        let config = MrepoConfig::load(Some(&path)).unwrap();
        assert_eq!(config.modules_dir, PathBuf::from("/tmp/modules"));
        assert_eq!(config.http.timeout_seconds, 10);
        assert!(config.http.user_agent.starts_with("mrepo/"));
        assert_eq!(config.install_command, vec!["magisk", "--install-module"]);
    }

    #[test]
    fn test_empty_install_command_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "install_command: []\n").unwrap();

        let err = MrepoConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("install_command"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let config = MrepoConfig {
            modules_dir: PathBuf::from("/srv/modules"),
            install_command: vec!["ksud".to_string(), "module".to_string(), "install".to_string()],
            ..MrepoConfig::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = MrepoConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
