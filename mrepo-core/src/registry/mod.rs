//! Module registry - the host's view of installed modules
//!
//! The registry is privileged and external. The engine only needs to ask it
//! which modules are installed and whether a file is a recognizable package;
//! how a module actually gets applied to the host is not its concern here.

mod fs;
mod package;

pub use fs::FsModuleRegistry;
pub use package::read_package_metadata;

use async_trait::async_trait;
use std::path::Path;

use crate::error::RegistryError;
use crate::module::Module;

/// Trait for module registries
#[async_trait]
pub trait ModuleRegistry: Send + Sync {
    /// Every module currently installed on the host, unique by id
    async fn list_installed_modules(&self) -> Result<Vec<Module>, RegistryError>;

    /// Read package metadata from the file at `path`
    ///
    /// `None` means the file is not a recognizable package.
    async fn module_metadata(&self, path: &Path) -> Option<Module>;

    /// A single installed module
    async fn installed_module_by_id(&self, id: &str) -> Result<Option<Module>, RegistryError>;

    /// Registry identifier for logging/debugging
    fn name(&self) -> &'static str;
}
