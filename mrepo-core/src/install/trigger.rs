//! Install triggers consume a resolved package

use async_trait::async_trait;

use super::ResolvedPackage;
use crate::error::TriggerError;

/// The boundary past which a validated package is actually installed
#[async_trait]
pub trait InstallTrigger: Send + Sync {
    async fn install(&self, package: &ResolvedPackage) -> Result<(), TriggerError>;

    /// Trigger identifier for logging/debugging
    fn name(&self) -> &'static str;
}

/// Runs an external install command with the package path appended
#[derive(Debug, Clone)]
pub struct CommandTrigger {
    program: String,
    args: Vec<String>,
}

impl CommandTrigger {
    /// `command` is the program followed by its leading arguments
    pub fn new(command: &[String]) -> Result<Self, TriggerError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| TriggerError::Other("install command is empty".to_string()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl InstallTrigger for CommandTrigger {
    async fn install(&self, package: &ResolvedPackage) -> Result<(), TriggerError> {
        tracing::info!(
            "Installing {} ({}) with {}",
            package.module.id,
            package.path.display(),
            self.program
        );

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&package.path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TriggerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!("Install command failed: {} - stderr: {}", self.program, stderr);
            return Err(TriggerError::ExitStatus {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::debug!(
            "Install command completed: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
