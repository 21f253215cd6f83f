//! Install command

use anyhow::{Context, Result};
use std::io::Read;
use std::sync::Arc;

use mrepo_core::config::MrepoConfig;
use mrepo_core::install::{CommandTrigger, ContentReference, InstallSession, UriReference};
use mrepo_core::sync::SyncEngine;

const STDIN_URI: &str = "stdin://";

/// Reference for the command line argument; `-` reads the package from stdin
fn reference_for(uri: &str) -> Arc<dyn ContentReference> {
    if uri == "-" {
        let stdin = UriReference::parse(STDIN_URI)
            .with_opener(|| Ok(Box::new(std::io::stdin()) as Box<dyn Read + Send>));
        Arc::new(stdin)
    } else {
        Arc::new(UriReference::parse(uri))
    }
}

pub async fn execute_install(
    config: &MrepoConfig,
    engine: &SyncEngine,
    uri: &str,
    dry_run: bool,
) -> Result<()> {
    let session = InstallSession::new(engine.registry().clone(), &config.tmp_dir)?;
    let reference = reference_for(uri);

    if dry_run {
        let package = session
            .resolve(reference)
            .await
            .with_context(|| format!("Cannot install {uri}"))?;
        println!("{}", serde_json::to_string_pretty(&package)?);
        return Ok(());
    }

    let trigger = CommandTrigger::new(&config.install_command)?;
    let package = session
        .run(reference, &trigger)
        .await
        .with_context(|| format!("Cannot install {uri}"))?;

    println!(
        "Installed {} {} ({})",
        package.module.id, package.module.version, package.module.version_code
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdin_marker_is_not_a_path() {
        let reference = reference_for("-");
        assert_eq!(reference.uri(), STDIN_URI);
        assert!(reference.resolve_path().is_none());
    }

    #[test]
    fn test_plain_reference_keeps_uri() {
        let reference = reference_for("file:///sdcard/Download/demo.zip");
        assert_eq!(reference.uri(), "file:///sdcard/Download/demo.zip");
    }
}
