//! MRepo - module catalog manager
//!
//! Mirrors the host's installed modules and a set of catalog repositories
//! into a local record store, reports available updates and installs
//! packages from arbitrary references.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use mrepo_core::catalog::HttpTransport;
use mrepo_core::config::MrepoConfig;
use mrepo_core::registry::FsModuleRegistry;
use mrepo_core::store::FileStore;
use mrepo_core::sync::SyncEngine;

mod install_cli;
mod module_cli;
mod repo_cli;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "mrepo",
    about = "Keep installed modules in step with their repositories",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Configuration file (defaults to <config dir>/mrepo/config.yaml)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Set log level
    #[clap(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON lines
    #[clap(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile installed modules, fetch repositories and refresh update marks
    Sync {
        /// Also fetch disabled repositories
        #[clap(long)]
        include_disabled: bool,
    },

    /// List installed modules
    Local {
        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Re-read a single installed module from the host
    Refresh {
        /// Module id
        id: String,
    },

    /// List installed modules with a newer online version
    Updates {
        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Browse modules offered by enabled repositories
    Online {
        /// Search query (matches id, name, description)
        query: Option<String>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Manage catalog repositories
    Repo {
        #[clap(subcommand)]
        command: repo_cli::RepoCommand,
    },

    /// Resolve a package reference and install it
    Install {
        /// Path, file:// URI, or "-" to read the package from stdin
        uri: String,

        /// Stop after resolution and print the result
        #[clap(long)]
        dry_run: bool,
    },
}

/// Initialize tracing with CLI flags
///
/// `RUST_LOG` takes precedence over `--log-level` when set.
fn initialize_tracing(log_level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    // logs go to stderr, stdout is reserved for command output
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Wire the sync engine from configuration
fn build_engine(config: &MrepoConfig) -> Result<SyncEngine> {
    let registry = Arc::new(FsModuleRegistry::new(&config.modules_dir));
    let transport = Arc::new(HttpTransport::new(&config.http)?);
    let store = Arc::new(
        FileStore::open(&config.store_path)
            .with_context(|| format!("Failed to open record store {}", config.store_path.display()))?,
    );

    tracing::debug!(
        "Using modules dir {} and store {}",
        config.modules_dir.display(),
        config.store_path.display()
    );
    Ok(SyncEngine::new(registry, transport, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.log_level, cli.log_json);

    let config = MrepoConfig::load(cli.config.as_deref())?;
    let engine = build_engine(&config)?;

    match cli.command {
        Command::Sync { include_disabled } => {
            module_cli::execute_sync(&engine, include_disabled).await
        }
        Command::Local { json } => module_cli::execute_local(&engine, json),
        Command::Refresh { id } => module_cli::execute_refresh(&engine, &id).await,
        Command::Updates { json } => module_cli::execute_updates(&engine, json),
        Command::Online { query, json } => {
            module_cli::execute_online(&engine, query.as_deref(), json)
        }
        Command::Repo { command } => command.execute(&engine).await,
        Command::Install { uri, dry_run } => {
            install_cli::execute_install(&config, &engine, &uri, dry_run).await
        }
    }
}
