//! Repository commands

use anyhow::Result;
use clap::Subcommand;
use tabled::{settings::Style, Table, Tabled};

use mrepo_core::store::RepoEntity;
use mrepo_core::sync::SyncEngine;

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Add a repository
    Add {
        /// Repository URL (must serve json/modules.json)
        url: String,
    },

    /// List configured repositories
    List,

    /// Remove a repository and its mirrored catalog
    Remove { url: String },

    /// Enable a repository
    Enable { url: String },

    /// Disable a repository; its offers stop counting for updates
    Disable { url: String },

    /// Fetch one repository, or every enabled repository
    Fetch {
        url: Option<String>,

        /// Also fetch disabled repositories
        #[clap(long)]
        include_disabled: bool,
    },
}

#[derive(Tabled)]
struct RepoRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

impl From<&RepoEntity> for RepoRow {
    fn from(repo: &RepoEntity) -> Self {
        Self {
            name: repo.name.clone(),
            url: repo.url.clone(),
            enabled: if repo.enable { "yes" } else { "no" },
            updated_at: repo.updated_at.clone().unwrap_or_else(|| "never".to_string()),
        }
    }
}

impl RepoCommand {
    pub async fn execute(self, engine: &SyncEngine) -> Result<()> {
        match self {
            RepoCommand::Add { url } => {
                let repo = engine.add_repo(&url)?;
                println!("Added repository {}", repo.url);
            }
            RepoCommand::List => {
                let repos = engine.store().repo_all()?;
                if repos.is_empty() {
                    println!("No repositories configured.");
                    return Ok(());
                }
                let rows: Vec<RepoRow> = repos.iter().map(RepoRow::from).collect();
                println!("{}", Table::new(&rows).with(Style::rounded()));
            }
            RepoCommand::Remove { url } => {
                let repo = engine.remove_repo(&url)?;
                println!("Removed repository {}", repo.url);
            }
            RepoCommand::Enable { url } => {
                let repo = engine.set_repo_enabled(&url, true)?;
                println!("Enabled repository {}", repo.url);
            }
            RepoCommand::Disable { url } => {
                let repo = engine.set_repo_enabled(&url, false)?;
                println!("Disabled repository {}", repo.url);
            }
            RepoCommand::Fetch {
                url: Some(url),
                include_disabled: _,
            } => {
                let repo = engine.repo(&url)?;
                let count = engine.fetch_repo(&repo).await?;
                engine.refresh_updatable_tags()?;
                println!("Fetched {count} modules from {}", repo.url);
            }
            RepoCommand::Fetch {
                url: None,
                include_disabled,
            } => {
                let outcomes = engine.fetch_all_repos(include_disabled).await?;
                engine.refresh_updatable_tags()?;

                let mut failed = 0;
                for outcome in &outcomes {
                    match &outcome.result {
                        Ok(count) => println!("  ✓ {} ({count} modules)", outcome.url),
                        Err(e) => {
                            failed += 1;
                            println!("  ✗ {} ({e})", outcome.url);
                        }
                    }
                }

                if failed > 0 {
                    anyhow::bail!("{failed} of {} repositories failed to fetch", outcomes.len());
                }
            }
        }

        Ok(())
    }
}
