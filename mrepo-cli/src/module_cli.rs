//! Module commands: sync, local, refresh, updates, online

use anyhow::Result;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use mrepo_core::store::{LocalModuleRecord, OnlineModuleRecord};
use mrepo_core::sync::SyncEngine;

const DESCRIPTION_WIDTH: usize = 50;

/// Table row for installed modules
#[derive(Tabled)]
struct LocalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Code")]
    version_code: i64,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Update")]
    update: &'static str,
}

impl From<&LocalModuleRecord> for LocalRow {
    fn from(record: &LocalModuleRecord) -> Self {
        Self {
            id: record.module.id.clone(),
            name: record.module.name.clone(),
            version: record.module.version.clone(),
            version_code: record.module.version_code,
            status: record.module.status.as_str(),
            update: if record.updatable_tag { "yes" } else { "" },
        }
    }
}

/// Table row for online offers
#[derive(Tabled)]
struct OnlineRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Code")]
    version_code: i64,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&OnlineModuleRecord> for OnlineRow {
    fn from(record: &OnlineModuleRecord) -> Self {
        Self {
            id: record.module.id.clone(),
            version: record.module.version.clone(),
            version_code: record.module.version_code,
            author: record.module.author.clone(),
            description: truncate(record.module.short_description(), DESCRIPTION_WIDTH),
        }
    }
}

/// Table row for available updates
#[derive(Tabled)]
struct UpdateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Repository")]
    repo_url: String,
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn render<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

pub async fn execute_sync(engine: &SyncEngine, include_disabled: bool) -> Result<()> {
    let report = engine.sync_all(include_disabled).await;

    match &report.reconcile {
        Ok(reconcile) => println!(
            "Installed modules: {} present, {} removed",
            reconcile.upserted,
            reconcile.removed.len()
        ),
        Err(e) => println!("Installed modules: not reconciled ({e})"),
    }

    match &report.repos {
        Ok(outcomes) => {
            for outcome in outcomes {
                match &outcome.result {
                    Ok(count) => println!("  ✓ {} ({} modules)", outcome.url, count),
                    Err(e) => println!("  ✗ {} ({e})", outcome.url),
                }
            }
        }
        Err(e) => println!("Repositories: not fetched ({e})"),
    }

    match &report.updates {
        Ok(updates) => println!("Updates available: {}", updates.len()),
        Err(e) => println!("Updates: not computed ({e})"),
    }

    if !report.is_complete() {
        anyhow::bail!("Sync finished with errors");
    }
    Ok(())
}

pub fn execute_local(engine: &SyncEngine, json_output: bool) -> Result<()> {
    let records = engine.store().local_all()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No installed modules recorded. Run `mrepo sync` first.");
        return Ok(());
    }

    let rows: Vec<LocalRow> = records.iter().map(LocalRow::from).collect();
    println!("{}", render(&rows));
    Ok(())
}

pub async fn execute_refresh(engine: &SyncEngine, id: &str) -> Result<()> {
    let report = engine.reconcile_one(id).await?;
    engine.refresh_updatable_tags()?;

    if report.upserted > 0 {
        println!("Refreshed '{id}'");
    } else if !report.removed.is_empty() {
        println!("'{id}' is no longer installed; record removed");
    } else {
        println!("'{id}' is not installed");
    }
    Ok(())
}

pub fn execute_updates(engine: &SyncEngine, json_output: bool) -> Result<()> {
    let updates = engine.updates()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&updates)?);
        return Ok(());
    }

    if updates.is_empty() {
        println!("All installed modules are up to date.");
        return Ok(());
    }

    let rows: Vec<UpdateRow> = updates
        .iter()
        .map(|update| UpdateRow {
            id: update.id.clone(),
            installed: format!("{} ({})", update.local_version, update.local_version_code),
            available: format!("{} ({})", update.online_version, update.online_version_code),
            repo_url: update.repo_url.clone(),
        })
        .collect();
    println!("{}", render(&rows));
    Ok(())
}

pub fn execute_online(engine: &SyncEngine, query: Option<&str>, json_output: bool) -> Result<()> {
    let mut offers = engine.online_catalog()?;
    if let Some(query) = query {
        offers.retain(|record| record.module.matches(query));
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&offers)?);
        return Ok(());
    }

    if offers.is_empty() {
        println!("No modules found.");
        return Ok(());
    }

    println!("Found {} module(s):\n", offers.len());
    let rows: Vec<OnlineRow> = offers.iter().map(OnlineRow::from).collect();
    println!("{}", render(&rows));
    Ok(())
}
