//! Sync engine - reconciles the record store with the host and the repositories
//!
//! Two independent write paths:
//!
//! - [`SyncEngine::reconcile_installed`] mirrors the registry's installed set
//!   into the local table and drops records of uninstalled modules.
//! - [`SyncEngine::fetch_repo`] replaces one repository's partition of the
//!   online table with its freshly fetched catalog.
//!
//! Neither path is transactional. Every store call commits on its own, so a
//! failure part way leaves the earlier writes in effect; the next pass
//! converges. Update tags are a read-side product of both tables and are
//! recomputed only by [`SyncEngine::refresh_updatable_tags`]. Callers of
//! either write path must follow it with a refresh before reading tags;
//! [`SyncEngine::sync_all`] does so.
//!
//! `fetch_repo` must not run concurrently with itself for the same url:
//! its delete-then-insert is not atomic. Different urls never interfere.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::catalog::{find_updates, latest_offers, CatalogTransport, ModuleUpdate};
use crate::error::SyncError;
use crate::registry::ModuleRegistry;
use crate::store::{OnlineModuleRecord, RecordStore, RepoEntity};

/// Outcome of an installed-set reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Modules written to the local table
    pub upserted: usize,
    /// Ids whose local records were dropped
    pub removed: Vec<String>,
}

/// Outcome of one repository fetch inside a bulk fetch
#[derive(Debug)]
pub struct RepoFetchOutcome {
    pub url: String,
    /// Number of offers mirrored on success
    pub result: Result<usize, SyncError>,
}

impl RepoFetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of a full sync pass
#[derive(Debug)]
pub struct SyncReport {
    pub reconcile: Result<ReconcileReport, SyncError>,
    pub repos: Result<Vec<RepoFetchOutcome>, SyncError>,
    pub updates: Result<Vec<ModuleUpdate>, SyncError>,
}

impl SyncReport {
    /// Whether every step, including every repository, succeeded
    pub fn is_complete(&self) -> bool {
        self.reconcile.is_ok()
            && self.updates.is_ok()
            && self
                .repos
                .as_ref()
                .map(|outcomes| outcomes.iter().all(RepoFetchOutcome::is_ok))
                .unwrap_or(false)
    }
}

pub struct SyncEngine {
    registry: Arc<dyn ModuleRegistry>,
    transport: Arc<dyn CatalogTransport>,
    store: Arc<dyn RecordStore>,
}

impl SyncEngine {
    pub fn new(
        registry: Arc<dyn ModuleRegistry>,
        transport: Arc<dyn CatalogTransport>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            registry,
            transport,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<dyn ModuleRegistry> {
        &self.registry
    }

    /// A configured repository by url
    pub fn repo(&self, url: &str) -> Result<RepoEntity, SyncError> {
        let url = url.trim();
        self.store
            .repo_by_url(url)?
            .ok_or_else(|| SyncError::UnknownRepo(url.to_string()))
    }

    /// Register a repository; an already configured url is returned as is
    pub fn add_repo(&self, url: &str) -> Result<RepoEntity, SyncError> {
        let repo = RepoEntity::new(url)?;
        if let Some(existing) = self.store.repo_by_url(&repo.url)? {
            debug!("Repository {} already configured", existing.url);
            return Ok(existing);
        }

        self.store.upsert_repo(&repo)?;
        info!("Added repository {}", repo.url);
        Ok(repo)
    }

    /// Enable or disable a repository, then recompute update tags
    pub fn set_repo_enabled(&self, url: &str, enable: bool) -> Result<RepoEntity, SyncError> {
        let mut repo = self.repo(url)?;
        if repo.enable != enable {
            repo.enable = enable;
            self.store.upsert_repo(&repo)?;
            info!(
                "Repository {} {}",
                repo.url,
                if enable { "enabled" } else { "disabled" }
            );
            self.refresh_updatable_tags()?;
        }
        Ok(repo)
    }

    /// Remove a repository and its online records, then recompute update tags
    pub fn remove_repo(&self, url: &str) -> Result<RepoEntity, SyncError> {
        let repo = self.repo(url)?;
        self.store.delete_repo(&repo.url)?;
        info!("Removed repository {}", repo.url);
        self.refresh_updatable_tags()?;
        Ok(repo)
    }

    /// Mirror the registry's installed set into the local table
    ///
    /// Upserts every reported module, then drops local records whose id the
    /// registry no longer reports, clearing their update tags first.
    /// Failures are returned, never panicked; completed writes stay.
    ///
    /// Tags of surviving records are not recomputed: an upgrade on the host
    /// keeps a stale tag until [`Self::refresh_updatable_tags`] runs.
    pub async fn reconcile_installed(&self) -> Result<ReconcileReport, SyncError> {
        let result = self.try_reconcile_installed().await;
        if let Err(e) = &result {
            error!("reconcile_installed via {}: {}", self.registry.name(), e);
        }
        result
    }

    async fn try_reconcile_installed(&self) -> Result<ReconcileReport, SyncError> {
        let modules: Vec<_> = self
            .registry
            .list_installed_modules()
            .await?
            .into_iter()
            .map(|mut module| {
                module.state.is_installed = true;
                module
            })
            .collect();

        self.store.upsert_local(&modules)?;

        let installed: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();
        let removed: Vec<String> = self
            .store
            .local_all()?
            .into_iter()
            .filter(|record| !installed.contains(record.id()))
            .map(|record| record.module.id)
            .collect();

        if !removed.is_empty() {
            self.store.clear_updatable_tags(&removed)?;
            self.store.delete_local(&removed)?;
        }

        info!(
            "Reconciled installed modules: {} present, {} removed",
            modules.len(),
            removed.len()
        );

        Ok(ReconcileReport {
            upserted: modules.len(),
            removed,
        })
    }

    /// Refresh a single module's local record
    ///
    /// Present on the host: upserted. Absent: tag cleared and record dropped.
    pub async fn reconcile_one(&self, id: &str) -> Result<ReconcileReport, SyncError> {
        let result = self.try_reconcile_one(id).await;
        if let Err(e) = &result {
            error!("reconcile_one: {}: {}", id, e);
        }
        result
    }

    async fn try_reconcile_one(&self, id: &str) -> Result<ReconcileReport, SyncError> {
        match self.registry.installed_module_by_id(id).await? {
            Some(mut module) => {
                module.state.is_installed = true;
                self.store.upsert_local(&[module])?;
                debug!("Refreshed local record for {}", id);
                Ok(ReconcileReport {
                    upserted: 1,
                    removed: Vec::new(),
                })
            }
            None => {
                let ids = [id.to_string()];
                let existed = self.store.local_by_id(id)?.is_some();
                self.store.clear_updatable_tags(&ids)?;
                self.store.delete_local(&ids)?;
                debug!("Module {} is not installed; local record dropped", id);
                Ok(ReconcileReport {
                    upserted: 0,
                    removed: if existed { ids.to_vec() } else { Vec::new() },
                })
            }
        }
    }

    /// Fetch one repository and replace its mirrored catalog
    ///
    /// On failure the cached document and the repository's online records
    /// are left exactly as they were. Does not touch update tags; run
    /// [`Self::refresh_updatable_tags`] afterwards.
    pub async fn fetch_repo(&self, repo: &RepoEntity) -> Result<usize, SyncError> {
        let result = self.try_fetch_repo(repo).await;
        if let Err(e) = &result {
            error!("fetch_repo: {}: {}", repo.url, e);
        }
        result
    }

    async fn try_fetch_repo(&self, repo: &RepoEntity) -> Result<usize, SyncError> {
        let catalog = self.transport.fetch_catalog(&repo.url).await?;

        self.store.upsert_repo(&repo.with_catalog(&catalog))?;
        self.store.delete_online_by_url(&repo.url)?;
        self.store
            .insert_online(&repo.url, &catalog.document.modules)?;

        let count = catalog.document.module_count();
        info!("Fetched {} modules from {}", count, repo.url);
        Ok(count)
    }

    /// Fetch every enabled repository (or every repository) concurrently
    ///
    /// One repository failing never affects the others; each outcome is
    /// reported separately. Only failing to list repositories fails the call.
    pub async fn fetch_all_repos(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<RepoFetchOutcome>, SyncError> {
        let repos: Vec<RepoEntity> = self
            .store
            .repo_all()?
            .into_iter()
            .filter(|repo| include_disabled || repo.enable)
            .collect();

        if repos.is_empty() {
            debug!("No repositories to fetch");
        }

        let outcomes = join_all(repos.iter().map(|repo| async move {
            RepoFetchOutcome {
                url: repo.url.clone(),
                result: self.fetch_repo(repo).await,
            }
        }))
        .await;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            warn!("{} of {} repositories failed to fetch", failed, outcomes.len());
        }

        Ok(outcomes)
    }

    /// Online records of enabled repositories only
    pub fn enabled_online(&self) -> Result<Vec<OnlineModuleRecord>, SyncError> {
        let enabled: HashSet<String> = self
            .store
            .repo_all()?
            .into_iter()
            .filter(|repo| repo.enable)
            .map(|repo| repo.url)
            .collect();

        Ok(self
            .store
            .online_all()?
            .into_iter()
            .filter(|record| enabled.contains(&record.repo_url))
            .collect())
    }

    /// Latest offer per module id across enabled repositories, sorted by id
    pub fn online_catalog(&self) -> Result<Vec<OnlineModuleRecord>, SyncError> {
        let online = self.enabled_online()?;
        let mut latest: Vec<OnlineModuleRecord> =
            latest_offers(&online).into_values().cloned().collect();
        latest.sort_by(|a, b| a.module.id.cmp(&b.module.id));
        Ok(latest)
    }

    /// Compare local records against enabled repositories without writing
    pub fn updates(&self) -> Result<Vec<ModuleUpdate>, SyncError> {
        let local = self.store.local_all()?;
        let online = self.enabled_online()?;
        Ok(find_updates(&local, &online))
    }

    /// Recompute and persist every local record's update tag
    pub fn refresh_updatable_tags(&self) -> Result<Vec<ModuleUpdate>, SyncError> {
        let local = self.store.local_all()?;
        let online = self.enabled_online()?;
        let updates = find_updates(&local, &online);

        let newer: HashSet<&str> = updates.iter().map(|u| u.id.as_str()).collect();
        let tags: Vec<(String, bool)> = local
            .iter()
            .map(|record| (record.module.id.clone(), newer.contains(record.id())))
            .collect();
        self.store.set_updatable_tags(&tags)?;

        debug!("{} of {} local modules have updates", updates.len(), local.len());
        Ok(updates)
    }

    /// Reconcile, fetch, then recompute update tags
    ///
    /// Each step runs even if an earlier one failed, so a dead registry does
    /// not stop catalogs from refreshing and vice versa.
    pub async fn sync_all(&self, include_disabled: bool) -> SyncReport {
        let (reconcile, repos) = tokio::join!(
            self.reconcile_installed(),
            self.fetch_all_repos(include_disabled)
        );
        let updates = self.refresh_updatable_tags();

        SyncReport {
            reconcile,
            repos,
            updates,
        }
    }
}
