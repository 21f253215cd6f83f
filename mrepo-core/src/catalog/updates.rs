//! Read-side update detection
//!
//! A local module has an update when some online record with the same id,
//! from any repository, carries a strictly greater `versionCode`. Both
//! inputs are snapshots; results computed against a catalog that is being
//! refreshed are simply recomputed on the next pass.

use serde::Serialize;
use std::collections::HashMap;

use crate::store::{LocalModuleRecord, OnlineModuleRecord};

/// A newer online revision of an installed module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleUpdate {
    pub id: String,
    pub local_version: String,
    pub local_version_code: i64,
    pub online_version: String,
    pub online_version_code: i64,
    /// Repository offering the newest revision
    pub repo_url: String,
}

/// Best offer per module id across all given online records
///
/// Ties on `versionCode` keep the first record seen, so callers control
/// repository precedence through input order.
pub fn latest_offers(online: &[OnlineModuleRecord]) -> HashMap<&str, &OnlineModuleRecord> {
    let mut latest: HashMap<&str, &OnlineModuleRecord> = HashMap::new();
    for record in online {
        latest
            .entry(record.id())
            .and_modify(|best| {
                if record.module.version_code > best.module.version_code {
                    *best = record;
                }
            })
            .or_insert(record);
    }
    latest
}

/// Compare every local record against the best online offer for its id
///
/// Returns one entry per local module that has a strictly newer offer,
/// sorted by id.
pub fn find_updates(
    local: &[LocalModuleRecord],
    online: &[OnlineModuleRecord],
) -> Vec<ModuleUpdate> {
    let latest = latest_offers(online);

    let mut updates: Vec<ModuleUpdate> = local
        .iter()
        .filter_map(|record| {
            let offer = latest.get(record.id())?;
            if offer.module.version_code <= record.module.version_code {
                return None;
            }
            Some(ModuleUpdate {
                id: record.module.id.clone(),
                local_version: record.module.version.clone(),
                local_version_code: record.module.version_code,
                online_version: offer.module.version.clone(),
                online_version_code: offer.module.version_code,
                repo_url: offer.repo_url.clone(),
            })
        })
        .collect();

    updates.sort_by(|a, b| a.id.cmp(&b.id));
    updates
}
