//! Test helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use mrepo_core::catalog::{CatalogTransport, FetchedCatalog};
use mrepo_core::error::TransportError;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Mutex, Once};
use zip::write::SimpleFileOptions;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn module_prop(id: &str, version_code: i64) -> String {
    format!(
        "id={id}\nname={id} module\nversion=v{version_code}\nversionCode={version_code}\nauthor=tester\ndescription=Test module {id}\n"
    )
}

/// Package bytes: a zip archive with `<id>/module.prop`
pub fn package_bytes(id: &str, version_code: i64) -> Vec<u8> {
    let prop = module_prop(id, version_code);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    writer
        .start_file(format!("{id}/module.prop"), SimpleFileOptions::default())
        .unwrap();
    writer.write_all(prop.as_bytes()).unwrap();
    writer
        .start_file(format!("{id}/customize.sh"), SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"#!/system/bin/sh\n").unwrap();

    writer.finish().unwrap().into_inner()
}

pub fn write_package(path: &Path, id: &str, version_code: i64) {
    fs::write(path, package_bytes(id, version_code)).unwrap();
}

/// Lay out an installed module the way the host does
pub fn install_module_dir(modules_dir: &Path, id: &str, version_code: i64) {
    let dir = modules_dir.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("module.prop"), module_prop(id, version_code)).unwrap();
}

/// Serves canned catalog documents; unknown urls answer 404
#[derive(Default)]
pub struct StaticTransport {
    documents: Mutex<HashMap<String, String>>,
}

impl StaticTransport {
    pub fn serve(&self, url: &str, offers: &[(&str, i64)]) {
        let modules: Vec<_> = offers
            .iter()
            .map(|(id, code)| {
                serde_json::json!({
                    "id": id,
                    "name": id,
                    "version": format!("v{code}"),
                    "versionCode": code,
                    "author": "upstream",
                    "description": format!("{id} from {url}"),
                    "zipUrl": format!("{url}files/{id}-{code}.zip"),
                })
            })
            .collect();
        let document = serde_json::json!({
            "name": format!("Repo at {url}"),
            "metadata": { "version": 1, "timestamp": 1_700_000_000.0 },
            "modules": modules,
        });

        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), document.to_string());
    }

    pub fn take_down(&self, url: &str) {
        self.documents.lock().unwrap().remove(url);
    }
}

#[async_trait]
impl CatalogTransport for StaticTransport {
    async fn fetch_catalog(&self, repo_url: &str) -> Result<FetchedCatalog, TransportError> {
        let raw = self.documents.lock().unwrap().get(repo_url).cloned();
        match raw {
            Some(raw) => FetchedCatalog::parse(repo_url, raw),
            None => Err(TransportError::Status {
                url: repo_url.to_string(),
                status: 404,
            }),
        }
    }
}
