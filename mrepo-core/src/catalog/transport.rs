//! Catalog transport - fetches repository documents
//!
//! The sync engine only sees the [`CatalogTransport`] trait, so tests and
//! alternative transports can stand in for HTTP.

use async_trait::async_trait;
use std::time::Duration;

use super::document::{CatalogDocument, MODULES_JSON};
use crate::config::HttpConfig;
use crate::error::TransportError;

/// A fetched catalog: the raw document as served plus its parsed form
#[derive(Debug, Clone)]
pub struct FetchedCatalog {
    pub raw: String,
    pub document: CatalogDocument,
}

impl FetchedCatalog {
    /// Parse a raw document fetched from `url`
    pub fn parse(url: &str, raw: String) -> Result<Self, TransportError> {
        let document = CatalogDocument::from_json(&raw).map_err(|source| TransportError::Parse {
            url: url.to_string(),
            source,
        })?;
        Ok(Self { raw, document })
    }
}

/// Trait for remote catalog transports
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    /// Fetch and parse the catalog of the repository at `repo_url`
    async fn fetch_catalog(&self, repo_url: &str) -> Result<FetchedCatalog, TransportError>;
}

/// Build the document url for a repository url
///
/// Urls already pointing at a `.json` document are used verbatim.
pub fn catalog_url(repo_url: &str) -> String {
    if repo_url.ends_with(".json") {
        repo_url.to_string()
    } else if repo_url.ends_with('/') {
        format!("{repo_url}{MODULES_JSON}")
    } else {
        format!("{repo_url}/{MODULES_JSON}")
    }
}

/// HTTP transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Minimum request timeout; catalogs can be large
    const MIN_TIMEOUT_SECONDS: u64 = 5;

    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let timeout_seconds = if config.timeout_seconds < Self::MIN_TIMEOUT_SECONDS {
            tracing::warn!(
                "Configured timeout_seconds={} is too low; using minimum of {} seconds",
                config.timeout_seconds,
                Self::MIN_TIMEOUT_SECONDS
            );
            Self::MIN_TIMEOUT_SECONDS
        } else {
            config.timeout_seconds
        };

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn fetch_catalog(&self, repo_url: &str) -> Result<FetchedCatalog, TransportError> {
        let url = catalog_url(repo_url);
        tracing::debug!("Fetching catalog document {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let raw = response.text().await.map_err(|source| TransportError::Body {
            url: url.clone(),
            source,
        })?;

        FetchedCatalog::parse(&url, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_url() {
        assert_eq!(
            catalog_url("https://example.invalid/repo/"),
            "https://example.invalid/repo/json/modules.json"
        );
        assert_eq!(
            catalog_url("https://example.invalid/repo"),
            "https://example.invalid/repo/json/modules.json"
        );
        assert_eq!(
            catalog_url("https://example.invalid/custom.json"),
            "https://example.invalid/custom.json"
        );
    }

    #[test]
    fn test_parse_failure_names_url() {
        let err = FetchedCatalog::parse("https://example.invalid/x.json", "nope".to_string())
            .unwrap_err();
        assert!(err.to_string().contains("https://example.invalid/x.json"));
    }

    #[test]
    fn test_http_transport_builds_with_low_timeout() {
        let config = HttpConfig {
            timeout_seconds: 1,
            ..HttpConfig::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
    }
}
