//! MRepo Catalog - remote repository documents and update detection
//!
//! # Overview
//!
//! Each configured repository publishes a catalog document listing the
//! modules it offers. The sync engine mirrors every enabled repository's
//! document into the record store; this module owns the document format,
//! the transport that fetches it, and the read-side comparison of installed
//! modules against the mirrored offers.
//!
//! ```text
//! Repository (static site)
//!     │
//!     └── json/modules.json   ← CatalogDocument
//!            │
//!            ▼  CatalogTransport
//!     SyncEngine::fetch_repo
//!            │
//!            ▼
//!     RecordStore (repos + online tables)
//!            │
//!            ▼  updates::find_updates
//!     ModuleUpdate list / updatable tags
//! ```

mod document;
mod transport;
pub mod updates;

pub use document::{CatalogDocument, CatalogMetadata, OnlineModule, MODULES_JSON};
pub use transport::{catalog_url, CatalogTransport, FetchedCatalog, HttpTransport};
pub use updates::{find_updates, latest_offers, ModuleUpdate};
