//! Error types for the MRepo core
//!
//! Resolution failures are fatal for the install attempt that produced them.
//! Sync failures are captured per call and never leave the engine in a
//! state other than "whatever store writes already completed".

use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a content reference into a validated package path
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Direct path resolution failed. Not fatal: triggers materialization.
    #[error("Content reference is not directly addressable: {uri}")]
    ReferenceUnresolvable { uri: String },

    /// The original reference could not be opened for reading
    #[error("Failed to open content reference {uri}")]
    StreamOpenFailed {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while copying the reference into temporary storage
    #[error("Failed to copy {uri} to {path}")]
    CopyFailed {
        uri: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither the original nor the materialized copy is a recognizable package
    #[error("Not a recognizable module package: {uri}")]
    NotAPackage { uri: String },

    /// The private temporary directory could not be prepared
    #[error("Failed to prepare temporary storage at {path}")]
    TempStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Whether this failure must terminate the install flow
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ResolveError::ReferenceUnresolvable { .. })
    }
}

/// Failures of the install trigger that consumes a resolved package
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Failed to run install command '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Install command '{program}' failed ({status}): {stderr}")]
    ExitStatus {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Failures of the resolve-then-install pipeline
#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Local Record Store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read record store {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write record store {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record store {path} is corrupted or has an invalid format")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize record store")]
    Serialize(#[source] serde_json::Error),

    #[error("Record store lock poisoned")]
    Poisoned,

    #[error("{0}")]
    Invalid(String),
}

/// Remote catalog transport failures
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch catalog from {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch catalog: HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read catalog response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse catalog document from {url}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Module registry failures
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Module registry unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid module.prop: {0}")]
    InvalidProp(String),
}

/// Failures captured by the sync engine
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Unknown repository: {0}")]
    UnknownRepo(String),
}
