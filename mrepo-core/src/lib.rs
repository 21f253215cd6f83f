//! MRepo core library
//!
//! Keeps a local record store of installed and remotely offered modules in
//! step with the host's module registry and a set of catalog repositories,
//! and turns untrusted content references into validated packages for
//! installation.

pub mod catalog;
pub mod config;
pub mod error;
pub mod install;
pub mod module;
pub mod registry;
pub mod store;
pub mod sync;
