//! Project registry and context-switching engine.
//!
//! The registry is a single JSON document naming every known project and
//! the one that is currently active. Every mutation runs as a transaction:
//! take the advisory lock, load, apply an in-memory transform, validate,
//! write via temp file + rename, release. Switching also repoints the
//! `active` alias symlink once the registry write has committed.

pub mod atomic;
pub mod cache;
pub mod detect;
pub mod engine;
pub mod error;
pub mod filter;
pub mod frequent;
pub mod lock;
pub mod quick_access;
pub mod service;
pub mod store;
pub mod symlink;
pub mod tx;
pub mod types;
pub mod validate;

pub use {
    detect::NameMatch,
    engine::{Deactivation, RegistryEngine, Switch},
    error::{Error, ErrorKind, Result},
    filter::{ListFilter, ListSort},
    lock::{LockGuard, LockManager, LockPolicy},
    service::{FileProjectRegistry, ProjectRegistry},
    store::RegistryStore,
    symlink::{SymlinkFix, SymlinkManager, SymlinkReport, SymlinkState},
    tx::{Committed, Updater},
    types::{CacheStatus, MAX_FREQUENT_PATHS, ProjectMetadata, Registry, SCHEMA_VERSION},
    validate::{Violation, Violations},
};
