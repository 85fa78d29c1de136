//! The only sanctioned way to mutate the registry.

use {
    chrono::Utc,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    lock::LockManager,
    store::RegistryStore,
    types::Registry,
    validate::validate_registry,
};

/// Result of a committed transaction: the registry as written plus
/// whatever the transform returned.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub registry: Registry,
    pub output: T,
}

/// Serializes registry mutations through the lock.
#[derive(Debug, Clone)]
pub struct Updater {
    store: RegistryStore,
    lock: LockManager,
}

impl Updater {
    pub fn new(store: RegistryStore, lock: LockManager) -> Self {
        Self { store, lock }
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn lock(&self) -> &LockManager {
        &self.lock
    }

    /// Lock, load, transform, validate, stamp, save, unlock.
    ///
    /// `transform` gets a freshly loaded copy. If it fails, or the result
    /// does not validate, nothing is written. The lock is released on every
    /// path out of this function.
    pub fn update<T, F>(&self, transform: F) -> Result<Committed<T>>
    where
        F: FnOnce(&mut Registry) -> Result<T>,
    {
        self.update_then(transform, |_, _| {})
    }

    /// [`Updater::update`], running `after_commit` once the write has
    /// landed but before the lock is released.
    ///
    /// Side effects that must track the committed document (the active
    /// alias) go here so concurrent writers apply them in commit order.
    pub fn update_then<T, F, A>(&self, transform: F, after_commit: A) -> Result<Committed<T>>
    where
        F: FnOnce(&mut Registry) -> Result<T>,
        A: FnOnce(&Registry, &T),
    {
        let guard = self.lock.acquire()?;

        let mut registry = self.store.load()?;
        let previous_stamp = registry.updated_at;

        let output = transform(&mut registry)?;
        validate_registry(&registry).map_err(Error::Validation)?;

        registry.updated_at = Utc::now().max(previous_stamp);
        self.store.save(&registry)?;
        after_commit(&registry, &output);

        if let Err(e) = guard.release() {
            // Already committed; the next acquirer reclaims it once stale.
            warn!(error = %e, "registry committed but lock release failed");
        }
        debug!(updated_at = %registry.updated_at, "registry transaction committed");
        Ok(Committed { registry, output })
    }

    /// Write an empty registry under the lock unless one already exists.
    ///
    /// Returns `true` when a new document was created.
    pub fn create_if_missing(&self) -> Result<bool> {
        let guard = self.lock.acquire()?;
        if self.store.exists() {
            return Ok(false);
        }
        self.store.save(&Registry::new(Utc::now()))?;
        guard.release()?;
        Ok(true)
    }
}
