//! Synchronous entry points for every registry operation.
//!
//! Reads load a snapshot without locking; writes go through
//! [`Updater::update`]. Nothing here caches the registry between calls.

use std::{path::Path, time::Duration};

use {
    chrono::{DateTime, Utc},
    ctxswitch_config::{CtxswitchConfig, Paths},
    tracing::{info, warn},
};

use crate::{
    cache,
    detect::{self, NameMatch},
    error::{Error, Result},
    filter::ListFilter,
    frequent,
    lock::{LockManager, LockPolicy},
    quick_access,
    store::RegistryStore,
    symlink::{SymlinkManager, SymlinkReport},
    tx::Updater,
    types::{ProjectMetadata, Registry},
    validate::{Violations, name_problem},
};

/// Outcome of [`RegistryEngine::set_active`].
#[derive(Debug)]
pub struct Switch {
    pub project: ProjectMetadata,
    pub previous: Option<String>,
    /// The registry switch committed, but the alias could not be updated.
    pub alias_error: Option<Error>,
}

/// Outcome of [`RegistryEngine::clear_active`].
#[derive(Debug)]
pub struct Deactivation {
    pub previous: Option<String>,
    pub alias_error: Option<Error>,
}

/// The registry engine bound to one config root.
#[derive(Debug, Clone)]
pub struct RegistryEngine {
    updater: Updater,
    links: SymlinkManager,
    inactivity: Duration,
}

impl RegistryEngine {
    pub fn new(paths: &Paths, config: &CtxswitchConfig) -> Self {
        let store = RegistryStore::new(paths.registry())
            .validate_on_load(config.registry.validate_on_load);
        let lock = LockManager::new(paths.lock(), LockPolicy::from(&config.lock));
        Self {
            updater: Updater::new(store, lock),
            links: SymlinkManager::new(paths.active_link()),
            inactivity: config.cache.inactivity(),
        }
    }

    /// Engine for the resolved config root and its `ctxswitch.toml`.
    pub fn discover() -> Result<Self> {
        let paths = Paths::discover()?;
        let config = ctxswitch_config::discover_and_load(paths.root());
        Ok(Self::new(&paths, &config))
    }

    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    pub fn links(&self) -> &SymlinkManager {
        &self.links
    }

    /// Create an empty registry if none exists. Returns `true` if created.
    pub fn init(&self) -> Result<bool> {
        let created = self.updater.create_if_missing()?;
        if created {
            info!(path = %self.updater.store().path().display(), "registry initialized");
        }
        Ok(created)
    }

    /// Read-only snapshot. Never write it back; use a mutating operation.
    pub fn load(&self) -> Result<Registry> {
        self.updater.store().load()
    }

    pub fn register(
        &self,
        name: &str,
        path: &Path,
        description: Option<String>,
    ) -> Result<ProjectMetadata> {
        if let Some(reason) = name_problem(name) {
            return Err(Error::Validation(Violations::single("name", reason, name)));
        }
        if !path.is_absolute() {
            return Err(Error::invalid_path(path, "must be absolute"));
        }

        let committed = self.updater.update(|reg| {
            if reg.projects.contains_key(name) {
                return Err(Error::ProjectExists {
                    name: name.to_string(),
                });
            }
            if !path.exists() {
                return Err(Error::invalid_path(path, "does not exist"));
            }
            if !path.is_dir() {
                return Err(Error::invalid_path(path, "is not a directory"));
            }
            let project =
                ProjectMetadata::new(name, path, Utc::now()).with_description(description);
            reg.projects.insert(name.to_string(), project.clone());
            Ok(project)
        })?;

        info!(project = name, path = %path.display(), "project registered");
        Ok(committed.output)
    }

    /// Remove a project. The active project cannot be removed.
    pub fn remove(&self, name: &str) -> Result<ProjectMetadata> {
        let committed = self.updater.update(|reg| {
            if reg.is_active(name) {
                return Err(Error::ActiveProject {
                    name: name.to_string(),
                    reason: "switch to another project or clear the active project first",
                });
            }
            reg.projects
                .remove(name)
                .ok_or_else(|| Error::project_not_found(name))
        })?;
        info!(project = name, "project removed");
        Ok(committed.output)
    }

    pub fn get(&self, name: &str) -> Result<ProjectMetadata> {
        self.load()?.project(name).cloned()
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<ProjectMetadata>> {
        Ok(filter.apply(&self.load()?))
    }

    pub fn get_active(&self) -> Result<Option<ProjectMetadata>> {
        Ok(self.load()?.active().cloned())
    }

    /// Switch the active project, then repoint the alias before the lock
    /// is released.
    ///
    /// An alias failure does not undo the switch; it is returned in
    /// [`Switch::alias_error`] and can be repaired with
    /// [`RegistryEngine::validate_symlink`].
    pub fn set_active(&self, name: &str) -> Result<Switch> {
        let mut alias_error = None;
        let committed = self.updater.update_then(
            |reg| {
                let previous = cache::activate(reg, name, Utc::now())?;
                let project = reg.project(name)?.clone();
                Ok((project, previous))
            },
            |_, (project, _)| {
                if let Err(e) = self.links.repoint(&project.path) {
                    warn!(error = %e, "switch committed but the active alias was not updated");
                    alias_error = Some(e);
                }
            },
        )?;
        let (project, previous) = committed.output;
        info!(project = name, previous = ?previous, "active project switched");

        Ok(Switch {
            project,
            previous,
            alias_error,
        })
    }

    /// Clear the active pointer and remove the alias.
    pub fn clear_active(&self) -> Result<Deactivation> {
        let mut alias_error = None;
        let committed = self.updater.update_then(
            |reg| Ok(cache::deactivate(reg, Utc::now())),
            |_, _| {
                if let Err(e) = self.links.remove() {
                    warn!(error = %e, "active project cleared but the alias was not removed");
                    alias_error = Some(e);
                }
            },
        )?;
        let previous = committed.output;
        info!(previous = ?previous, "active project cleared");

        Ok(Deactivation {
            previous,
            alias_error,
        })
    }

    /// Promote `path` in the project's frequently-used list. Returns the
    /// updated list.
    pub fn record_file_access(&self, name: &str, path: &Path) -> Result<Vec<String>> {
        let committed = self.updater.update(|reg| {
            let project = reg.project_mut(name)?;
            let entry = frequent::normalize(&project.path, path)?;
            frequent::record(&mut project.frequently_used_paths, &entry);
            project.touch(Utc::now());
            Ok(project.frequently_used_paths.clone())
        })?;
        Ok(committed.output)
    }

    pub fn set_quick_access(&self, name: &str, key: &str, value: serde_json::Value) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Validation(Violations::single(
                "key",
                "must not be empty",
                key,
            )));
        }
        self.updater.update(|reg| {
            let project = reg.project_mut(name)?;
            quick_access::set(project, key, value, Utc::now());
            Ok(())
        })?;
        Ok(())
    }

    pub fn get_quick_access(&self, name: &str, key: &str) -> Result<Option<serde_json::Value>> {
        let registry = self.load()?;
        let project = registry.project(name)?;
        Ok(quick_access::get(project, key).cloned())
    }

    /// Returns whether the key existed.
    pub fn delete_quick_access(&self, name: &str, key: &str) -> Result<bool> {
        let committed = self.updater.update(|reg| {
            let project = reg.project_mut(name)?;
            Ok(quick_access::delete(project, key, Utc::now()))
        })?;
        Ok(committed.output)
    }

    pub fn set_description(&self, name: &str, description: Option<String>) -> Result<()> {
        self.updater.update(|reg| {
            let project = reg.project_mut(name)?;
            project.description = description.filter(|d| !d.trim().is_empty());
            project.touch(Utc::now());
            Ok(())
        })?;
        Ok(())
    }

    /// Cool projects idle for longer than the configured inactivity window.
    pub fn sweep(&self) -> Result<Vec<String>> {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let committed = self
            .updater
            .update(|reg| Ok(cache::sweep(reg, now, self.inactivity)))?;
        if !committed.output.is_empty() {
            info!(cooled = ?committed.output, "cache sweep cooled idle projects");
        }
        Ok(committed.output)
    }

    /// Compare the alias with the registry's active project.
    pub fn validate_symlink(&self) -> Result<SymlinkReport> {
        let registry = self.load()?;
        self.links
            .inspect(registry.active().map(|p| p.path.as_path()))
    }

    /// Inspect the alias and apply any available fix under the registry
    /// lock, so a concurrent switch cannot commit between the inspection
    /// and the repair.
    ///
    /// The returned report describes the alias as found; when its `fix` is
    /// present it has already been applied.
    pub fn repair_symlink(&self) -> Result<SymlinkReport> {
        let guard = self.updater.lock().acquire()?;
        let registry = self.load()?;
        let report = self
            .links
            .inspect(registry.active().map(|p| p.path.as_path()))?;
        if let Some(fix) = &report.fix {
            fix.apply()?;
            info!(state = ?report.state, "active alias repaired");
        }
        if let Err(e) = guard.release() {
            warn!(error = %e, "alias repaired but lock release failed");
        }
        Ok(report)
    }

    /// Registered project whose root contains `dir`.
    pub fn detect(&self, dir: &Path) -> Result<Option<ProjectMetadata>> {
        Ok(detect::detect(&self.load()?, dir).cloned())
    }

    /// Names resembling `query`, best first.
    pub fn suggest(&self, query: &str, limit: usize) -> Result<Vec<NameMatch>> {
        Ok(detect::fuzzy_matches(&self.load()?, query, limit))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::CacheStatus,
        std::{fs, path::PathBuf},
    };

    struct Env {
        dir: tempfile::TempDir,
        engine: RegistryEngine,
    }

    impl Env {
        fn project_dir(&self, name: &str) -> PathBuf {
            let p = self.dir.path().join("work").join(name);
            fs::create_dir_all(&p).unwrap();
            p
        }
    }

    fn env() -> Env {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path().join("cfg"));
        let mut config = CtxswitchConfig::default();
        config.lock.timeout_ms = 500;
        let engine = RegistryEngine::new(&paths, &config);
        engine.init().unwrap();
        Env { dir, engine }
    }

    #[test]
    fn register_validates_path() {
        let env = env();
        let err = env
            .engine
            .register("alpha", Path::new("relative/alpha"), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { reason: "must be absolute", .. }));

        let missing = env.dir.path().join("nope");
        let err = env.engine.register("alpha", &missing, None).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { reason: "does not exist", .. }));
        assert!(env.engine.load().unwrap().projects.is_empty());
    }

    #[test]
    fn register_rejects_duplicates_and_bad_names() {
        let env = env();
        let alpha = env.project_dir("alpha");
        let created = env
            .engine
            .register("alpha", &alpha, Some("first".into()))
            .unwrap();
        assert_eq!(created.description.as_deref(), Some("first"));
        assert_eq!(created.cache_status, CacheStatus::Cold);

        let err = env.engine.register("alpha", &alpha, None).unwrap_err();
        assert!(matches!(err, Error::ProjectExists { .. }));

        let err = env.engine.register("bad name", &alpha, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn remove_refuses_active_project() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();
        env.engine.set_active("alpha").unwrap();

        let err = env.engine.remove("alpha").unwrap_err();
        assert!(matches!(err, Error::ActiveProject { .. }));

        env.engine.clear_active().unwrap();
        env.engine.remove("alpha").unwrap();
        assert!(matches!(
            env.engine.get("alpha"),
            Err(Error::ProjectNotFound { .. })
        ));
        assert!(matches!(
            env.engine.remove("alpha"),
            Err(Error::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn set_active_unknown_project_is_not_found() {
        let env = env();
        let err = env.engine.set_active("ghost").unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound { .. }));
        assert!(env.engine.get_active().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn alias_failure_does_not_roll_back_switch() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();
        // Occupy the alias path with a non-empty directory so rename fails.
        let link = env.engine.links().link().to_path_buf();
        fs::create_dir_all(link.join("keep")).unwrap();

        let switch = env.engine.set_active("alpha").unwrap();
        assert!(matches!(switch.alias_error, Some(Error::Symlink { .. })));
        assert_eq!(env.engine.get_active().unwrap().unwrap().name, "alpha");
    }

    #[test]
    fn switch_never_replaces_a_regular_file_at_the_alias() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();
        let link = env.engine.links().link().to_path_buf();
        fs::write(&link, "user data").unwrap();

        let switch = env.engine.set_active("alpha").unwrap();
        let Some(Error::Symlink { source, .. }) = switch.alias_error else {
            panic!("expected the alias update to fail");
        };
        assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(env.engine.get_active().unwrap().unwrap().name, "alpha");
        assert!(!fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link).unwrap(), "user data");
    }

    #[cfg(unix)]
    #[test]
    fn repair_follows_switches_committed_after_inspection() {
        let env = env();
        let alpha = env.project_dir("alpha");
        let beta = env.project_dir("beta");
        env.engine.register("alpha", &alpha, None).unwrap();
        env.engine.register("beta", &beta, None).unwrap();
        env.engine.set_active("beta").unwrap();
        fs::remove_file(env.engine.links().link()).unwrap();

        let early = env.engine.validate_symlink().unwrap();
        assert_eq!(early.fix.unwrap().target(), Some(beta.as_path()));
        env.engine.set_active("alpha").unwrap();
        fs::remove_file(env.engine.links().link()).unwrap();

        let report = env.engine.repair_symlink().unwrap();
        assert_eq!(report.fix.unwrap().target(), Some(alpha.as_path()));
        assert_eq!(fs::read_link(env.engine.links().link()).unwrap(), alpha);
        assert!(env.engine.validate_symlink().unwrap().state.is_consistent());
        assert!(!env.engine.updater().lock().path().exists());
    }

    #[test]
    fn repair_waits_for_the_registry_lock() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();
        env.engine.set_active("alpha").unwrap();

        let _held = env.engine.updater().lock().acquire().unwrap();
        let err = env.engine.repair_symlink().unwrap_err();
        assert!(matches!(err, Error::RegistryLocked { .. }));
    }

    #[test]
    fn last_active_is_never_before_created_at() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();

        // Registration recorded under a clock that later stepped backwards.
        let store = env.engine.updater().store();
        let mut reg = store.load().unwrap();
        let ahead = Utc::now() + chrono::Duration::hours(1);
        let project = reg.projects.get_mut("alpha").unwrap();
        project.created_at = ahead;
        project.last_active = ahead;
        project.last_modified = ahead;
        store.save(&reg).unwrap();

        env.engine.set_active("alpha").unwrap();
        let project = env.engine.get("alpha").unwrap();
        assert_eq!(project.last_active, ahead);
        assert_eq!(project.last_modified, ahead);
        assert!(project.is_hot());
    }

    #[test]
    fn record_file_access_normalizes_and_bounds() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();

        for i in 0..25 {
            env.engine
                .record_file_access("alpha", Path::new(&format!("src/m{i}.rs")))
                .unwrap();
        }
        let list = env
            .engine
            .record_file_access("alpha", &alpha.join("src/m10.rs"))
            .unwrap();
        assert_eq!(list.len(), 20);
        assert_eq!(list[0], "src/m10.rs");
        assert_eq!(list[1], "src/m24.rs");

        let err = env
            .engine
            .record_file_access("alpha", Path::new("../escape"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn quick_access_round_trip() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();
        let before = env.engine.get("alpha").unwrap().last_modified;

        env.engine
            .set_quick_access("alpha", "test", serde_json::json!(["cargo", "test"]))
            .unwrap();
        assert_eq!(
            env.engine.get_quick_access("alpha", "test").unwrap(),
            Some(serde_json::json!(["cargo", "test"]))
        );
        assert!(env.engine.get("alpha").unwrap().last_modified >= before);

        assert!(env.engine.delete_quick_access("alpha", "test").unwrap());
        assert!(!env.engine.delete_quick_access("alpha", "test").unwrap());
        assert_eq!(env.engine.get_quick_access("alpha", "test").unwrap(), None);
        assert!(matches!(
            env.engine.get_quick_access("ghost", "test"),
            Err(Error::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn sweep_uses_configured_window() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();
        env.engine.set_active("alpha").unwrap();
        // The active project is exempt no matter how idle.
        let later = Utc::now() + chrono::Duration::days(30);
        assert!(env.engine.sweep_at(later).unwrap().is_empty());
        assert!(env.engine.get("alpha").unwrap().is_hot());
    }

    #[test]
    fn sweep_repairs_stray_hot_projects_from_lenient_loads() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path().join("cfg"));
        let mut config = CtxswitchConfig::default();
        config.registry.validate_on_load = false;
        let engine = RegistryEngine::new(&paths, &config);
        engine.init().unwrap();

        let work = dir.path().join("old");
        fs::create_dir_all(&work).unwrap();
        engine.register("old", &work, None).unwrap();

        // A document written by an older tool left a non-active project hot.
        let store = engine.updater().store();
        let mut reg = store.load().unwrap();
        let project = reg.projects.get_mut("old").unwrap();
        let ten_days_ago = Utc::now() - chrono::Duration::days(10);
        project.cache_status = CacheStatus::Hot;
        project.created_at = ten_days_ago;
        project.last_active = ten_days_ago;
        store.save(&reg).unwrap();

        assert_eq!(engine.sweep().unwrap(), vec!["old".to_string()]);
        assert_eq!(engine.get("old").unwrap().cache_status, CacheStatus::Cold);
    }

    #[test]
    fn description_can_be_set_and_cleared() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine
            .register("alpha", &alpha, Some("old".into()))
            .unwrap();
        let before = env.engine.get("alpha").unwrap().last_modified;

        env.engine
            .set_description("alpha", Some("payments api".into()))
            .unwrap();
        let project = env.engine.get("alpha").unwrap();
        assert_eq!(project.description.as_deref(), Some("payments api"));
        assert!(project.last_modified >= before);

        env.engine
            .set_description("alpha", Some("   ".into()))
            .unwrap();
        assert!(env.engine.get("alpha").unwrap().description.is_none());

        let err = env.engine.set_description("ghost", None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ProjectNotFound);
    }

    #[test]
    fn detect_and_suggest() {
        let env = env();
        let alpha = env.project_dir("alpha");
        env.engine.register("alpha", &alpha, None).unwrap();
        fs::create_dir_all(alpha.join("src")).unwrap();

        let found = env.engine.detect(&alpha.join("src")).unwrap().unwrap();
        assert_eq!(found.name, "alpha");
        assert_eq!(env.engine.suggest("alpah", 3).unwrap()[0].name, "alpha");
    }
}
