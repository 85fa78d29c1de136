use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::{Context, Result};

/// Environment variable that redirects the config root.
pub const CONFIG_DIR_ENV: &str = "CTXSWITCH_CONFIG_DIR";

const REGISTRY_FILE: &str = "registry.json";
const LOCK_SUFFIX: &str = "lock";
const ACTIVE_LINK: &str = "active";

static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Override the config root for the rest of the process.
pub fn set_config_dir(path: PathBuf) {
    let mut slot = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(path);
}

/// Drop a previous [`set_config_dir`] override.
pub fn clear_config_dir() {
    let mut slot = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = None;
}

/// Returns the config root.
///
/// Resolution order:
/// 1. programmatic override ([`set_config_dir`])
/// 2. `CTXSWITCH_CONFIG_DIR`
/// 3. `~/.config/ctxswitch`
pub fn config_dir() -> Option<PathBuf> {
    let override_dir = CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    resolve_config_dir(override_dir, std::env::var_os(CONFIG_DIR_ENV))
}

/// Pure form of [`config_dir`], with the override and environment value
/// passed in explicitly.
pub fn resolve_config_dir(
    override_dir: Option<PathBuf>,
    env_value: Option<OsString>,
) -> Option<PathBuf> {
    if let Some(dir) = override_dir {
        return Some(dir);
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    directories::ProjectDirs::from("", "", "ctxswitch").map(|d| d.config_dir().to_path_buf())
}

/// The well-known locations the engine reads and writes under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
    registry: PathBuf,
    lock: PathBuf,
    active_link: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let registry = root.join(REGISTRY_FILE);
        let lock = registry.with_extension(format!("json.{LOCK_SUFFIX}"));
        let active_link = root.join(ACTIVE_LINK);
        Self {
            root,
            registry,
            lock,
            active_link,
        }
    }

    /// Paths under the resolved [`config_dir`].
    pub fn discover() -> Result<Self> {
        let root = config_dir().context("could not determine a config directory")?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &Path {
        &self.registry
    }

    pub fn lock(&self) -> &Path {
        &self.lock
    }

    pub fn active_link(&self) -> &Path {
        &self.active_link
    }
}
