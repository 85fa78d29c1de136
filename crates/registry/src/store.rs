use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    atomic::write_atomic,
    error::{Error, Result},
    types::Registry,
    validate::validate_registry,
};

/// Reads and writes the registry document.
///
/// Writes always go through [`write_atomic`]; callers that mutate should use
/// [`crate::tx::Updater`] rather than calling [`RegistryStore::save`]
/// directly.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
    validate_on_load: bool,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            validate_on_load: true,
        }
    }

    #[must_use]
    pub fn validate_on_load(mut self, enabled: bool) -> Self {
        self.validate_on_load = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Registry> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::RegistryNotFound {
                    path: self.path.clone(),
                });
            },
            Err(e) => {
                return Err(Error::filesystem(
                    format!("failed to read {}", self.path.display()),
                    e,
                ));
            },
        };

        let registry: Registry =
            serde_json::from_str(&raw).map_err(|e| Error::corrupted(&self.path, e))?;

        if self.validate_on_load {
            validate_registry(&registry).map_err(|v| Error::corrupted(&self.path, v))?;
        }
        debug!(
            path = %self.path.display(),
            projects = registry.projects.len(),
            "registry loaded"
        );
        Ok(registry)
    }

    pub fn save(&self, registry: &Registry) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(registry).map_err(Error::Serialize)?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), "registry saved");
        Ok(())
    }
}
