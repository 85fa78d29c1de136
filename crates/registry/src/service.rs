use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;

use crate::{
    detect::NameMatch,
    engine::{Deactivation, RegistryEngine, Switch},
    error::Result,
    filter::ListFilter,
    symlink::SymlinkReport,
    types::ProjectMetadata,
};

/// Registry operations offered to collaborators (CLI, orchestration, UI).
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    async fn init(&self) -> Result<bool>;
    async fn register(
        &self,
        name: &str,
        path: &Path,
        description: Option<String>,
    ) -> Result<ProjectMetadata>;
    async fn remove(&self, name: &str) -> Result<ProjectMetadata>;
    async fn get(&self, name: &str) -> Result<ProjectMetadata>;
    async fn list(&self, filter: ListFilter) -> Result<Vec<ProjectMetadata>>;
    async fn get_active(&self) -> Result<Option<ProjectMetadata>>;
    async fn set_active(&self, name: &str) -> Result<Switch>;
    async fn clear_active(&self) -> Result<Deactivation>;
    async fn record_file_access(&self, name: &str, path: &Path) -> Result<Vec<String>>;
    async fn set_quick_access(&self, name: &str, key: &str, value: serde_json::Value)
    -> Result<()>;
    async fn get_quick_access(&self, name: &str, key: &str) -> Result<Option<serde_json::Value>>;
    async fn delete_quick_access(&self, name: &str, key: &str) -> Result<bool>;
    async fn set_description(&self, name: &str, description: Option<String>) -> Result<()>;
    async fn sweep(&self) -> Result<Vec<String>>;
    async fn validate_symlink(&self) -> Result<SymlinkReport>;
    async fn repair_symlink(&self) -> Result<SymlinkReport>;
    async fn detect(&self, dir: &Path) -> Result<Option<ProjectMetadata>>;
    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<NameMatch>>;
}

/// [`ProjectRegistry`] over the on-disk engine. Each call runs on the
/// blocking pool since lock waits and file I/O are synchronous.
#[derive(Debug, Clone)]
pub struct FileProjectRegistry {
    engine: Arc<RegistryEngine>,
}

impl FileProjectRegistry {
    pub fn new(engine: RegistryEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &RegistryEngine {
        &self.engine
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&RegistryEngine) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || f(&engine)).await?
    }
}

#[async_trait]
impl ProjectRegistry for FileProjectRegistry {
    async fn init(&self) -> Result<bool> {
        self.blocking(|e| e.init()).await
    }

    async fn register(
        &self,
        name: &str,
        path: &Path,
        description: Option<String>,
    ) -> Result<ProjectMetadata> {
        let name = name.to_string();
        let path = path.to_path_buf();
        self.blocking(move |e| e.register(&name, &path, description))
            .await
    }

    async fn remove(&self, name: &str) -> Result<ProjectMetadata> {
        let name = name.to_string();
        self.blocking(move |e| e.remove(&name)).await
    }

    async fn get(&self, name: &str) -> Result<ProjectMetadata> {
        let name = name.to_string();
        self.blocking(move |e| e.get(&name)).await
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<ProjectMetadata>> {
        self.blocking(move |e| e.list(&filter)).await
    }

    async fn get_active(&self) -> Result<Option<ProjectMetadata>> {
        self.blocking(|e| e.get_active()).await
    }

    async fn set_active(&self, name: &str) -> Result<Switch> {
        let name = name.to_string();
        self.blocking(move |e| e.set_active(&name)).await
    }

    async fn clear_active(&self) -> Result<Deactivation> {
        self.blocking(|e| e.clear_active()).await
    }

    async fn record_file_access(&self, name: &str, path: &Path) -> Result<Vec<String>> {
        let name = name.to_string();
        let path: PathBuf = path.to_path_buf();
        self.blocking(move |e| e.record_file_access(&name, &path))
            .await
    }

    async fn set_quick_access(
        &self,
        name: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let name = name.to_string();
        let key = key.to_string();
        self.blocking(move |e| e.set_quick_access(&name, &key, value))
            .await
    }

    async fn get_quick_access(&self, name: &str, key: &str) -> Result<Option<serde_json::Value>> {
        let name = name.to_string();
        let key = key.to_string();
        self.blocking(move |e| e.get_quick_access(&name, &key))
            .await
    }

    async fn delete_quick_access(&self, name: &str, key: &str) -> Result<bool> {
        let name = name.to_string();
        let key = key.to_string();
        self.blocking(move |e| e.delete_quick_access(&name, &key))
            .await
    }

    async fn set_description(&self, name: &str, description: Option<String>) -> Result<()> {
        let name = name.to_string();
        self.blocking(move |e| e.set_description(&name, description))
            .await
    }

    async fn sweep(&self) -> Result<Vec<String>> {
        self.blocking(|e| e.sweep()).await
    }

    async fn validate_symlink(&self) -> Result<SymlinkReport> {
        self.blocking(|e| e.validate_symlink()).await
    }

    async fn repair_symlink(&self) -> Result<SymlinkReport> {
        self.blocking(|e| e.repair_symlink()).await
    }

    async fn detect(&self, dir: &Path) -> Result<Option<ProjectMetadata>> {
        let dir = dir.to_path_buf();
        self.blocking(move |e| e.detect(&dir)).await
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<NameMatch>> {
        let query = query.to_string();
        self.blocking(move |e| e.suggest(&query, limit)).await
    }
}
