use std::{
    collections::BTreeMap,
    fmt,
    path::PathBuf,
    str::FromStr,
};

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::error::{Error, Result};

/// Version written into new registry documents.
pub const SCHEMA_VERSION: &str = "1.0";

/// Bound on [`ProjectMetadata::frequently_used_paths`].
pub const MAX_FREQUENT_PATHS: usize = 20;

/// The registry document: every known project plus the active pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub active_project: Option<String>,
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectMetadata>,
}

impl Registry {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            updated_at: now,
            active_project: None,
            projects: BTreeMap::new(),
        }
    }

    pub fn project(&self, name: &str) -> Result<&ProjectMetadata> {
        self.projects
            .get(name)
            .ok_or_else(|| Error::project_not_found(name))
    }

    pub fn project_mut(&mut self, name: &str) -> Result<&mut ProjectMetadata> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| Error::project_not_found(name))
    }

    /// Metadata of the active project, if one is set and present.
    pub fn active(&self) -> Option<&ProjectMetadata> {
        self.active_project
            .as_deref()
            .and_then(|name| self.projects.get(name))
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active_project.as_deref() == Some(name)
    }
}

/// A registered project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Relative paths, most recent first.
    #[serde(default)]
    pub frequently_used_paths: Vec<String>,
    #[serde(default)]
    pub quick_access: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub cache_status: CacheStatus,
}

impl ProjectMetadata {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: None,
            created_at: now,
            last_active: now,
            last_modified: now,
            frequently_used_paths: Vec::new(),
            quick_access: BTreeMap::new(),
            cache_status: CacheStatus::Cold,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Stamp `last_modified`, never earlier than `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now.max(self.created_at);
    }

    pub fn is_hot(&self) -> bool {
        self.cache_status == CacheStatus::Hot
    }
}

/// Whether a project's working context is expected to be warm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hot,
    #[default]
    Cold,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hot => f.write_str("hot"),
            Self::Cold => f.write_str("cold"),
        }
    }
}

impl FromStr for CacheStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(Self::Hot),
            "cold" => Ok(Self::Cold),
            other => Err(format!("unknown cache status `{other}` (expected hot or cold)")),
        }
    }
}
