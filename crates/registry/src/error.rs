use std::{error::Error as StdError, fmt, path::PathBuf, time::Duration};

use crate::validate::Violations;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no registry at {path} (run `ctxswitch init` first)")]
    RegistryNotFound { path: PathBuf },
    #[error("registry at {path} is corrupted: {source}")]
    RegistryCorrupted {
        path: PathBuf,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("registry is locked ({path}) after waiting {waited:?}{}", holder_suffix(.holder))]
    RegistryLocked {
        path: PathBuf,
        waited: Duration,
        holder: Option<u32>,
    },
    #[error("project `{name}` not found")]
    ProjectNotFound { name: String },
    #[error("project `{name}` already exists")]
    ProjectExists { name: String },
    #[error("project `{name}` is active: {reason}")]
    ActiveProject { name: String, reason: &'static str },
    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },
    #[error("registry failed validation: {0}")]
    Validation(Violations),
    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to update alias {link}: {source}")]
    Symlink {
        link: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize registry: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ctxswitch_common::Error),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Payload-free discriminant of [`Error`], for callers that only need to
/// branch on what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RegistryNotFound,
    RegistryCorrupted,
    RegistryLocked,
    ProjectNotFound,
    ProjectExists,
    ActiveProject,
    InvalidPath,
    Validation,
    Filesystem,
    Symlink,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RegistryNotFound => "registry-not-found",
            Self::RegistryCorrupted => "registry-corrupted",
            Self::RegistryLocked => "registry-locked",
            Self::ProjectNotFound => "project-not-found",
            Self::ProjectExists => "project-exists",
            Self::ActiveProject => "active-project",
            Self::InvalidPath => "invalid-path",
            Self::Validation => "validation",
            Self::Filesystem => "filesystem",
            Self::Symlink => "symlink",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RegistryNotFound { .. } => ErrorKind::RegistryNotFound,
            Self::RegistryCorrupted { .. } => ErrorKind::RegistryCorrupted,
            Self::RegistryLocked { .. } => ErrorKind::RegistryLocked,
            Self::ProjectNotFound { .. } => ErrorKind::ProjectNotFound,
            Self::ProjectExists { .. } => ErrorKind::ProjectExists,
            Self::ActiveProject { .. } => ErrorKind::ActiveProject,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::Symlink { .. } => ErrorKind::Symlink,
            Self::Serialize(_) | Self::Config(_) | Self::Task(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn filesystem(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn corrupted<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::RegistryCorrupted {
            path: path.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn project_not_found(name: impl Into<String>) -> Self {
        Self::ProjectNotFound { name: name.into() }
    }

    #[must_use]
    pub fn invalid_path(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }
}

fn holder_suffix(holder: &Option<u32>) -> String {
    holder
        .map(|pid| format!(", held by pid {pid}"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
