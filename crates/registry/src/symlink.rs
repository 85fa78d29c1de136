//! The `active` alias: a symlink that follows the active project.
//!
//! The alias is derived state. It is repointed with the same temp + rename
//! discipline as registry writes, and can always be rebuilt from the
//! registry via [`SymlinkManager::inspect`] and [`SymlinkFix::apply`].

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// What the alias currently looks like relative to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymlinkState {
    /// Points at the active project, or is absent with nothing active.
    Consistent { target: Option<PathBuf> },
    /// A project is active but there is no alias.
    Missing { expected: PathBuf },
    /// The alias points at a path that does not exist.
    Broken { target: PathBuf },
    /// The alias points somewhere other than the active project (or exists
    /// while nothing is active).
    Stale {
        target: PathBuf,
        expected: Option<PathBuf>,
    },
    /// Something that is not a symlink occupies the alias path.
    NotASymlink,
}

impl SymlinkState {
    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent { .. })
    }
}

/// Outcome of [`SymlinkManager::inspect`].
#[derive(Debug, Clone)]
pub struct SymlinkReport {
    pub state: SymlinkState,
    /// Present when the state can be repaired automatically.
    pub fix: Option<SymlinkFix>,
}

/// A deferred repair for the alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkFix {
    link: PathBuf,
    action: FixAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FixAction {
    Repoint(PathBuf),
    Remove,
}

impl SymlinkFix {
    /// Perform the repair computed at inspection time. This does not take
    /// the registry lock; [`crate::RegistryEngine::repair_symlink`] does.
    pub fn apply(&self) -> Result<()> {
        let manager = SymlinkManager::new(&self.link);
        match &self.action {
            FixAction::Repoint(target) => manager.repoint(target),
            FixAction::Remove => manager.remove(),
        }
    }

    /// Target the fix will point at, or `None` if it removes the alias.
    pub fn target(&self) -> Option<&Path> {
        match &self.action {
            FixAction::Repoint(target) => Some(target),
            FixAction::Remove => None,
        }
    }
}

/// Maintains the alias at a fixed path.
#[derive(Debug, Clone)]
pub struct SymlinkManager {
    link: PathBuf,
}

impl SymlinkManager {
    pub fn new(link: impl Into<PathBuf>) -> Self {
        Self { link: link.into() }
    }

    pub fn link(&self) -> &Path {
        &self.link
    }

    /// Point the alias at `target`, replacing any previous alias atomically.
    ///
    /// A regular file or directory at the alias path is never replaced;
    /// that fails with [`Error::Symlink`] (`AlreadyExists`).
    pub fn repoint(&self, target: &Path) -> Result<()> {
        if let Some(parent) = self.link.parent() {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        self.ensure_replaceable()?;

        let file_name = self
            .link
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "active".to_string());
        let tmp = self
            .link
            .with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

        create_symlink(target, &tmp).map_err(|e| self.error(e))?;
        if let Err(e) = self.ensure_replaceable() {
            let _ = remove_symlink(&tmp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, &self.link) {
            let _ = fs::remove_file(&tmp);
            return Err(self.error(e));
        }
        info!(link = %self.link.display(), target = %target.display(), "active alias repointed");
        Ok(())
    }

    /// Remove the alias. Missing alias is not an error; a non-symlink at
    /// the alias path is left alone.
    pub fn remove(&self) -> Result<()> {
        if self.ensure_replaceable()? {
            remove_symlink(&self.link).map_err(|e| self.error(e))?;
            debug!(link = %self.link.display(), "active alias removed");
        }
        Ok(())
    }

    /// `Ok(true)` if a symlink sits at the alias path, `Ok(false)` if
    /// nothing does, an error if something else occupies it.
    fn ensure_replaceable(&self) -> Result<bool> {
        match fs::symlink_metadata(&self.link) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(true),
            Ok(_) => Err(self.error(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "alias path is occupied by a regular file or directory",
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.error(e)),
        }
    }

    /// Current alias target, `None` if there is no alias.
    pub fn target(&self) -> Result<Option<PathBuf>> {
        match fs::read_link(&self.link) {
            Ok(target) => Ok(Some(self.resolve(target))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.error(e)),
        }
    }

    /// Compare the alias with where it should point.
    pub fn inspect(&self, expected: Option<&Path>) -> Result<SymlinkReport> {
        let meta = match fs::symlink_metadata(&self.link) {
            Ok(meta) => Some(meta),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(self.error(e)),
        };

        let state = match meta {
            None => match expected {
                None => SymlinkState::Consistent { target: None },
                Some(expected) => SymlinkState::Missing {
                    expected: expected.to_path_buf(),
                },
            },
            Some(meta) if !meta.file_type().is_symlink() => SymlinkState::NotASymlink,
            Some(_) => {
                let target = self
                    .target()?
                    .ok_or_else(|| self.error(io::ErrorKind::NotFound.into()))?;
                match expected {
                    Some(expected) if same_location(&target, expected) => {
                        if target.exists() {
                            SymlinkState::Consistent {
                                target: Some(target),
                            }
                        } else {
                            SymlinkState::Broken { target }
                        }
                    },
                    _ if !target.exists() => SymlinkState::Broken { target },
                    _ => SymlinkState::Stale {
                        target,
                        expected: expected.map(Path::to_path_buf),
                    },
                }
            },
        };

        let fix = match (&state, expected) {
            (SymlinkState::Consistent { .. } | SymlinkState::NotASymlink, _) => None,
            (_, None) => Some(FixAction::Remove),
            (_, Some(expected)) if expected.exists() => {
                Some(FixAction::Repoint(expected.to_path_buf()))
            },
            // Repointing at a missing project root would only produce
            // another broken alias.
            (_, Some(_)) => None,
        }
        .map(|action| SymlinkFix {
            link: self.link.clone(),
            action,
        });

        Ok(SymlinkReport { state, fix })
    }

    /// Relative targets are interpreted from the alias's directory.
    fn resolve(&self, target: PathBuf) -> PathBuf {
        if target.is_absolute() {
            return target;
        }
        match self.link.parent() {
            Some(parent) => parent.join(target),
            None => target,
        }
    }

    fn error(&self, source: io::Error) -> Error {
        Error::Symlink {
            link: self.link.clone(),
            source,
        }
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_symlink(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_symlink(link: &Path) -> io::Result<()> {
    // Directory symlinks are removed like directories on Windows.
    fs::remove_dir(link).or_else(|_| fs::remove_file(link))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(all(test, unix))]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        alpha: PathBuf,
        beta: PathBuf,
        links: SymlinkManager,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let alpha = dir.path().join("alpha");
        let beta = dir.path().join("beta");
        fs::create_dir(&alpha).unwrap();
        fs::create_dir(&beta).unwrap();
        let links = SymlinkManager::new(dir.path().join("cfg").join("active"));
        Fixture {
            _dir: dir,
            alpha,
            beta,
            links,
        }
    }

    #[test]
    fn repoint_replaces_existing_alias() {
        let f = fixture();
        f.links.repoint(&f.alpha).unwrap();
        assert_eq!(fs::read_link(f.links.link()).unwrap(), f.alpha);
        f.links.repoint(&f.beta).unwrap();
        assert_eq!(fs::read_link(f.links.link()).unwrap(), f.beta);

        let leftovers: Vec<_> = fs::read_dir(f.links.link().parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn no_alias_and_nothing_active_is_consistent() {
        let f = fixture();
        let report = f.links.inspect(None).unwrap();
        assert_eq!(report.state, SymlinkState::Consistent { target: None });
        assert!(report.fix.is_none());
    }

    #[test]
    fn missing_alias_is_fixable() {
        let f = fixture();
        let report = f.links.inspect(Some(&f.alpha)).unwrap();
        assert_eq!(report.state, SymlinkState::Missing {
            expected: f.alpha.clone()
        });
        report.fix.unwrap().apply().unwrap();
        assert!(f.links.inspect(Some(&f.alpha)).unwrap().state.is_consistent());
    }

    #[test]
    fn stale_alias_is_repointed() {
        let f = fixture();
        f.links.repoint(&f.alpha).unwrap();
        let report = f.links.inspect(Some(&f.beta)).unwrap();
        assert_eq!(report.state, SymlinkState::Stale {
            target: f.alpha.clone(),
            expected: Some(f.beta.clone()),
        });
        let fix = report.fix.unwrap();
        assert_eq!(fix.target(), Some(f.beta.as_path()));
        fix.apply().unwrap();
        assert_eq!(f.links.target().unwrap(), Some(f.beta.clone()));
    }

    #[test]
    fn broken_alias_is_detected() {
        let f = fixture();
        f.links.repoint(&f.alpha).unwrap();
        fs::remove_dir(&f.alpha).unwrap();
        let report = f.links.inspect(Some(&f.beta)).unwrap();
        assert_eq!(report.state, SymlinkState::Broken {
            target: f.alpha.clone()
        });
        assert!(report.fix.is_some());
    }

    #[test]
    fn alias_without_active_project_is_removed_by_fix() {
        let f = fixture();
        f.links.repoint(&f.alpha).unwrap();
        let report = f.links.inspect(None).unwrap();
        assert!(matches!(report.state, SymlinkState::Stale { expected: None, .. }));
        report.fix.unwrap().apply().unwrap();
        assert_eq!(f.links.target().unwrap(), None);
    }

    #[test]
    fn regular_file_at_alias_is_not_touched() {
        let f = fixture();
        fs::create_dir_all(f.links.link().parent().unwrap()).unwrap();
        fs::write(f.links.link(), "user data").unwrap();
        let report = f.links.inspect(Some(&f.alpha)).unwrap();
        assert_eq!(report.state, SymlinkState::NotASymlink);
        assert!(report.fix.is_none());
        assert!(matches!(f.links.remove(), Err(Error::Symlink { .. })));
        assert_eq!(fs::read_to_string(f.links.link()).unwrap(), "user data");

        let Err(Error::Symlink { source, .. }) = f.links.repoint(&f.alpha) else {
            panic!("repoint must refuse to replace a regular file");
        };
        assert_eq!(source.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(f.links.link()).unwrap(), "user data");

        let leftovers: Vec<_> = fs::read_dir(f.links.link().parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
