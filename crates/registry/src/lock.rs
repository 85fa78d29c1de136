//! Advisory lock guarding registry mutation.
//!
//! The lock is a marker file next to the registry, created with
//! `create_new` so only one process can hold it. The marker records the
//! holder's pid and acquisition time; a marker older than the stale
//! threshold is assumed abandoned and reclaimed. Reclamation itself is
//! serialized through an `fd-lock` on a sidecar guard file so two waiters
//! can't both delete the marker and then delete each other's fresh one.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant, SystemTime},
};

use {
    chrono::{DateTime, Utc},
    ctxswitch_config::LockConfig,
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

/// Timing knobs for [`LockManager::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub timeout: Duration,
    pub stale_after: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self::from(&LockConfig::default())
    }
}

impl From<&LockConfig> for LockPolicy {
    fn from(cfg: &LockConfig) -> Self {
        Self {
            timeout: cfg.timeout(),
            stale_after: cfg.stale_after(),
            initial_backoff: cfg.initial_backoff(),
            max_backoff: cfg.max_backoff(),
        }
    }
}

/// Exponential backoff, capped.
#[derive(Debug)]
struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self { next: initial, max }
    }

    fn step(&mut self) -> Duration {
        let current = self.next.min(self.max);
        self.next = current.saturating_mul(2).min(self.max);
        current
    }
}

/// Content of the lock marker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMarker {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

/// Creates and removes the lock marker.
#[derive(Debug, Clone)]
pub struct LockManager {
    path: PathBuf,
    policy: LockPolicy,
}

impl LockManager {
    pub fn new(path: impl Into<PathBuf>, policy: LockPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &LockPolicy {
        &self.policy
    }

    /// Acquire with the configured timeout.
    pub fn acquire(&self) -> Result<LockGuard> {
        self.acquire_within(self.policy.timeout)
    }

    /// Retry with exponential backoff until the marker is ours or `timeout`
    /// elapses.
    pub fn acquire_within(&self, timeout: Duration) -> Result<LockGuard> {
        let started = Instant::now();
        let mut backoff = Backoff::new(self.policy.initial_backoff, self.policy.max_backoff);

        loop {
            if self.try_create()? {
                debug!(path = %self.path.display(), "lock acquired");
                return Ok(LockGuard {
                    manager: self.clone(),
                    released: false,
                });
            }

            if self.reclaim_if_stale()? {
                continue;
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(Error::RegistryLocked {
                    path: self.path.clone(),
                    waited,
                    holder: self.read_marker().map(|m| m.pid),
                });
            }
            thread::sleep(backoff.step().min(timeout - waited));
        }
    }

    /// Remove the marker. Missing marker is not an error.
    pub fn release(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "lock released");
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::filesystem(
                format!("failed to remove lock {}", self.path.display()),
                e,
            )),
        }
    }

    /// Marker currently on disk, if readable.
    pub fn read_marker(&self) -> Option<LockMarker> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// `Ok(false)` when someone else holds the marker.
    fn try_create(&self) -> Result<bool> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::filesystem(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(Error::filesystem(
                    format!("failed to create lock {}", self.path.display()),
                    e,
                ));
            },
        };

        let marker = LockMarker {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        let written = serde_json::to_vec(&marker)
            .map_err(io::Error::other)
            .and_then(|bytes| file.write_all(&bytes))
            .and_then(|()| file.sync_all());
        if let Err(e) = written {
            let _ = fs::remove_file(&self.path);
            return Err(Error::filesystem(
                format!("failed to write lock {}", self.path.display()),
                e,
            ));
        }
        Ok(true)
    }

    /// Age of the marker on disk, `None` if it vanished.
    ///
    /// Falls back to the file mtime when the marker can't be parsed (the
    /// holder may still be writing it).
    fn marker_age(&self) -> Option<Duration> {
        if let Some(marker) = self.read_marker() {
            return Some((Utc::now() - marker.acquired_at).to_std().unwrap_or_default());
        }
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default(),
        )
    }

    /// Delete the marker if it is older than the stale threshold.
    fn reclaim_if_stale(&self) -> Result<bool> {
        match self.marker_age() {
            Some(age) if age > self.policy.stale_after => {},
            _ => return Ok(false),
        }

        let guard_path = self.guard_path();
        let guard_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&guard_path)
            .map_err(|e| {
                Error::filesystem(format!("failed to open {}", guard_path.display()), e)
            })?;
        let mut guard_lock = fd_lock::RwLock::new(guard_file);
        let _held = guard_lock.write().map_err(|e| {
            Error::filesystem(format!("failed to lock {}", guard_path.display()), e)
        })?;

        // Re-check under the guard: another waiter may already have
        // reclaimed it and taken a fresh lock.
        let Some(age) = self.marker_age() else {
            return Ok(true);
        };
        if age <= self.policy.stale_after {
            return Ok(false);
        }

        let holder = self.read_marker().map(|m| m.pid);
        warn!(
            path = %self.path.display(),
            holder = ?holder,
            age_secs = age.as_secs(),
            "reclaiming stale registry lock"
        );
        self.release()?;
        Ok(true)
    }

    fn guard_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".guard");
        self.path.with_file_name(name)
    }
}

/// Held lock. Dropping it releases the marker.
#[derive(Debug)]
pub struct LockGuard {
    manager: LockManager,
    released: bool,
}

impl LockGuard {
    /// Release now and report failures instead of only logging them.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.manager.release()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.manager.release()
        {
            warn!(error = %e, "failed to release registry lock");
        }
    }
}
