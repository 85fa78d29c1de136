//! Crash-safe file replacement.
//!
//! Content goes to a sibling temp file, is fsynced, then renamed over the
//! target. Readers see either the old bytes or the new bytes, never a mix.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

use crate::error::{Error, Result};

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic_with(path, |file| file.write_all(bytes))
}

/// Atomically replace `path` with whatever `write` puts into the temp file.
///
/// If `write` (or the flush/rename that follows) fails, the temp file is
/// removed and `path` keeps its previous content.
pub fn write_atomic_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|e| Error::filesystem(format!("failed to create {}", dir.display()), e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "registry".to_string());

    // Dropping `tmp` on any early return deletes the temp file.
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::filesystem(format!("failed to create temp file in {}", dir.display()), e))?;

    write(tmp.as_file_mut())
        .and_then(|()| tmp.as_file_mut().flush())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::filesystem(format!("failed to write {}", tmp.path().display()), e))?;

    tmp.persist(path)
        .map_err(|e| Error::filesystem(format!("failed to rename onto {}", path.display()), e.error))?;

    sync_dir(dir);
    Ok(())
}

/// Best-effort fsync of the directory entry so the rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir)
        && let Err(e) = handle.sync_all()
    {
        tracing::debug!(dir = %dir.display(), error = %e, "directory fsync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
