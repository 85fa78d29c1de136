//! Most-recently-used file list per project.

use std::path::{Component, Path, PathBuf};

use crate::{
    error::{Error, Result},
    types::MAX_FREQUENT_PATHS,
};

/// Move `path` to the front of `paths`, dropping the oldest entries past
/// [`MAX_FREQUENT_PATHS`].
pub fn record(paths: &mut Vec<String>, path: &str) {
    paths.retain(|p| p != path);
    paths.insert(0, path.to_string());
    paths.truncate(MAX_FREQUENT_PATHS);
}

/// Turn a user-supplied path into the relative form stored in the list.
///
/// Absolute paths must lie inside `root`; relative paths are cleaned of
/// `.` components and may not escape the root with `..`.
pub fn normalize(root: &Path, path: &Path) -> Result<String> {
    let relative = if path.is_absolute() {
        path.strip_prefix(root)
            .map_err(|_| Error::invalid_path(path, "not inside the project root"))?
    } else {
        path
    };

    let mut clean = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {},
            Component::ParentDir => {
                return Err(Error::invalid_path(path, "escapes the project root"));
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::invalid_path(path, "not inside the project root"));
            },
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(Error::invalid_path(path, "names the project root itself"));
    }
    Ok(clean.to_string_lossy().replace('\\', "/"))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_five_paths_keep_newest_twenty() {
        let mut paths = Vec::new();
        for i in 0..25 {
            record(&mut paths, &format!("src/file{i}.rs"));
        }
        assert_eq!(paths.len(), MAX_FREQUENT_PATHS);
        assert_eq!(paths[0], "src/file24.rs");
        assert_eq!(paths[19], "src/file5.rs");
        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn re_recording_promotes_without_growing() {
        let mut paths = Vec::new();
        for name in ["a", "b", "c"] {
            record(&mut paths, name);
        }
        record(&mut paths, "a");
        assert_eq!(paths, vec!["a", "c", "b"]);
        record(&mut paths, "a");
        assert_eq!(paths, vec!["a", "c", "b"]);
    }

    #[test]
    fn promoting_in_full_list_drops_nothing_else() {
        let mut paths = Vec::new();
        for i in 0..MAX_FREQUENT_PATHS {
            record(&mut paths, &format!("f{i}"));
        }
        record(&mut paths, "f0");
        assert_eq!(paths.len(), MAX_FREQUENT_PATHS);
        assert_eq!(paths[0], "f0");
        assert_eq!(paths[MAX_FREQUENT_PATHS - 1], "f1");
    }

    #[cfg(unix)]
    #[test]
    fn normalize_strips_root_and_dots() {
        let root = Path::new("/srv/alpha");
        assert_eq!(
            normalize(root, Path::new("/srv/alpha/src/main.rs")).unwrap(),
            "src/main.rs"
        );
        assert_eq!(normalize(root, Path::new("./docs/../docs")).unwrap_err().to_string(),
            "invalid path ./docs/../docs: escapes the project root");
        assert_eq!(normalize(root, Path::new("./README.md")).unwrap(), "README.md");
    }

    #[cfg(unix)]
    #[test]
    fn normalize_rejects_outside_and_root() {
        let root = Path::new("/srv/alpha");
        assert!(matches!(
            normalize(root, Path::new("/etc/hosts")),
            Err(Error::InvalidPath { .. })
        ));
        assert!(matches!(
            normalize(root, Path::new("/srv/alpha")),
            Err(Error::InvalidPath { .. })
        ));
    }
}
