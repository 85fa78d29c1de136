//! Structural checks for registry documents and project records.
//!
//! Pure functions: nothing here touches the filesystem, so a path that no
//! longer exists on disk is still a valid registry entry.

use std::{collections::HashSet, fmt, path::Path};

use serde::Serialize;

use crate::types::{CacheStatus, MAX_FREQUENT_PATHS, ProjectMetadata, Registry};

const MAX_NAME_LEN: usize = 64;

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Dotted path, e.g. `projects.alpha.frequently_used_paths`.
    pub field: String,
    pub message: String,
    pub value: serde_json::Value,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (got {})", self.field, self.message, self.value)
    }
}

/// Non-empty, ordered list of violations.
#[derive(Debug, Clone, PartialEq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn single(field: impl Into<String>, message: impl Into<String>, value: impl Serialize) -> Self {
        Self(vec![Violation::new(field, message, value)])
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }

    fn from_vec(list: Vec<Violation>) -> Result<(), Self> {
        if list.is_empty() {
            Ok(())
        } else {
            Err(Self(list))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

/// Check a whole registry document.
pub fn validate_registry(registry: &Registry) -> Result<(), Violations> {
    let mut out = Vec::new();

    if registry.version.trim().is_empty() {
        out.push(Violation::new("version", "must not be empty", &registry.version));
    } else if registry.version.split('.').next() != Some("1") {
        out.push(Violation::new(
            "version",
            "unsupported schema version (expected 1.x)",
            &registry.version,
        ));
    }

    for (key, project) in &registry.projects {
        let prefix = format!("projects.{key}");
        if key != &project.name {
            out.push(Violation::new(
                format!("{prefix}.name"),
                "must match its key in `projects`",
                &project.name,
            ));
        }
        check_project(&prefix, project, &mut out);
    }

    match registry.active_project.as_deref() {
        Some(active) => match registry.projects.get(active) {
            None => out.push(Violation::new(
                "active_project",
                "names a project that is not registered",
                active,
            )),
            Some(p) if p.cache_status != CacheStatus::Hot => out.push(Violation::new(
                format!("projects.{active}.cache_status"),
                "the active project must be hot",
                p.cache_status,
            )),
            Some(_) => {},
        },
        None => {},
    }

    for (key, project) in &registry.projects {
        if project.is_hot() && !registry.is_active(key) {
            out.push(Violation::new(
                format!("projects.{key}.cache_status"),
                "only the active project may be hot",
                project.cache_status,
            ));
        }
    }

    Violations::from_vec(out)
}

/// Check a single project record outside of any registry.
pub fn validate_project(project: &ProjectMetadata) -> Result<(), Violations> {
    let mut out = Vec::new();
    check_project("project", project, &mut out);
    Violations::from_vec(out)
}

/// Reason a project name is unusable, if any.
pub fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("must not be empty");
    }
    if name.len() > MAX_NAME_LEN {
        return Some("must be at most 64 characters");
    }
    if name.starts_with('.') {
        return Some("must not start with `.`");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Some("may only contain ASCII letters, digits, `-`, `_` and `.`");
    }
    None
}

fn check_project(prefix: &str, project: &ProjectMetadata, out: &mut Vec<Violation>) {
    if let Some(reason) = name_problem(&project.name) {
        out.push(Violation::new(format!("{prefix}.name"), reason, &project.name));
    }

    if !project.path.is_absolute() {
        out.push(Violation::new(
            format!("{prefix}.path"),
            "must be absolute",
            &project.path,
        ));
    }

    if project.last_active < project.created_at {
        out.push(Violation::new(
            format!("{prefix}.last_active"),
            "precedes created_at",
            project.last_active,
        ));
    }
    if project.last_modified < project.created_at {
        out.push(Violation::new(
            format!("{prefix}.last_modified"),
            "precedes created_at",
            project.last_modified,
        ));
    }

    let paths = &project.frequently_used_paths;
    let field = format!("{prefix}.frequently_used_paths");
    if paths.len() > MAX_FREQUENT_PATHS {
        out.push(Violation::new(
            &field,
            format!("holds more than {MAX_FREQUENT_PATHS} entries"),
            paths.len(),
        ));
    }
    let mut seen = HashSet::new();
    for (i, entry) in paths.iter().enumerate() {
        if entry.trim().is_empty() {
            out.push(Violation::new(format!("{field}[{i}]"), "must not be empty", entry));
        } else if Path::new(entry).is_absolute() {
            out.push(Violation::new(format!("{field}[{i}]"), "must be relative", entry));
        }
        if !seen.insert(entry.as_str()) {
            out.push(Violation::new(format!("{field}[{i}]"), "duplicate entry", entry));
        }
    }

    if project.quick_access.keys().any(|k| k.is_empty()) {
        out.push(Violation::new(
            format!("{prefix}.quick_access"),
            "keys must not be empty",
            "",
        ));
    }
}
