//! Terminal rendering for registry records.

use {
    chrono::{DateTime, Utc},
    ctxswitch_registry::{CacheStatus, ProjectMetadata},
};

const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// One line per project: marker, name, status, path, description.
pub fn project_line(project: &ProjectMetadata) -> String {
    let (marker, color) = match project.cache_status {
        CacheStatus::Hot => ("*", GREEN),
        CacheStatus::Cold => (" ", DIM),
    };
    let mut line = format!(
        "{color}{marker} {BOLD}{name}{RESET} {color}[{status}]{RESET} {path}",
        name = project.name,
        status = project.cache_status,
        path = project.path.display(),
    );
    if let Some(ref desc) = project.description {
        line.push_str(&format!(" - {desc}"));
    }
    line
}

pub fn project_details(project: &ProjectMetadata, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Name:         {}\n", project.name));
    out.push_str(&format!("Path:         {}\n", project.path.display()));
    if let Some(ref desc) = project.description {
        out.push_str(&format!("Description:  {desc}\n"));
    }
    out.push_str(&format!("Status:       {}\n", project.cache_status));
    out.push_str(&format!(
        "Created:      {}\n",
        project.created_at.to_rfc3339()
    ));
    out.push_str(&format!(
        "Last active:  {} ({})\n",
        project.last_active.to_rfc3339(),
        ago(project.last_active, now)
    ));
    out.push_str(&format!(
        "Modified:     {}\n",
        project.last_modified.to_rfc3339()
    ));
    if !project.frequently_used_paths.is_empty() {
        out.push_str("Frequent:\n");
        for path in &project.frequently_used_paths {
            out.push_str(&format!("  {path}\n"));
        }
    }
    if !project.quick_access.is_empty() {
        out.push_str("Quick access:\n");
        for (key, value) in &project.quick_access {
            out.push_str(&format!("  {key} = {value}\n"));
        }
    }
    out
}

/// Coarse relative time ("3d ago", "just now").
pub fn ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

/// Interpret a command-line value as JSON, falling back to a plain string
/// so `quick set port 8080` stores a number and `quick set env prod` a string.
pub fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Strings print bare, everything else as compact JSON.
pub fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
