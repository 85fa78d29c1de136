//! Per-project key/value sidecar.

use chrono::{DateTime, Utc};

use crate::types::ProjectMetadata;

pub fn set(project: &mut ProjectMetadata, key: &str, value: serde_json::Value, now: DateTime<Utc>) {
    project.quick_access.insert(key.to_string(), value);
    project.touch(now);
}

pub fn get<'a>(project: &'a ProjectMetadata, key: &str) -> Option<&'a serde_json::Value> {
    project.quick_access.get(key)
}

/// Remove `key`. Returns whether it was present; absent keys are fine.
pub fn delete(project: &mut ProjectMetadata, key: &str, now: DateTime<Utc>) -> bool {
    let removed = project.quick_access.remove(key).is_some();
    if removed {
        project.touch(now);
    }
    removed
}
