//! Hot/cold lifecycle.
//!
//! Switching into a project makes it hot and the previously active one
//! cold. A sweep cools idle non-active projects. Nothing else changes the
//! status; a cold project only warms up by being switched to.

use std::time::Duration;

use {
    chrono::{DateTime, Utc},
    tracing::debug,
};

use crate::{
    error::Result,
    types::{CacheStatus, Registry},
};

/// Make `name` the active, hot project. Returns the previously active
/// project name, if any.
pub fn activate(registry: &mut Registry, name: &str, now: DateTime<Utc>) -> Result<Option<String>> {
    let target = registry.project_mut(name)?;
    target.cache_status = CacheStatus::Hot;
    target.last_active = now.max(target.created_at);
    target.touch(now);

    let previous = registry.active_project.replace(name.to_string());
    if let Some(prev) = previous.as_deref()
        && prev != name
        && let Some(project) = registry.projects.get_mut(prev)
    {
        project.cache_status = CacheStatus::Cold;
        project.touch(now);
    }
    Ok(previous)
}

/// Clear the active pointer, cooling the project it named.
pub fn deactivate(registry: &mut Registry, now: DateTime<Utc>) -> Option<String> {
    let previous = registry.active_project.take()?;
    if let Some(project) = registry.projects.get_mut(&previous) {
        project.cache_status = CacheStatus::Cold;
        project.touch(now);
    }
    Some(previous)
}

/// Cool every non-active hot project idle for longer than `inactivity`.
/// Returns the names that changed.
pub fn sweep(registry: &mut Registry, now: DateTime<Utc>, inactivity: Duration) -> Vec<String> {
    let active = registry.active_project.clone();
    let mut cooled = Vec::new();
    for (name, project) in registry.projects.iter_mut() {
        if active.as_deref() == Some(name.as_str()) || !project.is_hot() {
            continue;
        }
        let idle = (now - project.last_active).to_std().unwrap_or_default();
        if idle > inactivity {
            debug!(project = %name, idle_secs = idle.as_secs(), "cooling idle project");
            project.cache_status = CacheStatus::Cold;
            project.touch(now);
            cooled.push(name.clone());
        }
    }
    cooled
}
