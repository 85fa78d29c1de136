use std::path::{Path, PathBuf};

use {
    anyhow::{Result, bail},
    chrono::Utc,
    ctxswitch_registry::ProjectRegistry,
    tracing::warn,
};

use crate::output;

pub async fn active(registry: &dyn ProjectRegistry, json: bool) -> Result<()> {
    match registry.get_active().await? {
        Some(project) if json => println!("{}", serde_json::to_string_pretty(&project)?),
        Some(project) => print!("{}", output::project_details(&project, Utc::now())),
        None if json => println!("null"),
        None => println!("No active project."),
    }
    Ok(())
}

pub async fn switch(registry: &dyn ProjectRegistry, name: &str) -> Result<()> {
    let switch = registry.set_active(name).await?;
    match switch.previous.as_deref() {
        Some(prev) if prev != switch.project.name => {
            println!("Switched from '{prev}' to '{}'", switch.project.name);
        },
        _ => println!("Active project: '{}'", switch.project.name),
    }
    if let Some(err) = switch.alias_error {
        warn!(error = %err, "active alias was not updated");
        eprintln!("warning: {err} (run `ctxswitch link --fix`)");
    }
    Ok(())
}

pub async fn clear(registry: &dyn ProjectRegistry) -> Result<()> {
    let done = registry.clear_active().await?;
    match done.previous {
        Some(prev) => println!("Deactivated '{prev}'"),
        None => println!("No active project."),
    }
    if let Some(err) = done.alias_error {
        eprintln!("warning: {err} (run `ctxswitch link --fix`)");
    }
    Ok(())
}

pub async fn touch(
    registry: &dyn ProjectRegistry,
    path: &Path,
    project: Option<String>,
) -> Result<()> {
    let name = match project {
        Some(name) => name,
        None => match registry.get_active().await? {
            Some(active) => active.name,
            None => bail!("no active project; pass --project"),
        },
    };
    let path: PathBuf = if path.is_relative() && path.exists() {
        std::env::current_dir()?.join(path)
    } else {
        path.to_path_buf()
    };
    let paths = registry.record_file_access(&name, &path).await?;
    if let Some(first) = paths.first() {
        println!("{name}: {first}");
    }
    Ok(())
}
