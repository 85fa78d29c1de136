//! CLI commands for the per-project quick-access store.

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    ctxswitch_registry::ProjectRegistry,
};

use crate::output;

#[derive(Subcommand)]
pub enum QuickAction {
    /// Store a value. Valid JSON is stored as-is, anything else as a string.
    Set {
        key: String,
        value: String,
        /// Project (defaults to the active project).
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Print a value.
    Get {
        key: String,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Delete a key.
    Delete {
        key: String,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Print every key.
    List {
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

async fn target(registry: &dyn ProjectRegistry, project: Option<String>) -> Result<String> {
    if let Some(name) = project {
        return Ok(name);
    }
    match registry.get_active().await? {
        Some(active) => Ok(active.name),
        None => bail!("no active project; pass --project"),
    }
}

pub async fn handle_quick(registry: &dyn ProjectRegistry, action: QuickAction) -> Result<()> {
    match action {
        QuickAction::Set {
            key,
            value,
            project,
        } => {
            let name = target(registry, project).await?;
            registry
                .set_quick_access(&name, &key, output::parse_value(&value))
                .await?;
            println!("{name}: set {key}");
        },
        QuickAction::Get { key, project } => {
            let name = target(registry, project).await?;
            match registry.get_quick_access(&name, &key).await? {
                Some(value) => println!("{}", output::render_value(&value)),
                None => bail!("no key `{key}` in project `{name}`"),
            }
        },
        QuickAction::Delete { key, project } => {
            let name = target(registry, project).await?;
            if registry.delete_quick_access(&name, &key).await? {
                println!("{name}: deleted {key}");
            } else {
                println!("{name}: no key {key}");
            }
        },
        QuickAction::List { project, json } => {
            let name = target(registry, project).await?;
            let entries = registry.get(&name).await?.quick_access;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No quick-access entries for '{name}'.");
            } else {
                for (key, value) in &entries {
                    println!("{key} = {}", output::render_value(value));
                }
            }
        },
    }
    Ok(())
}
