//! Registration, listing and lookup commands.

use std::path::PathBuf;

use {
    anyhow::{Context, Result},
    chrono::Utc,
    clap::Args,
    ctxswitch_config::Paths,
    ctxswitch_registry::{CacheStatus, ListFilter, ListSort, ProjectRegistry},
};

use crate::output;

#[derive(Args)]
pub struct ListArgs {
    /// Only hot projects.
    #[arg(long, conflicts_with = "cold")]
    hot: bool,
    /// Only cold projects.
    #[arg(long)]
    cold: bool,
    /// Only names containing this substring (case-insensitive).
    #[arg(long)]
    name: Option<String>,
    /// Sort order: name, recent or created.
    #[arg(long, default_value = "name")]
    sort: ListSort,
    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

impl ListArgs {
    pub fn into_filter(self) -> ListFilter {
        let cache_status = match (self.hot, self.cold) {
            (true, _) => Some(CacheStatus::Hot),
            (_, true) => Some(CacheStatus::Cold),
            _ => None,
        };
        ListFilter {
            cache_status,
            name_contains: self.name,
            sort: self.sort,
        }
    }
}

fn current_dir_or(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(p) if p.is_absolute() => Ok(p),
        Some(p) => Ok(std::env::current_dir()?.join(p)),
        None => std::env::current_dir().context("failed to read current directory"),
    }
}

pub async fn init(registry: &dyn ProjectRegistry, paths: &Paths) -> Result<()> {
    if registry.init().await? {
        println!("Created registry at {}", paths.registry().display());
    } else {
        println!("Registry already exists at {}", paths.registry().display());
    }
    Ok(())
}

pub async fn register(
    registry: &dyn ProjectRegistry,
    name: &str,
    path: Option<PathBuf>,
    description: Option<String>,
) -> Result<()> {
    let path = current_dir_or(path)?;
    let project = registry.register(name, &path, description).await?;
    println!(
        "Registered '{}' at {}",
        project.name,
        project.path.display()
    );
    Ok(())
}

pub async fn remove(registry: &dyn ProjectRegistry, name: &str) -> Result<()> {
    let project = registry.remove(name).await?;
    println!(
        "Removed '{}' ({} left untouched)",
        project.name,
        project.path.display()
    );
    Ok(())
}

pub async fn show(registry: &dyn ProjectRegistry, name: &str, json: bool) -> Result<()> {
    let project = registry.get(name).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        print!("{}", output::project_details(&project, Utc::now()));
    }
    Ok(())
}

pub async fn list(registry: &dyn ProjectRegistry, args: ListArgs) -> Result<()> {
    let json = args.json;
    let projects = registry.list(args.into_filter()).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }
    for project in &projects {
        println!("{}", output::project_line(project));
    }
    Ok(())
}

pub async fn describe(
    registry: &dyn ProjectRegistry,
    name: &str,
    description: Option<String>,
) -> Result<()> {
    let cleared = description.is_none();
    registry.set_description(name, description).await?;
    if cleared {
        println!("Cleared description of '{name}'");
    } else {
        println!("Updated description of '{name}'");
    }
    Ok(())
}

pub async fn sweep(registry: &dyn ProjectRegistry) -> Result<()> {
    let cooled = registry.sweep().await?;
    if cooled.is_empty() {
        println!("Nothing to cool down.");
    } else {
        for name in &cooled {
            println!("Cooled '{name}'");
        }
    }
    Ok(())
}

pub async fn detect(registry: &dyn ProjectRegistry, dir: Option<PathBuf>) -> Result<()> {
    let dir = current_dir_or(dir)?;
    match registry.detect(&dir).await? {
        Some(project) => println!("{}", project.name),
        None => {
            eprintln!("{} is not inside a registered project", dir.display());
            std::process::exit(2);
        },
    }
    Ok(())
}
