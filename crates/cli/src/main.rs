mod config_commands;
mod context_commands;
mod link_commands;
mod output;
mod project_commands;
mod quick_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    ctxswitch_config::Paths,
    ctxswitch_registry::{
        Error as RegistryError, ErrorKind, FileProjectRegistry, ProjectRegistry, RegistryEngine,
    },
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "ctxswitch", about = "Project registry and context switcher", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/ctxswitch/).
    #[arg(long, global = true, env = "CTXSWITCH_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty registry if none exists.
    Init,
    /// Register a project directory.
    Register {
        name: String,
        /// Project root (defaults to the current directory).
        path: Option<PathBuf>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Remove a project from the registry (files are left alone).
    Remove { name: String },
    /// Show a project's metadata.
    Show {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// List registered projects.
    List(project_commands::ListArgs),
    /// Set or clear a project's description.
    Describe {
        name: String,
        /// New description; omit to clear it.
        description: Option<String>,
    },
    /// Print the active project.
    Active {
        #[arg(long)]
        json: bool,
    },
    /// Make a project active.
    Switch { name: String },
    /// Deactivate the current project.
    Clear,
    /// Record that a file inside a project was used.
    Touch {
        path: PathBuf,
        /// Project to record against (defaults to the active project).
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Per-project key/value store.
    Quick {
        #[command(subcommand)]
        action: quick_commands::QuickAction,
    },
    /// Inspect (and optionally repair) the `active` alias.
    Link {
        #[arg(long)]
        fix: bool,
    },
    /// Cool down hot projects that have been idle too long.
    Sweep,
    /// Find the registered project containing a directory.
    Detect {
        /// Directory to look up (defaults to the current directory).
        dir: Option<PathBuf>,
    },
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Logs go to stderr so command output on stdout stays pipeable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(ref dir) = cli.config_dir {
        ctxswitch_config::set_config_dir(dir.clone());
    }
    let paths = Paths::discover()?;
    let config = ctxswitch_config::discover_and_load(paths.root());
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        root = %paths.root().display(),
        "ctxswitch starting"
    );

    let registry = FileProjectRegistry::new(RegistryEngine::new(&paths, &config));

    let result = match cli.command {
        Commands::Init => project_commands::init(&registry, &paths).await,
        Commands::Register {
            name,
            path,
            description,
        } => project_commands::register(&registry, &name, path, description).await,
        Commands::Remove { name } => project_commands::remove(&registry, &name).await,
        Commands::Show { name, json } => project_commands::show(&registry, &name, json).await,
        Commands::List(args) => project_commands::list(&registry, args).await,
        Commands::Describe { name, description } => {
            project_commands::describe(&registry, &name, description).await
        },
        Commands::Active { json } => context_commands::active(&registry, json).await,
        Commands::Switch { name } => context_commands::switch(&registry, &name).await,
        Commands::Clear => context_commands::clear(&registry).await,
        Commands::Touch { path, project } => {
            context_commands::touch(&registry, &path, project).await
        },
        Commands::Quick { action } => quick_commands::handle_quick(&registry, action).await,
        Commands::Link { fix } => link_commands::handle_link(&registry, fix).await,
        Commands::Sweep => project_commands::sweep(&registry).await,
        Commands::Detect { dir } => project_commands::detect(&registry, dir).await,
        Commands::Config { action } => config_commands::handle_config(action, &paths, &config),
    };

    if let Err(err) = result {
        report(&registry, &err).await;
        std::process::exit(1);
    }
    Ok(())
}

async fn report(registry: &dyn ProjectRegistry, err: &anyhow::Error) {
    eprintln!("error: {err:#}");
    let Some(registry_err) = err.downcast_ref::<RegistryError>() else {
        return;
    };
    if let RegistryError::ProjectNotFound { name } = registry_err
        && let Ok(matches) = registry.suggest(name, 3).await
        && !matches.is_empty()
    {
        let names: Vec<_> = matches.iter().map(|m| m.name.as_str()).collect();
        eprintln!("  did you mean: {}", names.join(", "));
    }
    if let Some(hint) = hint(registry_err.kind()) {
        eprintln!("  hint: {hint}");
    }
}

fn hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::RegistryNotFound => Some("run `ctxswitch init` to create the registry"),
        ErrorKind::RegistryCorrupted => {
            Some("fix or move the registry file aside, then run `ctxswitch init`")
        },
        ErrorKind::RegistryLocked => Some(
            "another ctxswitch process is updating the registry; retry, or raise lock.timeout_ms",
        ),
        ErrorKind::ProjectNotFound => Some("see `ctxswitch list` for registered projects"),
        ErrorKind::ProjectExists => Some("pick another name or `ctxswitch remove` the old one"),
        ErrorKind::ActiveProject => Some("run `ctxswitch clear` or switch to another project first"),
        ErrorKind::Symlink => Some("run `ctxswitch link --fix` to repair the alias"),
        ErrorKind::InvalidPath
        | ErrorKind::Validation
        | ErrorKind::Filesystem
        | ErrorKind::Internal => None,
    }
}
