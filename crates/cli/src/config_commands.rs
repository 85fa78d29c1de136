use {
    anyhow::Result,
    clap::Subcommand,
    ctxswitch_config::{CtxswitchConfig, Paths},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the files ctxswitch reads and writes.
    Paths,
    /// Load the config file strictly and report parse errors.
    Check,
}

pub fn handle_config(action: ConfigAction, paths: &Paths, config: &CtxswitchConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", ctxswitch_config::render_config(config)?);
        },
        ConfigAction::Paths => {
            let file = ctxswitch_config::find_config_file(paths.root());
            println!("root:     {}", paths.root().display());
            println!("registry: {}", paths.registry().display());
            println!("lock:     {}", paths.lock().display());
            println!("alias:    {}", paths.active_link().display());
            match file {
                Some(f) => println!("config:   {}", f.display()),
                None => println!("config:   (none, using defaults)"),
            }
        },
        ConfigAction::Check => check(paths)?,
    }
    Ok(())
}

/// `discover_and_load` swallows errors; this surfaces them.
fn check(paths: &Paths) -> Result<()> {
    let Some(file) = ctxswitch_config::find_config_file(paths.root()) else {
        eprintln!("No config file found; using defaults.");
        return Ok(());
    };
    eprintln!("Checking {}", file.display());
    if let Err(e) = ctxswitch_config::load_config(&file) {
        eprintln!("  error: {e}");
        std::process::exit(1);
    }
    eprintln!("No issues found.");
    Ok(())
}
