use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{Context, Error, Result},
    schema::CtxswitchConfig,
};

/// Config file names checked in order inside the config root.
const CONFIG_FILENAMES: &[&str] = &[
    "ctxswitch.toml",
    "ctxswitch.yaml",
    "ctxswitch.yml",
    "ctxswitch.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<CtxswitchConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_config(&raw, path)
}

/// First existing config file under `root`.
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.is_file())
}

/// Load the config under `root`, falling back to defaults.
///
/// A missing file is normal; an unreadable or malformed one is logged and
/// ignored so a typo in the tunables never locks users out of the registry.
pub fn discover_and_load(root: &Path) -> CtxswitchConfig {
    let Some(path) = find_config_file(root) else {
        debug!(root = %root.display(), "no config file found, using defaults");
        return CtxswitchConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            CtxswitchConfig::default()
        },
    }
}

/// Render the effective config as TOML.
pub fn render_config(config: &CtxswitchConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| Error::parse("toml", e))
}

fn parse_config(raw: &str, path: &Path) -> Result<CtxswitchConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse("toml", e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse("yaml", e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse("json", e)),
        _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
    }
}
