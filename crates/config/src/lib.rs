//! Configuration root resolution and engine tunables.
//!
//! The config root holds the registry document, its lock marker, the
//! active-project alias and an optional `ctxswitch.{toml,yaml,yml,json}`.
//! It resolves from a programmatic override, then `CTXSWITCH_CONFIG_DIR`,
//! then `~/.config/ctxswitch/`.

pub mod error;
pub mod loader;
pub mod paths;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{discover_and_load, find_config_file, load_config, render_config},
    paths::{
        CONFIG_DIR_ENV, Paths, clear_config_dir, config_dir, resolve_config_dir, set_config_dir,
    },
    schema::{CacheConfig, CtxswitchConfig, LockConfig, RegistryConfig},
};
