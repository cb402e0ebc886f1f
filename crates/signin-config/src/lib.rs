//! Configuration for the sign-in client.
//!
//! TOML config with an `[oauth]` table, layered from the user config
//! directory and a project-local `signin.toml`, with `SIGNIN_*`
//! environment overrides on top.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    load_explicit, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
