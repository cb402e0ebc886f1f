//! CLI command handlers.

use std::path::PathBuf;

use anyhow::Result;
use signin_config::LoadedConfig;

pub mod authorize_url;
pub mod config;
pub mod login;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file, bypassing discovery.
    pub config_path: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load configuration from `--config` or by discovery.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let loaded = match &self.config_path {
            Some(path) => signin_config::load_explicit(path)?,
            None => signin_config::load_config(None)?,
        };
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        Ok(loaded)
    }
}
