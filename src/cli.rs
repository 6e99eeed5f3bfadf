//! Command-line interface parsing for NPS Explorer
//!
//! This module handles parsing of CLI arguments using clap. The only required
//! setting is the MapQuest API key, which is normally supplied through the
//! `MAPQUEST_API_KEY` environment variable so it never lands in shell history.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::default_cache_path;

/// Environment variable holding the MapQuest API key
pub const API_KEY_ENV: &str = "MAPQUEST_API_KEY";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The API key was supplied but blank
    #[error("MapQuest API key is empty; set MAPQUEST_API_KEY or pass --api-key")]
    EmptyApiKey,
}

/// NPS Explorer - Browse national park sites and find places nearby
#[derive(Parser, Debug)]
#[command(name = "npsexplorer")]
#[command(about = "Browse National Park Service sites by state and find places nearby")]
#[command(version)]
pub struct Cli {
    /// MapQuest API key used for nearby-place searches
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, value_name = "KEY")]
    pub api_key: String,

    /// Location of the request cache file
    ///
    /// Defaults to cache.json in the platform cache directory
    /// (~/.cache/npsexplorer/ on Linux).
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// MapQuest credential
    pub api_key: String,
    /// Where the request cache lives
    pub cache_path: PathBuf,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with defaults filled in
    /// * `Err(CliError)` if the API key is blank
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_key = cli.api_key.trim();
        if api_key.is_empty() {
            return Err(CliError::EmptyApiKey);
        }

        Ok(StartupConfig {
            api_key: api_key.to_string(),
            cache_path: cli.cache_file.clone().unwrap_or_else(default_cache_path),
        })
    }
}
