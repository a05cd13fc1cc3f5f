//! Command-line interface parsing for wxpanel
//!
//! This module handles parsing of CLI arguments using clap. Flags override the
//! values loaded from the config file.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::{AppConfig, ConfigError};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The config file could not be loaded or the result is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// wxpanel - current conditions and a multi-day forecast in your terminal
#[derive(Parser, Debug)]
#[command(name = "wxpanel")]
#[command(about = "Current weather and daily forecast from Open-Meteo")]
#[command(version)]
pub struct Cli {
    /// Latitude of the location in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude of the location in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Timezone for daily boundaries, e.g. "Europe/Berlin" or "auto"
    #[arg(long)]
    pub timezone: Option<String>,

    /// Number of forecast days to show (0-16)
    #[arg(long)]
    pub days: Option<u8>,

    /// Day cards per row before wrapping
    #[arg(long)]
    pub columns: Option<usize>,

    /// Minutes between automatic refreshes (0 disables)
    #[arg(long, value_name = "MINUTES")]
    pub refresh_minutes: Option<u64>,

    /// Forecast endpoint to query instead of the public API
    #[arg(long, value_name = "URL", hide = true)]
    pub base_url: Option<String>,

    /// Path to a TOML config file
    ///
    /// Defaults to the platform config directory, e.g.
    /// ~/.config/wxpanel/config.toml on Linux.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Always query the API instead of using cached responses
    #[arg(long)]
    pub no_cache: bool,

    /// Fetch once, print the forecast as plain text and exit
    #[arg(long)]
    pub once: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// Effective settings after file and flag merging
    pub config: AppConfig,
    /// Print once instead of starting the terminal UI
    pub once: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            once: false,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// Loads the config file (explicit `--config`, or the default path if it
    /// exists), applies flag overrides, then validates the result.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the merged settings
    /// * `Err(CliError)` if the file is unreadable or a value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let base = AppConfig::load(cli.config.as_deref())?;
        Self::from_cli_with_base(cli, base)
    }

    /// Applies flag overrides on top of an already loaded config
    pub fn from_cli_with_base(cli: &Cli, mut config: AppConfig) -> Result<Self, CliError> {
        if let Some(latitude) = cli.latitude {
            config.latitude = latitude;
        }
        if let Some(longitude) = cli.longitude {
            config.longitude = longitude;
        }
        if let Some(ref timezone) = cli.timezone {
            config.timezone = timezone.clone();
        }
        if let Some(days) = cli.days {
            config.forecast_days = days;
        }
        if let Some(columns) = cli.columns {
            config.columns = columns;
        }
        if let Some(minutes) = cli.refresh_minutes {
            config.refresh_minutes = minutes;
        }
        if let Some(ref base_url) = cli.base_url {
            config.base_url = base_url.clone();
        }
        if cli.no_cache {
            config.cache = false;
        }

        config.validate()?;

        Ok(StartupConfig {
            config,
            once: cli.once,
        })
    }
}
