//! Application configuration
//!
//! Settings come from an optional TOML file and are then overridden by CLI
//! flags. Every field has a default, so an empty or missing file is valid.
//!
//! Example `config.toml`:
//!
//! ```toml
//! latitude = 48.85
//! longitude = 2.35
//! timezone = "Europe/Paris"
//! forecast_days = 8
//! columns = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::forecast::{DEFAULT_CACHE_TTL_MINUTES, OPEN_METEO_BASE_URL};
use crate::data::{ForecastRequest, RetryPolicy};
use crate::presentation::{DashboardConfig, LayoutPolicy};

/// Largest horizon the forecast API serves
pub const MAX_FORECAST_DAYS: u8 = 16;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid latitude {0}: must be between -90 and 90")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}: must be between -180 and 180")]
    InvalidLongitude(f64),

    #[error("Invalid forecast days {0}: must be between 0 and 16")]
    InvalidForecastDays(u8),

    #[error("Invalid columns: at least one day card per row is required")]
    ZeroColumns,

    #[error("Timezone must not be empty")]
    EmptyTimezone,

    #[error("Invalid timeout: requests need at least one second")]
    ZeroTimeout,
}

/// All user-adjustable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA timezone name, or "auto" to let the API pick
    pub timezone: String,
    /// Number of forecast days (and day cards)
    pub forecast_days: u8,
    /// Day cards per row before wrapping
    pub columns: usize,
    /// Minutes between automatic refreshes, 0 disables
    pub refresh_minutes: u64,
    /// Forecast endpoint
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a failed request
    pub retries: u32,
    /// Backoff base in seconds
    pub backoff_factor: f64,
    /// Whether responses are cached on disk
    pub cache: bool,
    /// Cache freshness in minutes
    pub cache_ttl_minutes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            latitude: 52.52,
            longitude: 13.41,
            timezone: "Europe/Berlin".to_string(),
            forecast_days: 14,
            columns: LayoutPolicy::default().columns,
            refresh_minutes: 30,
            base_url: OPEN_METEO_BASE_URL.to_string(),
            timeout_secs: 30,
            retries: RetryPolicy::default().retries,
            backoff_factor: RetryPolicy::default().backoff_factor,
            cache: true,
            cache_ttl_minutes: DEFAULT_CACHE_TTL_MINUTES,
        }
    }
}

impl AppConfig {
    /// Default location of the config file (`~/.config/wxpanel/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "wxpanel")?;
        Some(dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration
    ///
    /// With an explicit `path` the file must exist. Without one, the default
    /// path is tried and defaults are used if no file is there.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reads and parses a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks ranges the API and the layout depend on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::InvalidLatitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::InvalidLongitude(self.longitude));
        }
        if self.forecast_days > MAX_FORECAST_DAYS {
            return Err(ConfigError::InvalidForecastDays(self.forecast_days));
        }
        if self.columns == 0 {
            return Err(ConfigError::ZeroColumns);
        }
        if self.timezone.trim().is_empty() {
            return Err(ConfigError::EmptyTimezone);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Layout for the dashboard
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            horizon: usize::from(self.forecast_days),
            layout: LayoutPolicy {
                columns: self.columns,
            },
        }
    }

    /// The request issued on every fetch
    pub fn forecast_request(&self) -> ForecastRequest {
        ForecastRequest {
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone.clone(),
            forecast_days: self.forecast_days,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff_factor: self.backoff_factor,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Auto-refresh interval, `None` when disabled
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_minutes > 0).then(|| Duration::from_secs(self.refresh_minutes.saturating_mul(60)))
    }

    /// Short "lat, lon (timezone)" label for headers
    pub fn location_label(&self) -> String {
        format!(
            "{:.2}, {:.2} ({})",
            self.latitude, self.longitude, self.timezone
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.forecast_days, 14);
        assert_eq!(config.columns, 7);
        assert_eq!(config.retries, 5);
        assert!((config.backoff_factor - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.cache_ttl_minutes, 60);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            latitude = 48.85
            longitude = 2.35
            timezone = "Europe/Paris"
            forecast_days = 8
            "#,
        )
        .expect("Failed to parse");

        assert!((config.latitude - 48.85).abs() < 0.0001);
        assert_eq!(config.timezone, "Europe/Paris");
        assert_eq!(config.forecast_days, 8);
        assert_eq!(config.columns, 7);
        assert_eq!(config.base_url, OPEN_METEO_BASE_URL);
    }

    #[test]
    fn test_from_file_reads_toml() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, "columns = 4\nrefresh_minutes = 0\n").unwrap();

        let config = AppConfig::load(Some(&path)).expect("Should load");
        assert_eq!(config.columns, 4);
        assert!(config.refresh_interval().is_none());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("nope.toml");

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, "forecast_days = \"many\"").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = AppConfig::default();
        config.latitude = 91.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLatitude(_))));

        let mut config = AppConfig::default();
        config.longitude = -180.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLongitude(_))));

        let mut config = AppConfig::default();
        config.forecast_days = 17;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidForecastDays(17))));

        let mut config = AppConfig::default();
        config.columns = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroColumns)));

        let mut config = AppConfig::default();
        config.timezone = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTimezone)));
    }

    #[test]
    fn test_zero_timeout_from_file_is_rejected() {
        let config: AppConfig = toml::from_str("timeout_secs = 0").expect("Should parse");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_zero_days_is_valid() {
        let mut config = AppConfig::default();
        config.forecast_days = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.dashboard_config().horizon, 0);
    }

    #[test]
    fn test_derived_settings() {
        let config = AppConfig::default();

        let request = config.forecast_request();
        assert_eq!(request.forecast_days, 14);
        assert_eq!(request.timezone, "Europe/Berlin");

        let dashboard = config.dashboard_config();
        assert_eq!(dashboard.horizon, 14);
        assert_eq!(dashboard.layout.columns, 7);

        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(1800)));
        assert_eq!(config.location_label(), "52.52, 13.41 (Europe/Berlin)");
    }
}
