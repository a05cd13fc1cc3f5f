//! Open-Meteo forecast client
//!
//! Fetches current conditions and daily forecast arrays from the Open-Meteo
//! API. Responses are cached on disk for a configurable TTL, and transient
//! failures are retried with exponential backoff.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::{nullable_series, CurrentConditions, DailySeries, Forecast, CURRENT_FIELDS, DAILY_FIELDS};
use crate::cache::CacheManager;
use crate::presentation::RenderError;

/// Base URL for the Open-Meteo forecast endpoint
pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Default time-to-live for cached forecast responses in minutes
pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 60;

/// Errors that can occur when fetching and displaying forecast data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Network, DNS or timeout failure
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Forecast API returned HTTP {0}")]
    HttpStatus(StatusCode),

    /// The body is not JSON of the expected schema
    #[error("Failed to parse forecast response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// The response has fewer or inconsistent elements than requested
    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    /// The dashboard rejected the update
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Broad failure categories used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The API could not be reached or refused the request
    Transport,
    /// The API answered, but not with what was asked for
    ResponseShape,
    /// The formatted values did not fit the dashboard layout
    Render,
}

impl WeatherError {
    /// Returns the failure category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Transport(_) | WeatherError::HttpStatus(_) => ErrorKind::Transport,
            WeatherError::MalformedResponse(_) | WeatherError::ResponseShape(_) => {
                ErrorKind::ResponseShape
            }
            WeatherError::Render(_) => ErrorKind::Render,
        }
    }
}

/// Parameters of one forecast request
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA timezone name, or "auto"
    pub timezone: String,
    /// Number of forecast days, today included
    pub forecast_days: u8,
}

impl ForecastRequest {
    /// Query parameters in the order the API documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("current", CURRENT_FIELDS.join(",")),
            ("daily", DAILY_FIELDS.join(",")),
            ("timezone", self.timezone.clone()),
            ("forecast_days", self.forecast_days.to_string()),
        ]
    }

    /// File-name-safe cache key for this request
    pub fn cache_key(&self) -> String {
        CacheManager::key(&[
            "forecast",
            &self.latitude.to_string(),
            &self.longitude.to_string(),
            &self.timezone,
            &self.forecast_days.to_string(),
        ])
    }

    /// Canonical query string stored with cached responses
    pub fn cache_identity(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    /// Base of the exponential backoff in seconds
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff_factor: 0.0,
        }
    }

    /// Delay before retry number `attempt` (0-based): `backoff_factor * 2^attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2f64.powi(exponent);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs.min(60.0))
        } else {
            Duration::ZERO
        }
    }
}

/// Whether a status is worth retrying
fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Client for fetching forecasts from the Open-Meteo API
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    cache: Option<CacheManager>,
    cache_ttl_minutes: u64,
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastClient {
    /// Create a new ForecastClient with default settings and no cache
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a new ForecastClient with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: OPEN_METEO_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            cache: None,
            cache_ttl_minutes: DEFAULT_CACHE_TTL_MINUTES,
        }
    }

    /// Create a new ForecastClient whose requests time out after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Point the client at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable the on-disk response cache
    pub fn with_cache(mut self, cache: CacheManager, ttl_minutes: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl_minutes = ttl_minutes;
        self
    }

    /// Fetch the forecast described by `request`
    ///
    /// # Behavior
    /// - A fresh cache entry is returned without touching the network
    /// - Otherwise the API is queried, retrying transient failures
    /// - On failure, an expired cache entry is returned if one exists
    ///
    /// # Returns
    /// * `Ok(Forecast)` - Parsed forecast data
    /// * `Err(WeatherError)` - If every attempt fails and nothing is cached
    #[instrument(skip(self, request), fields(lat = %request.latitude, lon = %request.longitude, days = request.forecast_days))]
    pub async fn fetch_forecast(&self, request: &ForecastRequest) -> Result<Forecast, WeatherError> {
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.read(request) {
                if !cached.is_expired {
                    debug!(cached_at = %cached.cached_at, "Serving forecast from cache");
                    return Ok(cached.forecast);
                }
            }
        }

        match self.fetch_from_api(request).await {
            Ok(forecast) => {
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.write(request, &forecast, self.cache_ttl_minutes) {
                        warn!(error = %e, "Failed to write forecast cache");
                    }
                }
                Ok(forecast)
            }
            Err(api_error) => {
                if let Some(ref cache) = self.cache {
                    if let Some(cached) = cache.read(request) {
                        warn!(
                            error = %api_error,
                            cached_at = %cached.cached_at,
                            "Forecast fetch failed, using expired cache entry"
                        );
                        return Ok(cached.forecast);
                    }
                }
                Err(api_error)
            }
        }
    }

    /// Queries the API, retrying transport errors and retryable statuses
    async fn fetch_from_api(&self, request: &ForecastRequest) -> Result<Forecast, WeatherError> {
        let query = request.query_pairs();
        let mut attempt = 0;

        loop {
            debug!(url = %self.base_url, attempt, "Requesting forecast");

            let error = match self.client.get(&self.base_url).query(&query).send().await {
                Ok(response) if response.status().is_success() => {
                    let text = response.text().await?;
                    let api_response: OpenMeteoResponse = serde_json::from_str(&text)?;
                    return parse_response(api_response);
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable(status) {
                        return Err(WeatherError::HttpStatus(status));
                    }
                    WeatherError::HttpStatus(status)
                }
                Err(e) => WeatherError::Transport(e),
            };

            if attempt >= self.retry.retries {
                return Err(error);
            }

            let delay = self.retry.delay(attempt);
            warn!(error = %error, attempt, delay_ms = delay.as_millis() as u64, "Forecast request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Convert the raw API response into a Forecast
fn parse_response(response: OpenMeteoResponse) -> Result<Forecast, WeatherError> {
    let current = response.current;
    let daily = response.daily;

    let len = daily.time.len();

    // All daily arrays must line up with the date sequence
    if daily.temperature_2m_max.len() != len
        || daily.temperature_2m_min.len() != len
        || daily.apparent_temperature_max.len() != len
        || daily.apparent_temperature_min.len() != len
    {
        return Err(WeatherError::ResponseShape(
            "daily arrays have inconsistent lengths".to_string(),
        ));
    }

    Ok(Forecast {
        current: CurrentConditions {
            temperature: current.temperature_2m,
            apparent_temperature: current.apparent_temperature,
            precipitation: current.precipitation,
            wind_speed: current.wind_speed_10m,
            wind_direction: current.wind_direction_10m,
        },
        daily: DailySeries {
            dates: daily.time,
            temperature_max: daily.temperature_2m_max,
            temperature_min: daily.temperature_2m_min,
            apparent_max: daily.apparent_temperature_max,
            apparent_min: daily.apparent_temperature_min,
        },
        fetched_at: Utc::now(),
    })
}

/// Open-Meteo API response structure
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: CurrentWeather,
    daily: DailyWeather,
}

/// Current weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    apparent_temperature: f64,
    precipitation: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
}

/// Daily weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct DailyWeather {
    time: Vec<NaiveDate>,
    #[serde(deserialize_with = "nullable_series")]
    temperature_2m_max: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    temperature_2m_min: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    apparent_temperature_max: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    apparent_temperature_min: Vec<f64>,
}
