//! Forecast-to-dashboard adapter
//!
//! Fetches a forecast, checks it has as many days as were requested, formats
//! every value and hands the result to the dashboard.

use tracing::{info, instrument};

use crate::data::{Forecast, ForecastClient, ForecastRequest, WeatherError};
use crate::format::{
    trimmed, unrounded, with_unit, CELSIUS, DEGREES, KMH, MILLIMETRES, TEMPERATURE_PLACES,
    WIND_PLACES,
};
use crate::presentation::{CurrentReadings, DailyReadings, Dashboard, ForecastUpdate};

/// Fetches forecasts for one location and turns them into dashboard updates
#[derive(Debug, Clone)]
pub struct WeatherAdapter {
    client: ForecastClient,
    request: ForecastRequest,
}

impl WeatherAdapter {
    pub fn new(client: ForecastClient, request: ForecastRequest) -> Self {
        Self { client, request }
    }

    /// Number of forecast days requested
    pub fn horizon(&self) -> usize {
        usize::from(self.request.forecast_days)
    }

    /// Fetches and formats one update without touching any dashboard
    #[instrument(skip(self), fields(days = self.request.forecast_days))]
    pub async fn fetch_update(&self) -> Result<ForecastUpdate, WeatherError> {
        let forecast = self.client.fetch_forecast(&self.request).await?;
        build_update(&forecast, self.horizon())
    }

    /// Fetches, formats and writes the result into `dashboard`
    ///
    /// On error the dashboard keeps whatever it showed before.
    pub async fn fetch_and_apply(&self, dashboard: &mut Dashboard) -> Result<(), WeatherError> {
        let update = self.fetch_update().await?;
        dashboard.apply_update(&update)?;
        info!(days = dashboard.horizon(), "Dashboard updated");
        Ok(())
    }
}

/// Formats the first `horizon` days of `forecast`
///
/// Fails with [`WeatherError::ResponseShape`] if any daily series, dates
/// included, is shorter than `horizon`.
pub fn build_update(forecast: &Forecast, horizon: usize) -> Result<ForecastUpdate, WeatherError> {
    let daily = &forecast.daily;

    if daily.dates.len() < horizon {
        return Err(WeatherError::ResponseShape(format!(
            "expected {} dates, got {}",
            horizon,
            daily.dates.len()
        )));
    }
    for (field, values) in daily.named_series() {
        if values.len() < horizon {
            return Err(WeatherError::ResponseShape(format!(
                "expected {} values for {}, got {}",
                horizon,
                field,
                values.len()
            )));
        }
    }

    let daily_strings = |values: &[f64]| -> Vec<String> {
        values
            .iter()
            .take(horizon)
            .map(|v| trimmed(*v, TEMPERATURE_PLACES))
            .collect()
    };

    Ok(ForecastUpdate {
        current: format_current(forecast),
        daily: DailyReadings {
            dates: daily.dates.iter().take(horizon).copied().collect(),
            temperature_max: daily_strings(&daily.temperature_max),
            temperature_min: daily_strings(&daily.temperature_min),
            apparent_max: daily_strings(&daily.apparent_max),
            apparent_min: daily_strings(&daily.apparent_min),
        },
        fetched_at: forecast.fetched_at,
    })
}

/// Temperatures to 2 places, wind to 3, precipitation as reported
fn format_current(forecast: &Forecast) -> CurrentReadings {
    let current = &forecast.current;
    CurrentReadings {
        temperature: with_unit(&trimmed(current.temperature, TEMPERATURE_PLACES), CELSIUS),
        apparent_temperature: with_unit(
            &trimmed(current.apparent_temperature, TEMPERATURE_PLACES),
            CELSIUS,
        ),
        precipitation: with_unit(&unrounded(current.precipitation), MILLIMETRES),
        wind_speed: with_unit(&trimmed(current.wind_speed, WIND_PLACES), KMH),
        wind_direction: with_unit(&trimmed(current.wind_direction, WIND_PLACES), DEGREES),
    }
}
