//! Core data models for wxpanel
//!
//! This module contains the raw forecast values as decoded from the Open-Meteo
//! API, before any rounding or formatting is applied.

pub mod forecast;

pub use forecast::{ErrorKind, ForecastClient, ForecastRequest, RetryPolicy, WeatherError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Current-weather variables requested from the API, in request order
pub const CURRENT_FIELDS: [&str; 5] = [
    "temperature_2m",
    "apparent_temperature",
    "precipitation",
    "wind_speed_10m",
    "wind_direction_10m",
];

/// Daily variables requested from the API, in request order
pub const DAILY_FIELDS: [&str; 4] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "apparent_temperature_max",
    "apparent_temperature_min",
];

/// Current conditions at the configured location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Air temperature at 2m in Celsius
    pub temperature: f64,
    /// Feels-like temperature in Celsius
    pub apparent_temperature: f64,
    /// Precipitation in mm over the preceding interval
    pub precipitation: f64,
    /// Wind speed at 10m in km/h
    pub wind_speed: f64,
    /// Wind direction at 10m in degrees
    pub wind_direction: f64,
}

/// Daily forecast arrays, element `i` belonging to day offset `i`
///
/// Missing values (JSON `null`) are decoded as NaN so that one gap does not
/// discard the whole series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    /// Calendar dates as returned by the API
    pub dates: Vec<NaiveDate>,
    /// Daily maximum temperature in Celsius
    #[serde(deserialize_with = "nullable_series")]
    pub temperature_max: Vec<f64>,
    /// Daily minimum temperature in Celsius
    #[serde(deserialize_with = "nullable_series")]
    pub temperature_min: Vec<f64>,
    /// Daily maximum apparent temperature in Celsius
    #[serde(deserialize_with = "nullable_series")]
    pub apparent_max: Vec<f64>,
    /// Daily minimum apparent temperature in Celsius
    #[serde(deserialize_with = "nullable_series")]
    pub apparent_min: Vec<f64>,
}

impl DailySeries {
    /// Returns each value series paired with its API field name
    pub fn named_series(&self) -> [(&'static str, &[f64]); 4] {
        [
            (DAILY_FIELDS[0], &self.temperature_max),
            (DAILY_FIELDS[1], &self.temperature_min),
            (DAILY_FIELDS[2], &self.apparent_max),
            (DAILY_FIELDS[3], &self.apparent_min),
        ]
    }
}

/// A complete forecast response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Current conditions
    pub current: CurrentConditions,
    /// Daily forecast series
    pub daily: DailySeries,
    /// When this data was fetched from the API
    pub fetched_at: DateTime<Utc>,
}

/// Decodes an array of nullable numbers, mapping `null` to NaN
pub(crate) fn nullable_series<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(len: usize) -> DailySeries {
        DailySeries {
            dates: (0..len)
                .map(|i| NaiveDate::from_ymd_opt(2024, 7, 15 + i as u32).unwrap())
                .collect(),
            temperature_max: vec![20.0; len],
            temperature_min: vec![10.0; len],
            apparent_max: vec![21.0; len],
            apparent_min: vec![9.0; len],
        }
    }

    #[test]
    fn test_named_series_follows_request_order() {
        let daily = series(2);
        let names: Vec<&str> = daily.named_series().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, DAILY_FIELDS.to_vec());
    }

    #[test]
    fn test_nulls_decode_as_nan() {
        let json = r#"{
            "dates": ["2024-07-15", "2024-07-16"],
            "temperature_max": [21.5, null],
            "temperature_min": [11.0, 12.0],
            "apparent_max": [22.0, 23.0],
            "apparent_min": [10.0, null]
        }"#;

        let daily: DailySeries = serde_json::from_str(json).expect("Failed to parse series");

        assert!((daily.temperature_max[0] - 21.5).abs() < 0.001);
        assert!(daily.temperature_max[1].is_nan());
        assert!(daily.apparent_min[1].is_nan());
        assert_eq!(daily.dates[1], NaiveDate::from_ymd_opt(2024, 7, 16).unwrap());
    }

    #[test]
    fn test_forecast_survives_cache_encoding_with_gaps() {
        // serde_json writes NaN as null, which must read back
        let mut daily = series(2);
        daily.temperature_min[1] = f64::NAN;
        let forecast = Forecast {
            current: CurrentConditions {
                temperature: 18.2,
                apparent_temperature: 17.0,
                precipitation: 0.0,
                wind_speed: 9.4,
                wind_direction: 250.0,
            },
            daily,
            fetched_at: Utc::now(),
        };

        let json = serde_json::to_string(&forecast).expect("Failed to serialize Forecast");
        let decoded: Forecast = serde_json::from_str(&json).expect("Failed to deserialize Forecast");

        assert!(decoded.daily.temperature_min[1].is_nan());
        assert!((decoded.daily.temperature_min[0] - 10.0).abs() < 0.001);
        assert!((decoded.current.wind_direction - 250.0).abs() < 0.001);
    }
}
