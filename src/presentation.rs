//! Presentation model for the weather dashboard
//!
//! The dashboard owns every display slot: one current-weather slot and one
//! daily slot per forecast day. Slots are created once by
//! [`Dashboard::initialize_layout`] and rewritten in full by
//! [`Dashboard::apply_update`]. Nothing outside this module holds a reference
//! to a slot.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::format::MISSING;

/// Errors raised when an update does not fit the layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A layout needs at least one column per row band
    #[error("Layout must have at least one column per row")]
    ZeroColumns,

    /// A daily series has fewer entries than there are day slots
    #[error("Series '{field}' has {actual} entries, expected at least {expected}")]
    SeriesTooShort {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Offset in days from the first forecast day ("today" in the API's timezone)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayOffset(pub usize);

/// How day cards wrap into row bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPolicy {
    /// Number of day cards per row band
    pub columns: usize,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self { columns: 7 }
    }
}

/// Everything needed to lay out a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Number of forecast days, one daily slot each
    pub horizon: usize,
    /// Wrapping policy for the daily slots
    pub layout: LayoutPolicy,
}

/// Grid cell of a day card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    /// Row band, counted from the top
    pub band: usize,
    /// Column within the band
    pub column: usize,
}

impl GridPosition {
    fn for_offset(offset: DayOffset, layout: LayoutPolicy) -> Self {
        Self {
            band: offset.0 / layout.columns,
            column: offset.0 % layout.columns,
        }
    }
}

/// Formatted current-weather values, units included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentReadings {
    pub temperature: String,
    pub apparent_temperature: String,
    pub precipitation: String,
    pub wind_speed: String,
    pub wind_direction: String,
}

impl CurrentReadings {
    fn placeholder() -> Self {
        Self {
            temperature: MISSING.to_string(),
            apparent_temperature: MISSING.to_string(),
            precipitation: MISSING.to_string(),
            wind_speed: MISSING.to_string(),
            wind_direction: MISSING.to_string(),
        }
    }
}

/// Formatted daily values, element `i` belonging to day offset `i`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyReadings {
    /// Dates returned by the API; these label the day cards
    pub dates: Vec<NaiveDate>,
    pub temperature_max: Vec<String>,
    pub temperature_min: Vec<String>,
    pub apparent_max: Vec<String>,
    pub apparent_min: Vec<String>,
}

/// One complete set of display values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastUpdate {
    pub current: CurrentReadings,
    pub daily: DailyReadings,
    /// When the underlying data was fetched
    pub fetched_at: DateTime<Utc>,
}

/// The single current-weather panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSlot {
    readings: CurrentReadings,
}

impl CurrentSlot {
    /// Heading shown above the values
    pub const HEADING: &'static str = "Current weather";

    /// Current readings as shown
    pub fn readings(&self) -> &CurrentReadings {
        &self.readings
    }

    /// Labelled rows in display order
    pub fn rows(&self) -> [(&'static str, &str); 5] {
        [
            ("Temperature", self.readings.temperature.as_str()),
            ("Feels like", self.readings.apparent_temperature.as_str()),
            ("Precipitation", self.readings.precipitation.as_str()),
            ("Wind speed", self.readings.wind_speed.as_str()),
            ("Wind direction", self.readings.wind_direction.as_str()),
        ]
    }
}

/// A single day card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySlot {
    position: GridPosition,
    date: Option<NaiveDate>,
    temperature_max: String,
    temperature_min: String,
    apparent_max: String,
    apparent_min: String,
}

impl DailySlot {
    fn placeholder(position: GridPosition) -> Self {
        Self {
            position,
            date: None,
            temperature_max: MISSING.to_string(),
            temperature_min: MISSING.to_string(),
            apparent_max: MISSING.to_string(),
            apparent_min: MISSING.to_string(),
        }
    }

    /// Where the card sits in the grid
    pub fn position(&self) -> GridPosition {
        self.position
    }

    /// Date of this card, once an update has been applied
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Date label, e.g. "Mon 15 Jul"
    pub fn date_label(&self) -> String {
        match self.date {
            Some(date) => date.format("%a %d %b").to_string(),
            None => MISSING.to_string(),
        }
    }

    pub fn temperature_max(&self) -> &str {
        &self.temperature_max
    }

    pub fn temperature_min(&self) -> &str {
        &self.temperature_min
    }

    pub fn apparent_max(&self) -> &str {
        &self.apparent_max
    }

    pub fn apparent_min(&self) -> &str {
        &self.apparent_min
    }

    /// Labelled value rows in display order (the date row comes first, separately)
    pub fn rows(&self) -> [(&'static str, &str); 4] {
        [
            ("Max", self.temperature_max.as_str()),
            ("Min", self.temperature_min.as_str()),
            ("Feels max", self.apparent_max.as_str()),
            ("Feels min", self.apparent_min.as_str()),
        ]
    }
}

/// Owned presentation state for the whole window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    config: DashboardConfig,
    current: CurrentSlot,
    daily: BTreeMap<DayOffset, DailySlot>,
    updated_at: Option<DateTime<Utc>>,
}

impl Dashboard {
    /// Creates one current slot and `config.horizon` daily slots, all showing
    /// placeholder text. Day `i` lands in band `i / columns`, column
    /// `i % columns`.
    pub fn initialize_layout(config: DashboardConfig) -> Result<Self, RenderError> {
        if config.layout.columns == 0 {
            return Err(RenderError::ZeroColumns);
        }

        let daily = (0..config.horizon)
            .map(DayOffset)
            .map(|offset| {
                let position = GridPosition::for_offset(offset, config.layout);
                (offset, DailySlot::placeholder(position))
            })
            .collect();

        Ok(Self {
            config,
            current: CurrentSlot {
                readings: CurrentReadings::placeholder(),
            },
            daily,
            updated_at: None,
        })
    }

    /// Writes `update` into every slot
    ///
    /// Every daily series must cover all day slots. If any falls short the
    /// update is rejected and no slot changes.
    pub fn apply_update(&mut self, update: &ForecastUpdate) -> Result<(), RenderError> {
        let expected = self.daily.len();
        let daily = &update.daily;

        let lengths = [
            ("dates", daily.dates.len()),
            ("temperature_2m_max", daily.temperature_max.len()),
            ("temperature_2m_min", daily.temperature_min.len()),
            ("apparent_temperature_max", daily.apparent_max.len()),
            ("apparent_temperature_min", daily.apparent_min.len()),
        ];
        if let Some(&(field, actual)) = lengths.iter().find(|(_, len)| *len < expected) {
            return Err(RenderError::SeriesTooShort {
                field,
                expected,
                actual,
            });
        }

        self.current.readings = update.current.clone();

        for (&DayOffset(i), slot) in self.daily.iter_mut() {
            slot.date = Some(daily.dates[i]);
            slot.temperature_max.clone_from(&daily.temperature_max[i]);
            slot.temperature_min.clone_from(&daily.temperature_min[i]);
            slot.apparent_max.clone_from(&daily.apparent_max[i]);
            slot.apparent_min.clone_from(&daily.apparent_min[i]);
        }

        self.updated_at = Some(update.fetched_at);
        Ok(())
    }

    /// The layout this dashboard was built with
    pub fn config(&self) -> DashboardConfig {
        self.config
    }

    /// Number of daily slots
    pub fn horizon(&self) -> usize {
        self.daily.len()
    }

    /// Number of row bands the daily slots occupy
    pub fn band_count(&self) -> usize {
        self.daily.len().div_ceil(self.config.layout.columns)
    }

    /// The current-weather slot
    pub fn current(&self) -> &CurrentSlot {
        &self.current
    }

    /// The slot for a given day, if within the horizon
    pub fn daily_slot(&self, offset: DayOffset) -> Option<&DailySlot> {
        self.daily.get(&offset)
    }

    /// All daily slots in day order
    pub fn daily_slots(&self) -> impl Iterator<Item = (DayOffset, &DailySlot)> {
        self.daily.iter().map(|(offset, slot)| (*offset, slot))
    }

    /// Daily slots grouped by row band, each band in column order
    pub fn bands(&self) -> Vec<Vec<&DailySlot>> {
        let mut bands: Vec<Vec<&DailySlot>> = vec![Vec::new(); self.band_count()];
        for slot in self.daily.values() {
            bands[slot.position.band].push(slot);
        }
        bands
    }

    /// When the shown data was fetched, if any update has been applied
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(horizon: usize, columns: usize) -> DashboardConfig {
        DashboardConfig {
            horizon,
            layout: LayoutPolicy { columns },
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn update(len: usize) -> ForecastUpdate {
        let day = |i: usize| NaiveDate::from_ymd_opt(2024, 7, 1 + i as u32).unwrap();
        ForecastUpdate {
            current: CurrentReadings {
                temperature: "21.46 °C".to_string(),
                apparent_temperature: "20.1 °C".to_string(),
                precipitation: "0.1 mm".to_string(),
                wind_speed: "12.346 km/h".to_string(),
                wind_direction: "270°".to_string(),
            },
            daily: DailyReadings {
                dates: (0..len).map(day).collect(),
                temperature_max: (0..len).map(|i| format!("{}", 20 + i)).collect(),
                temperature_min: (0..len).map(|i| format!("{}", 10 + i)).collect(),
                apparent_max: (0..len).map(|i| format!("{}.5", 20 + i)).collect(),
                apparent_min: (0..len).map(|i| format!("{}.5", 10 + i)).collect(),
            },
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_one_slot_per_day() {
        let dashboard = Dashboard::initialize_layout(config(8, 7)).unwrap();
        assert_eq!(dashboard.horizon(), 8);
        assert_eq!(dashboard.daily_slots().count(), 8);
        assert!(dashboard.updated_at().is_none());
    }

    #[test]
    fn test_initialize_uses_placeholders() {
        let dashboard = Dashboard::initialize_layout(config(2, 7)).unwrap();
        for (_, value) in dashboard.current().rows() {
            assert_eq!(value, MISSING);
        }
        let slot = dashboard.daily_slot(DayOffset(1)).unwrap();
        assert_eq!(slot.date_label(), MISSING);
        assert_eq!(slot.temperature_max(), MISSING);
        assert!(slot.date().is_none());
    }

    #[test]
    fn test_slots_wrap_into_row_bands() {
        let dashboard = Dashboard::initialize_layout(config(14, 7)).unwrap();
        assert_eq!(dashboard.band_count(), 2);

        let first = dashboard.daily_slot(DayOffset(0)).unwrap().position();
        assert_eq!(first, GridPosition { band: 0, column: 0 });

        let last_in_band = dashboard.daily_slot(DayOffset(6)).unwrap().position();
        assert_eq!(last_in_band, GridPosition { band: 0, column: 6 });

        let wrapped = dashboard.daily_slot(DayOffset(7)).unwrap().position();
        assert_eq!(wrapped, GridPosition { band: 1, column: 0 });

        let bands = dashboard.bands();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].len(), 7);
        assert_eq!(bands[1].len(), 7);
    }

    #[test]
    fn test_partial_last_band() {
        let dashboard = Dashboard::initialize_layout(config(8, 7)).unwrap();
        let bands = dashboard.bands();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[1].len(), 1);
        assert_eq!(bands[1][0].position(), GridPosition { band: 1, column: 0 });
    }

    #[test]
    fn test_zero_columns_rejected() {
        let result = Dashboard::initialize_layout(config(8, 0));
        assert_eq!(result.unwrap_err(), RenderError::ZeroColumns);
    }

    #[test]
    fn test_zero_horizon_has_no_daily_slots() {
        let mut dashboard = Dashboard::initialize_layout(config(0, 7)).unwrap();
        assert_eq!(dashboard.horizon(), 0);
        assert_eq!(dashboard.band_count(), 0);
        assert!(dashboard.bands().is_empty());

        dashboard.apply_update(&update(0)).expect("Empty update should apply");
        assert_eq!(dashboard.current().readings().temperature, "21.46 °C");
    }

    #[test]
    fn test_apply_update_writes_every_slot() {
        let mut dashboard = Dashboard::initialize_layout(config(3, 7)).unwrap();
        let update = update(3);

        dashboard.apply_update(&update).expect("Update should apply");

        assert_eq!(dashboard.current().readings(), &update.current);
        for (DayOffset(i), slot) in dashboard.daily_slots() {
            assert_eq!(slot.date(), Some(update.daily.dates[i]));
            assert_eq!(slot.temperature_max(), update.daily.temperature_max[i]);
            assert_eq!(slot.temperature_min(), update.daily.temperature_min[i]);
            assert_eq!(slot.apparent_max(), update.daily.apparent_max[i]);
            assert_eq!(slot.apparent_min(), update.daily.apparent_min[i]);
        }
        assert_eq!(dashboard.updated_at(), Some(update.fetched_at));
    }

    #[test]
    fn test_apply_update_uses_returned_dates_for_labels() {
        let mut dashboard = Dashboard::initialize_layout(config(2, 7)).unwrap();
        dashboard.apply_update(&update(2)).unwrap();

        // 2024-07-01 was a Monday
        assert_eq!(
            dashboard.daily_slot(DayOffset(0)).unwrap().date_label(),
            "Mon 01 Jul"
        );
        assert_eq!(
            dashboard.daily_slot(DayOffset(1)).unwrap().date_label(),
            "Tue 02 Jul"
        );
    }

    #[test]
    fn test_apply_update_accepts_longer_series() {
        let mut dashboard = Dashboard::initialize_layout(config(2, 7)).unwrap();
        dashboard.apply_update(&update(5)).expect("Extra entries are ignored");
        assert_eq!(dashboard.horizon(), 2);
        assert_eq!(dashboard.daily_slot(DayOffset(1)).unwrap().temperature_max(), "21");
    }

    #[test]
    fn test_apply_update_is_idempotent() {
        let mut dashboard = Dashboard::initialize_layout(config(8, 7)).unwrap();
        let update = update(8);

        dashboard.apply_update(&update).unwrap();
        let first = dashboard.clone();
        dashboard.apply_update(&update).unwrap();

        assert_eq!(dashboard, first);
    }

    #[test]
    fn test_short_series_rejected_without_changes() {
        let mut dashboard = Dashboard::initialize_layout(config(4, 7)).unwrap();
        let before = dashboard.clone();

        let mut short = update(4);
        short.daily.apparent_min = strings(&["1", "2"]);

        let err = dashboard.apply_update(&short).unwrap_err();
        assert_eq!(
            err,
            RenderError::SeriesTooShort {
                field: "apparent_temperature_min",
                expected: 4,
                actual: 2,
            }
        );
        assert_eq!(dashboard, before);
    }

    #[test]
    fn test_short_dates_rejected() {
        let mut dashboard = Dashboard::initialize_layout(config(3, 7)).unwrap();
        let mut short = update(3);
        short.daily.dates.truncate(1);

        match dashboard.apply_update(&short) {
            Err(RenderError::SeriesTooShort { field, .. }) => assert_eq!(field, "dates"),
            other => panic!("Expected SeriesTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_error_message_names_field() {
        let err = RenderError::SeriesTooShort {
            field: "temperature_2m_max",
            expected: 8,
            actual: 7,
        };
        let message = err.to_string();
        assert!(message.contains("temperature_2m_max"));
        assert!(message.contains('8'));
        assert!(message.contains('7'));
    }
}
