//! Core data models for Nalssi
//!
//! This module contains the canonical records produced by the weather client,
//! the synthetic generator and the forecast interpolator. Every record is a
//! plain value object that can be stored in the cache as JSON.

pub mod interpolate;
pub mod locations;
pub mod synthetic;
pub mod weather;

pub use interpolate::{daily_summaries, interpolate_hourly, HourlySeries, InterpolationError};
pub use locations::mock_locations;
pub use synthetic::{synthetic_current, synthetic_forecast};
pub use weather::{WeatherClient, WeatherError};

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude coordinate
    pub lat: f64,
    /// Longitude coordinate
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns the coordinate rounded to two decimal places.
    ///
    /// Nearby queries collapse onto the same rounded coordinate, which is what
    /// cache keys and synthetic seeds are derived from.
    pub fn rounded(&self) -> Self {
        Self {
            lat: round_to(self.lat, 2),
            lon: round_to(self.lon, 2),
        }
    }
}

/// A place returned by location search or reverse lookup
///
/// `name` and `state` are display strings, not identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Localized names keyed by language code, when the provider supplies them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_names: Option<HashMap<String, String>>,
}

/// Weather condition families understood by the generator and the client
///
/// Names follow the provider's `weather[].main` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Mist,
}

impl Condition {
    /// Provider name of the condition
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Mist => "Mist",
        }
    }

    /// Daytime icon code for this condition
    pub fn day_icon(&self) -> &'static str {
        match self {
            Self::Clear => "01d",
            Self::Clouds => "03d",
            Self::Rain => "10d",
            Self::Snow => "13d",
            Self::Mist => "50d",
        }
    }

    /// Icon code for this condition, using night variants where they exist
    pub fn icon(&self, daytime: bool) -> &'static str {
        match (self, daytime) {
            (Self::Clear, false) => "01n",
            (Self::Clouds, false) => "03n",
            _ => self.day_icon(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current weather at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentObservation {
    /// Display label for the location
    pub location: String,
    pub temperature_c: i32,
    /// Provider condition name (e.g. "Clear", "Rain")
    pub condition: String,
    /// Localized description (e.g. "맑음")
    pub description: String,
    pub humidity_pct: u8,
    /// Wind speed in metres per second, one decimal
    pub wind_speed_ms: f64,
    pub pressure_hpa: i32,
    pub visibility_km: i32,
    pub uv_index: u8,
    pub feels_like_c: i32,
    pub icon_code: String,
    pub precipitation_chance_pct: u8,
}

impl CurrentObservation {
    /// Replaces the location label, as callers do after resolving a place name
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

/// A raw forecast sample at the provider's native (3 hour) granularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: String,
    pub icon_code: String,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    /// Probability of precipitation in percent (0-100)
    #[serde(default)]
    pub precipitation_chance_pct: f64,
}

/// One hour of the dense 24 hour series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: String,
    pub icon_code: String,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
    pub precipitation_chance_pct: u8,
}

/// Aggregated forecast for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Short weekday label (e.g. "월")
    pub weekday_label: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub condition: String,
    pub icon_code: String,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
}

/// The derived forecast pair stored in the cache and returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Exactly 24 hourly points
    pub hourly: Vec<HourlyPoint>,
    /// At most 7 daily summaries
    pub daily: Vec<DailySummary>,
}

/// Number of points in the hourly series
pub const HOURLY_POINTS: usize = 24;

/// Maximum number of daily summaries
pub const MAX_DAILY: usize = 7;

/// Rounds `value` to `places` decimal places, half away from zero
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Short Korean weekday label for a date
pub fn weekday_label(date: NaiveDate) -> &'static str {
    use chrono::{Datelike, Weekday};

    match date.weekday() {
        Weekday::Mon => "월",
        Weekday::Tue => "화",
        Weekday::Wed => "수",
        Weekday::Thu => "목",
        Weekday::Fri => "금",
        Weekday::Sat => "토",
        Weekday::Sun => "일",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_rounding() {
        let coord = Coordinate::new(37.5665, 126.9780);
        let rounded = coord.rounded();

        assert!((rounded.lat - 37.57).abs() < 1e-9);
        assert!((rounded.lon - 126.98).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_coordinates_share_rounding() {
        let a = Coordinate::new(37.5661, 126.9779).rounded();
        let b = Coordinate::new(37.5668, 126.9782).rounded();
        assert_eq!(a, b);
    }

    #[test]
    fn test_condition_icons() {
        assert_eq!(Condition::Clear.icon(true), "01d");
        assert_eq!(Condition::Clear.icon(false), "01n");
        assert_eq!(Condition::Clouds.icon(false), "03n");
        assert_eq!(Condition::Rain.icon(false), "10d");
        assert_eq!(Condition::Mist.day_icon(), "50d");
    }

    #[test]
    fn test_current_observation_uses_camel_case_fields() {
        let observation = CurrentObservation {
            location: "서울".to_string(),
            temperature_c: 21,
            condition: "Clear".to_string(),
            description: "맑음".to_string(),
            humidity_pct: 45,
            wind_speed_ms: 2.5,
            pressure_hpa: 1013,
            visibility_km: 10,
            uv_index: 5,
            feels_like_c: 20,
            icon_code: "01d".to_string(),
            precipitation_chance_pct: 3,
        };

        let json = serde_json::to_string(&observation).expect("Failed to serialize");
        assert!(json.contains("\"temperatureC\":21"));
        assert!(json.contains("\"precipitationChancePct\":3"));

        let relabelled = observation.with_location("Seoul");
        assert_eq!(relabelled.location, "Seoul");
    }

    #[test]
    fn test_location_match_omits_missing_optionals() {
        let location = LocationMatch {
            name: "Tokyo".to_string(),
            country: "JP".to_string(),
            state: None,
            lat: 35.6762,
            lon: 139.6503,
            local_names: None,
        };

        let json = serde_json::to_string(&location).expect("Failed to serialize");
        assert!(!json.contains("state"));
        assert!(!json.contains("local_names"));
    }

    #[test]
    fn test_weekday_label() {
        let monday = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        assert_eq!(weekday_label(monday), "월");
        let sunday = NaiveDate::from_ymd_opt(2024, 7, 21).unwrap();
        assert_eq!(weekday_label(sunday), "일");
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(2.345, 1) - 2.3).abs() < 1e-9);
        assert!((round_to(2.35, 0) - 2.0).abs() < 1e-9);
        assert!((round_to(-1.25, 1) - -1.3).abs() < 1e-9);
    }
}
