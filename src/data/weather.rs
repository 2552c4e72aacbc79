//! OpenWeatherMap API client
//!
//! This module issues the geocoding, current-weather and 5 day / 3 hour
//! forecast requests and normalizes the responses into our canonical records.
//! Each call is a single attempt; the caller decides what a failure means.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

use super::{round_to, Coordinate, CurrentObservation, ForecastSample, LocationMatch};
use crate::config::Config;

/// Base URL for the OpenWeatherMap API
pub const OPENWEATHERMAP_BASE_URL: &str = "https://api.openweathermap.org";

/// Credential values that mean "not configured"
const PLACEHOLDER_KEYS: [&str; 2] = ["your_api_key_here", "undefined"];

/// Longest response body kept in a status error
const MAX_ERROR_BODY: usize = 200;

/// Errors that can occur when talking to the weather API
#[derive(Debug, Error)]
pub enum WeatherError {
    /// No usable API key; no request was sent
    #[error("No API key configured")]
    MissingCredential,

    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// A sample carried a timestamp chrono cannot represent
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

impl WeatherError {
    /// Whether this is a configuration problem rather than a transport one
    pub fn is_config(&self) -> bool {
        matches!(self, Self::MissingCredential)
    }
}

/// Returns the key if it is present and not a placeholder
pub fn usable_credential(key: Option<&str>) -> Option<&str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(k))
}

/// Client for the OpenWeatherMap API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    units: String,
    lang: String,
}

impl WeatherClient {
    /// Create a new WeatherClient with default settings
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), api_key)
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: OPENWEATHERMAP_BASE_URL.to_string(),
            api_key,
            units: "metric".to_string(),
            lang: "kr".to_string(),
        }
    }

    /// Create a WeatherClient from runtime configuration
    ///
    /// The underlying HTTP client enforces `config.request_timeout` on every
    /// request. Placeholder keys are dropped here, so the client starts
    /// without a credential.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let api_key = config.credential().map(str::to_string);

        Ok(Self::with_client(client, api_key)
            .with_base_url(config.base_url.clone())
            .with_units(config.units.clone())
            .with_lang(config.lang.clone()))
    }

    /// Point the client at a different host (used for tests and proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the unit system requested from the API
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Set the response language requested from the API
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Whether a usable credential is configured
    pub fn has_credential(&self) -> bool {
        usable_credential(self.api_key.as_deref()).is_some()
    }

    fn credential(&self) -> Result<&str, WeatherError> {
        usable_credential(self.api_key.as_deref()).ok_or(WeatherError::MissingCredential)
    }

    /// Sends a GET request and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                status,
                body: truncate_body(&text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Search for places matching `query`
    ///
    /// # Returns
    /// * `Ok(Vec<LocationMatch>)` - Up to `limit` matches, empty for a blank query
    /// * `Err(WeatherError)` - If no credential is configured or the request fails
    pub async fn search_locations(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LocationMatch>, WeatherError> {
        let key = self.credential()?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.get_json(
            "/geo/1.0/direct",
            &[
                ("q", query.to_string()),
                ("limit", limit.to_string()),
                ("appid", key.to_string()),
            ],
        )
        .await
    }

    /// Fetch current conditions for the given coordinates
    pub async fn fetch_current(
        &self,
        coord: Coordinate,
    ) -> Result<CurrentObservation, WeatherError> {
        let key = self.credential()?;
        let response: OwCurrentResponse = self
            .get_json("/data/2.5/weather", &self.weather_query(coord, key))
            .await?;

        parse_current(response)
    }

    /// Fetch the raw 3-hourly forecast samples for the given coordinates
    pub async fn fetch_forecast_samples(
        &self,
        coord: Coordinate,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        let key = self.credential()?;
        let response: OwForecastResponse = self
            .get_json("/data/2.5/forecast", &self.weather_query(coord, key))
            .await?;

        parse_forecast(response)
    }

    /// Resolve the nearest named place for the given coordinates
    ///
    /// # Returns
    /// * `Ok(Some(LocationMatch))` - The closest place
    /// * `Ok(None)` - The API knows no place there
    /// * `Err(WeatherError)` - If no credential is configured or the request fails
    pub async fn reverse_geocode(
        &self,
        coord: Coordinate,
    ) -> Result<Option<LocationMatch>, WeatherError> {
        let key = self.credential()?;
        let places: Vec<LocationMatch> = self
            .get_json(
                "/geo/1.0/reverse",
                &[
                    ("lat", coord.lat.to_string()),
                    ("lon", coord.lon.to_string()),
                    ("limit", "1".to_string()),
                    ("appid", key.to_string()),
                ],
            )
            .await?;

        Ok(places.into_iter().next())
    }

    fn weather_query(&self, coord: Coordinate, key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
            ("appid", key.to_string()),
            ("units", self.units.clone()),
            ("lang", self.lang.clone()),
        ]
    }
}

/// Default precipitation chance when the response carries no volume
fn default_precipitation(condition: &str) -> u8 {
    match condition {
        "Rain" => 80,
        "Clouds" => 20,
        _ => 5,
    }
}

/// Normalize a current-weather response
fn parse_current(response: OwCurrentResponse) -> Result<CurrentObservation, WeatherError> {
    let weather = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::MissingField("weather".to_string()))?;

    // Precipitation volume over the last hour, rain first
    let volume = response
        .rain
        .and_then(|v| v.one_hour)
        .filter(|v| *v > 0.0)
        .or_else(|| response.snow.and_then(|v| v.one_hour))
        .unwrap_or(0.0);
    let precipitation = match (volume * 100.0).round() {
        p if p > 0.0 => p.min(100.0) as u8,
        _ => default_precipitation(&weather.main),
    };

    Ok(CurrentObservation {
        location: response.name,
        temperature_c: response.main.temp.round() as i32,
        condition: weather.main,
        description: weather.description,
        humidity_pct: response.main.humidity.round().clamp(0.0, 100.0) as u8,
        wind_speed_ms: round_to(response.wind.speed, 1),
        pressure_hpa: response.main.pressure.round() as i32,
        visibility_km: (response.visibility.unwrap_or(10_000.0) / 1000.0).round() as i32,
        uv_index: 0,
        feels_like_c: response.main.feels_like.round() as i32,
        icon_code: weather.icon,
        precipitation_chance_pct: precipitation,
    })
}

/// Normalize a forecast response into samples, preserving provider order
fn parse_forecast(response: OwForecastResponse) -> Result<Vec<ForecastSample>, WeatherError> {
    response
        .list
        .into_iter()
        .map(|entry| -> Result<ForecastSample, WeatherError> {
            let timestamp: DateTime<Utc> = DateTime::from_timestamp(entry.dt, 0)
                .ok_or(WeatherError::InvalidTimestamp(entry.dt))?;
            let weather = entry
                .weather
                .into_iter()
                .next()
                .ok_or_else(|| WeatherError::MissingField("list[].weather".to_string()))?;

            Ok(ForecastSample {
                timestamp,
                temperature_c: entry.main.temp,
                condition: weather.main,
                icon_code: weather.icon,
                humidity_pct: entry.main.humidity,
                wind_speed_ms: entry.wind.speed,
                precipitation_chance_pct: (entry.pop * 100.0).clamp(0.0, 100.0),
            })
        })
        .collect()
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((index, _)) => format!("{}...", &body[..index]),
        None => body.to_string(),
    }
}

/// OpenWeatherMap current-weather response
#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<f64>,
    rain: Option<OwVolume>,
    snow: Option<OwVolume>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

/// Precipitation volume in mm
#[derive(Debug, Deserialize)]
struct OwVolume {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

/// OpenWeatherMap 5 day / 3 hour forecast response
#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    /// Probability of precipitation, 0.0-1.0
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    humidity: f64,
}
