//! Weather service
//!
//! Sequences cache lookup, remote fetch and local fallback for every public
//! weather operation. Current conditions and forecasts share one
//! fetch-with-fallback path; location search falls back to the built-in list;
//! reverse lookup has no fallback and reports its error.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{
    cache_key, CacheInfo, DataClass, FileStore, KeyLocks, KeyValueStore, MemoryStore, TtlCache,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::data::{
    daily_summaries, interpolate_hourly, mock_locations, synthetic_current, synthetic_forecast,
    Coordinate, CurrentObservation, Forecast, InterpolationError, LocationMatch, WeatherClient,
    WeatherError,
};

/// Where a returned value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provenance {
    /// A still-valid cache entry
    #[serde(rename = "cache")]
    FromCache,
    /// A successful remote call
    #[serde(rename = "remote")]
    FromRemote,
    /// Generated locally: synthetic weather or the built-in location list
    #[serde(rename = "synthesized")]
    Synthesized,
}

/// A value tagged with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    pub source: Provenance,
    pub data: T,
}

impl<T> Fetched<T> {
    fn new(source: Provenance, data: T) -> Self {
        Self { source, data }
    }
}

/// Public operations of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SearchLocations,
    CurrentWeather,
    Forecast,
    LocationByCoords,
}

/// What an operation does when the remote call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Generate synthetic data for the coordinate
    Synthesize,
    /// Filter the built-in location list
    MockLocations,
    /// Return the error to the caller
    Propagate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchLocations => "search_locations",
            Self::CurrentWeather => "current_weather",
            Self::Forecast => "forecast",
            Self::LocationByCoords => "location_by_coords",
        }
    }

    pub const fn fallback_policy(&self) -> FallbackPolicy {
        match self {
            Self::SearchLocations => FallbackPolicy::MockLocations,
            Self::CurrentWeather | Self::Forecast => FallbackPolicy::Synthesize,
            Self::LocationByCoords => FallbackPolicy::Propagate,
        }
    }
}

/// Reasons the remote leg of a cached operation failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] WeatherError),

    /// The provider's samples could not fill the hourly series
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
}

impl FetchError {
    fn is_config(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_config())
    }
}

/// Reverse lookup failure, whatever the cause
#[derive(Debug, Error)]
#[error("Failed to look up location at ({lat}, {lon}): {source}")]
pub struct LookupError {
    pub lat: f64,
    pub lon: f64,
    #[source]
    pub source: WeatherError,
}

/// Current conditions and forecast for one coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub current: Fetched<CurrentObservation>,
    pub forecast: Fetched<Forecast>,
}

/// Entry point for weather data with caching and fallback
#[derive(Debug)]
pub struct WeatherService {
    client: WeatherClient,
    cache: TtlCache,
    locks: KeyLocks,
    clock: Arc<dyn Clock>,
}

impl WeatherService {
    pub fn new(client: WeatherClient, cache: TtlCache, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            cache,
            locks: KeyLocks::new(),
            clock,
        }
    }

    /// Builds the service from runtime configuration
    ///
    /// Uses an on-disk cache unless `memory_cache` is set or no cache
    /// directory can be resolved.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let client = WeatherClient::from_config(config)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store: Arc<dyn KeyValueStore> = if config.memory_cache {
            Arc::new(MemoryStore::new())
        } else if let Some(dir) = config.resolved_cache_dir() {
            debug!(dir = %dir.display(), "Using on-disk cache");
            Arc::new(FileStore::new(dir))
        } else {
            warn!("No cache directory available, caching in memory only");
            Arc::new(MemoryStore::new())
        };

        if config.credential().is_none() {
            info!("No API key configured, weather data will be synthesized");
        }

        Ok(Self::new(client, TtlCache::new(store, clock.clone()), clock))
    }

    /// Searches for places by name
    ///
    /// Falls back to the built-in location list when the API cannot be used.
    pub async fn search_locations(
        &self,
        query: &str,
        limit: usize,
    ) -> Fetched<Vec<LocationMatch>> {
        match self.client.search_locations(query, limit).await {
            Ok(places) => Fetched::new(Provenance::FromRemote, places),
            Err(e) => {
                log_fallback(Operation::SearchLocations, e.is_config(), &e);
                Fetched::new(Provenance::Synthesized, mock_locations(query, limit))
            }
        }
    }

    /// Current conditions at a coordinate
    pub async fn current_weather(&self, coord: Coordinate) -> Fetched<CurrentObservation> {
        self.fetch_with_fallback(
            Operation::CurrentWeather,
            DataClass::Current,
            coord,
            || async move { Ok::<_, FetchError>(self.client.fetch_current(coord).await?) },
            || synthetic_current(coord),
        )
        .await
    }

    /// 24 hourly points and up to 7 daily summaries for a coordinate
    ///
    /// Remote samples are interpolated before caching; a series the samples
    /// cannot fill counts as a failed fetch.
    pub async fn forecast(&self, coord: Coordinate) -> Fetched<Forecast> {
        self.fetch_with_fallback(
            Operation::Forecast,
            DataClass::Forecast,
            coord,
            || async move {
                let samples = self.client.fetch_forecast_samples(coord).await?;
                let hourly = interpolate_hourly(&samples, self.clock.now())?.into_complete()?;
                Ok::<_, FetchError>(Forecast {
                    hourly,
                    daily: daily_summaries(&samples),
                })
            },
            || synthetic_forecast(coord, self.clock.now()),
        )
        .await
    }

    /// Fetches current conditions and forecast concurrently
    pub async fn overview(&self, coord: Coordinate) -> Overview {
        let (current, forecast) =
            futures::join!(self.current_weather(coord), self.forecast(coord));
        Overview { current, forecast }
    }

    /// Resolves the nearest named place
    ///
    /// `Ok(None)` means the API answered but knows no place there.
    pub async fn location_by_coords(
        &self,
        coord: Coordinate,
    ) -> Result<Option<LocationMatch>, LookupError> {
        self.client
            .reverse_geocode(coord)
            .await
            .map_err(|source| {
                error!(lat = coord.lat, lon = coord.lon, error = %source, "Reverse lookup failed");
                LookupError {
                    lat: coord.lat,
                    lon: coord.lon,
                    source,
                }
            })
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.info()
    }

    /// Removes every cached entry, returning how many were removed
    pub fn clear_cache(&self) -> usize {
        self.cache.clear_all()
    }

    /// Cache, then remote, then synthesis; writes whatever was not a hit
    ///
    /// The key's lock is held throughout, so concurrent callers for the same
    /// key see the first caller's entry instead of fetching again.
    async fn fetch_with_fallback<T, R, Fut, S>(
        &self,
        operation: Operation,
        class: DataClass,
        coord: Coordinate,
        remote: R,
        synthesize: S,
    ) -> Fetched<T>
    where
        T: Serialize + DeserializeOwned,
        R: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        S: FnOnce() -> T,
    {
        let key = cache_key(class, coord);
        let _guard = self.locks.lock(&key).await;

        if let Some(data) = self.cache.get::<T>(&key) {
            debug!(operation = operation.as_str(), key, "Cache hit");
            return Fetched::new(Provenance::FromCache, data);
        }

        let fetched = match remote().await {
            Ok(data) => {
                info!(operation = operation.as_str(), key, "Fetched from remote");
                Fetched::new(Provenance::FromRemote, data)
            }
            Err(e) => {
                log_fallback(operation, e.is_config(), &e);
                Fetched::new(Provenance::Synthesized, synthesize())
            }
        };

        self.cache.set(&key, &fetched.data, class.ttl());
        fetched
    }
}

fn log_fallback(operation: Operation, config: bool, error: &dyn std::error::Error) {
    let policy = operation.fallback_policy();
    if config {
        info!(
            operation = operation.as_str(),
            ?policy,
            "API key not configured, using fallback data"
        );
    } else {
        warn!(
            operation = operation.as_str(),
            ?policy,
            error = %error,
            "Remote fetch failed, using fallback data"
        );
    }
}
