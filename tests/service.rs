//! Integration tests for the weather service
//!
//! The remote API is played by a wiremock server; the cache sits on an
//! in-memory store and a manual clock so expiry can be driven directly.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nalssi::cache::{KeyValueStore, MemoryStore, TtlCache};
use nalssi::clock::{Clock, ManualClock};
use nalssi::config::Config;
use nalssi::data::{synthetic_forecast, Coordinate, WeatherClient, WeatherError};
use nalssi::service::{Provenance, WeatherService};

const SEOUL: Coordinate = Coordinate {
    lat: 37.5665,
    lon: 126.9780,
};

/// 2024-07-15 12:00:00 UTC
const START: i64 = 1_721_044_800;

struct Harness {
    service: WeatherService,
    store: Arc<MemoryStore>,
    clock: ManualClock,
}

fn harness(api_key: Option<&str>, base_url: &str) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(Utc.timestamp_opt(START, 0).unwrap());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let client = WeatherClient::new(api_key.map(str::to_string)).with_base_url(base_url);
    let service = WeatherService::new(client, TtlCache::new(store.clone(), shared.clone()), shared);
    Harness {
        service,
        store,
        clock,
    }
}

/// Like `harness`, but with the HTTP client built from a config with a short
/// request timeout
fn harness_with_timeout(base_url: &str, timeout: std::time::Duration) -> Harness {
    let config = Config {
        api_key: Some("test_key".to_string()),
        base_url: base_url.to_string(),
        request_timeout: timeout,
        memory_cache: true,
        ..Config::default()
    };
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(Utc.timestamp_opt(START, 0).unwrap());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let client = WeatherClient::from_config(&config).expect("Should build client");
    let service = WeatherService::new(client, TtlCache::new(store.clone(), shared.clone()), shared);
    Harness {
        service,
        store,
        clock,
    }
}

fn current_body() -> serde_json::Value {
    json!({
        "weather": [{"main": "Clouds", "description": "구름 많음", "icon": "04d"}],
        "main": {"temp": 24.4, "feels_like": 25.1, "pressure": 1006, "humidity": 64},
        "wind": {"speed": 2.26},
        "visibility": 10000,
        "name": "Seoul"
    })
}

/// `count` samples three hours apart starting at `START`
fn forecast_body(count: usize) -> serde_json::Value {
    let list: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            json!({
                "dt": START + (i as i64) * 3 * 3600,
                "main": {"temp": 20.0 + i as f64, "humidity": 60},
                "weather": [{"main": "Clear", "description": "맑음", "icon": "01d"}],
                "wind": {"speed": 3.0},
                "pop": 0.1
            })
        })
        .collect();
    json!({ "cod": "200", "list": list })
}

#[tokio::test]
async fn test_remote_current_is_cached_until_ttl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());

    let first = h.service.current_weather(SEOUL).await;
    assert_eq!(first.source, Provenance::FromRemote);
    assert_eq!(first.data.location, "Seoul");
    assert_eq!(first.data.temperature_c, 24);

    h.clock.advance(chrono::Duration::minutes(4));
    let cached = h.service.current_weather(SEOUL).await;
    assert_eq!(cached.source, Provenance::FromCache);
    assert_eq!(cached.data, first.data);

    h.clock.advance(chrono::Duration::minutes(2));
    let refreshed = h.service.current_weather(SEOUL).await;
    assert_eq!(refreshed.source, Provenance::FromRemote);
}

#[tokio::test]
async fn test_remote_forecast_is_interpolated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(40)))
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());
    let forecast = h.service.forecast(SEOUL).await;

    assert_eq!(forecast.source, Provenance::FromRemote);
    let hourly = &forecast.data.hourly;
    assert_eq!(hourly.len(), 24);
    assert_eq!(hourly[0].temperature_c, 20.0);
    assert_eq!(hourly[1].temperature_c, 20.3);
    assert_eq!(hourly[3].temperature_c, 21.0);
    assert_eq!(hourly[0].precipitation_chance_pct, 10);
    assert!(hourly.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    // 40 samples from noon span six calendar days
    let daily = &forecast.data.daily;
    assert_eq!(daily.len(), 6);
    assert!(daily.iter().all(|d| d.max_temp_c >= d.min_temp_c));
    assert_eq!(daily[0].max_temp_c, 23.0);
    assert_eq!(daily[0].min_temp_c, 20.0);
    assert_eq!(daily[0].weekday_label, "월");
}

#[tokio::test]
async fn test_short_forecast_falls_back_to_synthetic() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(4)))
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());
    let forecast = h.service.forecast(SEOUL).await;

    assert_eq!(forecast.source, Provenance::Synthesized);
    assert_eq!(forecast.data.hourly.len(), 24);
}

#[tokio::test]
async fn test_forecast_transport_failure_uses_seeded_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());
    let forecast = h.service.forecast(Coordinate::new(37.5665, 126.9780)).await;

    assert_eq!(forecast.source, Provenance::Synthesized);
    assert_eq!(forecast.data.hourly.len(), 24);
    assert_eq!(forecast.data.daily.len(), 7);
    assert_eq!(forecast.data, synthetic_forecast(SEOUL, h.clock.now()));

    // The synthesized result is cached like a remote one
    let again = h.service.forecast(SEOUL).await;
    assert_eq!(again.source, Provenance::FromCache);
}

#[tokio::test]
async fn test_concurrent_duplicate_fetch_hits_remote_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body())
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());
    let (a, b) = tokio::join!(
        h.service.current_weather(SEOUL),
        h.service.current_weather(SEOUL)
    );

    let mut sources = vec![a.source, b.source];
    sources.sort_by_key(|s| *s == Provenance::FromCache);
    assert_eq!(sources, vec![Provenance::FromRemote, Provenance::FromCache]);
    assert_eq!(a.data, b.data);
    assert_eq!(h.store.keys().unwrap().len(), 1);
}

#[tokio::test]
async fn test_overview_fetches_both_classes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());
    let overview = h.service.overview(SEOUL).await;

    assert_eq!(overview.current.source, Provenance::FromRemote);
    assert_eq!(overview.forecast.source, Provenance::Synthesized);

    let mut keys = h.store.keys().unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "weather-app-cache-forecast-37.57-126.98",
            "weather-app-cache-weather-37.57-126.98",
        ]
    );
}

#[tokio::test]
async fn test_search_uses_remote_then_mock_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Busan", "country": "KR", "lat": 35.1796, "lon": 129.0756}
        ])))
        .mount(&mock_server)
        .await;

    let online = harness(Some("test_key"), &mock_server.uri());
    let results = online.service.search_locations("busan", 5).await;
    assert_eq!(results.source, Provenance::FromRemote);
    assert_eq!(results.data[0].name, "Busan");

    let offline = harness(None, &mock_server.uri());
    let results = offline.service.search_locations("seoul", 5).await;
    assert_eq!(results.source, Provenance::Synthesized);
    assert!(results.data.iter().any(|place| place.name == "서울"));
}

#[tokio::test]
async fn test_reverse_lookup_propagates_transport_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());
    let error = h.service.location_by_coords(SEOUL).await.unwrap_err();

    assert!(!error.source.is_config());
    assert!(h.store.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_reverse_lookup_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Jung-gu", "state": "Seoul", "country": "KR", "lat": 37.56, "lon": 126.99}
        ])))
        .mount(&mock_server)
        .await;

    let h = harness(Some("test_key"), &mock_server.uri());
    let place = h
        .service
        .location_by_coords(SEOUL)
        .await
        .expect("Lookup should succeed")
        .expect("A place should be found");

    assert_eq!(place.name, "Jung-gu");
    assert_eq!(place.state.as_deref(), Some("Seoul"));
}

#[tokio::test]
async fn test_clear_cache_leaves_foreign_keys() {
    let h = harness(None, "http://127.0.0.1:9");
    h.store.set("user-preferences", "{\"theme\":\"dark\"}").unwrap();

    h.service.overview(SEOUL).await;
    h.service.current_weather(Coordinate::new(35.1796, 129.0756)).await;

    let info = h.service.cache_info();
    assert_eq!(info.count, 3);
    assert_eq!(info.oldest_key.is_some(), info.newest_key.is_some());

    assert_eq!(h.service.clear_cache(), 3);
    assert_eq!(h.store.keys().unwrap(), vec!["user-preferences".to_string()]);
}

#[tokio::test]
async fn test_request_timeout_falls_back_and_caches() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body())
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let h = harness_with_timeout(&mock_server.uri(), std::time::Duration::from_millis(200));
    let started = std::time::Instant::now();
    let current = h.service.current_weather(SEOUL).await;

    assert!(started.elapsed() < std::time::Duration::from_secs(4));
    assert_eq!(current.source, Provenance::Synthesized);
    assert_eq!(
        h.store.keys().unwrap(),
        vec!["weather-app-cache-weather-37.57-126.98".to_string()]
    );
}

#[tokio::test]
async fn test_request_timeout_fails_reverse_lookup() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let h = harness_with_timeout(&mock_server.uri(), std::time::Duration::from_millis(200));
    let error = h.service.location_by_coords(SEOUL).await.unwrap_err();

    assert!(matches!(error.source, WeatherError::RequestFailed(ref e) if e.is_timeout()));
    assert!(h.store.keys().unwrap().is_empty());
}
