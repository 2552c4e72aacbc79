//! Deterministic synthetic weather
//!
//! Produces plausible current conditions and forecasts when the remote source
//! cannot be used. Every magnitude is a function of the seed derived from the
//! rounded coordinate and the sample index; the only input taken from the
//! clock is the instant used to label the series.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, Utc};

use super::{
    round_to, weekday_label, Condition, Coordinate, CurrentObservation, DailySummary, Forecast,
    HourlyPoint, HOURLY_POINTS, MAX_DAILY,
};

/// Fixed characteristics of one weather pattern
#[derive(Debug, Clone, Copy)]
struct Pattern {
    condition: Condition,
    description: &'static str,
    temp_offset: i32,
    humidity_base: i32,
}

/// Patterns in seed order: clear, clouds, rain, snow, mist
const PATTERNS: [Pattern; 5] = [
    Pattern {
        condition: Condition::Clear,
        description: "맑음",
        temp_offset: 2,
        humidity_base: 45,
    },
    Pattern {
        condition: Condition::Clouds,
        description: "구름많음",
        temp_offset: 0,
        humidity_base: 65,
    },
    Pattern {
        condition: Condition::Rain,
        description: "비",
        temp_offset: -3,
        humidity_base: 80,
    },
    Pattern {
        condition: Condition::Snow,
        description: "눈",
        temp_offset: -8,
        humidity_base: 85,
    },
    Pattern {
        condition: Condition::Mist,
        description: "안개",
        temp_offset: -1,
        humidity_base: 90,
    },
];

/// Base temperature inside the Korean reference box
const KOREA_BASE_TEMP: i32 = 23;

/// Base temperature everywhere else
const DEFAULT_BASE_TEMP: i32 = 20;

/// Location label for coordinates inside the reference box
const KOREA_LABEL: &str = "서울";

/// Location label for coordinates outside the reference box
const DEFAULT_LABEL: &str = "테스트 도시";

/// Derives the integer seed for a coordinate
///
/// `round(lat * 1000 + lon * 1000) mod 100` over the rounded coordinate,
/// using the euclidean remainder so western and southern coordinates still
/// land in `0..100`.
pub fn seed_for(coord: Coordinate) -> u32 {
    let rounded = coord.rounded();
    let raw = (rounded.lat * 1000.0 + rounded.lon * 1000.0).round() as i64;
    raw.rem_euclid(100) as u32
}

fn pattern_for(seed: u32) -> Pattern {
    PATTERNS[seed as usize % PATTERNS.len()]
}

/// Whether a coordinate falls inside the warmer reference bounding box
fn in_reference_box(coord: Coordinate) -> bool {
    (33.0..=39.0).contains(&coord.lat) && (124.0..=132.0).contains(&coord.lon)
}

/// Signed jitter `(value mod modulus) - offset`
fn jitter(value: u32, modulus: u32, offset: i32) -> i32 {
    (value % modulus) as i32 - offset
}

/// Precipitation chance for the current observation of a pattern
fn current_precipitation(condition: Condition, seed: u32) -> i32 {
    let seed = seed as i32;
    match condition {
        Condition::Rain => 70 + (seed % 20) + 10,
        Condition::Clouds => 20 + seed % 30,
        Condition::Snow => 60 + seed % 30,
        Condition::Clear => seed % 10,
        Condition::Mist => 15 + seed % 20,
    }
}

/// Generates the current observation for a coordinate
pub fn synthetic_current(coord: Coordinate) -> CurrentObservation {
    let rounded = coord.rounded();
    let seed = seed_for(rounded);
    let pattern = pattern_for(seed);
    let korea = in_reference_box(rounded);

    let base_temp = if korea {
        KOREA_BASE_TEMP
    } else {
        DEFAULT_BASE_TEMP
    };
    let temperature = base_temp + pattern.temp_offset + jitter(seed, 10, 5);
    let humidity = (pattern.humidity_base + jitter(seed, 20, 10)).clamp(30, 95);
    let wind_speed = (3 + jitter(seed, 6, 3)).clamp(1, 8);
    let feels_like = temperature + if humidity > 70 { 2 } else { -1 };

    CurrentObservation {
        location: if korea { KOREA_LABEL } else { DEFAULT_LABEL }.to_string(),
        temperature_c: temperature,
        condition: pattern.condition.as_str().to_string(),
        description: pattern.description.to_string(),
        humidity_pct: humidity as u8,
        wind_speed_ms: wind_speed as f64,
        pressure_hpa: 1013 + jitter(seed, 30, 15),
        visibility_km: (10 + jitter(seed, 10, 5)).clamp(1, 15),
        uv_index: (5 + jitter(seed, 6, 3)).clamp(0, 11) as u8,
        feels_like_c: feels_like,
        icon_code: pattern.condition.day_icon().to_string(),
        precipitation_chance_pct: current_precipitation(pattern.condition, seed).clamp(0, 100)
            as u8,
    }
}

/// Generates the 24 hour and 7 day forecast for a coordinate
///
/// `now` only labels the series; the values depend on the coordinate alone.
pub fn synthetic_forecast(coord: Coordinate, now: DateTime<Utc>) -> Forecast {
    let rounded = coord.rounded();
    let seed = seed_for(rounded);
    let current = synthetic_current(rounded);
    let base = pattern_for(seed).condition;

    Forecast {
        hourly: (0..HOURLY_POINTS)
            .map(|i| hourly_point(&current, base, seed, i, now))
            .collect(),
        daily: (0..MAX_DAILY)
            .map(|i| daily_summary(&current, base, seed, i, now))
            .collect(),
    }
}

/// One point of the synthetic hourly series
///
/// The day cycle is aligned to the start of the series, not to clock time:
/// point 0 is the cycle's 00:00 whatever hour `now` is. The timestamps are
/// labels only and should not be read as a real diurnal curve.
fn hourly_point(
    current: &CurrentObservation,
    base: Condition,
    seed: u32,
    index: usize,
    now: DateTime<Utc>,
) -> HourlyPoint {
    let i = index as u32;
    // Hour within the synthetic day cycle; the series starts at its trough.
    let hour = (index % 24) as f64;
    let daytime = (6.0..18.0).contains(&hour);

    let cycle = ((hour - 6.0) * PI / 12.0).sin() * 4.0;
    let trend = -(index as f64) * 0.1;
    let variation = jitter(seed + i * 7, 10, 5) as f64 * 0.3;
    let temperature = (current.temperature_c as f64 + cycle + trend + variation).round();

    let alternate = if base == Condition::Clear {
        Condition::Clouds
    } else {
        Condition::Clear
    };
    let variations = [base, base, alternate];
    let condition = variations[(i + seed) as usize % variations.len()];

    let humidity =
        (current.humidity_pct as i32 + (i as i32 * 2 - 4) + jitter(seed, 10, 5)).clamp(30, 90);
    let wind_speed = (current.wind_speed_ms + jitter(seed + i, 4, 2) as f64).clamp(0.5, 10.0);
    let precipitation = match condition {
        Condition::Rain => 70 + (seed + i * 3) % 25,
        Condition::Clouds => 20 + (seed + i * 2) % 30,
        Condition::Snow => 60 + (seed + i * 4) % 35,
        Condition::Clear | Condition::Mist => 5 + (seed + i) % 15,
    };

    HourlyPoint {
        timestamp: now + Duration::hours(index as i64),
        temperature_c: temperature,
        condition: condition.as_str().to_string(),
        icon_code: condition.icon(daytime).to_string(),
        humidity_pct: humidity as u8,
        wind_speed_ms: round_to(wind_speed, 1),
        precipitation_chance_pct: precipitation.min(100) as u8,
    }
}

fn daily_summary(
    current: &CurrentObservation,
    base: Condition,
    seed: u32,
    index: usize,
    now: DateTime<Utc>,
) -> DailySummary {
    let i = index as u32;
    let date = (now + Duration::days(index as i64)).date_naive();
    let trend = ((index as f64 * 2.0 + seed as f64 * 0.1) * 0.3).sin() * 3.0;

    let progression = [
        base,
        base,
        Condition::Clouds,
        Condition::Rain,
        Condition::Clear,
    ];
    let condition = progression[index.min(progression.len() - 1)];

    let temperature = current.temperature_c as f64;
    let humidity =
        (current.humidity_pct as i32 + (i as i32 * 3 - 6) + jitter(seed, 15, 7)).clamp(40, 85);
    let wind_speed = (current.wind_speed_ms + jitter(seed + i * 2, 5, 2) as f64).clamp(1.0, 8.0);

    DailySummary {
        date,
        weekday_label: weekday_label(date).to_string(),
        max_temp_c: (temperature + 5.0 + trend).round(),
        min_temp_c: (temperature - 3.0 + trend * 0.5).round(),
        condition: condition.as_str().to_string(),
        icon_code: condition.day_icon().to_string(),
        humidity_pct: humidity as u8,
        wind_speed_ms: round_to(wind_speed, 1),
    }
}
