//! Forecast interpolation
//!
//! Expands the provider's 3-hourly samples into a dense hourly series and
//! aggregates the same samples into per-day summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use super::{
    round_to, weekday_label, DailySummary, ForecastSample, HourlyPoint, HOURLY_POINTS, MAX_DAILY,
};

/// Hours between two provider samples
const SAMPLE_SPACING_HOURS: usize = 3;

/// Errors that can occur when interpolating forecast samples
#[derive(Debug, Error, PartialEq)]
pub enum InterpolationError {
    /// The provider returned no samples at all
    #[error("No forecast samples to interpolate")]
    Empty,

    /// The samples ran out before the series was full
    #[error("Forecast samples cover only {produced} of {expected} hours")]
    Incomplete { produced: usize, expected: usize },
}

/// Result of hourly interpolation
///
/// Holds however many points the samples could support. A series that ended
/// early is reported through [`HourlySeries::into_complete`] rather than padded.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub points: Vec<HourlyPoint>,
}

impl HourlySeries {
    /// Whether all 24 hours were produced
    pub fn is_complete(&self) -> bool {
        self.points.len() == HOURLY_POINTS
    }

    /// Returns the points if the series is full, or the count-short error
    pub fn into_complete(self) -> Result<Vec<HourlyPoint>, InterpolationError> {
        if self.is_complete() {
            Ok(self.points)
        } else {
            Err(InterpolationError::Incomplete {
                produced: self.points.len(),
                expected: HOURLY_POINTS,
            })
        }
    }
}

fn lerp(from: f64, to: f64, factor: f64) -> f64 {
    from + (to - from) * factor
}

/// Interpolates samples into hourly points starting at `now`
///
/// For hour `i`, the surrounding samples are `i / 3` and the one after it
/// (clamped to the last sample). Temperature, humidity, wind and precipitation
/// chance are interpolated linearly; condition and icon are carried from the
/// earlier sample.
pub fn interpolate_hourly(
    samples: &[ForecastSample],
    now: DateTime<Utc>,
) -> Result<HourlySeries, InterpolationError> {
    let last_index = samples.len().checked_sub(1).ok_or(InterpolationError::Empty)?;
    let mut points = Vec::with_capacity(HOURLY_POINTS);

    for hour in 0..HOURLY_POINTS {
        let sample_index = hour / SAMPLE_SPACING_HOURS;
        if sample_index > last_index {
            break;
        }
        let current = &samples[sample_index];
        let next = &samples[(sample_index + 1).min(last_index)];
        let factor = (hour % SAMPLE_SPACING_HOURS) as f64 / SAMPLE_SPACING_HOURS as f64;

        points.push(HourlyPoint {
            timestamp: now + Duration::hours(hour as i64),
            temperature_c: round_to(lerp(current.temperature_c, next.temperature_c, factor), 1),
            condition: current.condition.clone(),
            icon_code: current.icon_code.clone(),
            humidity_pct: lerp(current.humidity_pct, next.humidity_pct, factor)
                .round()
                .clamp(0.0, 100.0) as u8,
            wind_speed_ms: round_to(lerp(current.wind_speed_ms, next.wind_speed_ms, factor), 1),
            precipitation_chance_pct: lerp(
                current.precipitation_chance_pct,
                next.precipitation_chance_pct,
                factor,
            )
            .round()
            .clamp(0.0, 100.0) as u8,
        });
    }

    Ok(HourlySeries { points })
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Groups samples by UTC calendar date and summarizes each day
///
/// Days come out in chronological order, at most 7 of them. The first sample
/// of each day supplies the condition and icon.
pub fn daily_summaries(samples: &[ForecastSample]) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, Vec<&ForecastSample>> = BTreeMap::new();
    for sample in samples {
        days.entry(sample.timestamp.date_naive())
            .or_default()
            .push(sample);
    }

    days.into_iter()
        .take(MAX_DAILY)
        .filter_map(|(date, day)| {
            let first = day.first()?;
            let max = day
                .iter()
                .map(|s| s.temperature_c)
                .fold(f64::NEG_INFINITY, f64::max);
            let min = day
                .iter()
                .map(|s| s.temperature_c)
                .fold(f64::INFINITY, f64::min);

            Some(DailySummary {
                date,
                weekday_label: weekday_label(date).to_string(),
                max_temp_c: round_to(max, 1),
                min_temp_c: round_to(min, 1),
                condition: first.condition.clone(),
                icon_code: first.icon_code.clone(),
                humidity_pct: mean(day.iter().map(|s| s.humidity_pct))
                    .round()
                    .clamp(0.0, 100.0) as u8,
                wind_speed_ms: round_to(mean(day.iter().map(|s| s.wind_speed_ms)), 1),
            })
        })
        .collect()
}
