//! Raw metric → ordinal score (0–3) for every indicator.
//!
//! Each numeric indicator is a monotone staircase: the score never goes
//! down as the underlying quality improves. Missing or invalid input
//! (`None`, NaN, infinities, negative quantities) scores 0 so batch
//! scoring stays total.

use super::tiers::{parse_fare_trend, parse_info_availability, parse_integration};
use super::types::{RouteMetricRecord, ScoreRow};

fn valid(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// On-time ratio.
///
/// | Range          | Score |
/// |----------------|-------|
/// | >= 0.95        | 3     |
/// | [0.90, 0.95)   | 2     |
/// | [0.80, 0.90)   | 1     |
/// | < 0.80         | 0     |
pub fn punctuality(ratio: Option<f64>) -> u8 {
    match valid(ratio) {
        Some(p) if p >= 0.95 => 3,
        Some(p) if p >= 0.90 => 2,
        Some(p) if p >= 0.80 => 1,
        _ => 0,
    }
}

/// Paved fraction of the route.
///
/// | Range          | Score |
/// |----------------|-------|
/// | >= 1.0         | 3     |
/// | [0.95, 1.0)    | 2     |
/// | [0.85, 0.95)   | 1     |
/// | < 0.85         | 0     |
pub fn pavement(fraction: Option<f64>) -> u8 {
    match valid(fraction) {
        Some(p) if p >= 1.0 => 3,
        Some(p) if p >= 0.95 => 2,
        Some(p) if p >= 0.85 => 1,
        _ => 0,
    }
}

/// Mean distance between consecutive stops, in metres. Shorter is better.
///
/// | Range          | Score |
/// |----------------|-------|
/// | <= 250         | 3     |
/// | (250, 400]     | 2     |
/// | (400, 500]     | 1     |
/// | > 500          | 0     |
pub fn stop_spacing(distance_m: Option<f64>) -> u8 {
    match valid(distance_m) {
        Some(d) if d <= 250.0 => 3,
        Some(d) if d <= 400.0 => 2,
        Some(d) if d <= 500.0 => 1,
        _ => 0,
    }
}

/// Mean service interval, in minutes. Shorter is better.
///
/// | Range          | Score |
/// |----------------|-------|
/// | <= 10          | 3     |
/// | (10, 15]       | 2     |
/// | (15, 30]       | 1     |
/// | > 30           | 0     |
pub fn frequency(interval_minutes: Option<f64>) -> u8 {
    match valid(interval_minutes) {
        Some(m) if m <= 10.0 => 3,
        Some(m) if m <= 15.0 => 2,
        Some(m) if m <= 30.0 => 1,
        _ => 0,
    }
}

/// Executed / planned distance.
///
/// | Range          | Score |
/// |----------------|-------|
/// | >= 1.0         | 3     |
/// | [0.8, 1.0)     | 2     |
/// | [0.5, 0.8)     | 1     |
/// | < 0.5          | 0     |
pub fn itinerary_compliance(ratio: Option<f64>) -> u8 {
    match valid(ratio) {
        Some(r) if r >= 1.0 => 3,
        Some(r) if r >= 0.8 => 2,
        Some(r) if r >= 0.5 => 1,
        _ => 0,
    }
}

/// Fraction of drivers with up-to-date training.
///
/// | Range          | Score |
/// |----------------|-------|
/// | >= 1.0         | 3     |
/// | [0.95, 1.0)    | 2     |
/// | [0.90, 0.95)   | 1     |
/// | < 0.90         | 0     |
pub fn driver_training(fraction: Option<f64>) -> u8 {
    match valid(fraction) {
        Some(t) if t >= 1.0 => 3,
        Some(t) if t >= 0.95 => 2,
        Some(t) if t >= 0.90 => 1,
        _ => 0,
    }
}

/// Network coverage has no measurable source; the static attributes carry a
/// pre-assessed tier which is taken as-is when it is an ordinal in 0..=3.
pub fn network_coverage(tier: Option<f64>) -> u8 {
    match valid(tier) {
        Some(t) if t.fract() == 0.0 && t <= 3.0 => t as u8,
        _ => 0,
    }
}

pub fn integration(label: Option<&str>) -> u8 {
    label.map(|l| parse_integration(l).score()).unwrap_or(0)
}

pub fn info_availability(label: Option<&str>) -> u8 {
    label.map(|l| parse_info_availability(l).score()).unwrap_or(0)
}

pub fn fare_trend(label: Option<&str>) -> u8 {
    label.map(|l| parse_fare_trend(l).score()).unwrap_or(0)
}

/// Scores every column of a joined record.
pub fn score_record(record: &RouteMetricRecord) -> ScoreRow {
    ScoreRow {
        key: record.key.clone(),
        pavement: pavement(record.pavement),
        stop_spacing: stop_spacing(record.stop_spacing_m),
        integration: integration(record.integration.as_deref()),
        punctuality: punctuality(record.punctuality),
        frequency: frequency(record.interval_minutes),
        itinerary_compliance: itinerary_compliance(record.itinerary_ratio),
        network_coverage: network_coverage(record.network_coverage),
        driver_training: driver_training(record.training),
        info_availability: info_availability(record.info_availability.as_deref()),
        fare_trend: fare_trend(record.fare_trend.as_deref()),
    }
}
