//! Metric derivers: raw operational tables → one metric per route key.
//!
//! Each deriver fails softly. A row that cannot be parsed becomes a
//! [`RowIssue`] and is skipped; a key whose rows all failed is reported as
//! unavailable and reads as `None`, which the scorer turns into 0.

pub mod compliance;
pub mod frequency;
pub mod punctuality;
pub mod stop_spacing;
pub mod trajectory;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::ParseError;
use crate::indicators::utility::MeanAccumulator;
use crate::route::RouteKey;

/// A per-route metric that the line aggregator can join on.
pub trait RouteMetric {
    fn name(&self) -> &str;

    /// Value for `key`, or `None` when the source has nothing usable for it.
    fn value(&self, key: &RouteKey) -> Option<f64>;
}

/// A row a deriver had to skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub source: String,
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub reason: String,
}

impl RowIssue {
    pub fn new(source: &str, index: usize, reason: impl ToString) -> Self {
        Self {
            source: source.to_string(),
            row: index + 1,
            reason: reason.to_string(),
        }
    }
}

/// Mean of a continuous metric per route key.
///
/// Groups hold sum/count pairs, so a route-level lookup over several
/// directions is the exact mean of all their rows.
#[derive(Debug, Clone, Default)]
pub struct MetricTable {
    name: String,
    groups: BTreeMap<RouteKey, MeanAccumulator>,
    unavailable: BTreeSet<RouteKey>,
    pub issues: Vec<RowIssue>,
}

impl MetricTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, key: RouteKey, value: f64) {
        self.groups.entry(key).or_default().push(value);
    }

    /// Records a skipped row, marking its key unavailable when it is known.
    pub fn reject(&mut self, index: usize, key: Option<RouteKey>, error: ParseError) {
        debug!(source = %self.name, row = index + 1, error = %error, "Skipping row");
        if let Some(key) = key {
            self.unavailable.insert(key);
        }
        self.issues.push(RowIssue::new(&self.name, index, error));
    }

    /// Keys that had rows but no usable value.
    pub fn unavailable(&self) -> impl Iterator<Item = &RouteKey> {
        self.unavailable.iter().filter(|k| !self.groups.contains_key(*k))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Accumulator for `key` following the join rules: exact match first;
    /// a key without direction merges every group of its route; a key with
    /// a direction falls back to the route-level group.
    pub fn accumulator(&self, key: &RouteKey) -> Option<MeanAccumulator> {
        if let Some(acc) = self.groups.get(key) {
            return Some(*acc);
        }

        match key.direction {
            None => {
                let mut merged = MeanAccumulator::default();
                for (_, acc) in self.groups.iter().filter(|(k, _)| k.route == key.route) {
                    merged.merge(acc);
                }
                (merged.count > 0).then_some(merged)
            }
            Some(_) => self.groups.get(&key.without_direction()).copied(),
        }
    }
}

impl RouteMetric for MetricTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, key: &RouteKey) -> Option<f64> {
        self.accumulator(key).and_then(|acc| acc.mean())
    }
}

/// Missing-value sentinels used by the operators' exports.
pub fn is_missing(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") | Some("-") => true,
        Some(_) => false,
    }
}

/// Parses a decimal number accepting either `.` or `,` as separator.
pub fn parse_number(raw: &str) -> Result<f64, ParseError> {
    let text = raw.trim();
    let normalized = if text.contains(',') && !text.contains('.') {
        text.replace(',', ".")
    } else {
        text.to_string()
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::Number(raw.to_string()))
}

/// Like [`parse_number`] but treats missing sentinels as `None`.
pub fn parse_optional_number(raw: Option<&str>) -> Result<Option<f64>, ParseError> {
    if is_missing(raw) {
        return Ok(None);
    }
    raw.map(parse_number).transpose()
}
