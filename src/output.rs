//! Output formatting and persistence for scored routes.
//!
//! Results, links and summaries go to CSV; the error manifest goes to JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

use crate::derive::RowIssue;
use crate::indicators::types::{IqtResult, RouteFailure};

/// One row of the results table handed to the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IqtRecord {
    pub linha: String,
    pub sentido: String,
    #[serde(rename = "I1")]
    pub i1: u8,
    #[serde(rename = "I2")]
    pub i2: u8,
    #[serde(rename = "I3")]
    pub i3: u8,
    #[serde(rename = "I4")]
    pub i4: u8,
    #[serde(rename = "I5")]
    pub i5: u8,
    #[serde(rename = "I6")]
    pub i6: u8,
    #[serde(rename = "I7")]
    pub i7: u8,
    #[serde(rename = "I8")]
    pub i8: u8,
    #[serde(rename = "I9")]
    pub i9: u8,
    #[serde(rename = "I10")]
    pub i10: u8,
    pub iqt: f64,
    pub classificacao: String,
    pub cor: String,
}

impl From<&IqtResult> for IqtRecord {
    fn from(result: &IqtResult) -> Self {
        let s = &result.scores;
        Self {
            linha: s.key.route.clone(),
            sentido: s.key.direction_label().to_string(),
            i1: s.pavement,
            i2: s.stop_spacing,
            i3: s.integration,
            i4: s.punctuality,
            i5: s.frequency,
            i6: s.itinerary_compliance,
            i7: s.network_coverage,
            i8: s.driver_training,
            i9: s.info_availability,
            i10: s.fare_trend,
            iqt: result.iqt,
            classificacao: result.class.as_str().to_string(),
            cor: result.color.hex().to_string(),
        }
    }
}

/// One nearest-point link, by point id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub origem: String,
    pub ponto: String,
    pub distancia: f64,
}

/// A source table that could not be used at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceError {
    pub source: String,
    pub reason: String,
}

/// Everything that went wrong during a run, written next to the results.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorManifest {
    pub generated_at: DateTime<Utc>,
    pub failures: Vec<RouteFailure>,
    pub source_errors: Vec<SourceError>,
    pub row_issues: Vec<RowIssue>,
}

impl ErrorManifest {
    pub fn new(
        failures: Vec<RouteFailure>,
        source_errors: Vec<SourceError>,
        row_issues: Vec<RowIssue>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            failures,
            source_errors,
            row_issues,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.source_errors.is_empty() && self.row_issues.is_empty()
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

/// Writes `records` to a fresh CSV file with a header row.
pub fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "Wrote CSV");
    Ok(())
}

/// Writes the scored routes in results-table layout.
pub fn write_results(path: &Path, results: &[IqtResult]) -> Result<()> {
    let records: Vec<IqtRecord> = results.iter().map(IqtRecord::from).collect();
    write_csv(path, &records)
}

/// Writes `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), "Wrote JSON");
    Ok(())
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}
