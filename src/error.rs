//! Error taxonomy shared by the derivers, the calculator and the ingestion layer.

use thiserror::Error;

/// A single raw value could not be interpreted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("trajectory description '{0}' does not match '<route> - ... (ida|volta)'")]
    Trajectory(String),

    #[error("direction code '{0}' is neither 0/1 nor ida/volta")]
    Direction(String),

    #[error("invalid clock time '{0}', expected HH:MM:SS")]
    Time(String),

    #[error("invalid calendar date '{0}', expected DD/MM/YYYY")]
    Date(String),

    #[error("trip ends before it starts ({start} > {stop})")]
    NegativeDuration { start: String, stop: String },

    #[error("invalid number '{0}'")]
    Number(String),

    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("coordinate ({x}, {y}) is outside the valid range of {crs}")]
    Coordinate { x: f64, y: f64, crs: &'static str },

    #[error("unknown coordinate reference system '{0}'")]
    Crs(String),
}

/// A source table is missing columns the core relies on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("source '{source_name}' is missing columns: {missing:?}")]
pub struct SchemaMismatch {
    pub source_name: String,
    pub missing: Vec<String>,
}

/// IQT arithmetic on a malformed score row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("score row has {found} values, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("score for {indicator} is not an ordinal 0..=3: {value}")]
    NotOrdinal { indicator: &'static str, value: String },

    #[error("IQT evaluated to a non-finite value")]
    NonFinite,
}

/// Nearest-point linking failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("cannot link against an empty target point set")]
    EmptyTarget,
}

/// Failure to load one source table. The run continues without that source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaMismatch),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}
