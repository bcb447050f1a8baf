//! CSV ingestion for the raw source tables.
//!
//! Every column is read as text so that a malformed value only costs its own
//! row (the derivers record a [`RowIssue`]) instead of the whole file. Ragged
//! or unreadable records are dropped at read time and reported the same way.
//! The only hard failure is a missing required column.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::derive::RowIssue;
use crate::error::{LoadError, SchemaMismatch};
use crate::indicators::types::Indicator;
use crate::route::{Direction, RouteKey};

/// Route-level attributes maintained by the operator (`dados_linhas`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticAttributesRow {
    pub linha: String,
    #[serde(default)]
    pub sentido: Option<String>,
    pub via_pavimentada: Option<String>,
    pub integracao: Option<String>,
    pub treinamento_motorista: Option<String>,
    pub informacao_internet: Option<String>,
    pub valor_tarifa: Option<String>,
    #[serde(default)]
    pub abrangencia: Option<String>,
    #[serde(default)]
    pub distancia: Option<String>,
    #[serde(default)]
    pub geometry: Option<String>,
}

impl StaticAttributesRow {
    pub const SOURCE: &'static str = "static_attributes";
    pub const REQUIRED: &'static [&'static str] = &[
        "linha",
        "via_pavimentada",
        "integracao",
        "treinamento_motorista",
        "informacao_internet",
        "valor_tarifa",
    ];
}

/// One trip from the ticketing log (`frequencia`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripLogRow {
    pub linha: String,
    pub sentido: String,
    pub hsstart: String,
    pub hsstop: String,
    pub datai: String,
    pub dataf: String,
    #[serde(default)]
    pub qtpsg: Option<String>,
    #[serde(default)]
    pub valor_jornada: Option<String>,
}

impl TripLogRow {
    pub const SOURCE: &'static str = "trip_log";
    pub const REQUIRED: &'static [&'static str] =
        &["linha", "sentido", "hsstart", "hsstop", "datai", "dataf"];
}

/// One stop event from the punctuality report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PunctualityRow {
    #[serde(rename = "Data", default)]
    pub data: Option<String>,
    #[serde(rename = "Trajeto")]
    pub trajeto: String,
    #[serde(rename = "Chegada ao ponto")]
    pub chegada_ao_ponto: Option<String>,
    #[serde(rename = "Partida Real")]
    pub partida_real: Option<String>,
    #[serde(rename = "Chegada Real")]
    pub chegada_real: Option<String>,
}

impl PunctualityRow {
    pub const SOURCE: &'static str = "punctuality_log";
    pub const REQUIRED: &'static [&'static str] =
        &["Trajeto", "Chegada ao ponto", "Partida Real", "Chegada Real"];
}

/// One executed trip from the itinerary-compliance report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplianceRow {
    #[serde(rename = "Trajeto")]
    pub trajeto: String,
    #[serde(rename = "KM Executado")]
    pub km_executado: Option<String>,
}

impl ComplianceRow {
    pub const SOURCE: &'static str = "compliance_log";
    pub const REQUIRED: &'static [&'static str] = &["Trajeto", "KM Executado"];
}

/// A located point: a stop or a residence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
}

impl PointRow {
    pub const SOURCE: &'static str = "points";
    pub const REQUIRED: &'static [&'static str] = &["ID", "Longitude", "Latitude"];
}

/// One fare-integration agreement; only the originating route is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrationRow {
    #[serde(rename = "LINHA ORIGEM")]
    pub linha_origem: String,
}

impl IntegrationRow {
    pub const SOURCE: &'static str = "integrations";
    pub const REQUIRED: &'static [&'static str] = &["LINHA ORIGEM"];
}

/// A precomputed score matrix row: a route key and the raw I1..I10 cells.
#[derive(Debug, Clone)]
pub struct ScoreMatrixRow {
    pub key: RouteKey,
    pub cells: Vec<String>,
}

pub const SCORE_MATRIX_SOURCE: &str = "score_matrix";

/// Rows read from one source, plus the records that had to be dropped.
#[derive(Debug, Clone, Default)]
pub struct Table<T> {
    pub rows: Vec<T>,
    pub issues: Vec<RowIssue>,
}

impl<T> Table<T> {
    fn skip(&mut self, source_name: &str, index: usize, error: csv::Error) {
        warn!(source = source_name, row = index + 1, error = %error, "Dropping unreadable record");
        self.issues.push(RowIssue::new(source_name, index, error));
    }
}

fn open(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file))
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> LoadError + '_ {
    move |source| LoadError::Csv {
        path: path.display().to_string(),
        source,
    }
}

/// Checks that every required column is present in `headers`.
pub fn check_headers(
    source_name: &str,
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<(), SchemaMismatch> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaMismatch {
            source_name: source_name.to_string(),
            missing,
        })
    }
}

/// Reads a whole CSV table after checking its header.
///
/// A record that is too short for the row type or otherwise fails to
/// deserialize is dropped with a [`RowIssue`]; the rest of the file loads.
/// Short records still load when the columns they lack are optional.
pub fn read_table<T: DeserializeOwned>(
    path: &Path,
    source_name: &str,
    required: &[&str],
) -> Result<Table<T>, LoadError> {
    let mut rdr = open(path)?;
    let headers = rdr.headers().map_err(csv_error(path))?.clone();
    check_headers(source_name, &headers, required)?;

    let mut table = Table {
        rows: Vec::new(),
        issues: Vec::new(),
    };
    for (idx, result) in rdr.deserialize().enumerate() {
        match result {
            Ok(record) => table.rows.push(record),
            Err(e) => table.skip(source_name, idx, e),
        }
    }

    info!(
        source = source_name,
        path = %path.display(),
        rows = table.rows.len(),
        dropped = table.issues.len(),
        "Loaded source table"
    );
    Ok(table)
}

pub fn read_static_attributes(path: &Path) -> Result<Table<StaticAttributesRow>, LoadError> {
    read_table(path, StaticAttributesRow::SOURCE, StaticAttributesRow::REQUIRED)
}

pub fn read_trip_log(path: &Path) -> Result<Table<TripLogRow>, LoadError> {
    read_table(path, TripLogRow::SOURCE, TripLogRow::REQUIRED)
}

pub fn read_punctuality_log(path: &Path) -> Result<Table<PunctualityRow>, LoadError> {
    read_table(path, PunctualityRow::SOURCE, PunctualityRow::REQUIRED)
}

pub fn read_compliance_log(path: &Path) -> Result<Table<ComplianceRow>, LoadError> {
    read_table(path, ComplianceRow::SOURCE, ComplianceRow::REQUIRED)
}

pub fn read_points(path: &Path) -> Result<Table<PointRow>, LoadError> {
    read_table(path, PointRow::SOURCE, PointRow::REQUIRED)
}

pub fn read_integrations(path: &Path) -> Result<Table<IntegrationRow>, LoadError> {
    read_table(path, IntegrationRow::SOURCE, IntegrationRow::REQUIRED)
}

/// Reads a `linha[, sentido], I1..I10` matrix. Cells are kept as text; the
/// calculator decides what a malformed cell means for its row.
pub fn read_score_matrix(path: &Path) -> Result<Table<ScoreMatrixRow>, LoadError> {
    let mut rdr = open(path)?;
    let headers = rdr.headers().map_err(csv_error(path))?.clone();

    let mut required = vec!["linha"];
    required.extend(Indicator::ALL.iter().map(Indicator::code));
    check_headers(SCORE_MATRIX_SOURCE, &headers, &required)?;

    let position = |name: &str| headers.iter().position(|h| h == name);
    let route_col = position("linha");
    let direction_col = position("sentido");
    let score_cols: Vec<Option<usize>> = Indicator::ALL.iter().map(|i| position(i.code())).collect();

    let mut table = Table {
        rows: Vec::new(),
        issues: Vec::new(),
    };
    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                table.skip(SCORE_MATRIX_SOURCE, idx, e);
                continue;
            }
        };
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("").to_string();

        let direction = Direction::parse_code(&cell(direction_col)).unwrap_or_else(|e| {
            debug!(error = %e, "Ignoring unreadable direction in score matrix");
            None
        });
        table.rows.push(ScoreMatrixRow {
            key: RouteKey::new(cell(route_col), direction),
            cells: score_cols.iter().map(|c| cell(*c)).collect(),
        });
    }

    info!(path = %path.display(), rows = table.rows.len(), "Loaded score matrix");
    Ok(table)
}
