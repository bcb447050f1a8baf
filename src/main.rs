//! CLI entry point for the IQT rater.
//!
//! Provides subcommands for scoring a route network from its source tables,
//! recomputing IQT from a score matrix, linking point sets and summarising
//! trip logs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iqt_rater::config::RunConfig;
use iqt_rater::derive::RowIssue;
use iqt_rater::error::LoadError;
use iqt_rater::geometry::Crs;
use iqt_rater::geometry::linker::link;
use iqt_rater::input::{
    ComplianceRow, PointRow, PunctualityRow, Table, TripLogRow, read_compliance_log,
    read_integrations, read_points, read_punctuality_log, read_score_matrix,
    read_static_attributes, read_trip_log,
};
use iqt_rater::output::{
    ErrorManifest, LinkRecord, SourceError, print_pretty, write_csv, write_json, write_results,
};
use iqt_rater::pipeline::{PipelineInputs, evaluate_matrix, load_points, run};
use iqt_rater::summary::{integrated_routes, summarize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "iqt-rater")]
#[command(about = "Score bus routes with the Transport Quality Index (IQT)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline from the sources named in a JSON config
    Score {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Results CSV, overrides the config
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Error manifest JSON, overrides the config
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
    /// Recompute IQT and class from a precomputed score matrix (linha, I1..I10)
    Iqt {
        /// Score matrix CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Results CSV
        #[arg(short, long, default_value = "iqt_results.csv")]
        output: PathBuf,

        /// Error manifest JSON
        #[arg(short, long, default_value = "iqt_errors.json")]
        manifest: PathBuf,
    },
    /// Link every point of one set to its nearest point in another
    Link {
        /// Origin points CSV (ID, Longitude, Latitude)
        #[arg(long)]
        from: PathBuf,

        /// Target points CSV (ID, Longitude, Latitude)
        #[arg(long)]
        to: PathBuf,

        /// CRS of both point sets
        #[arg(long, default_value = "EPSG:4326")]
        crs: Crs,

        /// Links CSV
        #[arg(short, long, default_value = "links.csv")]
        output: PathBuf,
    },
    /// Per-route operation summary of a trip log
    Summary {
        /// Trip log CSV
        #[arg(short, long)]
        trips: PathBuf,

        /// Summary CSV
        #[arg(short, long, default_value = "summary.csv")]
        output: PathBuf,

        /// Per-day passengers and revenue per route CSV
        #[arg(long)]
        daily: Option<PathBuf>,

        /// Per-month mean trip duration per route CSV
        #[arg(long)]
        monthly: Option<PathBuf>,

        /// Rank routes by revenue instead of passengers
        #[arg(long)]
        by_revenue: bool,

        /// Fare integrations CSV (LINHA ORIGEM); flags integrated routes
        #[arg(long)]
        integrations: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/iqt_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("iqt_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            config,
            output,
            manifest,
        } => score(&config, output, manifest)?,
        Commands::Iqt {
            input,
            output,
            manifest,
        } => recompute_iqt(&input, &output, &manifest)?,
        Commands::Link {
            from,
            to,
            crs,
            output,
        } => link_points(&from, &to, crs, &output)?,
        Commands::Summary {
            trips,
            output,
            daily,
            monthly,
            by_revenue,
            integrations,
        } => summarize_trips(
            &trips,
            &output,
            daily.as_deref(),
            monthly.as_deref(),
            by_revenue,
            integrations.as_deref(),
        )?,
    }

    Ok(())
}

/// What went wrong while loading the sources of a run.
#[derive(Default)]
struct LoadLog {
    source_errors: Vec<SourceError>,
    issues: Vec<RowIssue>,
}

impl LoadLog {
    /// Keeps the rows of a loaded source and collects its dropped records.
    fn keep<T>(&mut self, table: Table<T>) -> Vec<T> {
        self.issues.extend(table.issues);
        table.rows
    }

    /// Loads an optional source. A source that fails to load is logged and
    /// recorded; the run goes on without it.
    fn optional<T>(
        &mut self,
        path: Option<&Path>,
        source: &str,
        read: impl Fn(&Path) -> Result<Table<T>, LoadError>,
    ) -> Option<Vec<T>> {
        let path = path?;
        match read(path) {
            Ok(table) => Some(self.keep(table)),
            Err(e) => {
                error!(source, path = %path.display(), error = %e, "Source unusable, continuing without it");
                self.source_errors.push(SourceError {
                    source: source.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

/// Runs the full pipeline and writes the results plus the error manifest.
#[tracing::instrument(skip_all, fields(config = %config_path.display()))]
fn score(
    config_path: &Path,
    output: Option<PathBuf>,
    manifest: Option<PathBuf>,
) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let mut log = LoadLog::default();
    let static_attributes = log.keep(
        read_static_attributes(&config.static_attributes)
            .context("static attributes are required to score routes")?,
    );
    let trips = log.optional(config.trips.as_deref(), TripLogRow::SOURCE, read_trip_log);
    let punctuality = log.optional(
        config.punctuality.as_deref(),
        PunctualityRow::SOURCE,
        read_punctuality_log,
    );
    let compliance = log.optional(
        config.compliance.as_deref(),
        ComplianceRow::SOURCE,
        read_compliance_log,
    );
    let stops = log.optional(config.stops.as_deref(), PointRow::SOURCE, read_points);

    let inputs = PipelineInputs {
        static_attributes,
        trips,
        punctuality,
        compliance,
        stops,
        geometry_crs: config.geometry_crs,
        points_crs: config.points_crs,
        by_direction: config.by_direction,
        issues: log.issues,
    };

    let report = run(&inputs);

    let output = output.unwrap_or(config.output);
    let manifest_path = manifest.unwrap_or(config.manifest);
    write_results(&output, &report.results)?;

    let manifest = ErrorManifest::new(report.failures, log.source_errors, report.issues);
    if !manifest.is_empty() {
        warn!(
            failures = manifest.failures.len(),
            source_errors = manifest.source_errors.len(),
            row_issues = manifest.row_issues.len(),
            path = %manifest_path.display(),
            "Run finished with errors, see manifest"
        );
    }
    write_json(&manifest_path, &manifest)?;

    info!(routes = report.results.len(), output = %output.display(), "Scoring complete");
    Ok(())
}

/// Recomputes IQT from a score matrix.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
fn recompute_iqt(input: &Path, output: &Path, manifest: &Path) -> Result<()> {
    let matrix = read_score_matrix(input)?;
    let (results, failures) = evaluate_matrix(matrix.rows);

    for result in &results {
        print_pretty(result);
    }
    write_results(output, &results)?;
    write_json(manifest, &ErrorManifest::new(failures, Vec::new(), matrix.issues))?;
    Ok(())
}

/// Links every origin point to its nearest target point.
#[tracing::instrument(skip_all, fields(from = %from.display(), to = %to.display(), crs = %crs))]
fn link_points(from: &Path, to: &Path, crs: Crs, output: &Path) -> Result<()> {
    let mut log = LoadLog::default();
    let origin_rows = log.keep(read_points(from)?);
    let target_rows = log.keep(read_points(to)?);
    let (origins, origin_issues) = load_points(&origin_rows, crs)?;
    let (targets, target_issues) = load_points(&target_rows, crs)?;
    for issue in log.issues.iter().chain(&origin_issues).chain(&target_issues) {
        warn!(row = issue.row, reason = %issue.reason, "Skipping point");
    }

    let links = link(origins.points(), targets.points())?;
    let records: Vec<LinkRecord> = links
        .pontos
        .iter()
        .zip(&links.distancias)
        .zip(&origins.ids)
        .map(|((target, distance), origin)| LinkRecord {
            origem: origin.clone(),
            ponto: targets.ids[*target].clone(),
            distancia: *distance,
        })
        .collect();

    write_csv(output, &records)
}

/// Writes the per-route summary of a trip log, plus the optional daily and
/// monthly breakdowns.
#[tracing::instrument(skip_all, fields(trips = %trips.display()))]
fn summarize_trips(
    trips: &Path,
    output: &Path,
    daily: Option<&Path>,
    monthly: Option<&Path>,
    by_revenue: bool,
    integrations: Option<&Path>,
) -> Result<()> {
    let mut log = LoadLog::default();
    let rows = log.keep(read_trip_log(trips)?);
    let mut summary = summarize(&rows);
    if by_revenue {
        summary.rank_by_revenue();
    }
    if let Some(path) = integrations {
        let routes = integrated_routes(&log.keep(read_integrations(path)?));
        info!(routes = routes.len(), "Loaded integrated routes");
        summary.mark_integrated(&routes);
    }

    for issue in log.issues.iter().chain(&summary.issues) {
        warn!(source = %issue.source, row = issue.row, reason = %issue.reason, "Row issue");
    }

    write_csv(output, &summary.routes)?;
    if let Some(path) = daily {
        write_csv(path, &summary.daily)?;
    }
    if let Some(path) = monthly {
        write_csv(path, &summary.monthly)?;
    }
    Ok(())
}
