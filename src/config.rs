use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::geometry::Crs;

/// Sources and options of a scoring run.
///
/// Stored as a JSON object on disk; only `static_attributes` is required:
/// ```json
/// {
///   "static_attributes": "data/dados_linhas.csv",
///   "trips": "data/frequencia.csv",
///   "punctuality": "data/pontualidade.csv",
///   "compliance": "data/cumprimento.csv",
///   "stops": "data/pontos.csv",
///   "geometry_crs": "EPSG:4326",
///   "points_crs": "EPSG:4326",
///   "by_direction": false,
///   "output": "out/iqt.csv",
///   "manifest": "out/errors.json"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub static_attributes: PathBuf,
    #[serde(default)]
    pub trips: Option<PathBuf>,
    #[serde(default)]
    pub punctuality: Option<PathBuf>,
    #[serde(default)]
    pub compliance: Option<PathBuf>,
    #[serde(default)]
    pub stops: Option<PathBuf>,
    #[serde(default)]
    pub geometry_crs: Crs,
    #[serde(default)]
    pub points_crs: Crs,
    #[serde(default)]
    pub by_direction: bool,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("iqt_results.csv")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("iqt_errors.json")
}

impl RunConfig {
    /// Loads the config from a JSON file at `path`. Relative source paths
    /// are resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: RunConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_sources(base);
        }
        Ok(config)
    }

    fn resolve_sources(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.static_attributes);
        for source in [
            &mut self.trips,
            &mut self.punctuality,
            &mut self.compliance,
            &mut self.stops,
        ]
        .into_iter()
        .flatten()
        {
            resolve(source);
        }
    }
}
