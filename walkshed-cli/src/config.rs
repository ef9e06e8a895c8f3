//! TOML run configuration shared by all pipeline stages.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkshed_core::Error;
use walkshed_core::loading::overpass::DEFAULT_ENDPOINT;
use walkshed_core::prelude::{DETOUR_FACTOR, TIME_BUDGET};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Overpass interpreter endpoint
    pub overpass_url: String,
    /// Polygon file delimiting the study area; its bounds become the
    /// Overpass bounding box
    pub study_area: PathBuf,
    /// Directory for per-category POI point files
    pub pois_dir: PathBuf,
    /// Directory for per-category isochrone polygon files
    pub isochrones_dir: PathBuf,
    /// Coverage raster output
    pub coverage_raster: PathBuf,
    /// Building centroid point file for the routes stage
    pub buildings: PathBuf,
    /// Route-frequency edge output
    pub routes_output: PathBuf,
    /// Raster cell size in map units
    pub resolution: f64,
    /// Walking time budget in seconds
    pub time_budget: u32,
    /// Network detour factor applied to the budget
    pub detour_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overpass_url: DEFAULT_ENDPOINT.to_string(),
            study_area: PathBuf::from("study_area.geojson"),
            pois_dir: PathBuf::from("pois"),
            isochrones_dir: PathBuf::from("isochrones"),
            coverage_raster: PathBuf::from("coverage.tif"),
            buildings: PathBuf::from("buildings.geojson"),
            routes_output: PathBuf::from("routes.geojson"),
            resolution: 1.0,
            time_budget: TIME_BUDGET,
            detour_factor: DETOUR_FACTOR,
        }
    }
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::InvalidData(format!("config: {e}")))
    }

    /// Effective traversal radius: the budget scaled by the detour
    /// factor, applied as metres of walked street length.
    pub fn cutoff(&self) -> u32 {
        (f64::from(self.time_budget) * self.detour_factor).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/walkshed.toml")).unwrap();
        assert_eq!(config.overpass_url, DEFAULT_ENDPOINT);
        assert_eq!(config.cutoff(), 1260);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walkshed.toml");
        std::fs::write(&path, "time_budget = 600\nresolution = 10.0\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.time_budget, 600);
        assert_eq!(config.cutoff(), 840);
        assert_eq!(config.resolution, 10.0);
        assert_eq!(config.pois_dir, PathBuf::from("pois"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walkshed.toml");
        std::fs::write(&path, "timebudget = 600\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
