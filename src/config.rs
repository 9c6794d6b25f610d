use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

use crate::types::{LatLon, Viewport};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub fap_csv: PathBuf,
    pub state_boundaries: PathBuf,
    pub ea_polygon_dir: PathBuf, // one <UPPERCASE STATE>.geojson per state
    #[serde(default = "default_boundary_name_property")]
    pub boundary_name_property: String,
}

fn default_boundary_name_property() -> String {
    "admin1Name".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub country_center_lat: f64,
    pub country_center_lon: f64,
    pub country_zoom: f64,
    pub state_zoom: f64,
    pub marker_size: u32,
    pub marker_opacity: f64,
    pub boundary_color: String,
    pub boundary_opacity: f64,
    pub ea_line_color: String,
    pub ea_line_width: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            country_center_lat: 9.0820,
            country_center_lon: 8.6753,
            country_zoom: 5.85,
            state_zoom: 7.0,
            marker_size: 13,
            marker_opacity: 0.7,
            boundary_color: "#636efa".to_string(),
            boundary_opacity: 0.5,
            ea_line_color: "purple".to_string(),
            ea_line_width: 4.0,
        }
    }
}

impl MapConfig {
    pub fn country_viewport(&self) -> Viewport {
        Viewport {
            center: LatLon::new(self.country_center_lat, self.country_center_lon),
            zoom: self.country_zoom,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
