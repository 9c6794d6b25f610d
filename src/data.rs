use crate::config::InputConfig;
use crate::error::LoadError;
use crate::palette::{fap_type_colors, functionality_colors};
use crate::types::{
    category_cell, BoundaryPolygon, EnumerationAreaPolygon, FapRecord, Functionality, LatLon,
    LocationClass, ALL,
};
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, Trim};
use geo::{Centroid, MultiPolygon};
use geojson::{GeoJson, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "STATE",
    "EA NAME",
    "FAP_TYPE",
    "FORMALITY",
    "FAP_FUNCTIONALITY",
    "LATITUDE",
    "LONGITUDE",
    "FAP_LOCATION",
    "KM Diff Calculation",
];

#[derive(Debug, Deserialize)]
struct FapRow {
    #[serde(rename = "STATE")]
    state: String,
    #[serde(rename = "EA NAME")]
    ea_name: String,
    #[serde(rename = "FAP_TYPE")]
    fap_type: String,
    #[serde(rename = "FORMALITY")]
    formality: String,
    #[serde(rename = "FAP_FUNCTIONALITY")]
    functionality: String,
    #[serde(rename = "LATITUDE")]
    latitude: String,
    #[serde(rename = "LONGITUDE")]
    longitude: String,
    #[serde(rename = "FAP_LOCATION")]
    location: String,
    #[serde(rename = "KM Diff Calculation")]
    km_diff: String,
}

impl FapRow {
    fn into_record(self) -> Option<FapRecord> {
        let lat = self.latitude.trim().parse::<f64>().ok()?;
        let lon = self.longitude.trim().parse::<f64>().ok()?;
        let position = LatLon::new(lat, lon);
        if !position.within_nigeria() {
            return None;
        }

        Some(FapRecord {
            fap_type: category_cell(&self.fap_type),
            functionality: category_cell(&self.functionality),
            location: LocationClass::from(self.location.as_str()),
            proximity_km: self
                .km_diff
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
            state: self.state,
            ea_name: self.ea_name,
            formality: self.formality,
            position,
        })
    }
}

pub fn load_fap_records(path: &Path) -> Result<Vec<FapRecord>> {
    // 1. Check the file and its header
    if !path.exists() {
        return Err(LoadError::MissingFile(path.to_path_buf()).into());
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(file);
    let headers = rdr.headers()?.clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            }
            .into());
        }
    }

    // 2. Parse rows, dropping unusable coordinates
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line, result) in rdr.deserialize::<FapRow>().enumerate() {
        let row = result.with_context(|| format!("Malformed row {} in {:?}", line + 2, path))?;
        match row.into_record() {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped rows with missing or out-of-region coordinates in {:?}", path);
    }
    info!("Loaded {} FAP records from {:?}", records.len(), path);
    Ok(records)
}

fn read_feature_collection(path: &Path) -> Result<geojson::FeatureCollection> {
    if !path.exists() {
        return Err(LoadError::MissingFile(path.to_path_buf()).into());
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(LoadError::NotFeatureCollection(path.to_path_buf()).into()),
    }
}

pub fn load_state_boundaries(path: &Path, name_property: &str) -> Result<Vec<BoundaryPolygon>> {
    let collection = read_feature_collection(path)?;
    let mut boundaries = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let name = match feature.properties.as_ref().and_then(|p| p.get(name_property)) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(LoadError::MissingProperty {
                    path: path.to_path_buf(),
                    index,
                    property: name_property.to_string(),
                }
                .into())
            }
        };

        let unsupported = || LoadError::UnsupportedGeometry {
            path: path.to_path_buf(),
            name: name.clone(),
        };
        let value = feature.geometry.ok_or_else(unsupported)?.value;
        let geometry: MultiPolygon<f64> = match value {
            Value::Polygon(_) | Value::MultiPolygon(_) => {
                let geom: geo::Geometry<f64> = value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of '{}': {:?}", name, e))?;
                match geom {
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    geo::Geometry::MultiPolygon(mp) => mp,
                    _ => return Err(unsupported().into()),
                }
            }
            _ => return Err(unsupported().into()),
        };

        let centroid = geometry.centroid().ok_or_else(|| LoadError::EmptyGeometry {
            path: path.to_path_buf(),
            name: name.clone(),
        })?;

        boundaries.push(BoundaryPolygon { name, geometry, centroid });
    }

    info!("Loaded {} state boundaries from {:?}", boundaries.len(), path);
    Ok(boundaries)
}

/// Exterior rings of every `Polygon` feature; other geometry types are skipped.
pub fn load_enumeration_areas(path: &Path, state: &str) -> Result<Vec<EnumerationAreaPolygon>> {
    let collection = read_feature_collection(path)?;
    let total = collection.features.len();

    let polygons: Vec<EnumerationAreaPolygon> = collection
        .features
        .into_iter()
        .filter_map(|feature| match feature.geometry.map(|g| g.value) {
            Some(Value::Polygon(rings)) => rings.into_iter().next(),
            _ => None,
        })
        .map(|exterior| EnumerationAreaPolygon {
            state: state.to_string(),
            ring: exterior
                .iter()
                .filter(|p| p.len() >= 2)
                .map(|p| LatLon::new(p[1], p[0]))
                .collect(),
        })
        .collect();

    debug!(
        "Loaded {} of {} EA polygons for {} from {:?}",
        polygons.len(),
        total,
        state,
        path
    );
    Ok(polygons)
}

/// Parsed inputs keyed by source path. `clear` is the only invalidation.
#[derive(Debug, Default)]
pub struct GeoCache {
    records: RwLock<HashMap<PathBuf, Arc<Vec<FapRecord>>>>,
    boundaries: RwLock<HashMap<PathBuf, Arc<Vec<BoundaryPolygon>>>>,
    enumeration_areas: RwLock<HashMap<PathBuf, Arc<Vec<EnumerationAreaPolygon>>>>,
}

fn get_or_load<T>(
    map: &RwLock<HashMap<PathBuf, Arc<T>>>,
    path: &Path,
    load: impl FnOnce() -> Result<T>,
) -> Result<Arc<T>> {
    if let Some(hit) = map.read().unwrap_or_else(PoisonError::into_inner).get(path) {
        debug!("Cache hit for {:?}", path);
        return Ok(Arc::clone(hit));
    }

    let loaded = Arc::new(load()?);
    let mut guard = map.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(guard.entry(path.to_path_buf()).or_insert(loaded)))
}

impl GeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, path: &Path) -> Result<Arc<Vec<FapRecord>>> {
        get_or_load(&self.records, path, || load_fap_records(path))
    }

    pub fn boundaries(&self, path: &Path, name_property: &str) -> Result<Arc<Vec<BoundaryPolygon>>> {
        get_or_load(&self.boundaries, path, || load_state_boundaries(path, name_property))
    }

    pub fn enumeration_areas(&self, path: &Path, state: &str) -> Result<Arc<Vec<EnumerationAreaPolygon>>> {
        get_or_load(&self.enumeration_areas, path, || load_enumeration_areas(path, state))
    }

    pub fn clear(&self) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.boundaries.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.enumeration_areas.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorOptions {
    pub states: Vec<String>,
    /// First-appearance order, no `All` entry.
    pub proximity_states: Vec<String>,
    pub functionalities: Vec<String>,
    pub fap_types: Vec<String>,
    /// The proximity view has no `All` entry.
    pub proximity_fap_types: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DataStore {
    records: Arc<Vec<FapRecord>>,
    boundaries: Arc<Vec<BoundaryPolygon>>,
    ea_dir: PathBuf,
    cache: Arc<GeoCache>,
}

impl DataStore {
    pub fn open(input: &InputConfig, cache: Arc<GeoCache>) -> Result<Self> {
        let records = cache.records(&input.fap_csv)?;
        let boundaries = cache.boundaries(&input.state_boundaries, &input.boundary_name_property)?;
        let store = Self::from_parts(records, boundaries, input.ea_polygon_dir.clone(), cache);
        store.report_unmatched();
        Ok(store)
    }

    pub fn from_parts(
        records: Arc<Vec<FapRecord>>,
        boundaries: Arc<Vec<BoundaryPolygon>>,
        ea_dir: PathBuf,
        cache: Arc<GeoCache>,
    ) -> Self {
        Self { records, boundaries, ea_dir, cache }
    }

    /// Logs category values without a display color and states without a boundary.
    fn report_unmatched(&self) {
        for t in fap_type_colors().unknown(self.records.iter().filter_map(|r| r.fap_type.as_ref())) {
            warn!("FAP type '{}' has no display color; using fallback", t);
        }
        for f in functionality_colors().unknown(self.records.iter().filter_map(|r| r.functionality.as_ref())) {
            warn!("Functionality '{}' has no display color; using fallback", f);
        }

        let known: HashSet<&str> = self.boundaries.iter().map(|b| b.name.as_str()).collect();
        let missing: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.state.as_str())
            .filter(|s| !known.contains(s))
            .collect();
        for state in missing {
            warn!("State '{}' has records but no boundary polygon", state);
        }
    }

    pub fn records(&self) -> &[FapRecord] {
        &self.records
    }

    pub fn boundaries(&self) -> &[BoundaryPolygon] {
        &self.boundaries
    }

    pub fn boundary(&self, state: &str) -> Option<&BoundaryPolygon> {
        self.boundaries.iter().find(|b| b.name == state)
    }

    pub fn enumeration_area_path(&self, state: &str) -> PathBuf {
        self.ea_dir.join(format!("{}.geojson", state.to_uppercase()))
    }

    /// EA overlay for one state. A missing file is not an error: there is
    /// simply nothing to overlay.
    pub fn enumeration_areas(&self, state: &str) -> Result<Option<Arc<Vec<EnumerationAreaPolygon>>>> {
        let path = self.enumeration_area_path(state);
        if !path.exists() {
            warn!("No EA polygon file for {} at {:?}", state, path);
            return Ok(None);
        }
        self.cache.enumeration_areas(&path, state).map(Some)
    }

    pub fn options(&self) -> SelectorOptions {
        let states: BTreeSet<&str> = self.records.iter().map(|r| r.state.as_str()).collect();

        let mut seen_states = HashSet::new();
        let proximity_states: Vec<String> = self
            .records
            .iter()
            .map(|r| r.state.as_str())
            .filter(|s| seen_states.insert(*s))
            .map(String::from)
            .collect();

        let mut seen = HashSet::new();
        let types: Vec<String> = self
            .records
            .iter()
            .filter_map(|r| r.fap_type.as_ref())
            .map(|t| t.to_string())
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let with_all = |values: Vec<String>| -> Vec<String> {
            std::iter::once(ALL.to_string()).chain(values).collect()
        };

        SelectorOptions {
            states: with_all(states.into_iter().map(String::from).collect()),
            proximity_states,
            functionalities: with_all(Functionality::LISTED.iter().map(|f| f.to_string()).collect()),
            fap_types: with_all(types.clone()),
            proximity_fap_types: types,
            locations: with_all(vec![
                LocationClass::Inside.to_string(),
                LocationClass::Outside.to_string(),
            ]),
        }
    }
}
