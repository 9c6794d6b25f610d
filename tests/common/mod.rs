//! Fixture files shared by the integration tests.

#![allow(dead_code)]

use fap_mapping::config::InputConfig;
use fap_mapping::{DataStore, GeoCache};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const HEADER: &str =
    "STATE,EA NAME,FAP_TYPE,FORMALITY,FAP_FUNCTIONALITY,LATITUDE,LONGITUDE,FAP_LOCATION,KM Diff Calculation,ENUMERATOR";

/// Lagos, Kano and Oyo as one-degree squares.
pub const STATES: [(&str, f64, f64); 3] = [("Lagos", 6.5, 3.4), ("Kano", 12.0, 8.5), ("Oyo", 8.0, 3.9)];

pub fn square(lat: f64, lon: f64, half: f64) -> Value {
    json!([[
        [lon - half, lat - half],
        [lon + half, lat - half],
        [lon + half, lat + half],
        [lon - half, lat + half],
        [lon - half, lat - half]
    ]])
}

pub fn feature_collection(features: Vec<Value>) -> String {
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

pub fn state_feature(name: &str, lat: f64, lon: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": { "admin1Name": name, "admin1Pcod": "NG000" },
        "geometry": { "type": "Polygon", "coordinates": square(lat, lon, 0.5) }
    })
}

pub struct Fixture {
    pub dir: TempDir,
    pub input: InputConfig,
}

impl Fixture {
    pub fn new(rows: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("A2F_FAP_v1.csv");
        let mut csv = String::from(HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv.push('\n');
        fs::write(&csv_path, csv).unwrap();

        let boundaries_path = dir.path().join("states.geojson");
        let features = STATES
            .iter()
            .map(|(name, lat, lon)| state_feature(name, *lat, *lon))
            .collect();
        fs::write(&boundaries_path, feature_collection(features)).unwrap();

        let ea_dir = dir.path().join("polygons");
        fs::create_dir_all(&ea_dir).unwrap();
        let ea = feature_collection(vec![
            json!({ "type": "Feature", "properties": {},
                    "geometry": { "type": "Polygon", "coordinates": square(6.4, 3.3, 0.05) } }),
            json!({ "type": "Feature", "properties": {},
                    "geometry": { "type": "Polygon", "coordinates": square(6.6, 3.5, 0.05) } }),
            json!({ "type": "Feature", "properties": {},
                    "geometry": { "type": "Point", "coordinates": [3.4, 6.5] } }),
            json!({ "type": "Feature", "properties": {},
                    "geometry": { "type": "MultiPolygon", "coordinates": [square(6.5, 3.4, 0.01)] } }),
        ]);
        fs::write(ea_dir.join("LAGOS.geojson"), ea).unwrap();

        let input = InputConfig {
            fap_csv: csv_path,
            state_boundaries: boundaries_path,
            ea_polygon_dir: ea_dir,
            boundary_name_property: "admin1Name".to_string(),
        };
        Self { dir, input }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn store(&self) -> DataStore {
        DataStore::open(&self.input, Arc::new(GeoCache::new())).unwrap()
    }
}

/// Rows for a small survey across Lagos and Kano.
pub fn survey_rows() -> Vec<&'static str> {
    vec![
        "Lagos,Ikeja 001,Bank branch,Formal,Active,6.60,3.35,Inside,1.5,E1",
        "Lagos,Ikeja 001,Bank branch,Formal,Inactive,6.55,3.40,Outside,2.5,E1",
        "Lagos,Surulere 002,Bank branch,Formal,Active,6.50,3.36,Inside,5.0,E2",
        "Lagos,Surulere 002,MFI/MFB,Formal,Active,6.49,3.37,Inside,9.0,E2",
        "Kano,Dala 004,Bank branch,Formal,Active,12.00,8.50,Inside,4.0,E3",
        "Kano,Dala 004,Moneylender,Informal,,12.01,8.51,Outside,,E3",
        "Kano,Dala 004,\"Payment services banks (MTN Y\u{2019}ello, Money master, 9PSB, Hope)\",Formal,Inactive,12.02,8.52,Inside,0.5,E3",
        "Kano,Dala 005,Thrift collector,Informal,Active,12.03,8.53,Inside,2.0,E3",
    ]
}
