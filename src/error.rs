//! Errors callers need to tell apart.
//!
//! Everything else travels as `anyhow::Error` with context attached; these
//! types survive that wrapping and can be recovered with `downcast_ref`.

use std::path::PathBuf;

/// Fatal problems with an input file. A render cannot proceed past these.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("input file not found: {0}")]
    MissingFile(PathBuf),
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{0} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection(PathBuf),
    #[error("feature {index} in {path} has no '{property}' property")]
    MissingProperty {
        path: PathBuf,
        index: usize,
        property: String,
    },
    #[error("feature '{name}' in {path} is not a Polygon or MultiPolygon")]
    UnsupportedGeometry { path: PathBuf, name: String },
    #[error("feature '{name}' in {path} has an empty geometry")]
    EmptyGeometry { path: PathBuf, name: String },
}

/// A selection the pipeline cannot serve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown view '{0}' (expected status, types, proximity or density)")]
    UnknownView(String),
    #[error("the {0} view needs a specific category, not All")]
    MissingCategory(&'static str),
}
