//! Financial access point (FAP) mapping over Nigerian administrative
//! boundaries: load survey records and boundary geometry, narrow them to a
//! selection, and assemble map layers and summary tables for a renderer.

pub mod types;
pub mod error;
pub mod config;
pub mod palette;
pub mod data;
pub mod filter;
pub mod assemble;
pub mod report;
pub mod pipeline;
pub mod server;

pub use data::{DataStore, GeoCache};
pub use pipeline::{render, RenderOutput};
pub use types::{FilterSelection, View};
