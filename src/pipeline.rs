use crate::assemble::{assemble, assemble_choropleth, count_label, mean_label};
use crate::config::MapConfig;
use crate::data::DataStore;
use crate::error::SelectionError;
use crate::filter::narrow;
use crate::report::{summarize, SummaryQuery, COUNT_COLUMN, DISTANCE_COLUMN};
use crate::types::{AggregateTable, FapType, FilterSelection, MapLayerSet, Selector, View};
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub layers: MapLayerSet,
    pub tables: Vec<AggregateTable>,
    /// Non-fatal problems, such as a state missing from the boundary file.
    pub warnings: Vec<String>,
}

pub fn render(store: &DataStore, selection: &FilterSelection, map: &MapConfig) -> Result<RenderOutput> {
    // 1. Narrow
    let narrowed = narrow(store, selection, map)?;
    debug!(
        view = ?selection.view,
        state = %selection.state,
        category = %selection.category,
        records = narrowed.records.len(),
        "Narrowed selection"
    );

    let records = || narrowed.records.iter().copied();
    let regions: Vec<String> = narrowed.boundaries.iter().map(|b| b.name.clone()).collect();

    // 2. Assemble layers and summarize
    let (layers, tables) = match selection.view {
        View::Status => {
            let layers = assemble(selection, &narrowed, map);
            // The national table counts the whole dataset, every functionality.
            let table = if selection.state.is_all() {
                summarize(store.records(), &SummaryQuery::Status)
            } else {
                summarize(records(), &SummaryQuery::Status)
            };
            (layers, vec![table])
        }
        View::Types => (assemble(selection, &narrowed, map), Vec::new()),
        View::Proximity => {
            let fap_type = selection
                .category
                .as_only()
                .map(|c| FapType::from(c.as_str()))
                .ok_or(SelectionError::MissingCategory("proximity"))?;

            let by_state = summarize(
                records(),
                &SummaryQuery::ProximityByState {
                    fap_type: fap_type.clone(),
                    state: selection.state.clone(),
                    regions,
                },
            );
            let layers = assemble_choropleth(
                selection,
                &narrowed,
                &by_state.values().unwrap_or_default(),
                DISTANCE_COLUMN,
                mean_label,
                map,
            );

            let tables = match &selection.state {
                Selector::All => Vec::new(),
                Selector::Only(_) => vec![summarize(
                    records(),
                    &SummaryQuery::ProximityByEa { fap_type, state: selection.state.clone() },
                )],
            };
            (layers, tables)
        }
        View::Density => {
            // Records are already narrowed to the chosen location class.
            let counts = summarize(
                records(),
                &SummaryQuery::LocationByState { location: Selector::All, regions },
            );
            let layers = assemble_choropleth(
                selection,
                &narrowed,
                &counts.values().unwrap_or_default(),
                COUNT_COLUMN,
                count_label,
                map,
            );
            (layers, vec![counts])
        }
    };

    Ok(RenderOutput { layers, tables, warnings: narrowed.warnings })
}
