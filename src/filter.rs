use crate::config::MapConfig;
use crate::data::DataStore;
use crate::error::SelectionError;
use crate::types::{
    BoundaryPolygon, Category, EnumerationAreaPolygon, FapRecord, FapType, FilterSelection, Functionality,
    LatLon, LocationClass, Selector, View, Viewport,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// The category half of a selection, parsed for the view it applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryFilter {
    /// `listed_only` restricts to Active/Inactive (the Nigeria-wide status view).
    Functionality { selector: Selector<Functionality>, listed_only: bool },
    FapType(Selector<FapType>),
    Location(Selector<LocationClass>),
}

impl CategoryFilter {
    pub fn from_selection(selection: &FilterSelection) -> Result<Self, SelectionError> {
        let category = &selection.category;
        Ok(match selection.view {
            View::Status => CategoryFilter::Functionality {
                selector: category.map(|c| Functionality::from(c.as_str())),
                listed_only: selection.state.is_all(),
            },
            View::Types => CategoryFilter::FapType(category.map(|c| FapType::from(c.as_str()))),
            View::Proximity => match category {
                Selector::All => return Err(SelectionError::MissingCategory("proximity")),
                Selector::Only(c) => CategoryFilter::FapType(Selector::Only(FapType::from(c.as_str()))),
            },
            View::Density => {
                CategoryFilter::Location(category.map(|c| LocationClass::from(c.as_str())))
            }
        })
    }

    pub fn matches(&self, record: &FapRecord) -> bool {
        match self {
            CategoryFilter::Functionality { selector, listed_only } => {
                let f = record.functionality.as_ref();
                (!listed_only || f.is_some_and(|f| f.is_listed())) && selector.matches_cell(f)
            }
            CategoryFilter::FapType(selector) => selector.matches_cell(record.fap_type.as_ref()),
            CategoryFilter::Location(selector) => selector.matches(&record.location),
        }
    }
}

/// Result of narrowing: the records to draw and the geometry around them.
#[derive(Debug, Clone)]
pub struct Narrowed<'a> {
    pub records: Vec<&'a FapRecord>,
    pub category: CategoryFilter,
    pub viewport: Viewport,
    pub boundaries: Vec<&'a BoundaryPolygon>,
    pub overlay: Option<Arc<Vec<EnumerationAreaPolygon>>>,
    pub warnings: Vec<String>,
}

pub fn narrow<'a>(
    store: &'a DataStore,
    selection: &FilterSelection,
    map: &MapConfig,
) -> Result<Narrowed<'a>> {
    let category = CategoryFilter::from_selection(selection)?;

    let records: Vec<&FapRecord> = store
        .records()
        .iter()
        .filter(|r| selection.state.matches(&r.state) && category.matches(r))
        .collect();

    let mut warnings = Vec::new();
    let mut viewport = map.country_viewport();
    let mut boundaries: Vec<&BoundaryPolygon> = store.boundaries().iter().collect();
    let mut overlay = None;

    // Choropleth views always cover every region from the national view.
    let point_view = matches!(selection.view, View::Status | View::Types);

    if let Selector::Only(state) = &selection.state {
        match store.boundary(state) {
            Some(boundary) if point_view => {
                viewport = Viewport {
                    center: LatLon::from(boundary.centroid),
                    zoom: map.state_zoom,
                };
                boundaries = vec![boundary];
            }
            Some(_) => {}
            None => {
                let message = format!(
                    "Selected state '{}' not found in boundary file; defaulting to Nigeria view",
                    state
                );
                warn!("{}", message);
                warnings.push(message);
                if point_view {
                    boundaries.clear();
                }
            }
        }
        if point_view {
            overlay = store.enumeration_areas(state)?;
        }
    }

    Ok(Narrowed { records, category, viewport, boundaries, overlay, warnings })
}
