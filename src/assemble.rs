use crate::config::MapConfig;
use crate::filter::{CategoryFilter, Narrowed};
use crate::palette::{fap_type_colors, functionality_colors, ColorPolicy, GREENS};
use crate::types::{
    BoundaryPolygon, Category, ChoroplethCell, ChoroplethLayer, EnumerationAreaPolygon,
    FapRecord, FilterSelection, MapLayerSet, Marker, MarkerGroup, OutlineGroup, Selector,
    LatLon, TextLabel, View,
};
use std::collections::BTreeMap;

pub const PROXIMITY_TITLE: &str = "Heatmap of average proximity to FAP in KM";

fn place_name(selection: &FilterSelection) -> String {
    match &selection.state {
        Selector::All => "NIGERIA".to_string(),
        Selector::Only(state) => state.clone(),
    }
}

pub fn map_title(selection: &FilterSelection) -> String {
    match selection.view {
        View::Status => format!(
            "FAP STATUS VISUALIZATION FOR {} - {}",
            place_name(selection),
            selection.category
        ),
        View::Types => format!("FAP TYPES VISUALIZATION FOR {}", place_name(selection)),
        View::Proximity => PROXIMITY_TITLE.to_string(),
        View::Density => format!(
            "FAP LOCATION DENSITY FOR {} - {}",
            place_name(selection),
            selection.category
        ),
    }
}

pub fn boundary_layer(boundaries: &[&BoundaryPolygon], map: &MapConfig) -> OutlineGroup {
    OutlineGroup {
        label: "State boundaries".to_string(),
        color: map.boundary_color.clone(),
        line_width: 1.0,
        fill: true,
        opacity: map.boundary_opacity,
        show_in_legend: false,
        rings: boundaries.iter().flat_map(|b| b.rings()).collect(),
    }
}

/// EA outlines for a single state; never in the legend.
pub fn overlay_layer(overlay: &[EnumerationAreaPolygon], map: &MapConfig) -> OutlineGroup {
    OutlineGroup {
        label: "Enumeration areas".to_string(),
        color: map.ea_line_color.clone(),
        line_width: map.ea_line_width,
        fill: false,
        opacity: 1.0,
        show_in_legend: false,
        rings: overlay.iter().map(|ea| ea.ring.clone()).collect(),
    }
}

pub fn marker_categories<K: Category>(
    policy: &ColorPolicy<K>,
    selector: &Selector<K>,
    unlisted: Vec<K>,
) -> Vec<K> {
    match selector {
        Selector::Only(k) => vec![k.clone()],
        Selector::All => policy.keys().cloned().chain(unlisted).collect(),
    }
}

/// One group per category, in the given order. Empty groups are kept.
pub fn marker_groups<K, F>(
    records: &[&FapRecord],
    categories: &[K],
    policy: &ColorPolicy<K>,
    key: F,
    map: &MapConfig,
) -> Vec<MarkerGroup>
where
    K: Category,
    F: Fn(&FapRecord) -> Option<&K>,
{
    categories
        .iter()
        .map(|category| MarkerGroup {
            label: category.to_string(),
            color: policy.color_for(category).to_string(),
            size: map.marker_size,
            opacity: map.marker_opacity,
            markers: records
                .iter()
                .filter(|r| key(**r) == Some(category))
                .map(|r| Marker { position: r.position, hover: r.hover_text() })
                .collect(),
        })
        .collect()
}

fn outlines(narrowed: &Narrowed<'_>, map: &MapConfig) -> Vec<OutlineGroup> {
    let mut outlines = Vec::new();
    if !narrowed.boundaries.is_empty() {
        outlines.push(boundary_layer(&narrowed.boundaries, map));
    }
    if let Some(overlay) = &narrowed.overlay {
        outlines.push(overlay_layer(overlay, map));
    }
    outlines
}

pub fn assemble(selection: &FilterSelection, narrowed: &Narrowed<'_>, map: &MapConfig) -> MapLayerSet {
    let (markers, legend_title) = match &narrowed.category {
        CategoryFilter::Functionality { selector, .. } => {
            let policy = functionality_colors();
            let categories = marker_categories(&policy, selector, Vec::new());
            let groups = marker_groups(&narrowed.records, &categories, &policy, |r| r.functionality.as_ref(), map);
            (groups, Some("FAP Functionality"))
        }
        CategoryFilter::FapType(selector) => {
            let policy = fap_type_colors();
            let unlisted = policy.unknown(narrowed.records.iter().filter_map(|r| r.fap_type.as_ref()));
            let categories = marker_categories(&policy, selector, unlisted);
            let groups = marker_groups(&narrowed.records, &categories, &policy, |r| r.fap_type.as_ref(), map);
            (groups, Some("FAP Type"))
        }
        CategoryFilter::Location(_) => (Vec::new(), None),
    };

    MapLayerSet {
        title: map_title(selection),
        legend_title: legend_title.map(String::from),
        viewport: narrowed.viewport,
        outlines: outlines(narrowed, map),
        markers,
        choropleth: None,
        labels: Vec::new(),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn mean_label(value: f64) -> String {
    format!("{:?}", round2(value))
}

pub fn count_label(value: f64) -> String {
    format!("{}", value.round() as u64)
}

/// One cell per region in `narrowed.boundaries`. Regions absent from `values`
/// are drawn at zero. A text label sits on each centroid.
pub fn assemble_choropleth(
    selection: &FilterSelection,
    narrowed: &Narrowed<'_>,
    values: &BTreeMap<String, f64>,
    value_label: &str,
    label: fn(f64) -> String,
    map: &MapConfig,
) -> MapLayerSet {
    let cell_values: Vec<(&BoundaryPolygon, f64)> = narrowed
        .boundaries
        .iter()
        .map(|b| {
            let v = values.get(&b.name).copied().filter(|v| v.is_finite()).unwrap_or(0.0);
            (*b, v)
        })
        .collect();

    let max = cell_values.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let range = (0.0, max);

    let cells = cell_values
        .iter()
        .map(|(b, v)| ChoroplethCell {
            region: b.name.clone(),
            value: *v,
            color: GREENS.color_at(*v, range),
            rings: b.rings(),
        })
        .collect();

    let labels = cell_values
        .iter()
        .map(|(b, v)| TextLabel { position: LatLon::from(b.centroid), text: label(*v) })
        .collect();

    MapLayerSet {
        title: map_title(selection),
        legend_title: None,
        viewport: narrowed.viewport,
        outlines: Vec::new(),
        markers: Vec::new(),
        choropleth: Some(ChoroplethLayer {
            value_label: value_label.to_string(),
            scale: GREENS.name.to_string(),
            range,
            cells,
        }),
        labels,
    }
}
