use geo::{MultiPolygon, Point};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SelectionError;

/// Sentinel used by every selector widget; never a data value.
pub const ALL: &str = "All";

// Nigeria spans roughly 4..14N and 2.7..14.7E; the margin keeps border FAPs.
pub const NIGERIA_LAT_RANGE: (f64, f64) = (3.5, 14.5);
pub const NIGERIA_LON_RANGE: (f64, f64) = (2.0, 15.5);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn within_nigeria(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (NIGERIA_LAT_RANGE.0..=NIGERIA_LAT_RANGE.1).contains(&self.lat)
            && (NIGERIA_LON_RANGE.0..=NIGERIA_LON_RANGE.1).contains(&self.lon)
    }
}

impl From<Point<f64>> for LatLon {
    fn from(p: Point<f64>) -> Self {
        Self { lat: p.y(), lon: p.x() }
    }
}

/// A closed categorical column: a fixed set of listed values plus free text.
pub trait Category: Clone + Ord + fmt::Display {
    fn label(&self) -> &str;
    /// False for free-text values outside the fixed list.
    fn is_listed(&self) -> bool;
}

macro_rules! label_serde {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    };
}

/// Blank cells are missing values, not a category of their own.
pub fn category_cell<T: for<'a> From<&'a str>>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| T::from(raw))
}

/// The 13 survey FAP categories, or free text entered under "Other".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FapType {
    PosAgent,
    Cooperative,
    Microfinance,
    Atm,
    BankBranch,
    PaymentServiceBank,
    Moneylender,
    BureauDeChange,
    CapitalMarket,
    Insurance,
    Pension,
    NonInterestBank,
    Others,
    Other(String),
}

impl FapType {
    /// Listed categories in survey order.
    pub const LISTED: [FapType; 13] = [
        FapType::PosAgent,
        FapType::Cooperative,
        FapType::Microfinance,
        FapType::Atm,
        FapType::BankBranch,
        FapType::PaymentServiceBank,
        FapType::Moneylender,
        FapType::BureauDeChange,
        FapType::CapitalMarket,
        FapType::Insurance,
        FapType::Pension,
        FapType::NonInterestBank,
        FapType::Others,
    ];
}

impl Category for FapType {
    fn label(&self) -> &str {
        match self {
            FapType::PosAgent => "Financial Service agent (POS agents)",
            FapType::Cooperative => {
                "Cooperative/ Social group/Women group/savings group/farmer groups etc."
            }
            FapType::Microfinance => "MFI/MFB",
            FapType::Atm => "ATM (This does not include ATMs at a bank branch)",
            FapType::BankBranch => "Bank branch",
            FapType::PaymentServiceBank => {
                "Payment services banks (MTN Y\u{2019}ello, Money master, 9PSB, Hope)"
            }
            FapType::Moneylender => "Moneylender",
            FapType::BureauDeChange => "Bureau De Change (BDC)",
            FapType::CapitalMarket => "Capital market operators (portfolio/fund managers)",
            FapType::Insurance => "Insurance company/agent/broker",
            FapType::Pension => "Pension provider",
            FapType::NonInterestBank => "Non-Interest Banks",
            FapType::Others => "Others (specify)",
            FapType::Other(text) => text,
        }
    }

    fn is_listed(&self) -> bool {
        !matches!(self, FapType::Other(_))
    }
}

impl From<&str> for FapType {
    fn from(s: &str) -> Self {
        FapType::LISTED
            .iter()
            .find(|t| t.label() == s)
            .cloned()
            .unwrap_or_else(|| FapType::Other(s.to_string()))
    }
}

label_serde!(FapType);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Functionality {
    Active,
    Inactive,
    Other(String),
}

impl Functionality {
    pub const LISTED: [Functionality; 2] = [Functionality::Active, Functionality::Inactive];
}

impl Category for Functionality {
    fn label(&self) -> &str {
        match self {
            Functionality::Active => "Active",
            Functionality::Inactive => "Inactive",
            Functionality::Other(text) => text,
        }
    }

    fn is_listed(&self) -> bool {
        !matches!(self, Functionality::Other(_))
    }
}

impl From<&str> for Functionality {
    fn from(s: &str) -> Self {
        match s {
            "Active" => Functionality::Active,
            "Inactive" => Functionality::Inactive,
            other => Functionality::Other(other.to_string()),
        }
    }
}

label_serde!(Functionality);

/// Whether the FAP was found inside or outside its enumeration area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationClass {
    Inside,
    Outside,
    Other(String),
}

impl Category for LocationClass {
    fn label(&self) -> &str {
        match self {
            LocationClass::Inside => "Inside",
            LocationClass::Outside => "Outside",
            LocationClass::Other(text) => text,
        }
    }

    fn is_listed(&self) -> bool {
        !matches!(self, LocationClass::Other(_))
    }
}

impl From<&str> for LocationClass {
    fn from(s: &str) -> Self {
        match s {
            "Inside" => LocationClass::Inside,
            "Outside" => LocationClass::Outside,
            other => LocationClass::Other(other.to_string()),
        }
    }
}

label_serde!(LocationClass);

/// One financial access point from the survey CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct FapRecord {
    pub state: String,
    pub ea_name: String,
    pub fap_type: Option<FapType>,
    pub formality: String,
    pub functionality: Option<Functionality>,
    pub position: LatLon,
    pub location: LocationClass,
    /// Kilometres to the nearest reference point; `None` when the cell was blank.
    pub proximity_km: Option<f64>,
}

impl FapRecord {
    pub fn hover_text(&self) -> String {
        format!(
            "{}, {}, {}",
            self.fap_type.as_ref().map(FapType::label).unwrap_or_default(),
            self.formality,
            self.functionality.as_ref().map(Functionality::label).unwrap_or_default()
        )
    }
}

/// A state outline joined on its `admin1Name` property.
#[derive(Debug, Clone)]
pub struct BoundaryPolygon {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub centroid: Point<f64>,
}

impl BoundaryPolygon {
    /// Every exterior and interior ring as lat/lon pairs.
    pub fn rings(&self) -> Vec<Vec<LatLon>> {
        let mut rings = Vec::new();
        for poly in &self.geometry.0 {
            for ring in std::iter::once(poly.exterior()).chain(poly.interiors().iter()) {
                rings.push(ring.0.iter().map(|c| LatLon::new(c.y, c.x)).collect());
            }
        }
        rings
    }
}

/// Exterior ring of one EA polygon inside a state.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationAreaPolygon {
    pub state: String,
    pub ring: Vec<LatLon>,
}

/// Either the `All` wildcard or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector<T> {
    All,
    Only(T),
}

impl<T: PartialEq> Selector<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(v) => v == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    /// A missing value only passes the wildcard.
    pub fn matches_cell(&self, value: Option<&T>) -> bool {
        match value {
            Some(v) => self.matches(v),
            None => self.is_all(),
        }
    }

    pub fn as_only(&self) -> Option<&T> {
        match self {
            Selector::All => None,
            Selector::Only(v) => Some(v),
        }
    }

    pub fn map<U, F: FnOnce(&T) -> U>(&self, f: F) -> Selector<U> {
        match self {
            Selector::All => Selector::All,
            Selector::Only(v) => Selector::Only(f(v)),
        }
    }
}

impl Selector<String> {
    /// Widget value to selector; `"All"` and blank mean the wildcard.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == ALL {
            Selector::All
        } else {
            Selector::Only(raw.to_string())
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str(ALL),
            Selector::Only(v) => write!(f, "{}", v),
        }
    }
}

/// Which dashboard page the selection drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Status,
    Types,
    Proximity,
    Density,
}

impl FromStr for View {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(View::Status),
            "types" | "type" => Ok(View::Types),
            "proximity" => Ok(View::Proximity),
            "density" => Ok(View::Density),
            _ => Err(SelectionError::UnknownView(s.to_string())),
        }
    }
}

/// The user's widget state for one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub view: View,
    pub state: Selector<String>,
    /// Functionality, FAP type or location class depending on `view`.
    pub category: Selector<String>,
}

impl FilterSelection {
    pub fn new(view: View, state: &str, category: &str) -> Self {
        Self {
            view,
            state: Selector::parse(state),
            category: Selector::parse(category),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLon,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLon,
    pub hover: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerGroup {
    pub label: String,
    pub color: String,
    pub size: u32,
    pub opacity: f64,
    pub markers: Vec<Marker>,
}

/// Non-interactive polygon layer (state boundary or EA overlay).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineGroup {
    pub label: String,
    pub color: String,
    pub line_width: f64,
    pub fill: bool,
    pub opacity: f64,
    pub show_in_legend: bool,
    pub rings: Vec<Vec<LatLon>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethCell {
    pub region: String,
    pub value: f64,
    pub color: String,
    pub rings: Vec<Vec<LatLon>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethLayer {
    pub value_label: String,
    pub scale: String,
    pub range: (f64, f64),
    pub cells: Vec<ChoroplethCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub position: LatLon,
    pub text: String,
}

/// Everything a renderer needs to draw one map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayerSet {
    pub title: String,
    pub legend_title: Option<String>,
    pub viewport: Viewport,
    pub outlines: Vec<OutlineGroup>,
    pub markers: Vec<MarkerGroup>,
    pub choropleth: Option<ChoroplethLayer>,
    pub labels: Vec<TextLabel>,
}

/// Counts per (state, functionality); absent pairs read as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusTable {
    pub columns: Vec<Functionality>,
    pub rows: BTreeMap<String, BTreeMap<Functionality, u64>>,
}

impl StatusTable {
    pub fn count(&self, state: &str, functionality: &Functionality) -> u64 {
        self.rows
            .get(state)
            .and_then(|row| row.get(functionality))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanTable {
    pub key_label: String,
    pub value_label: String,
    pub rows: BTreeMap<String, f64>,
}

impl MeanTable {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountTable {
    pub key_label: String,
    pub value_label: String,
    pub rows: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateTable {
    Status(StatusTable),
    Mean(MeanTable),
    Count(CountTable),
}

impl AggregateTable {
    /// One number per key, for shading; `None` for the status crosstab.
    pub fn values(&self) -> Option<BTreeMap<String, f64>> {
        match self {
            AggregateTable::Status(_) => None,
            AggregateTable::Mean(t) => Some(t.rows.clone()),
            AggregateTable::Count(t) => {
                Some(t.rows.iter().map(|(k, v)| (k.clone(), *v as f64)).collect())
            }
        }
    }
}
