//! Side-panel tables and choropleth values.
//!
//! Every aggregate resolves an empty group to zero so no NaN ever reaches a
//! renderer.

use crate::types::{
    AggregateTable, CountTable, FapRecord, FapType, Functionality, LocationClass, MeanTable,
    Selector, StatusTable,
};
use std::collections::{BTreeMap, BTreeSet};

pub const STATE_COLUMN: &str = "STATE";
pub const EA_COLUMN: &str = "EA NAME";
pub const DISTANCE_COLUMN: &str = "KM Diff Calculation";
pub const COUNT_COLUMN: &str = "FAP count";

/// What to group by and what to compute.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryQuery {
    /// Count per (state, functionality).
    Status,
    /// Mean distance per EA for one type, optionally within one state.
    ProximityByEa { fap_type: FapType, state: Selector<String> },
    /// Mean distance per region for one type; every region present.
    ProximityByState {
        fap_type: FapType,
        state: Selector<String>,
        regions: Vec<String>,
    },
    /// Count of one location class (or all) per region; every region present.
    LocationByState {
        location: Selector<LocationClass>,
        regions: Vec<String>,
    },
}

pub fn summarize<'a, I>(records: I, query: &SummaryQuery) -> AggregateTable
where
    I: IntoIterator<Item = &'a FapRecord>,
{
    match query {
        SummaryQuery::Status => AggregateTable::Status(status_table(records)),
        SummaryQuery::ProximityByEa { fap_type, state } => {
            AggregateTable::Mean(proximity_by_ea(records, fap_type, state))
        }
        SummaryQuery::ProximityByState { fap_type, state, regions } => {
            AggregateTable::Mean(proximity_by_state(records, fap_type, state, regions))
        }
        SummaryQuery::LocationByState { location, regions } => {
            AggregateTable::Count(location_by_state(records, location, regions))
        }
    }
}

pub fn status_table<'a, I>(records: I) -> StatusTable
where
    I: IntoIterator<Item = &'a FapRecord>,
{
    let mut counts: BTreeMap<String, BTreeMap<Functionality, u64>> = BTreeMap::new();
    let mut columns: BTreeSet<Functionality> = Functionality::LISTED.into_iter().collect();

    // Blank functionality cells are left out, as is a state with nothing else.
    for record in records {
        let Some(functionality) = &record.functionality else {
            continue;
        };
        columns.insert(functionality.clone());
        *counts
            .entry(record.state.clone())
            .or_default()
            .entry(functionality.clone())
            .or_insert(0) += 1;
    }

    // Every row carries every column, zero where unseen.
    for row in counts.values_mut() {
        for column in &columns {
            row.entry(column.clone()).or_insert(0);
        }
    }

    StatusTable { columns: columns.into_iter().collect(), rows: counts }
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    n: u64,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn value(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum / self.n as f64
        }
    }
}

fn mean_by<'a, I, F>(records: I, mut key: F) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a FapRecord>,
    F: FnMut(&'a FapRecord) -> Option<&'a str>,
{
    let mut groups: BTreeMap<String, Mean> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            groups.entry(k.to_string()).or_default().add(record.proximity_km);
        }
    }
    groups.into_iter().map(|(k, m)| (k, m.value())).collect()
}

fn zero_fill<V: Copy + Default>(mut rows: BTreeMap<String, V>, regions: &[String]) -> BTreeMap<String, V> {
    rows.retain(|k, _| regions.contains(k));
    for region in regions {
        rows.entry(region.clone()).or_default();
    }
    rows
}

/// Keyed by the EA names observed; no zero fill.
pub fn proximity_by_ea<'a, I>(records: I, fap_type: &FapType, state: &Selector<String>) -> MeanTable
where
    I: IntoIterator<Item = &'a FapRecord>,
{
    let rows = mean_by(records, |r| {
        (r.fap_type.as_ref() == Some(fap_type) && state.matches(&r.state)).then_some(r.ea_name.as_str())
    });
    MeanTable {
        key_label: EA_COLUMN.to_string(),
        value_label: DISTANCE_COLUMN.to_string(),
        rows,
    }
}

/// Left-joined onto `regions`: states outside it are dropped, regions without
/// data read zero.
pub fn proximity_by_state<'a, I>(
    records: I,
    fap_type: &FapType,
    state: &Selector<String>,
    regions: &[String],
) -> MeanTable
where
    I: IntoIterator<Item = &'a FapRecord>,
{
    let rows = mean_by(records, |r| {
        (r.fap_type.as_ref() == Some(fap_type) && state.matches(&r.state)).then_some(r.state.as_str())
    });
    MeanTable {
        key_label: STATE_COLUMN.to_string(),
        value_label: DISTANCE_COLUMN.to_string(),
        rows: zero_fill(rows, regions),
    }
}

pub fn location_by_state<'a, I>(
    records: I,
    location: &Selector<LocationClass>,
    regions: &[String],
) -> CountTable
where
    I: IntoIterator<Item = &'a FapRecord>,
{
    let mut rows: BTreeMap<String, u64> = BTreeMap::new();
    for record in records.into_iter().filter(|r| location.matches(&r.location)) {
        *rows.entry(record.state.clone()).or_insert(0) += 1;
    }
    CountTable {
        key_label: STATE_COLUMN.to_string(),
        value_label: COUNT_COLUMN.to_string(),
        rows: zero_fill(rows, regions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn with_distance(mut r: FapRecord, ea: &str, km: Option<f64>) -> FapRecord {
        r.ea_name = ea.to_string();
        r.proximity_km = km;
        r
    }

    #[test]
    fn status_table_counts_and_zero_fills() {
        let records = vec![
            record("Lagos", "Active", FapType::BankBranch),
            record("Lagos", "Inactive", FapType::BankBranch),
            record("Kano", "Active", FapType::BankBranch),
        ];
        let table = status_table(&records);

        assert_eq!(table.count("Lagos", &Functionality::Active), 1);
        assert_eq!(table.count("Lagos", &Functionality::Inactive), 1);
        assert_eq!(table.count("Kano", &Functionality::Active), 1);
        assert_eq!(table.rows["Kano"].get(&Functionality::Inactive), Some(&0));
        assert_eq!(table.columns, Functionality::LISTED.to_vec());
    }

    #[test]
    fn status_table_widens_for_unlisted_values() {
        let records = vec![
            record("Lagos", "Active", FapType::Atm),
            record("Kano", "Closed", FapType::Atm),
        ];
        let table = status_table(&records);
        let closed = Functionality::Other("Closed".into());
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.rows["Lagos"].get(&closed), Some(&0));
        assert_eq!(table.count("Kano", &closed), 1);
    }

    #[test]
    fn ea_proximity_is_arithmetic_mean_of_matching_type() {
        let records = vec![
            with_distance(record("Lagos", "Active", FapType::Atm), "EA-1", Some(1.0)),
            with_distance(record("Lagos", "Active", FapType::Atm), "EA-1", Some(4.0)),
            with_distance(record("Lagos", "Active", FapType::BankBranch), "EA-1", Some(100.0)),
            with_distance(record("Lagos", "Active", FapType::Atm), "EA-2", Some(3.0)),
            with_distance(record("Kano", "Active", FapType::Atm), "EA-9", Some(7.0)),
        ];
        let table = proximity_by_ea(&records, &FapType::Atm, &Selector::Only("Lagos".into()));

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.get("EA-1"), Some(2.5));
        assert_eq!(table.get("EA-2"), Some(3.0));
        assert_eq!(table.get("EA-9"), None);
        assert_eq!(table.key_label, EA_COLUMN);
    }

    #[test]
    fn blank_distances_do_not_produce_nan() {
        let records = vec![with_distance(record("Lagos", "Active", FapType::Atm), "EA-1", None)];
        let table = proximity_by_ea(&records, &FapType::Atm, &Selector::All);
        assert_eq!(table.get("EA-1"), Some(0.0));
    }

    #[test]
    fn state_proximity_zero_fills_regions() {
        let records = vec![
            with_distance(record("Lagos", "Active", FapType::Atm), "EA-1", Some(2.0)),
            with_distance(record("Lagos", "Active", FapType::Atm), "EA-2", Some(3.0)),
            with_distance(record("Nowhere", "Active", FapType::Atm), "EA-3", Some(9.0)),
        ];
        let regions = vec!["Kano".to_string(), "Lagos".to_string()];
        let table = proximity_by_state(&records, &FapType::Atm, &Selector::All, &regions);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.get("Lagos"), Some(2.5));
        assert_eq!(table.get("Kano"), Some(0.0));
        assert_eq!(table.get("Nowhere"), None);
    }

    #[test]
    fn location_counts_per_state() {
        let mut outside = record("Kano", "Active", FapType::Atm);
        outside.location = LocationClass::Outside;
        let records = vec![
            record("Kano", "Active", FapType::Atm),
            outside,
            record("Lagos", "Active", FapType::Atm),
        ];
        let regions = vec!["Kano".to_string(), "Lagos".to_string(), "Oyo".to_string()];

        let inside = location_by_state(&records, &Selector::Only(LocationClass::Inside), &regions);
        assert_eq!(inside.rows["Kano"], 1);
        assert_eq!(inside.rows["Lagos"], 1);
        assert_eq!(inside.rows["Oyo"], 0);

        let all = location_by_state(&records, &Selector::All, &regions);
        assert_eq!(all.rows["Kano"], 2);
    }

    #[test]
    fn status_table_ignores_blank_functionality() {
        let records = vec![
            record("Lagos", "Active", FapType::Atm),
            record("Lagos", "", FapType::Atm),
            record("Kano", " ", FapType::Atm),
        ];
        let table = status_table(&records);
        assert_eq!(table.columns, Functionality::LISTED.to_vec());
        assert_eq!(table.count("Lagos", &Functionality::Active), 1);
        assert!(table.rows.get("Kano").is_none());
    }

    fn dispatch_fixture() -> Vec<FapRecord> {
        let mut outside = record("Kano", "Active", FapType::Atm);
        outside.location = LocationClass::Outside;
        vec![
            with_distance(record("Lagos", "Active", FapType::Atm), "EA-1", Some(2.0)),
            with_distance(record("Lagos", "Inactive", FapType::Atm), "EA-2", Some(4.0)),
            outside,
        ]
    }

    #[test]
    fn summarize_status() {
        let records = dispatch_fixture();
        match summarize(&records, &SummaryQuery::Status) {
            AggregateTable::Status(t) => {
                assert_eq!(t.count("Lagos", &Functionality::Active), 1);
                assert_eq!(t.count("Lagos", &Functionality::Inactive), 1);
                assert_eq!(t.count("Kano", &Functionality::Active), 1);
            }
            other => panic!("unexpected table {:?}", other),
        }
    }

    #[test]
    fn summarize_proximity_by_ea() {
        let records = dispatch_fixture();
        let query = SummaryQuery::ProximityByEa {
            fap_type: FapType::Atm,
            state: Selector::Only("Lagos".into()),
        };
        match summarize(&records, &query) {
            AggregateTable::Mean(t) => {
                assert_eq!(t.key_label, EA_COLUMN);
                assert_eq!(t.get("EA-1"), Some(2.0));
                assert_eq!(t.get("EA-2"), Some(4.0));
                assert_eq!(t.rows.len(), 2);
            }
            other => panic!("unexpected table {:?}", other),
        }
    }

    #[test]
    fn summarize_proximity_by_state() {
        let records = dispatch_fixture();
        let query = SummaryQuery::ProximityByState {
            fap_type: FapType::Atm,
            state: Selector::All,
            regions: vec!["Kano".into(), "Lagos".into(), "Oyo".into()],
        };
        let table = summarize(&records, &query);
        let values = table.values().unwrap();
        assert_eq!(values["Lagos"], 3.0);
        assert_eq!(values["Kano"], 1.0);
        assert_eq!(values["Oyo"], 0.0);
        assert!(matches!(&table, AggregateTable::Mean(t) if t.key_label == STATE_COLUMN));
    }

    #[test]
    fn summarize_location_by_state() {
        let records = dispatch_fixture();
        let query = SummaryQuery::LocationByState {
            location: Selector::Only(LocationClass::Outside),
            regions: vec!["Kano".into(), "Lagos".into()],
        };
        match summarize(&records, &query) {
            AggregateTable::Count(t) => {
                assert_eq!(t.rows["Kano"], 1);
                assert_eq!(t.rows["Lagos"], 0);
                assert_eq!(t.value_label, COUNT_COLUMN);
            }
            other => panic!("unexpected table {:?}", other),
        }
        assert_eq!(summarize(&records, &SummaryQuery::Status).values(), None);
    }
}
