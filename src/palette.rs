use std::collections::BTreeSet;

use crate::types::{Category, FapType, Functionality};

/// Color for any category value missing from a table.
pub const FALLBACK_COLOR: &str = "black";

/// Ordered category → color lookup. Order is legend order.
#[derive(Debug, Clone)]
pub struct ColorPolicy<K> {
    entries: Vec<(K, &'static str)>,
    fallback: &'static str,
}

impl<K: Category> ColorPolicy<K> {
    pub fn new(entries: Vec<(K, &'static str)>) -> Self {
        Self { entries, fallback: FALLBACK_COLOR }
    }

    pub fn color_for(&self, key: &K) -> &'static str {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| *c)
            .unwrap_or(self.fallback)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Observed values the table has no color for, sorted and deduplicated.
    pub fn unknown<'a, I>(&self, observed: I) -> Vec<K>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        observed
            .into_iter()
            .filter(|k| !self.contains(k))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

pub fn functionality_colors() -> ColorPolicy<Functionality> {
    ColorPolicy::new(vec![
        (Functionality::Active, "green"),
        (Functionality::Inactive, "red"),
    ])
}

pub fn fap_type_colors() -> ColorPolicy<FapType> {
    let colors = [
        "green", "blue", "red", "orange", "purple", "yellow", "cyan", "magenta", "lime", "brown",
        "teal", "pink", "gray",
    ];
    ColorPolicy::new(FapType::LISTED.into_iter().zip(colors).collect())
}

/// Piecewise-linear sequential scale over RGB stops.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    pub name: &'static str,
    stops: &'static [(u8, u8, u8)],
}

pub const GREENS: ColorScale = ColorScale {
    name: "greens",
    stops: &[
        (247, 252, 245),
        (229, 245, 224),
        (199, 233, 192),
        (161, 217, 155),
        (116, 196, 118),
        (65, 171, 93),
        (35, 139, 69),
        (0, 109, 44),
        (0, 68, 27),
    ],
};

impl ColorScale {
    /// Hex color for `value` within `range`. Degenerate ranges and NaN map to
    /// the lowest stop.
    pub fn color_at(&self, value: f64, range: (f64, f64)) -> String {
        let (lo, hi) = range;
        let t = if hi > lo && value.is_finite() {
            ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let last = self.stops.len() - 1;
        let pos = t * last as f64;
        let idx = (pos.floor() as usize).min(last);
        let next = (idx + 1).min(last);
        let frac = pos - idx as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (self.stops[idx], self.stops[next]);
        format!("#{:02x}{:02x}{:02x}", lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }
}
