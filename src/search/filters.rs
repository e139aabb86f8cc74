use std::collections::BTreeSet;

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

use crate::models::AvailabilityWindows;

pub const DEFAULT_MIN_PRICE: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 500.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    BestMatch,
    PriceAsc,
    PriceDesc,
    Rating,
    Distance,
    Availability,
    Newest,
}

impl SortBy {
    /// Reads the same kebab-case names the enum serializes to.
    pub fn parse(value: &str) -> Option<Self> {
        let deserializer: StrDeserializer<'_, ValueError> = value.trim().into_deserializer();
        Self::deserialize(deserializer).ok()
    }
}

/// Inclusive `[min, max]` bound. `[0, 500]` means "no constraint".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_PRICE,
            max: DEFAULT_MAX_PRICE,
        }
    }
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.min == DEFAULT_MIN_PRICE && self.max == DEFAULT_MAX_PRICE
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Requested availability window. Unknown keys are kept so they can match
/// everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityWindow {
    Today,
    Tomorrow,
    Week,
    NextWeek,
    Other(String),
}

impl AvailabilityWindow {
    pub fn parse(key: &str) -> Self {
        match key.trim() {
            "today" => Self::Today,
            "tomorrow" => Self::Tomorrow,
            "week" => Self::Week,
            "next-week" => Self::NextWeek,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_open(&self, windows: &AvailabilityWindows) -> bool {
        match self {
            Self::Today => windows.today,
            Self::Tomorrow => windows.tomorrow,
            Self::Week => windows.this_week,
            Self::NextWeek => windows.next_week,
            Self::Other(_) => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(default)]
    pub availability: BTreeSet<String>,
    #[serde(default)]
    pub sort_by: SortBy,
}

/// Query-string form of a search: `?q=hair&categories=Hair,Nails&sort=rating`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl SearchParams {
    pub fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }

    pub fn to_filters(&self) -> SearchFilters {
        SearchFilters {
            categories: split_list(self.categories.as_deref()),
            location: self.location.clone().unwrap_or_default(),
            price_range: PriceRange::new(
                finite_or(self.min_price, DEFAULT_MIN_PRICE),
                finite_or(self.max_price, DEFAULT_MAX_PRICE),
            ),
            availability: split_list(self.availability.as_deref()),
            sort_by: self
                .sort
                .as_deref()
                .and_then(SortBy::parse)
                .unwrap_or_default(),
        }
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(default)
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
