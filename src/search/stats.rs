use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::ServiceProvider;

use super::filters::SearchFilters;

const SUGGESTED_CATEGORY_LIMIT: usize = 5;

/// A predicate that narrows the search away from "everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveFilter {
    Query,
    Categories,
    Location,
    PriceRange,
    Availability,
}

/// The one place that decides which filters count as active.
pub fn active_filters(query: &str, filters: &SearchFilters) -> Vec<ActiveFilter> {
    let checks = [
        (ActiveFilter::Query, !query.trim().is_empty()),
        (ActiveFilter::Categories, !filters.categories.is_empty()),
        (ActiveFilter::Location, !filters.location.trim().is_empty()),
        (ActiveFilter::PriceRange, !filters.price_range.is_unconstrained()),
        (ActiveFilter::Availability, !filters.availability.is_empty()),
    ];
    checks
        .into_iter()
        .filter_map(|(filter, active)| active.then_some(filter))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceBucket {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub total_results: usize,
    pub has_active_filters: bool,
    pub active_filter_count: usize,
    pub active_filters: Vec<ActiveFilter>,
    pub suggested_categories: Vec<CategoryCount>,
    pub price_ranges: Vec<PriceBucket>,
}

pub fn calculate_search_stats(
    results: &[ServiceProvider],
    query: &str,
    filters: &SearchFilters,
) -> SearchStats {
    let active = active_filters(query, filters);
    SearchStats {
        total_results: results.len(),
        has_active_filters: !active.is_empty(),
        active_filter_count: active.len(),
        active_filters: active,
        suggested_categories: suggested_categories(results),
        price_ranges: price_buckets(results),
    }
}

fn suggested_categories(results: &[ServiceProvider]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for provider in results {
        *counts.entry(provider.category.as_str()).or_default() += 1;
    }
    let mut categories: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    // BTreeMap order is alphabetical, so the stable sort breaks ties by name.
    categories.sort_by(|a, b| b.count.cmp(&a.count));
    categories.truncate(SUGGESTED_CATEGORY_LIMIT);
    categories
}

fn price_buckets(results: &[ServiceProvider]) -> Vec<PriceBucket> {
    let bounds: [(&'static str, f64, f64); 4] = [
        ("under-50", f64::NEG_INFINITY, 50.0),
        ("50-100", 50.0, 100.0),
        ("100-200", 100.0, 200.0),
        ("200-plus", 200.0, f64::INFINITY),
    ];
    bounds
        .into_iter()
        .map(|(label, low, high)| PriceBucket {
            label,
            count: results
                .iter()
                .filter(|provider| provider.starting_price >= low && provider.starting_price < high)
                .count(),
        })
        .collect()
}
