use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{AvailabilityWindows, ServiceProvider};

use super::filters::{AvailabilityWindow, SearchFilters, SortBy};

/// Provider ids a user has favorited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet(HashSet<String>);

impl FavoriteSet {
    pub fn contains(&self, provider_id: &str) -> bool {
        self.0.contains(provider_id)
    }
}

impl FromIterator<String> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Marks `is_favorite` from `favorites`. Display only; filtering ignores it.
pub fn apply_favorites(providers: &mut [ServiceProvider], favorites: &FavoriteSet) {
    for provider in providers {
        provider.is_favorite = favorites.contains(&provider.id);
    }
}

/// Runs the query, filter and sort stages over `providers`.
pub fn filter_providers(
    providers: &[ServiceProvider],
    query: &str,
    filters: &SearchFilters,
) -> Vec<ServiceProvider> {
    let query = query.trim().to_lowercase();
    let location = filters.location.trim().to_lowercase();
    let windows: Vec<AvailabilityWindow> = filters
        .availability
        .iter()
        .map(|key| AvailabilityWindow::parse(key))
        .collect();

    let mut results: Vec<ServiceProvider> = providers
        .iter()
        .filter(|provider| query.is_empty() || matches_query(provider, &query))
        .filter(|provider| {
            filters.categories.is_empty() || filters.categories.contains(&provider.category)
        })
        .filter(|provider| location.is_empty() || matches_location(provider, &location))
        .filter(|provider| {
            filters.price_range.is_unconstrained()
                || filters.price_range.contains(provider.starting_price)
        })
        .filter(|provider| {
            windows.is_empty()
                || windows
                    .iter()
                    .any(|window| window.is_open(&provider.availability))
        })
        .cloned()
        .collect();

    sort_providers(&mut results, filters.sort_by);
    results
}

fn matches_query(provider: &ServiceProvider, query: &str) -> bool {
    [
        &provider.name,
        &provider.business_name,
        &provider.category,
        &provider.description,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(query))
}

fn matches_location(provider: &ServiceProvider, location: &str) -> bool {
    let place = &provider.location;
    [&place.city, &place.state, &place.zip, &place.address]
        .iter()
        .any(|field| field.to_lowercase().contains(location))
}

/// Stable in every mode; ties keep their input order.
pub fn sort_providers(providers: &mut [ServiceProvider], sort_by: SortBy) {
    match sort_by {
        SortBy::BestMatch | SortBy::Newest => {}
        SortBy::PriceAsc => {
            providers.sort_by(|a, b| a.starting_price.total_cmp(&b.starting_price))
        }
        SortBy::PriceDesc => {
            providers.sort_by(|a, b| b.starting_price.total_cmp(&a.starting_price))
        }
        SortBy::Rating => providers.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortBy::Distance => providers.sort_by(|a, b| distance_key(a).total_cmp(&distance_key(b))),
        SortBy::Availability => providers.sort_by(compare_availability),
    }
}

/// Leading number of a distance label such as `"3.2 mi"`.
pub fn parse_distance(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_digit() || *ch == '.'))
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<f64>().ok()
}

fn distance_key(provider: &ServiceProvider) -> f64 {
    parse_distance(&provider.distance).unwrap_or(f64::INFINITY)
}

fn earliest_window(windows: &AvailabilityWindows) -> u8 {
    if windows.today {
        0
    } else if windows.tomorrow {
        1
    } else if windows.this_week {
        2
    } else if windows.next_week {
        3
    } else {
        4
    }
}

fn compare_availability(a: &ServiceProvider, b: &ServiceProvider) -> Ordering {
    earliest_window(&a.availability).cmp(&earliest_window(&b.availability))
}
