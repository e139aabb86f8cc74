//! Provider search: text query, structured filters, stable sorting and the
//! summary numbers shown next to a result list.

mod filters;
mod pipeline;
mod stats;

pub use filters::{PriceRange, SearchFilters, SearchParams, SortBy};
pub use pipeline::{apply_favorites, filter_providers, parse_distance, sort_providers, FavoriteSet};
pub use stats::{active_filters, calculate_search_stats, ActiveFilter, SearchStats};
