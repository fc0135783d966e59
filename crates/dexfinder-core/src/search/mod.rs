//! Incremental search
//!
//! - [`Debouncer`] rate-limits keystroke-driven calls
//! - [`SearchCoordinator`] resolves queries against the catalog, caching
//!   results and discarding superseded lookups
//! - [`SearchCache`] holds results keyed by normalized query

pub mod cache;
pub mod coordinator;
pub mod debounce;

pub use cache::SearchCache;
pub use coordinator::{SearchCoordinator, SearchOptions};
pub use debounce::Debouncer;

/// Lowercase and trim a raw query
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}
