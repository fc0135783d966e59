//! Dexfinder Core Library
//!
//! This crate provides the core functionality for Dexfinder, including:
//! - Catalog access (PokeAPI over HTTP, in-memory fixtures)
//! - Incremental search with caching, debouncing and stale-lookup cancellation
//! - Multi-field filtering over loaded entities
//! - Page-at-a-time incremental loading
//! - Persistent configuration

pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod loader;
pub mod search;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{CatalogClient, EntityRef, HttpCatalogClient, StaticCatalog};
    pub use crate::config::Config;
    pub use crate::domain::{
        Entity, FilterCriteria, GenerationFilter, SearchResult, StatName, ValueRange,
        filter_entities,
    };
    pub use crate::error::{Error, Result};
    pub use crate::loader::{IncrementalLoader, LoadOutcome, LoaderState, SkipReason};
    pub use crate::search::{Debouncer, SearchCoordinator, SearchOptions};
}
