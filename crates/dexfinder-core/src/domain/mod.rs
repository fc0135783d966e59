//! Domain layer
//!
//! Entities, the generation partition and the filter engine. Nothing in here
//! performs I/O.

pub mod entity;
pub mod filter;
pub mod generation;
pub mod specification;

pub use entity::{Entity, EntityId, SearchResult, StatName, Stats};
pub use filter::{FilterCriteria, GenerationFilter, ValueRange, filter_entities};
pub use generation::{GENERATIONS, GenerationInfo, generation_for_id, generation_info};
