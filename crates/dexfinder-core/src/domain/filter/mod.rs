//! Filter engine
//!
//! Pure, order-preserving evaluation of [`FilterCriteria`] over a
//! materialized entity set. No I/O and no shared state.
//!
//! # Example
//!
//! ```
//! use dexfinder_core::domain::filter::{FilterCriteria, filter_entities};
//!
//! let criteria = FilterCriteria::new().with_types(["fire"]);
//! let filtered = filter_entities(&[], &criteria)?;
//! assert!(filtered.is_empty());
//! # Ok::<(), dexfinder_core::Error>(())
//! ```

pub mod criteria;
pub mod specification;

pub use criteria::{FilterCriteria, GenerationFilter, StatRanges, ValueRange};
pub use specification::{
    EntitySpecBuilder, GenerationSpec, HeightSpec, StatRangeSpec, TotalStatsSpec, TypeSpec,
    WeightSpec,
};

use tracing::debug;

use crate::domain::entity::Entity;
use crate::error::Result;

/// Keep the entities satisfying every criterion, in input order
///
/// Criteria are validated first; malformed criteria yield
/// [`Error::Validation`](crate::Error::Validation) and nothing is evaluated.
pub fn filter_entities(entities: &[Entity], criteria: &FilterCriteria) -> Result<Vec<Entity>> {
    criteria.validate()?;

    if !criteria.is_active() {
        return Ok(entities.to_vec());
    }

    let spec = EntitySpecBuilder::from_criteria(criteria);
    let filtered: Vec<Entity> = entities
        .iter()
        .filter(|entity| spec.is_satisfied_by(entity))
        .cloned()
        .collect();

    debug!(
        input = entities.len(),
        matched = filtered.len(),
        "Filtered entity set"
    );
    Ok(filtered)
}
