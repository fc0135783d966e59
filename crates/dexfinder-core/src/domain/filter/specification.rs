//! Entity filter specifications
//!
//! One specification per predicate category. [`EntitySpecBuilder`] turns
//! validated [`FilterCriteria`] into their conjunction.

use std::collections::BTreeSet;

use crate::domain::entity::{Entity, StatName};
use crate::domain::specification::{AllOf, Specification};

use super::criteria::{FilterCriteria, GenerationFilter, ValueRange};

/// Passes when no types are requested or the entity has any requested type
pub struct TypeSpec {
    types: BTreeSet<String>,
}

impl TypeSpec {
    pub fn new(types: BTreeSet<String>) -> Self {
        Self { types }
    }
}

impl Specification<Entity> for TypeSpec {
    fn is_satisfied_by(&self, entity: &Entity) -> bool {
        if self.types.is_empty() {
            return true;
        }
        self.types.iter().any(|ty| entity.has_type(ty))
    }
}

/// Passes when the entity belongs to the requested generation
pub struct GenerationSpec {
    generation: GenerationFilter,
}

impl GenerationSpec {
    pub fn new(generation: GenerationFilter) -> Self {
        Self { generation }
    }
}

impl Specification<Entity> for GenerationSpec {
    fn is_satisfied_by(&self, entity: &Entity) -> bool {
        self.generation.matches(entity.generation)
    }
}

/// Inclusive range on one base stat
pub struct StatRangeSpec {
    stat: StatName,
    range: ValueRange,
}

impl StatRangeSpec {
    pub fn new(stat: StatName, range: ValueRange) -> Self {
        Self { stat, range }
    }
}

impl Specification<Entity> for StatRangeSpec {
    fn is_satisfied_by(&self, entity: &Entity) -> bool {
        self.range.contains(u32::from(entity.stats.get(self.stat)))
    }
}

/// Inclusive range on the stat total
pub struct TotalStatsSpec(pub ValueRange);

impl Specification<Entity> for TotalStatsSpec {
    fn is_satisfied_by(&self, entity: &Entity) -> bool {
        self.0.contains(entity.total_stats)
    }
}

/// Inclusive range on height in decimetres
pub struct HeightSpec(pub ValueRange);

impl Specification<Entity> for HeightSpec {
    fn is_satisfied_by(&self, entity: &Entity) -> bool {
        self.0.contains(entity.height)
    }
}

/// Inclusive range on weight in hectograms
pub struct WeightSpec(pub ValueRange);

impl Specification<Entity> for WeightSpec {
    fn is_satisfied_by(&self, entity: &Entity) -> bool {
        self.0.contains(entity.weight)
    }
}

/// Builder for composing entity specifications
#[derive(Default)]
pub struct EntitySpecBuilder {
    specs: AllOf<Entity>,
}

impl EntitySpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every predicate category of the criteria, AND-ed together
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let mut builder = Self::new()
            .with_types(criteria.types.clone())
            .with_generation(criteria.generation);
        for stat in StatName::ALL {
            builder = builder.with_stat(stat, criteria.stats.get(stat));
        }
        builder
            .with_total(criteria.stats.total)
            .with_height(criteria.height)
            .with_weight(criteria.weight)
    }

    pub fn with_types(mut self, types: BTreeSet<String>) -> Self {
        self.specs.push(TypeSpec::new(types));
        self
    }

    pub fn with_generation(mut self, generation: GenerationFilter) -> Self {
        self.specs.push(GenerationSpec::new(generation));
        self
    }

    pub fn with_stat(mut self, stat: StatName, range: ValueRange) -> Self {
        self.specs.push(StatRangeSpec::new(stat, range));
        self
    }

    pub fn with_total(mut self, range: ValueRange) -> Self {
        self.specs.push(TotalStatsSpec(range));
        self
    }

    pub fn with_height(mut self, range: ValueRange) -> Self {
        self.specs.push(HeightSpec(range));
        self
    }

    pub fn with_weight(mut self, range: ValueRange) -> Self {
        self.specs.push(WeightSpec(range));
        self
    }

    /// Number of composed specifications
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn is_satisfied_by(&self, entity: &Entity) -> bool {
        self.specs.is_satisfied_by(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Stats;

    fn entity(id: u32, types: &[&str], speed: u8) -> Entity {
        let mut stats = Stats::default();
        stats.set(StatName::Speed, speed);
        Entity::new(
            id,
            format!("entity-{id}"),
            types.iter().map(|t| t.to_string()).collect(),
            stats,
            10,
            100,
        )
        .unwrap()
    }

    #[test]
    fn test_type_spec_intersects() {
        let spec = TypeSpec::new(["fire".to_string(), "water".to_string()].into());

        assert!(spec.is_satisfied_by(&entity(6, &["fire", "flying"], 100)));
        assert!(spec.is_satisfied_by(&entity(7, &["water"], 43)));
        assert!(!spec.is_satisfied_by(&entity(1, &["grass", "poison"], 45)));
    }

    #[test]
    fn test_empty_type_spec_passes_all() {
        let spec = TypeSpec::new(BTreeSet::new());
        assert!(spec.is_satisfied_by(&entity(1, &["grass"], 45)));
    }

    #[test]
    fn test_generation_spec() {
        let spec = GenerationSpec::new(GenerationFilter::Only(2));
        assert!(spec.is_satisfied_by(&entity(152, &["grass"], 45)));
        assert!(!spec.is_satisfied_by(&entity(151, &["psychic"], 100)));
        assert!(GenerationSpec::new(GenerationFilter::Any).is_satisfied_by(&entity(1, &["grass"], 45)));
    }

    #[test]
    fn test_stat_range_boundaries() {
        let spec = StatRangeSpec::new(StatName::Speed, ValueRange { min: 50, max: 65 });

        assert!(spec.is_satisfied_by(&entity(4, &["fire"], 50)));
        assert!(spec.is_satisfied_by(&entity(4, &["fire"], 65)));
        assert!(!spec.is_satisfied_by(&entity(4, &["fire"], 49)));
        assert!(!spec.is_satisfied_by(&entity(4, &["fire"], 66)));
    }

    #[test]
    fn test_builder_covers_every_category() {
        let builder = EntitySpecBuilder::from_criteria(&FilterCriteria::default());
        // types, generation, six stats, total, height, weight
        assert_eq!(builder.len(), 11);
        assert!(builder.is_satisfied_by(&entity(25, &["electric"], 90)));
    }
}
