//! Filter criteria
//!
//! Every range is inclusive on both ends. Criteria are validated before any
//! evaluation and are never clamped.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::entity::{MAX_STAT, MAX_TOTAL_STATS, StatName};
use crate::domain::generation::LATEST_GENERATION;
use crate::error::{Error, Result};

/// Inclusive `[min, max]` range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: u32,
    pub max: u32,
}

impl ValueRange {
    /// Create a validated range
    pub fn new(min: u32, max: u32) -> Result<Self> {
        let range = Self { min, max };
        range.validate("range")?;
        Ok(range)
    }

    /// Range from zero up to `max`
    pub const fn up_to(max: u32) -> Self {
        Self { min: 0, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn validate(&self, field: &str) -> Result<()> {
        if self.min > self.max {
            return Err(Error::Validation(format!(
                "{}: min {} is greater than max {}",
                field, self.min, self.max
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// Parses `MIN..MAX`, `MIN..` or `..MAX`; open ends default to the full u32 span
impl FromStr for ValueRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (min, max) = s
            .split_once("..")
            .ok_or_else(|| Error::InvalidInput(format!("Expected MIN..MAX, got '{}'", s)))?;

        let parse = |part: &str, default: u32| -> Result<u32> {
            let part = part.trim().trim_start_matches('=');
            if part.is_empty() {
                Ok(default)
            } else {
                part.parse()
                    .map_err(|_| Error::InvalidInput(format!("Invalid range bound '{}'", part)))
            }
        };

        ValueRange::new(parse(min, 0)?, parse(max, u32::MAX)?)
    }
}

/// Generation restriction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationFilter {
    #[default]
    Any,
    Only(u8),
}

impl GenerationFilter {
    pub fn matches(&self, generation: u8) -> bool {
        match self {
            GenerationFilter::Any => true,
            GenerationFilter::Only(wanted) => *wanted == generation,
        }
    }
}

/// Ranges for the six base stats plus their total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRanges {
    pub hp: ValueRange,
    pub attack: ValueRange,
    pub defense: ValueRange,
    pub special_attack: ValueRange,
    pub special_defense: ValueRange,
    pub speed: ValueRange,
    pub total: ValueRange,
}

impl Default for StatRanges {
    fn default() -> Self {
        let stat = ValueRange::up_to(MAX_STAT);
        Self {
            hp: stat,
            attack: stat,
            defense: stat,
            special_attack: stat,
            special_defense: stat,
            speed: stat,
            total: ValueRange::up_to(MAX_TOTAL_STATS),
        }
    }
}

impl StatRanges {
    pub fn get(&self, stat: StatName) -> ValueRange {
        match stat {
            StatName::Hp => self.hp,
            StatName::Attack => self.attack,
            StatName::Defense => self.defense,
            StatName::SpecialAttack => self.special_attack,
            StatName::SpecialDefense => self.special_defense,
            StatName::Speed => self.speed,
        }
    }

    pub fn set(&mut self, stat: StatName, range: ValueRange) {
        match stat {
            StatName::Hp => self.hp = range,
            StatName::Attack => self.attack = range,
            StatName::Defense => self.defense = range,
            StatName::SpecialAttack => self.special_attack = range,
            StatName::SpecialDefense => self.special_defense = range,
            StatName::Speed => self.speed = range,
        }
    }
}

/// Structured multi-field predicate over entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Empty means no type restriction
    pub types: BTreeSet<String>,
    pub generation: GenerationFilter,
    pub stats: StatRanges,
    pub height: ValueRange,
    pub weight: ValueRange,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            types: BTreeSet::new(),
            generation: GenerationFilter::Any,
            stats: StatRanges::default(),
            height: ValueRange::up_to(u32::MAX),
            weight: ValueRange::up_to(u32::MAX),
        }
    }
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to entities having at least one of these types
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.types.extend(
            types
                .into_iter()
                .map(|ty| ty.as_ref().trim().to_lowercase())
                .filter(|ty| !ty.is_empty()),
        );
        self
    }

    pub fn with_generation(mut self, generation: u8) -> Self {
        self.generation = GenerationFilter::Only(generation);
        self
    }

    pub fn with_stat(mut self, stat: StatName, range: ValueRange) -> Self {
        self.stats.set(stat, range);
        self
    }

    pub fn with_total(mut self, range: ValueRange) -> Self {
        self.stats.total = range;
        self
    }

    pub fn with_height(mut self, range: ValueRange) -> Self {
        self.height = range;
        self
    }

    pub fn with_weight(mut self, range: ValueRange) -> Self {
        self.weight = range;
        self
    }

    /// Reject malformed criteria
    pub fn validate(&self) -> Result<()> {
        for stat in StatName::ALL {
            self.stats.get(stat).validate(stat.as_str())?;
        }
        self.stats.total.validate("total")?;
        self.height.validate("height")?;
        self.weight.validate("weight")?;

        if let GenerationFilter::Only(generation) = self.generation {
            if !(1..=LATEST_GENERATION).contains(&generation) {
                return Err(Error::Validation(format!(
                    "generation must be between 1 and {}, got {}",
                    LATEST_GENERATION, generation
                )));
            }
        }
        Ok(())
    }

    /// Whether any restriction differs from the pass-all default
    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let range = ValueRange::new(10, 20).unwrap();
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(9));
        assert!(!range.contains(21));
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let err = ValueRange::new(5, 4).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("10..20".parse::<ValueRange>().unwrap(), ValueRange { min: 10, max: 20 });
        assert_eq!("..=80".parse::<ValueRange>().unwrap(), ValueRange { min: 0, max: 80 });
        assert_eq!(
            "100..".parse::<ValueRange>().unwrap(),
            ValueRange { min: 100, max: u32::MAX }
        );
        assert!("20".parse::<ValueRange>().is_err());
        assert!("a..b".parse::<ValueRange>().is_err());
        assert!("30..10".parse::<ValueRange>().is_err());
    }

    #[test]
    fn test_default_criteria_are_inactive() {
        let criteria = FilterCriteria::default();
        assert!(!criteria.is_active());
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn test_any_restriction_activates() {
        assert!(FilterCriteria::new().with_types(["fire"]).is_active());
        assert!(FilterCriteria::new().with_generation(2).is_active());
        assert!(
            FilterCriteria::new()
                .with_weight(ValueRange::up_to(1000))
                .is_active()
        );
    }

    #[test]
    fn test_types_are_normalized() {
        let criteria = FilterCriteria::new().with_types(["Fire", " water ", ""]);
        let types: Vec<_> = criteria.types.iter().cloned().collect();
        assert_eq!(types, vec!["fire", "water"]);
    }

    #[test]
    fn test_validate_names_offending_field() {
        let mut criteria = FilterCriteria::new();
        criteria.stats.speed = ValueRange { min: 90, max: 10 };

        let err = criteria.validate().unwrap_err();
        assert!(err.to_string().contains("speed"));

        let criteria = FilterCriteria {
            height: ValueRange { min: 3, max: 2 },
            ..FilterCriteria::default()
        };
        assert!(criteria.validate().unwrap_err().to_string().contains("height"));
    }

    #[test]
    fn test_validate_rejects_unknown_generation() {
        assert!(FilterCriteria::new().with_generation(0).validate().is_err());
        assert!(FilterCriteria::new().with_generation(10).validate().is_err());
        assert!(FilterCriteria::new().with_generation(9).validate().is_ok());
    }

    #[test]
    fn test_criteria_serialize_generation() {
        let json = serde_json::to_value(FilterCriteria::new()).unwrap();
        assert_eq!(json["generation"], "any");

        let json = serde_json::to_value(FilterCriteria::new().with_generation(4)).unwrap();
        assert_eq!(json["generation"]["only"], 4);
    }
}
