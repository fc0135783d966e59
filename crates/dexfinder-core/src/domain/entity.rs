//! Catalog entities
//!
//! An [`Entity`] is built once from a detail record and never mutated
//! afterwards. [`SearchResult`] is the slim projection used by the search
//! pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::generation::generation_for_id;
use crate::error::{Error, Result};

/// Dex id, always >= 1
pub type EntityId = u32;

/// Maximum value of a single base stat
pub const MAX_STAT: u32 = 255;

/// Maximum possible sum of the six base stats
pub const MAX_TOTAL_STATS: u32 = MAX_STAT * 6;

/// The six base stats, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatName {
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
}

impl StatName {
    pub const ALL: [StatName; 6] = [
        StatName::Hp,
        StatName::Attack,
        StatName::Defense,
        StatName::SpecialAttack,
        StatName::SpecialDefense,
        StatName::Speed,
    ];

    /// Name as spelled by the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            StatName::Hp => "hp",
            StatName::Attack => "attack",
            StatName::Defense => "defense",
            StatName::SpecialAttack => "special-attack",
            StatName::SpecialDefense => "special-defense",
            StatName::Speed => "speed",
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "hp" => Ok(StatName::Hp),
            "attack" | "atk" => Ok(StatName::Attack),
            "defense" | "def" => Ok(StatName::Defense),
            "specialattack" | "spatk" | "spa" => Ok(StatName::SpecialAttack),
            "specialdefense" | "spdef" => Ok(StatName::SpecialDefense),
            "speed" | "spe" => Ok(StatName::Speed),
            _ => Err(Error::InvalidInput(format!("Unknown stat name: {}", s))),
        }
    }
}

/// Base stats of an entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub special_attack: u8,
    pub special_defense: u8,
    pub speed: u8,
}

impl Stats {
    pub fn get(&self, stat: StatName) -> u8 {
        match stat {
            StatName::Hp => self.hp,
            StatName::Attack => self.attack,
            StatName::Defense => self.defense,
            StatName::SpecialAttack => self.special_attack,
            StatName::SpecialDefense => self.special_defense,
            StatName::Speed => self.speed,
        }
    }

    pub fn set(&mut self, stat: StatName, value: u8) {
        match stat {
            StatName::Hp => self.hp = value,
            StatName::Attack => self.attack = value,
            StatName::Defense => self.defense = value,
            StatName::SpecialAttack => self.special_attack = value,
            StatName::SpecialDefense => self.special_defense = value,
            StatName::Speed => self.speed = value,
        }
    }

    pub fn total(&self) -> u32 {
        StatName::ALL.iter().map(|s| u32::from(self.get(*s))).sum()
    }
}

/// Fully enriched catalog entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// One or two type names in slot order
    pub types: Vec<String>,
    pub stats: Stats,
    pub total_stats: u32,
    /// Decimetres
    pub height: u32,
    /// Hectograms
    pub weight: u32,
    pub generation: u8,
    pub image: Option<String>,
    pub base_experience: Option<u32>,
}

impl Entity {
    /// Build an entity, deriving the stat total and generation
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        types: Vec<String>,
        stats: Stats,
        height: u32,
        weight: u32,
    ) -> Result<Self> {
        let name = name.into();
        let generation = generation_for_id(id)
            .ok_or_else(|| Error::InvalidRecord(format!("'{}' has invalid id {}", name, id)))?;

        let mut unique_types: Vec<String> = Vec::with_capacity(types.len());
        for ty in types {
            let ty = ty.trim().to_lowercase();
            if !ty.is_empty() && !unique_types.contains(&ty) {
                unique_types.push(ty);
            }
        }
        if unique_types.is_empty() || unique_types.len() > 2 {
            return Err(Error::InvalidRecord(format!(
                "'{}' must have one or two types, got {}",
                name,
                unique_types.len()
            )));
        }

        Ok(Self {
            id,
            name,
            types: unique_types,
            total_stats: stats.total(),
            stats,
            height,
            weight,
            generation,
            image: None,
            base_experience: None,
        })
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_base_experience(mut self, base_experience: u32) -> Self {
        self.base_experience = Some(base_experience);
        self
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.iter().any(|ty| ty.eq_ignore_ascii_case(name))
    }

    /// Project to the slim search representation
    pub fn to_search_result(&self) -> SearchResult {
        SearchResult {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone().unwrap_or_default(),
            types: self.types.clone(),
        }
    }
}

/// Search suggestion derived from an [`Entity`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: EntityId,
    pub name: String,
    /// Primary image URL, empty when the catalog has none
    pub image: String,
    pub types: Vec<String>,
}
