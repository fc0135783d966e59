//! Catalog wire types
//!
//! Mirrors the PokeAPI JSON shapes closely enough to deserialize them
//! directly, and converts detail records into [`Entity`] values.

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Entity, EntityId, StatName, Stats};
use crate::error::{Error, Result};

/// Entry of a list page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub name: String,
    pub url: String,
}

impl ListItem {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Dex id parsed from the trailing `/pokemon/<id>/` segment of the url
    pub fn id(&self) -> Option<EntityId> {
        id_from_url(&self.url)
    }
}

/// Raw list response body
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub count: u32,
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<ListItem>,
}

/// One page of list items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub items: Vec<ListItem>,
    pub has_next: bool,
}

impl From<ListResponse> for ListPage {
    fn from(response: ListResponse) -> Self {
        Self {
            has_next: response.next.is_some(),
            items: response.results,
        }
    }
}

/// Reference to a named catalog resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Artwork,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    #[serde(default)]
    pub back_default: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

impl Sprites {
    /// Official artwork, falling back to the default front sprite
    pub fn primary_image(&self) -> Option<&str> {
        self.other
            .official_artwork
            .front_default
            .as_deref()
            .or(self.front_default.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// Detail record for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: EntityId,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub sprites: Sprites,
    pub stats: Vec<StatEntry>,
    pub types: Vec<TypeSlot>,
}

impl TryFrom<RawRecord> for Entity {
    type Error = Error;

    fn try_from(record: RawRecord) -> Result<Self> {
        let mut stats = Stats::default();
        for stat in StatName::ALL {
            let entry = record
                .stats
                .iter()
                .find(|entry| entry.stat.name == stat.as_str())
                .ok_or_else(|| {
                    Error::InvalidRecord(format!("'{}' is missing stat {}", record.name, stat))
                })?;
            let value = u8::try_from(entry.base_stat).map_err(|_| {
                Error::InvalidRecord(format!(
                    "'{}' has {} {} outside 0-255",
                    record.name, stat, entry.base_stat
                ))
            })?;
            stats.set(stat, value);
        }

        let mut slots = record.types.clone();
        slots.sort_by_key(|slot| slot.slot);
        let types = slots.into_iter().map(|slot| slot.kind.name).collect();

        let image = record.sprites.primary_image().map(str::to_string);
        let mut entity = Entity::new(
            record.id,
            record.name,
            types,
            stats,
            record.height,
            record.weight,
        )?;
        if let Some(image) = image {
            entity = entity.with_image(image);
        }
        if let Some(base_experience) = record.base_experience {
            entity = entity.with_base_experience(base_experience);
        }
        Ok(entity)
    }
}

/// Extract the numeric id from a `/pokemon/<id>/` resource url
pub fn id_from_url(url: &str) -> Option<EntityId> {
    let (_, tail) = url.rsplit_once("/pokemon/")?;
    let digits = tail.trim_end_matches('/');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|id| *id > 0)
}
