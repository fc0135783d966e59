//! In-memory catalog
//!
//! Serves detail records held in memory, either built in code or loaded from
//! a JSON fixture (an array of detail records in the PokeAPI shape). Latency
//! and failures can be configured per record, which makes it the catalog of
//! choice for exercising the search and loader state machines offline.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::types::{
    Artwork, ListItem, ListPage, NamedResource, OtherSprites, RawRecord, Sprites, StatEntry,
    TypeSlot,
};
use super::{CatalogClient, EntityRef};
use crate::domain::entity::StatName;
use crate::error::{Error, Result};

/// Base used to build list item urls
const STATIC_BASE_URL: &str = "memory://catalog";

const ARTWORK_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// Catalog backed by a fixed list of detail records
#[derive(Debug)]
pub struct StaticCatalog {
    records: Vec<RawRecord>,
    list_delay: Duration,
    detail_delays: HashMap<String, Duration>,
    failing_details: HashSet<String>,
    list_failures_left: AtomicUsize,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

/// Builder for a [`StaticCatalog`]
#[derive(Debug, Default)]
pub struct StaticCatalogBuilder {
    records: Vec<RawRecord>,
    list_delay: Duration,
    detail_delays: HashMap<String, Duration>,
    failing_details: HashSet<String>,
    list_failures: usize,
}

impl StaticCatalogBuilder {
    pub fn records(mut self, records: Vec<RawRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn record(mut self, record: RawRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Delay every list call
    pub fn list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    /// Delay detail fetches of one record
    pub fn detail_delay(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.detail_delays.insert(name.into(), delay);
        self
    }

    /// Make detail fetches of one record fail with a transport error
    pub fn fail_detail(mut self, name: impl Into<String>) -> Self {
        self.failing_details.insert(name.into());
        self
    }

    /// Make the next `times` list calls fail with a transport error
    pub fn fail_list(mut self, times: usize) -> Self {
        self.list_failures = times;
        self
    }

    pub fn build(self) -> StaticCatalog {
        StaticCatalog {
            records: self.records,
            list_delay: self.list_delay,
            detail_delays: self.detail_delays,
            failing_details: self.failing_details,
            list_failures_left: AtomicUsize::new(self.list_failures),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }
}

impl StaticCatalog {
    pub fn builder() -> StaticCatalogBuilder {
        StaticCatalogBuilder::default()
    }

    pub fn from_records(records: Vec<RawRecord>) -> Self {
        Self::builder().records(records).build()
    }

    /// Load a JSON array of detail records
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let records: Vec<RawRecord> = serde_json::from_str(&contents)
            .map_err(|e| Error::InvalidRecord(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_records(records))
    }

    /// The Kanto starter lines plus a few extra entries
    pub fn with_starters() -> Self {
        Self::from_records(vec![
            record(1, "bulbasaur", &["grass", "poison"], [45, 49, 49, 65, 65, 45], 7, 69),
            record(2, "ivysaur", &["grass", "poison"], [60, 62, 63, 80, 80, 60], 10, 130),
            record(3, "venusaur", &["grass", "poison"], [80, 82, 83, 100, 100, 80], 20, 1000),
            record(4, "charmander", &["fire"], [39, 52, 43, 60, 50, 65], 6, 85),
            record(5, "charmeleon", &["fire"], [58, 64, 58, 80, 65, 80], 11, 190),
            record(6, "charizard", &["fire", "flying"], [78, 84, 78, 109, 85, 100], 17, 905),
            record(7, "squirtle", &["water"], [44, 48, 65, 50, 64, 43], 5, 90),
            record(8, "wartortle", &["water"], [59, 63, 80, 65, 80, 58], 10, 225),
            record(9, "blastoise", &["water"], [79, 83, 100, 85, 105, 78], 16, 855),
            record(25, "pikachu", &["electric"], [35, 55, 40, 50, 50, 90], 4, 60),
            record(26, "raichu", &["electric"], [60, 90, 55, 90, 80, 110], 8, 300),
            record(152, "chikorita", &["grass"], [45, 49, 65, 49, 65, 45], 9, 64),
        ])
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Number of list calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of detail calls served so far
    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn find(&self, reference: &EntityRef) -> Option<&RawRecord> {
        self.records.iter().find(|record| match reference {
            EntityRef::Id(id) => record.id == *id,
            EntityRef::Name(name) => record.name.eq_ignore_ascii_case(name),
        })
    }

    fn take_list_failure(&self) -> bool {
        self.list_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn list_entities(&self, limit: u32, offset: u32) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        if self.take_list_failure() {
            return Err(Error::Transport(format!(
                "list request (limit {}, offset {}) failed",
                limit, offset
            )));
        }

        let start = (offset as usize).min(self.records.len());
        let end = start.saturating_add(limit as usize).min(self.records.len());
        let items = self.records[start..end]
            .iter()
            .map(|record| {
                ListItem::new(
                    record.name.clone(),
                    format!("{}/pokemon/{}/", STATIC_BASE_URL, record.id),
                )
            })
            .collect();

        debug!(limit, offset, total = self.records.len(), "Served static list page");
        Ok(ListPage {
            items,
            has_next: end < self.records.len(),
        })
    }

    async fn get_entity(&self, reference: &EntityRef) -> Result<RawRecord> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let record = self
            .find(reference)
            .ok_or_else(|| Error::EntityNotFound(reference.to_string()))?;

        if let Some(delay) = self.detail_delays.get(&record.name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_details.contains(&record.name) {
            return Err(Error::Transport(format!(
                "detail request for '{}' failed",
                record.name
            )));
        }
        Ok(record.clone())
    }
}

/// Build a detail record in the catalog's wire shape
pub fn record(
    id: u32,
    name: &str,
    types: &[&str],
    stats: [u32; 6],
    height: u32,
    weight: u32,
) -> RawRecord {
    RawRecord {
        id,
        name: name.to_string(),
        height,
        weight,
        base_experience: None,
        sprites: Sprites {
            front_default: None,
            back_default: None,
            other: OtherSprites {
                official_artwork: Artwork {
                    front_default: Some(format!("{}/{}.png", ARTWORK_URL, id)),
                },
            },
        },
        stats: StatName::ALL
            .iter()
            .zip(stats)
            .map(|(stat, base_stat)| StatEntry {
                base_stat,
                effort: 0,
                stat: NamedResource {
                    name: stat.as_str().to_string(),
                    url: String::new(),
                },
            })
            .collect(),
        types: types
            .iter()
            .enumerate()
            .map(|(index, name)| TypeSlot {
                slot: index as u32 + 1,
                kind: NamedResource {
                    name: name.to_string(),
                    url: String::new(),
                },
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Entity;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_pages() {
        let catalog = StaticCatalog::with_starters();

        let first = catalog.list_entities(5, 0).await.unwrap();
        assert_eq!(first.items.len(), 5);
        assert!(first.has_next);
        assert_eq!(first.items[0].id(), Some(1));

        let last = catalog.list_entities(5, 10).await.unwrap();
        assert_eq!(last.items.len(), 2);
        assert!(!last.has_next);

        let past_end = catalog.list_entities(5, 50).await.unwrap();
        assert!(past_end.items.is_empty());
        assert!(!past_end.has_next);
        assert_eq!(catalog.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_get_entity_by_id_and_name() {
        let catalog = StaticCatalog::with_starters();

        let by_id = catalog.get_entity(&EntityRef::Id(25)).await.unwrap();
        let by_name = catalog.get_entity(&EntityRef::parse("Pikachu")).await.unwrap();
        assert_eq!(by_id, by_name);

        let err = catalog.get_entity(&EntityRef::Id(999)).await.unwrap_err();
        assert!(matches!(err, Error::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_failures_are_consumed() {
        let catalog = StaticCatalog::builder()
            .record(record(1, "bulbasaur", &["grass"], [1; 6], 1, 1))
            .fail_list(1)
            .build();

        assert!(catalog.list_entities(10, 0).await.is_err());
        assert!(catalog.list_entities(10, 0).await.is_ok());
    }

    #[test]
    fn test_fixture_records_are_valid_entities() {
        let catalog = StaticCatalog::with_starters();
        for raw in catalog.records() {
            let entity = Entity::try_from(raw.clone()).unwrap();
            assert!(entity.image.is_some());
        }
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.json");
        let records = StaticCatalog::with_starters().records().to_vec();
        fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let catalog = StaticCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.records().len(), records.len());

        fs::write(&path, "{ not json").unwrap();
        assert!(StaticCatalog::from_json_file(&path).is_err());
    }
}
