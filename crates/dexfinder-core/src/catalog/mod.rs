//! Catalog access
//!
//! The rest of the crate only talks to the remote catalog through the
//! [`CatalogClient`] trait. Two implementations ship with the crate:
//!
//! - [`HttpCatalogClient`]: PokeAPI over HTTP
//! - [`StaticCatalog`]: in-memory records, loadable from a JSON fixture
//!
//! [`enrich_items`] turns list entries into full [`Entity`] values by fetching
//! every detail record concurrently.

pub mod http;
pub mod memory;
pub mod types;

pub use http::{HttpCatalogClient, HttpCatalogClientBuilder};
pub use memory::{StaticCatalog, StaticCatalogBuilder};
pub use types::{ListItem, ListPage, RawRecord, id_from_url};

use std::fmt;

use async_trait::async_trait;
use futures_util::future::try_join_all;

use crate::domain::entity::{Entity, EntityId};
use crate::error::Result;

/// Identifies a detail record either by dex id or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Id(EntityId),
    Name(String),
}

impl EntityRef {
    /// Numeric input becomes an id, anything else a lowercased name
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<EntityId>() {
            Ok(id) => EntityRef::Id(id),
            Err(_) => EntityRef::Name(trimmed.to_lowercase()),
        }
    }

    /// Prefer the id embedded in the item url, fall back to its name
    pub fn for_item(item: &ListItem) -> Self {
        item.id()
            .map(EntityRef::Id)
            .unwrap_or_else(|| EntityRef::Name(item.name.to_lowercase()))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Id(id) => write!(f, "{}", id),
            EntityRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<EntityId> for EntityRef {
    fn from(id: EntityId) -> Self {
        EntityRef::Id(id)
    }
}

impl From<&str> for EntityRef {
    fn from(input: &str) -> Self {
        EntityRef::parse(input)
    }
}

/// Remote paginated catalog
///
/// Implementations report non-success responses as
/// [`Error::Transport`](crate::Error::Transport) and missing records as
/// [`Error::EntityNotFound`](crate::Error::EntityNotFound). Dropping a
/// returned future must abandon the underlying request.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page of list entries
    async fn list_entities(&self, limit: u32, offset: u32) -> Result<ListPage>;

    /// Fetch one detail record
    async fn get_entity(&self, reference: &EntityRef) -> Result<RawRecord>;
}

/// Fetch and convert one detail record
pub async fn fetch_entity(client: &dyn CatalogClient, reference: &EntityRef) -> Result<Entity> {
    let record = client.get_entity(reference).await?;
    Entity::try_from(record)
}

/// Enrich list entries concurrently, all-or-nothing
///
/// Every detail fetch runs at once. The first failure completes the join and
/// drops the sibling fetches still in flight. Output order follows `items`.
pub async fn enrich_items(client: &dyn CatalogClient, items: &[ListItem]) -> Result<Vec<Entity>> {
    let fetches = items.iter().map(|item| {
        let reference = EntityRef::for_item(item);
        async move { fetch_entity(client, &reference).await }
    });
    try_join_all(fetches).await
}
