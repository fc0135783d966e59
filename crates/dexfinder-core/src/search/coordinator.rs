//! Search coordinator
//!
//! Owns the result cache and the lookup token. Every cache miss issues a new
//! token and cancels the lookup it supersedes; only the holder of the latest
//! token may write to the cache or hand results back to its caller.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::cache::SearchCache;
use super::normalize_query;
use crate::catalog::{CatalogClient, EntityRef, ListItem, enrich_items, fetch_entity};
use crate::config::Config;
use crate::domain::entity::{Entity, SearchResult};
use crate::error::{Error, Result};

/// Tunables for the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Shortest normalized query, in characters, that reaches the catalog
    pub min_query_len: usize,
    /// How many list entries each lookup scans for name matches
    pub list_limit: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            list_limit: 1000,
        }
    }
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_query_len: config.search.min_query_len,
            list_limit: config.catalog.search_list_limit,
        }
    }
}

#[derive(Debug, Default)]
struct LookupState {
    last_issued: u64,
    in_flight: Option<CancellationToken>,
}

/// Incremental name search over a remote catalog
pub struct SearchCoordinator {
    client: Arc<dyn CatalogClient>,
    cache: SearchCache,
    options: SearchOptions,
    lookups: Mutex<LookupState>,
}

impl SearchCoordinator {
    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        Self::with_options(client, SearchOptions::default())
    }

    pub fn with_options(client: Arc<dyn CatalogClient>, options: SearchOptions) -> Self {
        Self {
            client,
            cache: SearchCache::new(),
            options,
            lookups: Mutex::new(LookupState::default()),
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Search entity names containing `query`
    ///
    /// Queries shorter than the minimum length return an empty list without
    /// touching the catalog or the cache. A lookup superseded by a newer call
    /// resolves to an empty list instead of an error.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query = normalize_query(query);
        if query.chars().count() < self.options.min_query_len || limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(results) = self.cache.get(&query, limit).await {
            debug!(query = %query, limit, hits = results.len(), "Search cache hit");
            return Ok(results);
        }

        let (token, cancel) = self.begin_lookup().await;
        debug!(query = %query, limit, token, "Search cache miss, starting lookup");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.lookup(&query, limit) => result,
        };

        let mut lookups = self.lookups.lock().await;
        let current = lookups.last_issued == token;
        if current {
            lookups.in_flight = None;
        }

        match outcome {
            Ok(results) if current => {
                self.cache.put(query.as_str(), results.clone(), limit).await;
                Ok(results)
            }
            Ok(_) => {
                debug!(query = %query, token, "Discarding results of superseded lookup");
                Ok(Vec::new())
            }
            Err(e) if e.is_cancellation() || !current => {
                debug!(query = %query, token, "Lookup superseded");
                Ok(Vec::new())
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Search lookup failed");
                Err(e)
            }
        }
    }

    /// Empty the result cache
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Fetch one entity by dex id or name, bypassing the cache
    pub async fn get_entity(&self, id_or_name: &str) -> Result<Entity> {
        if id_or_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "expected a dex number or a name".to_string(),
            ));
        }
        fetch_entity(self.client.as_ref(), &EntityRef::parse(id_or_name)).await
    }

    /// Issue the next token and cancel the lookup it supersedes
    async fn begin_lookup(&self) -> (u64, CancellationToken) {
        let mut lookups = self.lookups.lock().await;
        lookups.last_issued += 1;

        if let Some(previous) = lookups.in_flight.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        lookups.in_flight = Some(cancel.clone());

        (lookups.last_issued, cancel)
    }

    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let page = self.client.list_entities(self.options.list_limit, 0).await?;
        let candidates: Vec<ListItem> = page
            .items
            .into_iter()
            .filter(|item| item.name.to_lowercase().contains(query))
            .take(limit)
            .collect();

        debug!(query = %query, candidates = candidates.len(), "Enriching search candidates");
        let entities = enrich_items(self.client.as_ref(), &candidates).await?;
        Ok(entities.iter().map(Entity::to_search_result).collect())
    }
}

impl std::fmt::Debug for SearchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCoordinator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::record;
    use crate::catalog::{ListPage, RawRecord, StaticCatalog};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Records which detail fetches ran to completion
    struct CompletionLog {
        inner: StaticCatalog,
        completed: std::sync::Mutex<Vec<String>>,
    }

    impl CompletionLog {
        fn completed(&self) -> Vec<String> {
            let mut names = self.completed.lock().unwrap().clone();
            names.sort();
            names
        }
    }

    #[async_trait]
    impl CatalogClient for CompletionLog {
        async fn list_entities(&self, limit: u32, offset: u32) -> Result<ListPage> {
            self.inner.list_entities(limit, offset).await
        }

        async fn get_entity(&self, reference: &EntityRef) -> Result<RawRecord> {
            let record = self.inner.get_entity(reference).await?;
            self.completed.lock().unwrap().push(record.name.clone());
            Ok(record)
        }
    }

    fn names(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    fn coordinator(catalog: &Arc<StaticCatalog>) -> SearchCoordinator {
        SearchCoordinator::new(Arc::clone(catalog) as Arc<dyn CatalogClient>)
    }

    #[tokio::test]
    async fn test_short_query_skips_catalog() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        assert!(coordinator.search("c", 5).await.unwrap().is_empty());
        assert!(coordinator.search("  C  ", 5).await.unwrap().is_empty());
        assert!(coordinator.search("", 5).await.unwrap().is_empty());

        assert_eq!(catalog.list_calls(), 0);
        assert_eq!(catalog.detail_calls(), 0);
        assert!(coordinator.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_search_matches_substring_in_catalog_order() {
        let catalog = Arc::new(StaticCatalog::from_records(vec![
            record(1, "bulbasaur", &["grass", "poison"], [45, 49, 49, 65, 65, 45], 7, 69),
            record(4, "charmander", &["fire"], [39, 52, 43, 60, 50, 65], 6, 85),
            record(5, "charmeleon", &["fire"], [58, 64, 58, 80, 65, 80], 11, 190),
            record(6, "charizard", &["fire", "flying"], [78, 84, 78, 109, 85, 100], 17, 905),
        ]));
        let coordinator = coordinator(&catalog);

        let results = coordinator.search("ch", 5).await.unwrap();
        assert_eq!(names(&results), vec!["charmander", "charmeleon", "charizard"]);
        assert_eq!(results[2].types, vec!["fire", "flying"]);
        assert!(results[0].image.ends_with("/4.png"));
    }

    #[tokio::test]
    async fn test_query_is_normalized() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        let results = coordinator.search("  PiKa ", 5).await.unwrap();
        assert_eq!(names(&results), vec!["pikachu"]);
        assert!(coordinator.cache().contains("pika").await);
    }

    #[tokio::test]
    async fn test_repeated_query_hits_cache() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        let first = coordinator.search("saur", 5).await.unwrap();
        let second = coordinator.search("SAUR", 5).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["bulbasaur", "ivysaur", "venusaur"]);
        assert_eq!(catalog.list_calls(), 1);
        assert_eq!(catalog.detail_calls(), 3);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        coordinator.search("saur", 5).await.unwrap();
        coordinator.clear_cache().await;
        assert!(coordinator.cache().is_empty().await);

        coordinator.search("saur", 5).await.unwrap();
        assert_eq!(catalog.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_results_truncated_to_limit() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        let results = coordinator.search("char", 2).await.unwrap();
        assert_eq!(names(&results), vec!["charmander", "charmeleon"]);
        // Only the truncated candidates are enriched
        assert_eq!(catalog.detail_calls(), 2);

        assert!(coordinator.search("char", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_larger_limit_refetches_full_entry() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        coordinator.search("char", 1).await.unwrap();
        let wider = coordinator.search("char", 3).await.unwrap();
        assert_eq!(wider.len(), 3);
        assert_eq!(catalog.list_calls(), 2);

        let narrower = coordinator.search("char", 2).await.unwrap();
        assert_eq!(narrower.len(), 2);
        assert_eq!(catalog.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_larger_limit_served_when_match_set_complete() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        coordinator.search("pika", 5).await.unwrap();
        let results = coordinator.search("pika", 20).await.unwrap();
        assert_eq!(names(&results), vec!["pikachu"]);
        assert_eq!(catalog.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_enrichment_fails_search_and_caches_nothing() {
        let catalog = Arc::new(
            StaticCatalog::builder()
                .records(StaticCatalog::with_starters().records().to_vec())
                .fail_detail("charizard")
                .build(),
        );
        let coordinator = coordinator(&catalog);

        let err = coordinator.search("char", 5).await.unwrap_err();
        assert!(err.is_transport());
        assert!(!coordinator.cache().contains("char").await);

        // Queries that avoid the failing record still work
        let results = coordinator.search("charm", 5).await.unwrap();
        assert_eq!(names(&results), vec!["charmander", "charmeleon"]);
    }

    #[tokio::test]
    async fn test_list_failure_propagates_without_retry() {
        let catalog = Arc::new(
            StaticCatalog::builder()
                .records(StaticCatalog::with_starters().records().to_vec())
                .fail_list(1)
                .build(),
        );
        let coordinator = coordinator(&catalog);

        assert!(coordinator.search("char", 5).await.is_err());
        assert_eq!(catalog.list_calls(), 1);

        // The caller decides to retry
        assert_eq!(coordinator.search("char", 5).await.unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_search_supersedes_in_flight_lookup() {
        let catalog = Arc::new(
            StaticCatalog::builder()
                .records(StaticCatalog::with_starters().records().to_vec())
                .detail_delay("charmander", Duration::from_secs(5))
                .build(),
        );
        let coordinator = Arc::new(coordinator(&catalog));

        let slow = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.search("char", 5).await })
        };
        // Let the first lookup reach its slow detail fetch
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fast = coordinator.search("pika", 5).await.unwrap();
        assert_eq!(names(&fast), vec!["pikachu"]);

        let superseded = slow.await.unwrap().unwrap();
        assert!(superseded.is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(coordinator.cache().queries().await, vec!["pika"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_lookup_drops_pending_detail_fetch() {
        let catalog = Arc::new(CompletionLog {
            inner: StaticCatalog::builder()
                .records(StaticCatalog::with_starters().records().to_vec())
                .detail_delay("charmander", Duration::from_secs(5))
                .build(),
            completed: std::sync::Mutex::new(Vec::new()),
        });
        let coordinator = Arc::new(SearchCoordinator::new(
            Arc::clone(&catalog) as Arc<dyn CatalogClient>
        ));

        let slow = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.search("char", 5).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(catalog.completed(), vec!["charizard", "charmeleon"]);

        coordinator.search("pika", 5).await.unwrap();
        assert!(slow.await.unwrap().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        // charmander was started but never finished
        assert_eq!(catalog.inner.detail_calls(), 4);
        assert_eq!(catalog.completed(), vec!["charizard", "charmeleon", "pikachu"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_failure_is_not_surfaced() {
        let catalog = Arc::new(
            StaticCatalog::builder()
                .records(StaticCatalog::with_starters().records().to_vec())
                .detail_delay("charmander", Duration::from_secs(5))
                .fail_detail("charmander")
                .build(),
        );
        let coordinator = Arc::new(coordinator(&catalog));

        let slow = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.search("char", 5).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        coordinator.search("saur", 5).await.unwrap();

        assert!(slow.await.unwrap().unwrap().is_empty());
        assert!(!coordinator.cache().contains("char").await);
    }

    #[tokio::test]
    async fn test_get_entity() {
        let catalog = Arc::new(StaticCatalog::with_starters());
        let coordinator = coordinator(&catalog);

        let by_name = coordinator.get_entity("Charizard").await.unwrap();
        assert_eq!(by_name.id, 6);
        assert_eq!(by_name.total_stats, 534);

        let by_id = coordinator.get_entity("152").await.unwrap();
        assert_eq!(by_id.generation, 2);

        assert!(matches!(
            coordinator.get_entity("missingno").await,
            Err(Error::EntityNotFound(_))
        ));
        assert!(matches!(
            coordinator.get_entity("  ").await,
            Err(Error::InvalidInput(_))
        ));
    }
}
