//! Incremental catalog loader
//!
//! Materializes the catalog one page at a time in response to proximity
//! signals (a list scrolled near its end). The loader is a small state
//! machine:
//!
//! ```text
//! Idle --request_more--> Loading --has_next--> Idle
//!                                 \--last page--> Exhausted
//! any --teardown--> Closed
//! ```
//!
//! A failed page returns to `Idle` with the offset unchanged so a later
//! signal retries it. Each page settles on its own task, so a caller that
//! drops [`IncrementalLoader::request_more`] mid-flight never leaves the
//! loader stuck in `Loading`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogClient, enrich_items};
use crate::config::LoaderConfig;
use crate::domain::entity::Entity;
use crate::error::{Error, Result};
use crate::search::normalize_query;

/// Loader lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderState {
    Idle,
    Loading,
    Exhausted,
    Closed,
}

impl std::fmt::Display for LoaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoaderState::Idle => "idle",
            LoaderState::Loading => "loading",
            LoaderState::Exhausted => "exhausted",
            LoaderState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Why a signal did not start a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Loading,
    Exhausted,
    SearchActive,
    Coalesced,
    Closed,
}

/// Result of one proximity signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { added: usize, has_next: bool },
    Skipped(SkipReason),
}

#[derive(Debug)]
struct LoaderInner {
    state: LoaderState,
    offset: u32,
    entities: Vec<Entity>,
    search_query: Option<String>,
    last_request: Option<Instant>,
}

impl LoaderInner {
    fn skip_reason(&self, coalesce_interval: Duration) -> Option<SkipReason> {
        match self.state {
            LoaderState::Closed => return Some(SkipReason::Closed),
            LoaderState::Loading => return Some(SkipReason::Loading),
            LoaderState::Exhausted => return Some(SkipReason::Exhausted),
            LoaderState::Idle => {}
        }
        if self.search_query.is_some() {
            return Some(SkipReason::SearchActive);
        }
        match self.last_request {
            Some(at) if at.elapsed() < coalesce_interval => Some(SkipReason::Coalesced),
            _ => None,
        }
    }
}

/// Page-at-a-time loader over a [`CatalogClient`]
pub struct IncrementalLoader {
    client: Arc<dyn CatalogClient>,
    page_size: u32,
    coalesce_interval: Duration,
    inner: Arc<Mutex<LoaderInner>>,
}

impl IncrementalLoader {
    pub fn new(client: Arc<dyn CatalogClient>, config: &LoaderConfig) -> Self {
        Self::with_settings(client, config.page_size, config.coalesce_interval())
    }

    pub fn with_settings(
        client: Arc<dyn CatalogClient>,
        page_size: u32,
        coalesce_interval: Duration,
    ) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
            coalesce_interval,
            inner: Arc::new(Mutex::new(LoaderInner {
                state: LoaderState::Idle,
                offset: 0,
                entities: Vec::new(),
                search_query: None,
                last_request: None,
            })),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn state(&self) -> LoaderState {
        self.inner.lock().await.state
    }

    /// Offset of the next page to request
    pub async fn offset(&self) -> u32 {
        self.inner.lock().await.offset
    }

    /// Snapshot of everything loaded so far, in load order
    pub async fn entities(&self) -> Vec<Entity> {
        self.inner.lock().await.entities.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entities.is_empty()
    }

    /// Suspend the loader while a search query is active. A blank query resumes it.
    pub async fn set_search_query(&self, query: &str) {
        let query = normalize_query(query);
        let mut inner = self.inner.lock().await;
        inner.search_query = if query.is_empty() { None } else { Some(query) };
    }

    pub async fn search_query(&self) -> Option<String> {
        self.inner.lock().await.search_query.clone()
    }

    /// Handle one proximity signal
    pub async fn request_more(&self) -> Result<LoadOutcome> {
        let offset = {
            let mut inner = self.inner.lock().await;
            if let Some(reason) = inner.skip_reason(self.coalesce_interval) {
                debug!(?reason, state = %inner.state, "Ignoring load signal");
                return Ok(LoadOutcome::Skipped(reason));
            }
            inner.state = LoaderState::Loading;
            inner.last_request = Some(Instant::now());
            inner.offset
        };

        let page = tokio::spawn(settle_page(
            Arc::clone(&self.client),
            Arc::clone(&self.inner),
            self.page_size,
            offset,
        ));
        match page.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let mut inner = self.inner.lock().await;
                if inner.state == LoaderState::Loading {
                    inner.state = LoaderState::Idle;
                }
                warn!(offset, error = %e, "Catalog page task aborted");
                Err(Error::Other(format!("catalog page task aborted: {}", e)))
            }
        }
    }

    /// Drive up to `pages` signals back to back, waiting out the coalescing
    /// window between them. Stops early once the catalog is exhausted or the
    /// loader refuses for any other reason. Returns the number of entities added.
    pub async fn load_pages(&self, pages: usize) -> Result<usize> {
        let mut added_total = 0;
        let mut loaded = 0;

        while loaded < pages {
            match self.request_more().await? {
                LoadOutcome::Loaded { added, has_next } => {
                    added_total += added;
                    loaded += 1;
                    if !has_next {
                        break;
                    }
                }
                LoadOutcome::Skipped(SkipReason::Coalesced) => {
                    tokio::time::sleep(self.coalesce_interval).await;
                }
                LoadOutcome::Skipped(_) => break,
            }
        }

        Ok(added_total)
    }

    /// Stop the loader for good. Pages still in flight are dropped.
    pub async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = LoaderState::Closed;
        debug!(loaded = inner.entities.len(), "Loader closed");
    }
}

/// Fetch one page and apply it to the loader state
async fn settle_page(
    client: Arc<dyn CatalogClient>,
    inner: Arc<Mutex<LoaderInner>>,
    page_size: u32,
    offset: u32,
) -> Result<LoadOutcome> {
    let fetched = fetch_page(client.as_ref(), page_size, offset).await;

    let mut inner = inner.lock().await;
    if inner.state == LoaderState::Closed {
        debug!(offset, "Dropping page fetched after teardown");
        return Ok(LoadOutcome::Skipped(SkipReason::Closed));
    }

    match fetched {
        Ok((entities, has_next)) => {
            let added = entities.len();
            inner.entities.extend(entities);
            inner.offset = offset.saturating_add(page_size);
            inner.state = if has_next {
                LoaderState::Idle
            } else {
                LoaderState::Exhausted
            };
            info!(
                offset,
                added,
                total = inner.entities.len(),
                has_next,
                "Loaded catalog page"
            );
            Ok(LoadOutcome::Loaded { added, has_next })
        }
        Err(e) => {
            inner.state = LoaderState::Idle;
            warn!(offset, error = %e, "Catalog page failed to load");
            Err(e)
        }
    }
}

async fn fetch_page(
    client: &dyn CatalogClient,
    page_size: u32,
    offset: u32,
) -> Result<(Vec<Entity>, bool)> {
    let page = client.list_entities(page_size, offset).await?;
    let entities = enrich_items(client, &page.items).await?;
    Ok((entities, page.has_next))
}

impl std::fmt::Debug for IncrementalLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalLoader")
            .field("page_size", &self.page_size)
            .field("coalesce_interval", &self.coalesce_interval)
            .finish_non_exhaustive()
    }
}
