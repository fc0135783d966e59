//! PokeAPI catalog client
//!
//! Thin async HTTP wrapper over the two endpoints the core needs:
//! - `GET {base}/pokemon?limit=&offset=` for list pages
//! - `GET {base}/pokemon/{id_or_name}` for detail records

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tracing::{debug, warn};

use super::types::{ListPage, ListResponse, RawRecord};
use super::{CatalogClient, EntityRef};
use crate::config::{CatalogConfig, DEFAULT_CATALOG_URL};
use crate::error::{Error, Result};

/// HTTP catalog client
#[derive(Clone)]
pub struct HttpCatalogClient {
    http_client: HttpClient,
    base_url: String,
}

impl std::fmt::Debug for HttpCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalogClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Builder for creating an HttpCatalogClient
pub struct HttpCatalogClientBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for HttpCatalogClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpCatalogClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Set the base URL (defaults to PokeAPI)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<HttpCatalogClient> {
        let timeout_secs = self
            .timeout_secs
            .unwrap_or_else(|| CatalogConfig::default().timeout_secs);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::Network)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(HttpCatalogClient {
            http_client,
            base_url,
        })
    }
}

impl HttpCatalogClient {
    /// Create a client from catalog configuration
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        HttpCatalogClientBuilder::new()
            .base_url(config.resolved_base_url())
            .timeout_secs(config.timeout_secs)
            .build()
    }

    pub fn builder() -> HttpCatalogClientBuilder {
        HttpCatalogClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_entities(&self, limit: u32, offset: u32) -> Result<ListPage> {
        let url = format!("{}/pokemon", self.base_url);
        debug!(limit, offset, "Fetching catalog page");

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, url = %url, "Catalog list request failed");
            return Err(Error::Transport(format!("GET {} returned {}", url, status)));
        }

        let body: ListResponse = response.json().await?;
        Ok(ListPage::from(body))
    }

    async fn get_entity(&self, reference: &EntityRef) -> Result<RawRecord> {
        let url = format!("{}/pokemon/{}", self.base_url, reference);
        debug!(reference = %reference, "Fetching catalog record");

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::EntityNotFound(reference.to_string()));
        }
        if !status.is_success() {
            warn!(%status, url = %url, "Catalog detail request failed");
            return Err(Error::Transport(format!("GET {} returned {}", url, status)));
        }

        Ok(response.json().await?)
    }
}
