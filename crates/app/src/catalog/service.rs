//! Catalog service.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use storefront::products::{Category, Product, ProductId};
use tracing::debug;

use crate::{
    catalog::{CatalogServiceError, RemoteSettings},
    records::{CATEGORIES, CONFIG, PRODUCTS, Query, RecordStoreClient},
};

/// Id of the single row in the remote `config` table.
const SETTINGS_ROW: u32 = 1;

#[derive(Debug, Deserialize)]
struct ViewsRecord {
    #[serde(default)]
    views: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ViewsUpdate {
    views: u64,
}

/// Catalog held in the remote record store.
#[derive(Debug, Clone)]
pub struct RemoteCatalogService {
    records: RecordStoreClient,
}

impl RemoteCatalogService {
    /// Create a service backed by `records`.
    #[must_use]
    pub fn new(records: RecordStoreClient) -> Self {
        Self { records }
    }
}

#[async_trait]
impl CatalogService for RemoteCatalogService {
    #[tracing::instrument(name = "catalog.service.list_products", skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, CatalogServiceError> {
        let products: Vec<Product> = self
            .records
            .select(PRODUCTS, &Query::new().order_desc("created_at"))
            .await?;

        debug!(count = products.len(), "listed products");

        Ok(products)
    }

    #[tracing::instrument(name = "catalog.service.get_product", skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogServiceError> {
        let products: Vec<Product> = self
            .records
            .select(PRODUCTS, &Query::new().eq("id", id).limit(1))
            .await?;

        products
            .into_iter()
            .next()
            .ok_or_else(|| CatalogServiceError::ProductNotFound(id.clone()))
    }

    #[tracing::instrument(name = "catalog.service.list_categories", skip(self), err)]
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogServiceError> {
        Ok(self
            .records
            .select(CATEGORIES, &Query::new().order_asc("name"))
            .await?)
    }

    #[tracing::instrument(name = "catalog.service.record_view", skip(self), fields(product_id = %id), err)]
    async fn record_view(&self, id: &ProductId) -> Result<u64, CatalogServiceError> {
        let current: Vec<ViewsRecord> = self
            .records
            .select(PRODUCTS, &Query::new().select("views").eq("id", id).limit(1))
            .await?;

        let Some(current) = current.into_iter().next() else {
            return Err(CatalogServiceError::ProductNotFound(id.clone()));
        };

        // Read-modify-write: concurrent viewers can lose increments.
        let views = current.views.unwrap_or(0).saturating_add(1);

        let _: Vec<ViewsRecord> = self
            .records
            .update(PRODUCTS, &Query::new().eq("id", id), &ViewsUpdate { views })
            .await?;

        Ok(views)
    }

    #[tracing::instrument(name = "catalog.service.fetch_settings", skip(self), err)]
    async fn fetch_settings(&self) -> Result<Option<RemoteSettings>, CatalogServiceError> {
        let rows: Vec<RemoteSettings> = self
            .records
            .select(CONFIG, &Query::new().eq("id", SETTINGS_ROW).limit(1))
            .await?;

        Ok(rows.into_iter().next())
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Every product, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, CatalogServiceError>;

    /// A single product.
    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogServiceError>;

    /// Every category, by name.
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogServiceError>;

    /// Increment a product's view counter, returning the new count.
    async fn record_view(&self, id: &ProductId) -> Result<u64, CatalogServiceError>;

    /// The remote settings row, if one exists.
    async fn fetch_settings(&self) -> Result<Option<RemoteSettings>, CatalogServiceError>;
}
