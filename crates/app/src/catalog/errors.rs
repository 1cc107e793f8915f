//! Catalog service errors.

use storefront::products::ProductId;
use thiserror::Error;

use crate::records::RecordStoreError;

/// Errors raised by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogServiceError {
    /// No product has the requested id.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The record store could not be reached or answered with an error.
    #[error("catalog unavailable")]
    Remote(#[from] RecordStoreError),
}
