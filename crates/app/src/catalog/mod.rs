//! Catalog
//!
//! Product and category retrieval, view counting and the remote settings row.

pub mod errors;
pub mod service;
pub mod settings;

pub use errors::CatalogServiceError;
pub use service::*;
pub use settings::RemoteSettings;
