//! Remote Record Store
//!
//! HTTP client for the `PostgREST`-style record store holding products,
//! categories, coupons and the remote configuration row.

mod client;
mod errors;
mod query;

pub use client::{RecordStoreClient, RecordStoreConfig};
pub use errors::RecordStoreError;
pub use query::Query;

/// Products table.
pub const PRODUCTS: &str = "products";

/// Categories table.
pub const CATEGORIES: &str = "categories";

/// Coupons table.
pub const COUPONS: &str = "coupons";

/// Remote configuration table.
pub const CONFIG: &str = "config";
