//! Local Storage Config

use std::path::PathBuf;

use clap::Args;

/// Local storage settings.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// File the cart snapshot is persisted to
    #[arg(long, env = "STORE_CART_SNAPSHOT_PATH", default_value = ".storefront/cart.json")]
    pub cart_snapshot_path: PathBuf,
}
