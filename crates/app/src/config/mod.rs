//! Storefront configuration
//!
//! Every setting can be given as a flag or an environment variable. A `.env`
//! file in the working directory is loaded before parsing.

use clap::Args;

pub mod admin;
pub mod logging;
pub mod remote;
pub mod storage;
pub mod store;

pub use admin::AdminConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use remote::RemoteConfig;
pub use storage::StorageConfig;
pub use store::StoreConfig;

/// Storefront configuration
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Remote record store settings.
    #[command(flatten)]
    pub remote: RemoteConfig,

    /// Storefront business settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Local storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Admin surface settings.
    #[command(flatten)]
    pub admin: AdminConfig,
}

/// Load a `.env` file if one is present. A missing file is not an error.
pub fn load_dotenv() {
    _ = dotenvy::dotenv();
}
