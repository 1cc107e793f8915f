//! Remote Record Store Config

use std::time::Duration;

use clap::Args;

/// Remote record store settings.
#[derive(Clone, Args)]
pub struct RemoteConfig {
    /// Record store base URL, e.g. `https://project.example.co`
    #[arg(long, env = "STORE_REMOTE_URL")]
    pub remote_url: String,

    /// Record store API key
    #[arg(long, env = "STORE_REMOTE_API_KEY", hide_env_values = true)]
    pub remote_api_key: String,

    /// Request timeout in seconds
    #[arg(long, env = "STORE_REMOTE_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub remote_timeout_seconds: u64,
}

impl RemoteConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_seconds)
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("remote_url", &self.remote_url)
            .field("remote_api_key", &"<redacted>")
            .field("remote_timeout_seconds", &self.remote_timeout_seconds)
            .finish()
    }
}
