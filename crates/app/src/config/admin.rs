//! Admin Config

use clap::Args;

/// Admin surface settings.
#[derive(Clone, Args)]
pub struct AdminConfig {
    /// Shared secret required by admin commands. Admin is disabled when unset.
    #[arg(long, env = "STORE_ADMIN_SECRET", hide_env_values = true)]
    pub admin_secret: Option<String>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("admin_secret", &self.admin_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
