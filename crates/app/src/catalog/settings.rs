//! Remote settings row.

use serde::Deserialize;

/// Row `id = 1` of the remote `config` table. Values present here override
/// the local configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteSettings {
    /// Messaging destination that receives orders.
    #[serde(default)]
    pub whatsapp_number: Option<String>,

    /// Discount percentage of the per-session welcome code.
    #[serde(default)]
    pub welcome_discount: Option<i64>,
}

impl RemoteSettings {
    /// The destination, ignoring blank values.
    pub fn destination(&self) -> Option<&str> {
        self.whatsapp_number
            .as_deref()
            .map(str::trim)
            .filter(|number| !number.is_empty())
    }
}
