//! Store Config

use std::time::Duration;

use clap::Args;
use storefront::{
    codes::REWARD_PREFIX,
    order::{DEFAULT_CURRENCY_SYMBOL, DEFAULT_MESSAGING_HOST},
};

/// Storefront business settings.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct StoreConfig {
    /// Messaging destination that receives orders
    #[arg(long, env = "STORE_WHATSAPP_NUMBER", default_value = "51999999999")]
    pub whatsapp_number: String,

    /// Host of the messaging deep link
    #[arg(long, env = "STORE_MESSAGING_HOST", default_value = DEFAULT_MESSAGING_HOST)]
    pub messaging_host: String,

    /// Symbol prefixed to rendered amounts
    #[arg(long, env = "STORE_CURRENCY_SYMBOL", default_value = DEFAULT_CURRENCY_SYMBOL)]
    pub currency_symbol: String,

    /// Discount percentage of the per-session welcome code
    #[arg(
        long,
        env = "STORE_WELCOME_DISCOUNT",
        default_value_t = 20,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub welcome_discount: u8,

    /// Items in one order needed to earn a reward coupon
    #[arg(long, env = "STORE_REWARD_THRESHOLD", default_value_t = 2_u64)]
    pub reward_threshold: u64,

    /// Prefix of generated reward coupon codes
    #[arg(long, env = "STORE_REWARD_PREFIX", default_value = REWARD_PREFIX)]
    pub reward_prefix: String,

    /// Seconds the checkout notice stays visible
    #[arg(long, env = "STORE_NOTICE_WINDOW_SECONDS", default_value_t = 5_u64)]
    pub notice_window_seconds: u64,
}

impl StoreConfig {
    /// Notice display window as a [`Duration`].
    #[must_use]
    pub fn notice_window(&self) -> Duration {
        Duration::from_secs(self.notice_window_seconds)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            whatsapp_number: "51999999999".to_string(),
            messaging_host: DEFAULT_MESSAGING_HOST.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            welcome_discount: 20,
            reward_threshold: 2,
            reward_prefix: REWARD_PREFIX.to_string(),
            notice_window_seconds: 5,
        }
    }
}
