//! Checkout
//!
//! Checkout runs one linear sequence: redeem the applied coupon in the
//! background, issue a reward coupon when the order is large enough, compose
//! the order message, hand it to the messaging channel, and reset the
//! session. There is no rollback: the session is reset even when the link
//! fails to open.

use std::{fmt, sync::Arc, time::Duration};

use rust_decimal::Decimal;
use storefront::{
    cart::SnapshotStore,
    codes::{REWARD_PREFIX, RewardCoupon},
    coupons::CouponCode,
    order::{DEFAULT_CURRENCY_SYMBOL, DEFAULT_MESSAGING_HOST, OrderMessage, deep_link},
};
use thiserror::Error;
use tokio::{sync::watch, task::JoinSet};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
    config::StoreConfig,
    coupons::CouponsService,
    launcher::ChannelLauncher,
    session::{CouponSource, Session},
};

/// Errors that stop a checkout before it starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("the cart is empty")]
    EmptyCart,
}

/// Observable checkout progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutStage {
    /// No checkout in progress.
    #[default]
    Idle,

    /// Redeeming the applied coupon.
    Validating,

    /// Pricing the cart and composing the order message.
    Composing,

    /// Handing the message to the messaging channel.
    Dispatching,

    /// Clearing the cart and coupon.
    Resetting,
}

impl CheckoutStage {
    /// Stage name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Composing => "composing",
            Self::Dispatching => "dispatching",
            Self::Resetting => "resetting",
        }
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checkout behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Messaging destination that receives the order.
    pub destination: String,

    /// Host of the deep link.
    pub messaging_host: String,

    /// Symbol prefixed to amounts in the message.
    pub currency_symbol: String,

    /// Items in one order needed to earn a reward coupon.
    pub reward_threshold: u64,

    /// Prefix of reward coupon codes.
    pub reward_prefix: String,

    /// How long the success notice stays up.
    pub notice_window: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            destination: "51999999999".to_string(),
            messaging_host: DEFAULT_MESSAGING_HOST.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            reward_threshold: 2,
            reward_prefix: REWARD_PREFIX.to_string(),
            notice_window: Duration::from_secs(5),
        }
    }
}

impl From<&StoreConfig> for CheckoutSettings {
    fn from(config: &StoreConfig) -> Self {
        Self {
            destination: config.whatsapp_number.clone(),
            messaging_host: config.messaging_host.clone(),
            currency_symbol: config.currency_symbol.clone(),
            reward_threshold: config.reward_threshold,
            reward_prefix: config.reward_prefix.clone(),
            notice_window: config.notice_window(),
        }
    }
}

/// The transient post-checkout notice. Its presence is the success flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutNotice {
    /// Which checkout raised the notice.
    pub generation: u64,

    /// Reward coupon to show, if one was issued.
    pub reward: Option<RewardCoupon>,
}

/// Outcome of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// Correlation id, also recorded on the checkout span.
    pub checkout_id: Uuid,

    /// Amount payable, unrounded.
    pub total: Decimal,

    /// Items ordered.
    pub item_count: u64,

    /// Coupon applied to the order.
    pub coupon: Option<CouponCode>,

    /// Plain-text order message.
    pub message: String,

    /// Deep link carrying the encoded message.
    pub link: String,

    /// Reward coupon issued by this checkout.
    pub reward: Option<RewardCoupon>,

    /// Whether the link was opened.
    pub launched: bool,
}

/// Runs checkouts and owns their background work.
pub struct CheckoutOrchestrator {
    coupons: Arc<dyn CouponsService>,
    launcher: Arc<dyn ChannelLauncher>,
    settings: CheckoutSettings,
    stage: CheckoutStage,
    generation: u64,
    notice: Arc<watch::Sender<Option<CheckoutNotice>>>,
    background: JoinSet<()>,
}

impl fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("settings", &self.settings)
            .field("stage", &self.stage)
            .field("generation", &self.generation)
            .field("pending", &self.background.len())
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        coupons: Arc<dyn CouponsService>,
        launcher: Arc<dyn ChannelLauncher>,
        settings: CheckoutSettings,
    ) -> Self {
        let (notice, _) = watch::channel(None);

        Self {
            coupons,
            launcher,
            settings,
            stage: CheckoutStage::Idle,
            generation: 0,
            notice: Arc::new(notice),
            background: JoinSet::new(),
        }
    }

    /// Current stage.
    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    /// Settings in use.
    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Watch the post-checkout notice.
    pub fn subscribe(&self) -> watch::Receiver<Option<CheckoutNotice>> {
        self.notice.subscribe()
    }

    /// Background writes not yet awaited by [`CheckoutOrchestrator::flush`].
    pub fn pending(&self) -> usize {
        self.background.len()
    }

    /// Place the order held by `session`.
    ///
    /// Coupon redemption runs in the background and never delays or fails
    /// the checkout; nor does a link that fails to open.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when there is nothing to order.
    pub async fn checkout<S: SnapshotStore>(
        &mut self,
        session: &mut Session<S>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let checkout_id = Uuid::now_v7();
        let span = info_span!("checkout", %checkout_id);

        self.run(checkout_id, session).instrument(span).await
    }

    /// Wait for background coupon redemptions to finish.
    pub async fn flush(&mut self) {
        while let Some(result) = self.background.join_next().await {
            if let Err(error) = result {
                warn!(%error, "background task failed");
            }
        }
    }

    async fn run<S: SnapshotStore>(
        &mut self,
        checkout_id: Uuid,
        session: &mut Session<S>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if session.lines().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.enter(CheckoutStage::Validating);

        let coupon = session
            .applied_coupon()
            .map(|applied| applied.coupon.code.clone());

        if let Some(code) = &coupon {
            if session.coupon_source() == Some(CouponSource::Store) {
                self.redeem_in_background(code.clone());
            } else {
                debug!(%code, "welcome code needs no redemption");
            }
        }

        let item_count = session.total_item_count();

        let reward = (item_count >= self.settings.reward_threshold)
            .then(|| RewardCoupon::issue(&self.settings.reward_prefix));

        if let Some(reward) = &reward {
            info!(code = %reward.code, item_count, "issued reward coupon");
        }

        self.enter(CheckoutStage::Composing);

        let total = session.total();

        let message = OrderMessage::new(session.lines(), &self.settings.currency_symbol)
            .with_coupon(session.applied_coupon())
            .with_reward(reward.as_ref())
            .to_string();

        let link = deep_link(
            &self.settings.messaging_host,
            &self.settings.destination,
            &message,
        );

        self.enter(CheckoutStage::Dispatching);

        let launched = match self.launcher.launch(&link).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "failed to open order link");
                false
            }
        };

        self.enter(CheckoutStage::Resetting);

        if let Err(error) = session.reset() {
            warn!(%error, "failed to clear stored cart");
        }

        self.raise_notice(reward.clone());

        self.enter(CheckoutStage::Idle);

        info!(%total, item_count, launched, "checkout complete");

        Ok(CheckoutReceipt {
            checkout_id,
            total,
            item_count,
            coupon,
            message,
            link,
            reward,
            launched,
        })
    }

    fn enter(&mut self, stage: CheckoutStage) {
        debug!(from = %self.stage, to = %stage, "checkout stage");

        self.stage = stage;
    }

    fn redeem_in_background(&mut self, code: CouponCode) {
        let coupons = Arc::clone(&self.coupons);

        self.background.spawn(
            async move {
                match coupons.mark_used(&code).await {
                    Ok(()) => debug!(%code, "coupon redeemed"),
                    Err(error) => warn!(%code, %error, "failed to mark coupon used"),
                }
            }
            .in_current_span(),
        );
    }

    fn raise_notice(&mut self, reward: Option<RewardCoupon>) {
        self.generation += 1;

        let generation = self.generation;
        let window = self.settings.notice_window;
        let notice = Arc::clone(&self.notice);

        notice.send_replace(Some(CheckoutNotice { generation, reward }));

        tokio::spawn(
            async move {
                tokio::time::sleep(window).await;

                // A later checkout owns the notice now.
                let cleared = notice.send_if_modified(|current| {
                    if current
                        .as_ref()
                        .is_some_and(|notice| notice.generation == generation)
                    {
                        *current = None;
                        true
                    } else {
                        false
                    }
                });

                if cleared {
                    debug!(generation, "cleared checkout notice");
                }
            }
            .in_current_span(),
        );
    }
}
