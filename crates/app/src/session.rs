//! Shopping Session
//!
//! One customer session: the cart ledger, the applied coupon and the
//! per-session welcome code. All state changes go through the methods here
//! so the coupon target can only ever point at a line in the cart.

use rust_decimal::Decimal;
use storefront::{
    cart::{CartLedger, CartLine, SnapshotError, SnapshotStore},
    codes::{self, WELCOME_PREFIX},
    coupons::{Coupon, CouponCode, CouponError, DiscountPercent},
    pricing::{self, AppliedCoupon, PriceSummary},
    products::{Product, ProductId, Selection},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::coupons::{CouponsService, CouponsServiceError, validate};

/// Errors raised by session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Coupon validation failed.
    #[error(transparent)]
    Coupon(#[from] CouponsServiceError),

    /// A target was chosen with no coupon applied.
    #[error("no coupon is applied")]
    NoCouponApplied,

    /// The chosen target is not a line in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// The cart snapshot could not be written.
    #[error("failed to persist cart")]
    Snapshot(#[from] SnapshotError),
}

impl From<CouponError> for SessionError {
    fn from(error: CouponError) -> Self {
        Self::Coupon(error.into())
    }
}

/// Where an applied coupon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponSource {
    /// The session's own welcome code. Unknown to the coupon store.
    Welcome,

    /// A coupon held by the remote coupon store.
    Store,
}

/// The per-session welcome code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeCode {
    coupon: Coupon,
    redeemed: bool,
}

impl WelcomeCode {
    /// Generate a fresh `WELCOME-` code worth `discount`.
    ///
    /// # Errors
    ///
    /// Returns an error if the generated code is not a valid coupon code.
    pub fn generate(discount: DiscountPercent) -> Result<Self, CouponError> {
        Ok(Self::new(Coupon::new(
            CouponCode::parse(&codes::generate(WELCOME_PREFIX))?,
            discount,
        )))
    }

    /// Wrap an existing coupon as the session's welcome code.
    pub fn new(coupon: Coupon) -> Self {
        Self {
            coupon,
            redeemed: false,
        }
    }

    /// The code to show the customer.
    pub fn code(&self) -> &CouponCode {
        &self.coupon.code
    }

    /// Discount the code is worth.
    pub fn discount(&self) -> DiscountPercent {
        self.coupon.discount_percent
    }

    /// Whether the code has been applied in this session.
    pub fn is_redeemed(&self) -> bool {
        self.redeemed
    }
}

#[derive(Debug, Clone)]
struct SessionCoupon {
    applied: AppliedCoupon,
    source: CouponSource,
}

/// A customer's shopping session.
#[derive(Debug)]
pub struct Session<S> {
    ledger: CartLedger<S>,
    coupon: Option<SessionCoupon>,
    welcome: WelcomeCode,
}

impl<S: SnapshotStore> Session<S> {
    /// Start a session over `ledger` with the given welcome code.
    ///
    /// The persisted cart is restored. A corrupt snapshot is logged and the
    /// session starts with an empty cart.
    pub fn start(mut ledger: CartLedger<S>, welcome: WelcomeCode) -> Self {
        match ledger.restore_persisted() {
            Ok(lines) => debug!(lines, "restored cart"),
            Err(error) => warn!(%error, "discarded stored cart"),
        }

        Self {
            ledger,
            coupon: None,
            welcome,
        }
    }

    /// Lines in the cart.
    pub fn lines(&self) -> &[CartLine] {
        self.ledger.lines()
    }

    /// The cart ledger.
    pub fn ledger(&self) -> &CartLedger<S> {
        &self.ledger
    }

    /// Sum of all line quantities.
    pub fn total_item_count(&self) -> u64 {
        self.ledger.total_item_count()
    }

    /// The applied coupon, if any.
    pub fn applied_coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref().map(|coupon| &coupon.applied)
    }

    /// Where the applied coupon came from.
    pub fn coupon_source(&self) -> Option<CouponSource> {
        self.coupon.as_ref().map(|coupon| coupon.source)
    }

    /// The session's welcome code.
    pub fn welcome_code(&self) -> &WelcomeCode {
        &self.welcome
    }

    /// Amount payable under the applied coupon.
    pub fn total(&self) -> Decimal {
        pricing::compute_total(self.lines(), self.applied_coupon())
    }

    /// Subtotal, discount and total.
    pub fn summary(&self) -> PriceSummary {
        pricing::summarize(self.lines(), self.applied_coupon())
    }

    /// Add a validated selection of `product` to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart snapshot cannot be written.
    pub fn add_item(
        &mut self,
        product: &Product,
        selection: Selection,
    ) -> Result<(), SessionError> {
        self.ledger
            .add_item(product, selection.quantity, selection.variant)?;

        Ok(())
    }

    /// Change a line's quantity by `delta`; lines reaching zero are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart snapshot cannot be written.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<(), SessionError> {
        self.ledger.update_quantity(product_id, delta)?;

        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart snapshot cannot be written.
    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<(), SessionError> {
        self.ledger.remove_item(product_id)?;

        Ok(())
    }

    /// Validate and apply a coupon code, replacing any applied coupon. The
    /// first line becomes the target; an empty cart leaves it unset.
    ///
    /// The session's welcome code is accepted once without consulting the
    /// coupon store. Store coupons are validated remotely and only marked
    /// used at checkout.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the previously applied coupon is kept.
    pub async fn apply_coupon(
        &mut self,
        input: &str,
        coupons: &dyn CouponsService,
    ) -> Result<&AppliedCoupon, SessionError> {
        let code = CouponCode::parse(input)?;

        let (coupon, source) = if &code == self.welcome.code() {
            if self.welcome.redeemed {
                return Err(CouponError::AlreadyUsed.into());
            }

            self.welcome.redeemed = true;

            (self.welcome.coupon.clone(), CouponSource::Welcome)
        } else {
            (
                validate(coupons, code.as_str()).await?,
                CouponSource::Store,
            )
        };

        info!(code = %coupon.code, discount = %coupon.discount_percent, "applied coupon");

        let applied = &self
            .coupon
            .insert(SessionCoupon {
                applied: AppliedCoupon::new(coupon, self.ledger.lines()),
                source,
            })
            .applied;

        Ok(applied)
    }

    /// Remove the applied coupon. A removed welcome code stays redeemed.
    pub fn cancel_coupon(&mut self) {
        if let Some(coupon) = self.coupon.take() {
            debug!(code = %coupon.applied.coupon.code, "cancelled coupon");
        }
    }

    /// Choose the line that receives the coupon discount.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoCouponApplied`] without a coupon and
    /// [`SessionError::NotInCart`] when `product_id` has no line.
    pub fn select_target(&mut self, product_id: &ProductId) -> Result<(), SessionError> {
        let Some(coupon) = self.coupon.as_mut() else {
            return Err(SessionError::NoCouponApplied);
        };

        if !self.ledger.contains(product_id) {
            return Err(SessionError::NotInCart(product_id.clone()));
        }

        coupon.applied.target = Some(product_id.clone());

        Ok(())
    }

    /// Empty the cart, delete its snapshot and drop the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted. The cart and
    /// coupon are cleared regardless.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.coupon = None;
        self.ledger.clear()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use storefront::{cart::MemorySnapshotStore, fixtures};
    use testresult::TestResult;

    use crate::coupons::MockCouponsService;

    use super::*;

    fn welcome() -> Result<WelcomeCode, CouponError> {
        Ok(WelcomeCode::new(Coupon::new(
            CouponCode::parse("WELCOME-TEST01")?,
            DiscountPercent::new(20)?,
        )))
    }

    fn session() -> Result<Session<MemorySnapshotStore>, CouponError> {
        Ok(Session::start(
            CartLedger::new(MemorySnapshotStore::new()),
            welcome()?,
        ))
    }

    fn add(session: &mut Session<MemorySnapshotStore>, id: &str, quantity: u32) -> TestResult {
        let product = fixtures::product(id)?;
        let selection = Selection::for_product(&product, quantity, None, None)?;

        session.add_item(&product, selection)?;

        Ok(())
    }

    fn store_coupon(code: &str, percent: i64) -> Result<Coupon, CouponError> {
        Ok(Coupon::new(CouponCode::parse(code)?, DiscountPercent::new(percent)?))
    }

    #[tokio::test]
    async fn welcome_code_applies_once_without_the_store() -> TestResult {
        let mut session = session()?;
        add(&mut session, "1", 2)?;

        let mut coupons = MockCouponsService::new();
        coupons.expect_fetch_coupon().never();

        session.apply_coupon("welcome-test01", &coupons).await?;

        assert_eq!(session.coupon_source(), Some(CouponSource::Welcome));
        assert_eq!(session.total(), Decimal::new(53_982, 3));

        session.cancel_coupon();
        let second = session.apply_coupon("WELCOME-TEST01", &coupons).await;

        assert!(
            matches!(
                second,
                Err(SessionError::Coupon(CouponsServiceError::Coupon(
                    CouponError::AlreadyUsed
                )))
            ),
            "expected AlreadyUsed, got {second:?}"
        );
        assert_eq!(session.applied_coupon(), None);

        Ok(())
    }

    #[tokio::test]
    async fn store_coupon_targets_the_first_line() -> TestResult {
        let mut session = session()?;
        add(&mut session, "1", 1)?;
        add(&mut session, "3", 1)?;

        let coupon = store_coupon("PROMO50", 50)?;
        let mut coupons = MockCouponsService::new();
        coupons
            .expect_fetch_coupon()
            .return_once(move |_| Ok(Some(coupon)));

        let applied = session.apply_coupon("promo50", &coupons).await?;

        assert_eq!(applied.target, Some(ProductId::new("1")));
        assert_eq!(session.coupon_source(), Some(CouponSource::Store));

        Ok(())
    }

    #[tokio::test]
    async fn failed_validation_keeps_the_current_coupon() -> TestResult {
        let mut session = session()?;
        add(&mut session, "1", 1)?;

        let coupons = MockCouponsService::new();
        session.apply_coupon("WELCOME-TEST01", &coupons).await?;

        let mut coupons = MockCouponsService::new();
        coupons.expect_fetch_coupon().return_once(|_| Ok(None));

        let result = session.apply_coupon("bogus", &coupons).await;

        assert!(result.is_err(), "bogus code should be rejected");
        assert_eq!(session.coupon_source(), Some(CouponSource::Welcome));

        Ok(())
    }

    #[tokio::test]
    async fn coupon_on_empty_cart_has_no_target_until_selected() -> TestResult {
        let mut session = session()?;
        let coupons = MockCouponsService::new();

        let applied = session.apply_coupon("WELCOME-TEST01", &coupons).await?;
        assert_eq!(applied.target, None);

        add(&mut session, "2", 3)?;
        assert_eq!(session.total(), session.summary().subtotal);

        session.select_target(&ProductId::new("2"))?;

        // 19.99 * 0.8 + 19.99 * 2
        assert_eq!(session.total(), Decimal::new(55_972, 3));

        Ok(())
    }

    #[test]
    fn select_target_requires_a_coupon() -> TestResult {
        let mut session = session()?;
        add(&mut session, "1", 1)?;

        let result = session.select_target(&ProductId::new("1"));
        assert!(
            matches!(result, Err(SessionError::NoCouponApplied)),
            "expected NoCouponApplied, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn selecting_a_missing_line_is_rejected() -> TestResult {
        let mut session = session()?;
        add(&mut session, "1", 1)?;
        session
            .apply_coupon("WELCOME-TEST01", &MockCouponsService::new())
            .await?;

        let result = session.select_target(&ProductId::new("9"));

        assert!(
            matches!(result, Err(SessionError::NotInCart(ref id)) if id.as_str() == "9"),
            "expected NotInCart, got {result:?}"
        );
        assert_eq!(
            session.applied_coupon().and_then(|applied| applied.target.clone()),
            Some(ProductId::new("1"))
        );

        Ok(())
    }

    #[test]
    fn start_discards_a_corrupt_snapshot() -> TestResult {
        let session = Session::start(
            CartLedger::new(MemorySnapshotStore::with_raw("{broken")),
            welcome()?,
        );

        assert!(session.lines().is_empty());
        assert_eq!(session.ledger().store().raw(), None);

        Ok(())
    }

    #[tokio::test]
    async fn reset_clears_cart_and_coupon() -> TestResult {
        let mut session = session()?;
        add(&mut session, "1", 2)?;
        session
            .apply_coupon("WELCOME-TEST01", &MockCouponsService::new())
            .await?;

        session.reset()?;

        assert!(session.lines().is_empty());
        assert_eq!(session.applied_coupon(), None);
        assert_eq!(session.ledger().store().raw(), None);
        assert!(session.welcome_code().is_redeemed());

        Ok(())
    }
}
