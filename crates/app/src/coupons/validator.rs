//! Coupon validation.

use storefront::coupons::{Coupon, CouponCode, CouponError};
use tracing::debug;

use crate::coupons::{CouponsService, CouponsServiceError};

/// Validate a code entered by the user.
///
/// The input is trimmed and upper-cased before lookup. Blank input never
/// reaches the store. Validation has no side effects: the coupon is only
/// marked used at checkout.
///
/// # Errors
///
/// Returns [`CouponError::EmptyInput`] for blank input,
/// [`CouponError::Invalid`] when no coupon matches,
/// [`CouponError::AlreadyUsed`] when the coupon was redeemed, and
/// [`CouponsServiceError::Remote`] when the store cannot be queried.
pub async fn validate(
    coupons: &dyn CouponsService,
    input: &str,
) -> Result<Coupon, CouponsServiceError> {
    let code = CouponCode::parse(input)?;

    let Some(coupon) = coupons.fetch_coupon(&code).await? else {
        debug!(%code, "coupon not found");

        return Err(CouponError::Invalid.into());
    };

    coupon.ensure_available()?;

    Ok(coupon)
}
