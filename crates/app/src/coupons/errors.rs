//! Coupons service errors.

use storefront::coupons::CouponError;
use thiserror::Error;

use crate::records::RecordStoreError;

/// Errors raised by coupon operations.
///
/// The display strings of [`CouponsServiceError::Coupon`] are the
/// user-facing validation messages.
#[derive(Debug, Error)]
pub enum CouponsServiceError {
    /// The code or coupon was rejected.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// No coupon matched when one was required.
    #[error("coupon not found")]
    NotFound,

    /// The store answered with a row that is not a coupon.
    #[error("coupon store returned an invalid record")]
    InvalidRecord,

    /// The record store could not be reached or answered with an error.
    #[error("could not validate coupon")]
    Remote(#[from] RecordStoreError),
}

impl CouponsServiceError {
    /// Whether the error is a problem with the code the user entered, as
    /// opposed to the store being unavailable.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Coupon(_))
    }
}
