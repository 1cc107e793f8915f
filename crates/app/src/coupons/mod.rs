//! Coupons
//!
//! Remote coupon lookup, validation and redemption.

pub mod errors;
pub mod service;
pub mod validator;

pub use errors::CouponsServiceError;
pub use service::*;
pub use validator::validate;
