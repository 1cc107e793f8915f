//! Coupons

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::TypedId;

/// Coupon Id
pub type CouponId = TypedId<Coupon>;

/// Coupon validation and construction errors.
///
/// The display strings are the user-facing messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponError {
    /// The entered code was blank after trimming. Never reaches the network.
    #[error("enter a coupon code")]
    EmptyInput,

    /// No coupon matches the code.
    #[error("invalid coupon")]
    Invalid,

    /// The coupon exists but has already been redeemed.
    #[error("this coupon was already used")]
    AlreadyUsed,

    /// Discounts are whole percentages between 1 and 100.
    #[error("discount must be between 1% and 100%, got {0}")]
    DiscountOutOfRange(i64),
}

/// A coupon code in canonical form: trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalise user input into a code.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::EmptyInput`] when nothing but whitespace was entered.
    pub fn parse(input: &str) -> Result<Self, CouponError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(CouponError::EmptyInput);
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    /// The canonical code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CouponCode {
    type Err = CouponError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CouponCode> for String {
    fn from(value: CouponCode) -> Self {
        value.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A whole-number discount percentage in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    /// Build a percentage, rejecting anything outside `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::DiscountOutOfRange`] for out-of-range values.
    pub fn new(value: i64) -> Result<Self, CouponError> {
        match u8::try_from(value) {
            Ok(percent @ 1..=100) => Ok(Self(percent)),
            _ => Err(CouponError::DiscountOutOfRange(value)),
        }
    }

    /// The percentage as an integer.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Fraction of the price that is taken off, e.g. `0.2` for 20%.
    pub fn fraction_off(self) -> Decimal {
        Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }

    /// Fraction of the price that is still paid, e.g. `0.8` for 20%.
    pub fn fraction_paid(self) -> Decimal {
        Decimal::ONE - self.fraction_off()
    }
}

impl TryFrom<i64> for DiscountPercent {
    type Error = CouponError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercent> for u8 {
    fn from(value: DiscountPercent) -> Self {
        value.0
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A promotional coupon, as held by the remote coupon store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Coupon {
    /// Record id, absent for coupons that never came from the store.
    #[serde(default)]
    pub id: Option<CouponId>,

    /// Canonical code.
    pub code: CouponCode,

    /// Percentage taken off a single unit.
    #[serde(rename = "discount")]
    pub discount_percent: DiscountPercent,

    /// Redeemed flag; only ever flips from `false` to `true`.
    #[serde(default)]
    pub is_used: bool,

    /// When the coupon was redeemed, set together with `is_used`.
    #[serde(default)]
    pub used_at: Option<Timestamp>,

    /// When the coupon was issued.
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Coupon {
    /// A fresh, unused coupon.
    pub fn new(code: CouponCode, discount_percent: DiscountPercent) -> Self {
        Self {
            id: None,
            code,
            discount_percent,
            is_used: false,
            used_at: None,
            created_at: None,
        }
    }

    /// Check the coupon can still be redeemed.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::AlreadyUsed`] once the coupon has been redeemed.
    pub fn ensure_available(&self) -> Result<(), CouponError> {
        if self.is_used {
            Err(CouponError::AlreadyUsed)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn codes_are_trimmed_and_upper_cased() -> TestResult {
        let code = CouponCode::parse("  welcome-ab12cd \n")?;

        assert_eq!(code.as_str(), "WELCOME-AB12CD");

        Ok(())
    }

    #[test]
    fn blank_input_is_empty_not_invalid() {
        assert_eq!(CouponCode::parse("   "), Err(CouponError::EmptyInput));
        assert_eq!(CouponCode::parse(""), Err(CouponError::EmptyInput));
    }

    #[test]
    fn discount_bounds() {
        assert!(DiscountPercent::new(1).is_ok());
        assert!(DiscountPercent::new(100).is_ok());
        assert_eq!(
            DiscountPercent::new(0),
            Err(CouponError::DiscountOutOfRange(0))
        );
        assert_eq!(
            DiscountPercent::new(101),
            Err(CouponError::DiscountOutOfRange(101))
        );
        assert_eq!(
            DiscountPercent::new(-5),
            Err(CouponError::DiscountOutOfRange(-5))
        );
    }

    #[test]
    fn fractions() -> TestResult {
        let percent = DiscountPercent::new(20)?;

        assert_eq!(percent.fraction_off(), Decimal::new(2, 1));
        assert_eq!(percent.fraction_paid(), Decimal::new(8, 1));

        Ok(())
    }

    #[test]
    fn deserializes_store_row() -> TestResult {
        let coupon: Coupon = serde_json::from_value(json!({
            "id": 7,
            "code": "maki-001",
            "discount": 15,
            "is_used": true,
            "used_at": "2025-03-01T10:00:00Z",
            "created_at": "2025-02-01T10:00:00+00:00"
        }))?;

        assert_eq!(coupon.code.as_str(), "MAKI-001");
        assert_eq!(coupon.discount_percent.value(), 15);
        assert_eq!(coupon.ensure_available(), Err(CouponError::AlreadyUsed));

        Ok(())
    }
}
