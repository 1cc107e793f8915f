//! Pricing
//!
//! A coupon discounts exactly one unit of exactly one cart line, the target.
//! The target is resolved against the lines every time a price is computed,
//! so removing the target line simply turns the discount off.
//!
//! Amounts are accumulated at full precision and only rounded when formatted.

use rust_decimal::{Decimal, RoundingStrategy};
use smallvec::{SmallVec, smallvec};

use crate::{
    cart::CartLine,
    coupons::{Coupon, DiscountPercent},
    products::ProductId,
};

/// Decimal places used when displaying an amount.
pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

/// A validated coupon applied to the cart, with the line chosen to receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    /// The coupon.
    pub coupon: Coupon,

    /// Product id of the target line. May dangle if the line was removed.
    pub target: Option<ProductId>,
}

impl AppliedCoupon {
    /// Apply `coupon`, targeting the first line when the cart is not empty.
    pub fn new(coupon: Coupon, lines: &[CartLine]) -> Self {
        Self {
            coupon,
            target: lines.first().map(|line| line.product_id.clone()),
        }
    }

    /// Discount percentage of the coupon.
    pub fn discount(&self) -> DiscountPercent {
        self.coupon.discount_percent
    }

    /// The target line, if it is still in `lines`.
    pub fn resolve<'a>(&self, lines: &'a [CartLine]) -> Option<&'a CartLine> {
        let target = self.target.as_ref()?;

        lines.iter().find(|line| &line.product_id == target)
    }
}

/// A group of units on a line charged at the same unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCharge {
    /// Units in this charge.
    pub quantity: u32,

    /// Price paid per unit.
    pub unit_price: Decimal,

    /// Whether these units carry the coupon discount.
    pub discounted: bool,
}

impl LineCharge {
    /// Amount for this charge.
    pub fn amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A cart line broken into the charges that make up its price.
///
/// Undiscounted lines have a single full-price charge. The target line has a
/// discounted single-unit charge followed, when its quantity is above one, by
/// a full-price charge for the remaining units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine<'a> {
    /// The cart line.
    pub line: &'a CartLine,

    /// Charges, in display order.
    pub charges: SmallVec<[LineCharge; 2]>,
}

impl PricedLine<'_> {
    /// Amount payable for the line.
    pub fn total(&self) -> Decimal {
        self.charges.iter().map(LineCharge::amount).sum()
    }

    /// Amount taken off the line by the coupon.
    pub fn discount(&self) -> Decimal {
        self.line.line_total() - self.total()
    }

    /// Whether the coupon applies to this line.
    pub fn is_discounted(&self) -> bool {
        self.charges.iter().any(|charge| charge.discounted)
    }
}

/// Subtotal, discount and total for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSummary {
    /// Full-price sum of all lines.
    pub subtotal: Decimal,

    /// Amount taken off by the coupon.
    pub discount: Decimal,

    /// Amount payable.
    pub total: Decimal,
}

/// Price of one unit after `percent` is taken off.
pub fn discounted_unit_price(unit_price: Decimal, percent: DiscountPercent) -> Decimal {
    unit_price * percent.fraction_paid()
}

/// Break every line into its charges under the applied coupon.
pub fn price_lines<'a>(
    lines: &'a [CartLine],
    applied: Option<&AppliedCoupon>,
) -> Vec<PricedLine<'a>> {
    let target = applied.and_then(|applied| {
        applied
            .resolve(lines)
            .map(|line| (&line.product_id, applied.discount()))
    });

    lines
        .iter()
        .map(|line| {
            let charges = match target {
                Some((target, percent)) if target == &line.product_id => {
                    discounted_charges(line, percent)
                }
                _ => smallvec![LineCharge {
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discounted: false,
                }],
            };

            PricedLine { line, charges }
        })
        .collect()
}

fn discounted_charges(line: &CartLine, percent: DiscountPercent) -> SmallVec<[LineCharge; 2]> {
    let mut charges = smallvec![LineCharge {
        quantity: 1,
        unit_price: discounted_unit_price(line.unit_price, percent),
        discounted: true,
    }];

    if line.quantity > 1 {
        charges.push(LineCharge {
            quantity: line.quantity - 1,
            unit_price: line.unit_price,
            discounted: false,
        });
    }

    charges
}

/// Full-price sum of `unit_price × quantity` over all lines.
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Amount payable for the cart under the applied coupon.
///
/// Without a coupon, or when the coupon's target is not in the cart, this is
/// the plain [`subtotal`].
pub fn compute_total(lines: &[CartLine], applied: Option<&AppliedCoupon>) -> Decimal {
    price_lines(lines, applied).iter().map(PricedLine::total).sum()
}

/// Subtotal, discount and total in one pass.
pub fn summarize(lines: &[CartLine], applied: Option<&AppliedCoupon>) -> PriceSummary {
    let subtotal = subtotal(lines);
    let total = compute_total(lines, applied);

    PriceSummary {
        subtotal,
        discount: subtotal - total,
        total,
    }
}

/// Round an amount to [`DISPLAY_DECIMAL_PLACES`], halves away from zero.
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DISPLAY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount with exactly two decimal places, e.g. `53.98`.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_for_display(amount))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        coupons::CouponCode,
        products::Variant,
    };

    use super::*;

    fn line(id: &str, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: price,
            quantity,
            variant: Variant::default(),
        }
    }

    fn coupon(percent: i64) -> Result<Coupon, crate::coupons::CouponError> {
        Ok(Coupon::new(
            CouponCode::parse("TEST")?,
            DiscountPercent::new(percent)?,
        ))
    }

    #[test]
    fn no_coupon_is_plain_sum() {
        let lines = [
            line("1", Decimal::new(2999, 2), 2),
            line("2", Decimal::new(1999, 2), 1),
        ];

        assert_eq!(compute_total(&lines, None), Decimal::new(7997, 2));
    }

    #[test]
    fn coupon_discounts_one_unit_of_the_target_only() -> TestResult {
        let lines = [
            line("1", Decimal::new(2999, 2), 2),
            line("2", Decimal::new(1000, 2), 3),
        ];

        let mut applied = AppliedCoupon::new(coupon(50)?, &lines);
        applied.target = Some(ProductId::new("2"));

        // 29.99 * 2 + (5.00 + 10.00 * 2)
        assert_eq!(compute_total(&lines, Some(&applied)), Decimal::new(8498, 2));

        let priced = price_lines(&lines, Some(&applied));
        let discounted: Vec<bool> = priced.iter().map(PricedLine::is_discounted).collect();

        assert_eq!(discounted, vec![false, true]);
        assert_eq!(priced.get(1).map(|p| p.charges.len()), Some(2));
        assert_eq!(priced.get(1).map(PricedLine::discount), Some(Decimal::new(500, 2)));

        Ok(())
    }

    #[test]
    fn single_unit_target_has_no_remainder_charge() -> TestResult {
        let lines = [line("1", Decimal::new(4000, 2), 1)];
        let applied = AppliedCoupon::new(coupon(25)?, &lines);

        let priced = price_lines(&lines, Some(&applied));

        assert_eq!(priced.first().map(|p| p.charges.len()), Some(1));
        assert_eq!(compute_total(&lines, Some(&applied)), Decimal::new(3000, 2));

        Ok(())
    }

    #[test]
    fn dangling_target_falls_back_to_undiscounted() -> TestResult {
        let lines = [line("1", Decimal::new(2999, 2), 2)];
        let mut applied = AppliedCoupon::new(coupon(20)?, &lines);
        applied.target = Some(ProductId::new("gone"));

        assert_eq!(compute_total(&lines, Some(&applied)), subtotal(&lines));

        Ok(())
    }

    #[test]
    fn applying_to_empty_cart_has_no_target() -> TestResult {
        let applied = AppliedCoupon::new(coupon(20)?, &[]);

        assert_eq!(applied.target, None);
        assert_eq!(compute_total(&[], Some(&applied)), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn hundred_percent_makes_one_unit_free() -> TestResult {
        let lines = [line("1", Decimal::new(1999, 2), 3)];
        let applied = AppliedCoupon::new(coupon(100)?, &lines);

        assert_eq!(compute_total(&lines, Some(&applied)), Decimal::new(3998, 2));

        Ok(())
    }

    #[test]
    fn summary_discount_is_subtotal_minus_total() -> TestResult {
        let lines = [line("1", Decimal::new(2999, 2), 2)];
        let applied = AppliedCoupon::new(coupon(20)?, &lines);

        let summary = summarize(&lines, Some(&applied));

        assert_eq!(summary.subtotal, Decimal::new(5998, 2));
        assert_eq!(summary.discount, Decimal::new(5998, 3));
        assert_eq!(summary.total, Decimal::new(53_982, 3));

        Ok(())
    }

    #[test]
    fn display_rounds_half_away_from_zero() {
        assert_eq!(format_amount(Decimal::new(53_982, 3)), "53.98");
        assert_eq!(format_amount(Decimal::new(23_995, 3)), "24.00");
        assert_eq!(format_amount(Decimal::new(5, 0)), "5.00");
    }
}
