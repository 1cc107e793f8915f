//! Storefront
//!
//! Cart pricing, coupon and reward engine for a small storefront that places
//! orders by handing a pre-formatted message to an external messaging channel.

pub mod cart;
pub mod codes;
pub mod coupons;
pub mod fixtures;
pub mod ids;
pub mod metrics;
pub mod order;
pub mod pricing;
pub mod products;
