//! Storefront application: remote services, the shopping session, checkout
//! and admin operations.

pub mod admin;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod context;
pub mod coupons;
pub mod launcher;
pub mod observability;
pub mod records;
pub mod render;
pub mod session;
