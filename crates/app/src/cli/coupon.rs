use std::error::Error as _;

use clap::{Args, Subcommand};
use storefront_app::{context::AppContext, coupons::validate};

#[derive(Debug, Args)]
pub(crate) struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    /// Check whether a coupon code can be used
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Coupon code, any case
    code: String,
}

pub(crate) async fn run(context: &AppContext, command: CouponCommand) -> Result<(), String> {
    match command.command {
        CouponSubcommand::Check(args) => check(context, &args.code).await,
    }
}

async fn check(context: &AppContext, code: &str) -> Result<(), String> {
    let coupon = validate(context.coupons.as_ref(), code)
        .await
        .map_err(|error| match error.source() {
            Some(source) if !error.is_user_error() => format!("{error}: {source}"),
            _ => error.to_string(),
        })?;

    println!(
        "{}: {} off one unit of the chosen product",
        coupon.code, coupon.discount_percent
    );

    Ok(())
}
