use std::io;

use clap::{Args, Subcommand};
use storefront_app::{context::AppContext, render};

#[derive(Debug, Args)]
pub(crate) struct AdminCommand {
    /// Admin secret
    #[arg(long, env = "STORE_ADMIN_SECRET_INPUT", hide_env_values = true)]
    secret: String,

    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Debug, Subcommand)]
enum AdminSubcommand {
    /// Manage coupons
    Coupon(CouponAdminCommand),
    /// Show catalog metrics
    Dashboard,
}

#[derive(Debug, Args)]
struct CouponAdminCommand {
    #[command(subcommand)]
    command: CouponAdminSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponAdminSubcommand {
    /// Issue a new WELCOME- coupon
    Create(CreateCouponArgs),
    /// List every coupon
    List,
    /// Delete a coupon
    Delete(DeleteCouponArgs),
}

#[derive(Debug, Args)]
struct CreateCouponArgs {
    /// Discount percentage, 1 to 100
    #[arg(long, allow_negative_numbers = true)]
    discount: i64,
}

#[derive(Debug, Args)]
struct DeleteCouponArgs {
    /// Coupon code
    code: String,
}

pub(crate) async fn run(context: &AppContext, command: AdminCommand) -> Result<(), String> {
    context
        .admin
        .verify(&command.secret)
        .map_err(|error| error.to_string())?;

    let admin = context.admin_service();

    match command.command {
        AdminSubcommand::Coupon(CouponAdminCommand {
            command: CouponAdminSubcommand::Create(args),
        }) => {
            let coupon = admin
                .issue_coupon(args.discount)
                .await
                .map_err(|error| format!("failed to create coupon: {error}"))?;

            println!("code: {}", coupon.code);
            println!("discount: {}", coupon.discount_percent);

            Ok(())
        }
        AdminSubcommand::Coupon(CouponAdminCommand {
            command: CouponAdminSubcommand::List,
        }) => {
            let coupons = admin
                .list_coupons()
                .await
                .map_err(|error| format!("failed to list coupons: {error}"))?;

            render::write_coupons(&mut io::stdout().lock(), &coupons)
                .map_err(|error| error.to_string())
        }
        AdminSubcommand::Coupon(CouponAdminCommand {
            command: CouponAdminSubcommand::Delete(args),
        }) => {
            let code = admin
                .revoke_coupon(&args.code)
                .await
                .map_err(|error| format!("failed to delete coupon: {error}"))?;

            println!("deleted {code}");

            Ok(())
        }
        AdminSubcommand::Dashboard => {
            let dashboard = admin
                .dashboard()
                .await
                .map_err(|error| format!("failed to load dashboard: {error}"))?;

            render::write_dashboard(
                &mut io::stdout().lock(),
                &dashboard.metrics(),
                &context.store.currency_symbol,
            )
            .map_err(|error| error.to_string())
        }
    }
}
