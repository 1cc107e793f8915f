use clap::{Parser, Subcommand};
use storefront_app::{
    config::{AppConfig, LoggingConfig},
    context::AppContext,
};

mod admin;
mod cart;
mod catalog;
mod checkout;
mod coupon;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List products
    Products(catalog::ProductsArgs),
    /// Show one product and count the view
    Product(catalog::ProductArgs),
    /// List categories
    Categories,
    /// Inspect or change the cart
    Cart(cart::CartCommand),
    /// Check coupon codes
    Coupon(coupon::CouponCommand),
    /// Send the order to the store
    Checkout(checkout::CheckoutArgs),
    /// Store owner operations
    Admin(admin::AdminCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.config.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let open_links = !matches!(&self.command, Commands::Checkout(args) if args.no_open);

        let mut context = AppContext::from_config(&self.config, open_links)
            .map_err(|error| format!("failed to start: {error}"))?;

        match self.command {
            Commands::Products(args) => catalog::list_products(&context, args).await,
            Commands::Product(args) => catalog::show_product(&context, args).await,
            Commands::Categories => catalog::list_categories(&context).await,
            Commands::Cart(command) => cart::run(&context, command).await,
            Commands::Coupon(command) => coupon::run(&context, command).await,
            Commands::Checkout(args) => {
                context.resolve_settings().await;
                checkout::run(&context, args).await
            }
            Commands::Admin(command) => admin::run(&context, command).await,
        }
    }
}
