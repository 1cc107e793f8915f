use std::io;

use clap::Args;
use storefront::products::{CatalogFilter, ProductId};
use storefront_app::{context::AppContext, render};
use tracing::warn;

#[derive(Debug, Args)]
pub(crate) struct ProductsArgs {
    /// Only list products in this category
    #[arg(long)]
    category: Option<String>,

    /// Only list products whose name contains this text
    #[arg(long)]
    search: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct ProductArgs {
    /// Product id
    id: String,
}

pub(crate) async fn list_products(context: &AppContext, args: ProductsArgs) -> Result<(), String> {
    let products = context
        .catalog
        .list_products()
        .await
        .map_err(|error| format!("failed to list products: {error}"))?;

    let filter = CatalogFilter {
        category: args.category,
        search: args.search,
    };

    render::write_products(
        &mut io::stdout().lock(),
        &filter.apply(&products),
        &context.store.currency_symbol,
    )
    .map_err(|error| error.to_string())
}

pub(crate) async fn show_product(context: &AppContext, args: ProductArgs) -> Result<(), String> {
    let id = ProductId::new(args.id);

    let mut product = context
        .catalog
        .get_product(&id)
        .await
        .map_err(|error| format!("failed to load product: {error}"))?;

    match context.catalog.record_view(&id).await {
        Ok(views) => product.views = Some(views),
        Err(error) => warn!(%error, "failed to record product view"),
    }

    render::write_product(
        &mut io::stdout().lock(),
        &product,
        &context.store.currency_symbol,
    )
    .map_err(|error| error.to_string())
}

pub(crate) async fn list_categories(context: &AppContext) -> Result<(), String> {
    let categories = context
        .catalog
        .list_categories()
        .await
        .map_err(|error| format!("failed to list categories: {error}"))?;

    render::write_categories(&mut io::stdout().lock(), &categories)
        .map_err(|error| error.to_string())
}
