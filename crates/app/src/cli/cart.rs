use std::io;

use clap::{Args, Subcommand};
use storefront::{
    cart::FileSnapshotStore,
    products::{ProductId, Selection},
};
use storefront_app::{context::AppContext, render, session::Session};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart and its total
    Show,
    /// Add a product to the cart
    Add(AddArgs),
    /// Change a line's quantity by a signed amount
    Update(UpdateArgs),
    /// Remove a line from the cart
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    id: String,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Colour variant
    #[arg(long)]
    color: Option<String>,

    /// Size variant
    #[arg(long)]
    size: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Product id
    id: String,

    /// Units to add, or remove when negative
    #[arg(allow_negative_numbers = true)]
    delta: i64,
}

#[derive(Debug, Args)]
struct RemoveArgs {
    /// Product id
    id: String,
}

pub(crate) async fn run(context: &AppContext, command: CartCommand) -> Result<(), String> {
    let mut session = context
        .open_session()
        .map_err(|error| format!("failed to open cart: {error}"))?;

    match command.command {
        CartSubcommand::Show => {}
        CartSubcommand::Add(args) => add(context, &mut session, args).await?,
        CartSubcommand::Update(args) => session
            .update_quantity(&ProductId::new(args.id), args.delta)
            .map_err(|error| format!("failed to update cart: {error}"))?,
        CartSubcommand::Remove(args) => session
            .remove_item(&ProductId::new(args.id))
            .map_err(|error| format!("failed to update cart: {error}"))?,
    }

    show(context, &session)
}

async fn add(
    context: &AppContext,
    session: &mut Session<FileSnapshotStore>,
    args: AddArgs,
) -> Result<(), String> {
    let product = context
        .catalog
        .get_product(&ProductId::new(args.id))
        .await
        .map_err(|error| format!("failed to load product: {error}"))?;

    let selection = Selection::for_product(&product, args.quantity, args.color, args.size)
        .map_err(|error| error.to_string())?;

    session
        .add_item(&product, selection)
        .map_err(|error| format!("failed to update cart: {error}"))
}

pub(crate) fn show(
    context: &AppContext,
    session: &Session<FileSnapshotStore>,
) -> Result<(), String> {
    render::write_cart(
        &mut io::stdout().lock(),
        session.lines(),
        session.applied_coupon(),
        &context.store.currency_symbol,
    )
    .map_err(|error| error.to_string())
}
