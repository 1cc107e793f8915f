use clap::Args;
use storefront::products::ProductId;
use storefront_app::context::AppContext;

use super::cart;

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Coupon code to apply to this order
    #[arg(long, conflicts_with = "welcome")]
    coupon: Option<String>,

    /// Product that receives the coupon discount; defaults to the first line
    #[arg(long)]
    target: Option<String>,

    /// Apply this session's welcome code
    #[arg(long)]
    welcome: bool,

    /// Print the order link instead of opening it
    #[arg(long)]
    pub(crate) no_open: bool,
}

pub(crate) async fn run(context: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    let mut session = context
        .open_session()
        .map_err(|error| format!("failed to open cart: {error}"))?;

    let code = if args.welcome {
        Some(session.welcome_code().code().to_string())
    } else {
        args.coupon
    };

    if let Some(code) = code {
        session
            .apply_coupon(&code, context.coupons.as_ref())
            .await
            .map_err(|error| error.to_string())?;
    }

    if let Some(target) = args.target {
        session
            .select_target(&ProductId::new(target))
            .map_err(|error| error.to_string())?;
    }

    cart::show(context, &session)?;

    let mut orchestrator = context.orchestrator();

    let receipt = orchestrator
        .checkout(&mut session)
        .await
        .map_err(|error| error.to_string())?;

    // The process exits next; let the coupon redemption land first.
    orchestrator.flush().await;

    println!();
    println!("{}", receipt.message);
    println!();

    if receipt.launched && !args.no_open {
        println!("opened {}", receipt.link);
    } else {
        println!("send your order: {}", receipt.link);
    }

    if let Some(reward) = receipt.reward {
        println!("reward coupon for your next order: {}", reward.code);
    }

    Ok(())
}
