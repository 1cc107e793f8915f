//! Terminal tables for catalog, cart, coupon and dashboard output.

use std::io;

use rust_decimal::Decimal;
use storefront::{
    cart::CartLine,
    coupons::Coupon,
    metrics::StoreMetrics,
    pricing::{AppliedCoupon, format_amount, price_lines, round_for_display, summarize},
    products::{Category, Product, Variant},
};
use tabled::{
    Table,
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

/// Output errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("failed to write output")]
    Io(#[from] io::Error),
}

/// Write a product listing.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_products(
    out: &mut impl io::Write,
    products: &[&Product],
    currency: &str,
) -> Result<(), RenderError> {
    if products.is_empty() {
        writeln!(out, "no products found")?;
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Id", "Name", "Category", "Price", "Stock"]);

    for product in products {
        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            money(currency, product.price),
            stock_label(product),
        ]);
    }

    let mut table = styled(builder);
    table.modify(Columns::new(3..5), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

/// Write a single product's details.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_product(
    out: &mut impl io::Write,
    product: &Product,
    currency: &str,
) -> Result<(), RenderError> {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    builder.push_record(["Id".to_string(), product.id.to_string()]);
    builder.push_record(["Name".to_string(), product.name.clone()]);
    builder.push_record(["Category".to_string(), product.category.clone()]);
    builder.push_record(["Price".to_string(), money(currency, product.price)]);
    builder.push_record(["Stock".to_string(), stock_label(product)]);

    if let Some(colors) = &product.colors {
        builder.push_record(["Colors".to_string(), colors.join(", ")]);
    }

    if let Some(sizes) = &product.sizes {
        builder.push_record(["Sizes".to_string(), sizes.join(", ")]);
    }

    if let Some(description) = &product.description {
        builder.push_record(["Description".to_string(), description.clone()]);
    }

    if let Some(views) = product.views {
        builder.push_record(["Views".to_string(), views.to_string()]);
    }

    writeln!(out, "{}", styled(builder))?;

    Ok(())
}

/// Write the category list.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_categories(
    out: &mut impl io::Write,
    categories: &[Category],
) -> Result<(), RenderError> {
    if categories.is_empty() {
        writeln!(out, "no categories found")?;
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Id", "Name"]);

    for category in categories {
        builder.push_record([category.id.to_string(), category.name.clone()]);
    }

    writeln!(out, "{}", styled(builder))?;

    Ok(())
}

/// Write the cart with one row per charge and a price summary.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_cart(
    out: &mut impl io::Write,
    lines: &[CartLine],
    applied: Option<&AppliedCoupon>,
    currency: &str,
) -> Result<(), RenderError> {
    if lines.is_empty() {
        writeln!(out, "your cart is empty")?;
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Id", "Item", "Variant", "Qty", "Unit Price", "Amount"]);

    for priced in price_lines(lines, applied) {
        for charge in &priced.charges {
            let mut unit_price = money(currency, charge.unit_price);

            if let Some(applied) = applied.filter(|_| charge.discounted) {
                unit_price.push_str(&format!(" (-{})", applied.discount()));
            }

            builder.push_record([
                priced.line.product_id.to_string(),
                priced.line.name.clone(),
                variant_label(&priced.line.variant),
                charge.quantity.to_string(),
                unit_price,
                money(currency, charge.amount()),
            ]);
        }
    }

    let mut table = styled(builder);
    table.modify(Columns::new(3..6), Alignment::right());

    writeln!(out, "{table}")?;

    let summary = summarize(lines, applied);

    writeln!(out, " Subtotal: {}", money(currency, summary.subtotal))?;

    if let Some(applied) = applied {
        writeln!(
            out,
            " Coupon:   {} ({})",
            applied.coupon.code,
            applied.discount()
        )?;

        if applied.resolve(lines).is_none() {
            writeln!(out, "           choose a product to discount")?;
        }

        writeln!(out, " Discount: -{}", money(currency, summary.discount))?;
    }

    writeln!(out, " Total:    {}", money(currency, summary.total))?;

    Ok(())
}

/// Write the coupon list.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_coupons(out: &mut impl io::Write, coupons: &[Coupon]) -> Result<(), RenderError> {
    if coupons.is_empty() {
        writeln!(out, "no coupons found")?;
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Code", "Discount", "Status", "Created", "Used"]);

    for coupon in coupons {
        builder.push_record([
            coupon.code.to_string(),
            coupon.discount_percent.to_string(),
            if coupon.is_used { "used" } else { "active" }.to_string(),
            coupon
                .created_at
                .map_or_else(|| "-".to_string(), |at| at.to_string()),
            coupon
                .used_at
                .map_or_else(|| "-".to_string(), |at| at.to_string()),
        ]);
    }

    let mut table = styled(builder);
    table.modify(Columns::one(1), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

/// Write dashboard figures and the recent and low-stock product lists.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_dashboard(
    out: &mut impl io::Write,
    metrics: &StoreMetrics<'_>,
    currency: &str,
) -> Result<(), RenderError> {
    let mut figures = Builder::default();
    figures.push_record(["Products", "Categories", "Low Stock", "Views"]);
    figures.push_record([
        metrics.total_products.to_string(),
        metrics.total_categories.to_string(),
        metrics.low_stock_count.to_string(),
        metrics.total_views.to_string(),
    ]);

    writeln!(out, "{}", styled(figures))?;

    writeln!(out, "\nRecently added")?;
    write_products(out, &metrics.recent, currency)?;

    writeln!(out, "\nLow stock")?;
    write_products(out, &metrics.low_stock, currency)?;

    Ok(())
}

fn styled(builder: Builder) -> Table {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);

    table
}

fn money(currency: &str, amount: Decimal) -> String {
    format!("{currency}{}", format_amount(round_for_display(amount)))
}

fn stock_label(product: &Product) -> String {
    match product.stock {
        Some(stock) if product.is_low_stock() => format!("{stock} (low)"),
        Some(stock) => stock.to_string(),
        None => "-".to_string(),
    }
}

fn variant_label(variant: &Variant) -> String {
    let parts: Vec<&str> = [variant.color.as_deref(), variant.size.as_deref()]
        .into_iter()
        .flatten()
        .collect();

    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use storefront::{
        coupons::{CouponCode, DiscountPercent},
        fixtures,
    };
    use testresult::TestResult;

    use super::*;

    fn line(id: &str, name: &str, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            product_id: id.into(),
            name: name.to_string(),
            unit_price: price,
            quantity,
            variant: Variant::default(),
        }
    }

    #[test]
    fn cart_splits_the_discounted_unit_and_summarises() -> TestResult {
        let lines = [line("1", "Polo Logo Negro", Decimal::new(2999, 2), 2)];
        let applied = AppliedCoupon::new(
            Coupon::new(CouponCode::parse("PROMO20")?, DiscountPercent::new(20)?),
            &lines,
        );

        let mut out = Vec::new();
        write_cart(&mut out, &lines, Some(&applied), "S/")?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("S/23.99 (-20%)"), "{output}");
        assert!(output.contains("S/29.99"), "{output}");
        assert!(output.contains("Subtotal: S/59.98"), "{output}");
        assert!(output.contains("Discount: -S/6.00"), "{output}");
        assert!(output.contains("Total:    S/53.98"), "{output}");

        Ok(())
    }

    #[test]
    fn untargeted_coupon_asks_for_a_product() -> TestResult {
        let lines = [line("1", "Polo", Decimal::new(2999, 2), 1)];
        let applied = AppliedCoupon {
            coupon: Coupon::new(CouponCode::parse("PROMO20")?, DiscountPercent::new(20)?),
            target: None,
        };

        let mut out = Vec::new();
        write_cart(&mut out, &lines, Some(&applied), "S/")?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("choose a product to discount"), "{output}");
        assert!(output.contains("Total:    S/29.99"), "{output}");

        Ok(())
    }

    #[test]
    fn empty_cart_has_a_message() -> TestResult {
        let mut out = Vec::new();
        write_cart(&mut out, &[], None, "S/")?;

        assert_eq!(String::from_utf8(out)?, "your cart is empty\n");

        Ok(())
    }

    #[test]
    fn product_table_marks_low_stock() -> TestResult {
        let products = fixtures::catalog()?;
        let listed: Vec<&Product> = products.iter().collect();

        let mut out = Vec::new();
        write_products(&mut out, &listed, "S/")?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("(low)"), "{output}");
        assert!(output.contains("S/29.99"), "{output}");

        Ok(())
    }

    #[test]
    fn dashboard_lists_figures() -> TestResult {
        let products = fixtures::catalog()?;
        let metrics = StoreMetrics::compute(&products, &[]);

        let mut out = Vec::new();
        write_dashboard(&mut out, &metrics, "S/")?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Recently added"), "{output}");
        assert!(output.contains("Low stock"), "{output}");
        assert!(output.contains("15"), "{output}");

        Ok(())
    }
}
