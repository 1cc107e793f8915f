//! Store Metrics

use crate::products::{Category, Product, low_stock};

/// How many products the dashboard lists as recently added.
pub const RECENT_PRODUCTS: usize = 5;

/// Catalog and traffic figures shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreMetrics<'a> {
    /// Products in the catalog.
    pub total_products: usize,

    /// Categories in the catalog.
    pub total_categories: usize,

    /// Products whose stock is below the low-stock threshold.
    pub low_stock_count: usize,

    /// Sum of product view counters.
    pub total_views: u64,

    /// Most recently created products, newest first. Products without a
    /// creation time sort last.
    pub recent: Vec<&'a Product>,

    /// Low-stock products, lowest stock first.
    pub low_stock: Vec<&'a Product>,
}

impl<'a> StoreMetrics<'a> {
    /// Compute the dashboard figures from a catalog listing.
    pub fn compute(products: &'a [Product], categories: &[Category]) -> Self {
        let low_stock = low_stock(products);

        let mut recent: Vec<&Product> = products.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_PRODUCTS);

        Self {
            total_products: products.len(),
            total_categories: categories.len(),
            low_stock_count: low_stock.len(),
            total_views: products
                .iter()
                .filter_map(|product| product.views)
                .fold(0, u64::saturating_add),
            recent,
            low_stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{fixtures, products::CategoryId};

    use super::*;

    #[test]
    fn fixture_catalog_figures() -> TestResult {
        let products = fixtures::catalog()?;
        let categories = vec![Category {
            id: CategoryId::new("1"),
            name: "polos".to_string(),
        }];

        let metrics = StoreMetrics::compute(&products, &categories);

        assert_eq!(metrics.total_products, 4);
        assert_eq!(metrics.total_categories, 1);
        assert_eq!(metrics.low_stock_count, 2);
        assert_eq!(metrics.total_views, 15);

        let low: Vec<&str> = metrics.low_stock.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(low, vec!["2", "3"]);

        Ok(())
    }

    #[test]
    fn recent_is_newest_first_and_capped() -> TestResult {
        let mut products = Vec::new();

        for day in 1..=7_i64 {
            let mut product = fixtures::priced(&day.to_string(), "Tee", Decimal::ONE);
            product.created_at = Some(Timestamp::from_second(day * 86_400)?);
            products.push(product);
        }

        products.push(fixtures::priced("undated", "Tee", Decimal::ONE));

        let metrics = StoreMetrics::compute(&products, &[]);
        let recent: Vec<&str> = metrics.recent.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(recent, vec!["7", "6", "5", "4", "3"]);

        Ok(())
    }
}
