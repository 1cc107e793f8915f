//! Products

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::TypedId;

/// Stock level below which a product is reported as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Upper bound on a single selection when the product carries no stock figure.
pub const MAX_SELECTION_QUANTITY: u32 = 999;

/// Product Id
pub type ProductId = TypedId<Product>;

/// Category Id
pub type CategoryId = TypedId<Category>;

/// A catalog product, as owned by the remote record store.
///
/// Optional attributes are modelled as absent rather than empty: a product
/// without colour options has `colors == None`, never `Some(vec![])`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ProductRecord")]
pub struct Product {
    /// Stable identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Unit price, non-negative.
    pub price: Decimal,

    /// Category tag.
    pub category: String,

    /// Long-form description.
    pub description: Option<String>,

    /// Image URLs, first one is the cover.
    pub images: Vec<String>,

    /// Colour variants, in display order.
    pub colors: Option<Vec<String>>,

    /// Size variants, in display order.
    pub sizes: Option<Vec<String>>,

    /// Informational stock level. Never decremented by the storefront.
    pub stock: Option<u32>,

    /// Detail page view counter.
    pub views: Option<u64>,

    /// When the product was created in the record store.
    pub created_at: Option<Timestamp>,
}

impl Product {
    /// Whether the product's stock is known and below [`LOW_STOCK_THRESHOLD`].
    pub fn is_low_stock(&self) -> bool {
        self.stock.is_some_and(|stock| stock < LOW_STOCK_THRESHOLD)
    }

    /// Largest quantity that can be selected in a single add.
    pub fn max_selectable(&self) -> u32 {
        self.stock.unwrap_or(MAX_SELECTION_QUANTITY)
    }

    /// The variant pre-selected on the product detail view: the first
    /// colour and first size, when offered.
    pub fn default_variant(&self) -> Variant {
        Variant {
            color: self.colors.as_ref().and_then(|colors| colors.first().cloned()),
            size: self.sizes.as_ref().and_then(|sizes| sizes.first().cloned()),
        }
    }
}

/// Wire shape of a product row. Older rows carry a single `image`, newer
/// ones an `images` array; both land in [`Product::images`].
#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: ProductId,
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    colors: Option<Vec<String>>,
    #[serde(default)]
    sizes: Option<Vec<String>>,
    #[serde(default)]
    stock: Option<u32>,
    #[serde(default)]
    views: Option<u64>,
    #[serde(default)]
    created_at: Option<Timestamp>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = String;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        if record.price.is_sign_negative() {
            return Err(format!(
                "product {} has a negative price {}",
                record.id, record.price
            ));
        }

        let mut images: Vec<String> = record
            .images
            .unwrap_or_default()
            .into_iter()
            .filter(|url| !url.trim().is_empty())
            .collect();

        if images.is_empty() {
            images.extend(record.image.filter(|url| !url.trim().is_empty()));
        }

        Ok(Self {
            id: record.id,
            name: record.name,
            price: record.price,
            category: record.category.unwrap_or_default(),
            description: record.description.filter(|text| !text.trim().is_empty()),
            images,
            colors: non_empty(record.colors),
            sizes: non_empty(record.sizes),
            stock: record.stock,
            views: record.views,
            created_at: record.created_at,
        })
    }
}

fn non_empty(options: Option<Vec<String>>) -> Option<Vec<String>> {
    options.filter(|values| !values.is_empty())
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    /// Stable identifier.
    pub id: CategoryId,

    /// Category name, matched case-insensitively against [`Product::category`].
    pub name: String,
}

/// Catalog listing filter: an optional category and a free-text search on
/// the product name. Both comparisons ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Restrict to this category; `None` lists every category.
    pub category: Option<String>,

    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl CatalogFilter {
    /// Whether `product` passes the filter.
    pub fn matches(&self, product: &Product) -> bool {
        let category_matches = self
            .category
            .as_deref()
            .is_none_or(|category| product.category.to_lowercase() == category.to_lowercase());

        let search_matches = self
            .search
            .as_deref()
            .map(str::trim)
            .is_none_or(|search| {
                product
                    .name
                    .to_lowercase()
                    .contains(&search.to_lowercase())
            });

        category_matches && search_matches
    }

    /// Filter a product listing, preserving order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products
            .iter()
            .filter(|product| self.matches(product))
            .collect()
    }
}

/// Products with low stock, lowest first.
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    let mut low: Vec<&Product> = products
        .iter()
        .filter(|product| product.is_low_stock())
        .collect();

    low.sort_by_key(|product| product.stock);

    low
}

/// Colour/size choice for a cart line. Free-form and display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Selected colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Selected size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl Variant {
    /// Whether neither colour nor size is set.
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.size.is_none()
    }
}

/// Errors raised while validating a product selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// A selection must be for at least one unit.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The requested quantity is above the product's stock figure.
    #[error("requested {requested} but only {available} available")]
    ExceedsStock {
        /// Quantity asked for.
        requested: u32,
        /// Quantity the product allows.
        available: u32,
    },

    /// The colour is not one the product offers.
    #[error("colour {0:?} is not offered for this product")]
    UnknownColor(String),

    /// The size is not one the product offers.
    #[error("size {0:?} is not offered for this product")]
    UnknownSize(String),
}

/// A validated "add to cart" choice from the product detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Units to add, at least one.
    pub quantity: u32,

    /// Chosen variant.
    pub variant: Variant,
}

impl Selection {
    /// Validate a quantity and optional colour/size against `product`.
    ///
    /// Missing choices fall back to the product's default variant.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] when the quantity is zero or above the
    /// product's stock, or a variant is not one the product offers.
    pub fn for_product(
        product: &Product,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Result<Self, SelectionError> {
        if quantity == 0 {
            return Err(SelectionError::ZeroQuantity);
        }

        let available = product.max_selectable();

        if quantity > available {
            return Err(SelectionError::ExceedsStock {
                requested: quantity,
                available,
            });
        }

        let defaults = product.default_variant();

        let color = match color {
            Some(color) if !offers(product.colors.as_deref(), &color) => {
                return Err(SelectionError::UnknownColor(color));
            }
            Some(color) => Some(color),
            None => defaults.color,
        };

        let size = match size {
            Some(size) if !offers(product.sizes.as_deref(), &size) => {
                return Err(SelectionError::UnknownSize(size));
            }
            Some(size) => Some(size),
            None => defaults.size,
        };

        Ok(Self {
            quantity,
            variant: Variant { color, size },
        })
    }
}

fn offers(options: Option<&[String]>, choice: &str) -> bool {
    options.is_some_and(|options| options.iter().any(|option| option == choice))
}
