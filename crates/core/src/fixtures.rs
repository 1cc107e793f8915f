//! Catalog Fixtures

use rust_decimal::Decimal;
use thiserror::Error;

use crate::products::{Product, ProductId};

/// A small catalog in the record store's wire format.
pub const CATALOG_JSON: &str = r#"[
    {
        "id": 1,
        "name": "Polo Logo Negro",
        "price": 29.99,
        "category": "polos",
        "image": "https://images.example.com/polo-negro.jpg",
        "colors": ["Negro", "Blanco"],
        "sizes": ["S", "M", "L"],
        "stock": 25
    },
    {
        "id": 2,
        "name": "Gorra Snapback",
        "price": 19.99,
        "category": "gorras",
        "images": ["https://images.example.com/gorra.jpg"],
        "stock": 4
    },
    {
        "id": 3,
        "name": "Hoodie Premium",
        "price": 49.99,
        "category": "hoodies",
        "sizes": ["M", "L", "XL"],
        "stock": 8,
        "views": 12
    },
    {
        "id": 4,
        "name": "Mochila Canvas",
        "price": 39.99,
        "category": "accesorios",
        "views": 3
    }
]"#;

/// Fixture loading errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture JSON did not parse.
    #[error("invalid fixture json")]
    Json(#[from] serde_json::Error),

    /// No fixture product has the requested id.
    #[error("no fixture product with id {0}")]
    UnknownProduct(String),
}

/// Parse [`CATALOG_JSON`].
///
/// # Errors
///
/// Returns [`FixtureError::Json`] if the fixture is malformed.
pub fn catalog() -> Result<Vec<Product>, FixtureError> {
    Ok(serde_json::from_str(CATALOG_JSON)?)
}

/// Look up a single fixture product.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownProduct`] when `id` is not in the catalog.
pub fn product(id: &str) -> Result<Product, FixtureError> {
    catalog()?
        .into_iter()
        .find(|product| product.id.as_str() == id)
        .ok_or_else(|| FixtureError::UnknownProduct(id.to_string()))
}

/// A bare product with just a name and price.
pub fn priced(id: &str, name: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price,
        category: String::new(),
        description: None,
        images: Vec::new(),
        colors: None,
        sizes: None,
        stock: None,
        views: None,
        created_at: None,
    }
}
