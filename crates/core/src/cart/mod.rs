//! Cart
//!
//! The cart ledger owns the line items of a session. Lines are keyed by
//! product: adding a product that is already in the cart increments the
//! existing line. Every mutation is written through to a [`SnapshotStore`];
//! an empty cart deletes its snapshot instead of storing an empty one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::{Product, ProductId, Variant};

pub mod snapshot;

pub use snapshot::{
    CartSnapshot, FileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore,
};

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line is for. Unique within a cart.
    pub product_id: ProductId,

    /// Product name at the time it was added.
    pub name: String,

    /// Product price at the time it was added. Never refreshed.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,

    /// Units in the cart, always positive.
    pub quantity: u32,

    /// Variant chosen on the first add. Display only.
    #[serde(default)]
    pub variant: Variant,
}

impl CartLine {
    /// Full-price total of the line.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The session's cart.
#[derive(Debug)]
pub struct CartLedger<S> {
    lines: Vec<CartLine>,
    store: S,
}

impl<S: SnapshotStore> CartLedger<S> {
    /// An empty ledger writing through to `store`. Nothing is read from the
    /// store until [`CartLedger::restore_persisted`] is called.
    pub fn new(store: S) -> Self {
        Self {
            lines: Vec::new(),
            store,
        }
    }

    /// Load the persisted snapshot, replacing the current lines. Returns the
    /// number of lines restored. A snapshot that restores no lines is removed.
    ///
    /// # Errors
    ///
    /// When the stored snapshot is corrupt the ledger is left empty, the bad
    /// snapshot is removed, and the corruption error is returned so the
    /// caller can report it. Storage failures are returned as-is.
    pub fn restore_persisted(&mut self) -> Result<usize, SnapshotError> {
        match self.store.load() {
            Ok(Some(snapshot)) => {
                self.lines = snapshot.into_lines();

                if self.lines.is_empty() {
                    self.store.delete()?;
                }

                Ok(self.lines.len())
            }
            Ok(None) => {
                self.lines.clear();

                Ok(0)
            }
            Err(error) if error.is_corrupt() => {
                self.lines.clear();
                self.store.delete()?;

                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    /// Whether a line for `product_id` exists.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    pub fn total_item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// The backing snapshot store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Add `quantity` units of `product`. An existing line for the product is
    /// incremented and keeps its original price and variant; otherwise a new
    /// line snapshots the product's current name and price. Adding zero units
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails. The in-memory change is kept.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: u32,
        variant: Variant,
    ) -> Result<(), SnapshotError> {
        if quantity == 0 {
            return Ok(());
        }

        match self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
                variant,
            }),
        }

        self.persist()
    }

    /// Add `delta` (which may be negative) to a line's quantity. A resulting
    /// quantity of zero or less removes the line. Unknown products and a zero
    /// delta leave the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails. The in-memory change is kept.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<(), SnapshotError> {
        if delta == 0 {
            return Ok(());
        }

        let Some(index) = self
            .lines
            .iter()
            .position(|line| &line.product_id == product_id)
        else {
            return Ok(());
        };

        let Some(line) = self.lines.get_mut(index) else {
            return Ok(());
        };

        let updated = i64::from(line.quantity).saturating_add(delta);

        if updated <= 0 {
            self.lines.remove(index);
        } else {
            line.quantity = u32::try_from(updated).unwrap_or(u32::MAX);
        }

        self.persist()
    }

    /// Remove the line for `product_id` regardless of its quantity. Removing
    /// a product that is not in the cart does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails. The in-memory change is kept.
    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<(), SnapshotError> {
        let before = self.lines.len();

        self.lines.retain(|line| &line.product_id != product_id);

        if self.lines.len() == before {
            return Ok(());
        }

        self.persist()
    }

    /// Empty the cart and delete its snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    pub fn clear(&mut self) -> Result<(), SnapshotError> {
        self.lines.clear();

        self.persist()
    }

    /// Copy of the current lines for persistence.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::new(self.lines.clone())
    }

    /// Replace every line with the snapshot's lines. Nothing is merged with
    /// the current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot write fails. The in-memory change is kept.
    pub fn restore(&mut self, snapshot: CartSnapshot) -> Result<(), SnapshotError> {
        self.lines = snapshot.into_lines();

        self.persist()
    }

    fn persist(&mut self) -> Result<(), SnapshotError> {
        if self.lines.is_empty() {
            self.store.delete()
        } else {
            let snapshot = self.snapshot();

            self.store.save(&snapshot)
        }
    }
}
