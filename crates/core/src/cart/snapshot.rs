//! Cart snapshot persistence.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartLine;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Errors raised while reading or writing a cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored snapshot could not be parsed.
    #[error("stored cart snapshot is corrupt")]
    Corrupt(#[source] serde_json::Error),

    /// The stored snapshot was written by an unknown format version.
    #[error("stored cart snapshot has unsupported version {0}")]
    UnsupportedVersion(u8),

    /// The snapshot could not be encoded.
    #[error("failed to encode cart snapshot")]
    Encode(#[source] serde_json::Error),

    /// The backing storage failed.
    #[error("cart snapshot storage error")]
    Io(#[from] io::Error),
}

impl SnapshotError {
    /// Whether the error means the stored data itself is unusable, as
    /// opposed to the storage being unreachable.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_) | Self::UnsupportedVersion(_))
    }
}

/// Serialized copy of the cart lines, persisted for session continuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Format version.
    pub version: u8,

    /// Cart lines in insertion order.
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Snapshot the given lines at the current format version.
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            lines,
        }
    }

    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    /// Decode from JSON, checking the format version.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Corrupt`] for malformed data and
    /// [`SnapshotError::UnsupportedVersion`] for unknown versions.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw).map_err(SnapshotError::Corrupt)?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }

        Ok(snapshot)
    }

    /// The lines with the ledger's invariants re-established: zero-quantity
    /// lines dropped and repeated products merged into their first line.
    pub fn into_lines(self) -> Vec<CartLine> {
        let mut lines: Vec<CartLine> = Vec::with_capacity(self.lines.len());

        for line in self.lines.into_iter().filter(|line| line.quantity > 0) {
            match lines
                .iter_mut()
                .find(|existing| existing.product_id == line.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }

        lines
    }
}

/// Durable local storage for the cart snapshot.
pub trait SnapshotStore {
    /// Read the stored snapshot, `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage fails or the data is corrupt.
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding or writing fails.
    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), SnapshotError>;

    /// Remove the stored snapshot. Removing a missing snapshot succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the storage fails.
    fn delete(&mut self) -> Result<(), SnapshotError>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        (**self).load()
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        (**self).save(snapshot)
    }

    fn delete(&mut self) -> Result<(), SnapshotError> {
        (**self).delete()
    }
}

/// Snapshot store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Store the snapshot at `path`. Parent directories are created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => CartSnapshot::from_json(&raw).map(Some),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target then rename, so readers never see a torn file.
        let staging = self.path.with_extension("json.tmp");

        fs::write(&staging, snapshot.to_json()?)?;
        fs::rename(&staging, &self.path)?;

        Ok(())
    }

    fn delete(&mut self) -> Result<(), SnapshotError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// In-process snapshot store holding the raw encoded snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    raw: Option<String>,
}

impl MemorySnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with raw (possibly malformed) snapshot data.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    /// The raw stored data, if any.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        self.raw.as_deref().map(CartSnapshot::from_json).transpose()
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        self.raw = Some(snapshot.to_json()?);

        Ok(())
    }

    fn delete(&mut self) -> Result<(), SnapshotError> {
        self.raw = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::products::{ProductId, Variant};

    use super::*;

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Decimal::new(1999, 2),
            quantity,
            variant: Variant::default(),
        }
    }

    #[test]
    fn prices_round_trip_at_full_precision() -> TestResult {
        let mut precise = line("1", 1);
        precise.unit_price = Decimal::new(23_992, 3);

        let snapshot = CartSnapshot::new(vec![precise.clone()]);
        let decoded = CartSnapshot::from_json(&snapshot.to_json()?)?;

        assert_eq!(decoded.lines, vec![precise]);

        Ok(())
    }

    #[test]
    fn malformed_json_is_corrupt() {
        let result = CartSnapshot::from_json("{\"version\": 1, \"lines\": [{]}");

        assert!(
            matches!(result, Err(SnapshotError::Corrupt(_))),
            "expected Corrupt, got {result:?}"
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result = CartSnapshot::from_json("{\"version\": 9, \"lines\": []}");

        assert!(
            matches!(result, Err(SnapshotError::UnsupportedVersion(9))),
            "expected UnsupportedVersion, got {result:?}"
        );
    }

    #[test]
    fn into_lines_drops_zero_quantities_and_merges_duplicates() {
        let snapshot = CartSnapshot::new(vec![line("1", 2), line("2", 0), line("1", 3)]);

        let lines = snapshot.into_lines();

        assert_eq!(lines, vec![line("1", 5)]);
    }

    #[test]
    fn file_store_saves_loads_and_deletes() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileSnapshotStore::new(dir.path().join("nested/cart.json"));

        assert_eq!(store.load()?, None);

        let snapshot = CartSnapshot::new(vec![line("1", 2)]);
        store.save(&snapshot)?;

        assert_eq!(store.load()?, Some(snapshot));

        store.delete()?;

        assert!(!store.path().exists());
        assert_eq!(store.load()?, None);

        store.delete()?;

        Ok(())
    }
}
