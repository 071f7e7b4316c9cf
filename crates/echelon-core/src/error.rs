//! Error taxonomy for the ranking core.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Reference to an item, either by numeric id or by its unique name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRef {
    /// Stable numeric id assigned at creation.
    Id(i64),
    /// Unique human-readable name (the image file name).
    Name(String),
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Id(id) => write!(f, "id {}", id),
            ItemRef::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

/// Errors surfaced by the item store, ledger, selector and seeding.
#[derive(Error, Debug)]
pub enum EchelonError {
    /// No item matches the given reference.
    #[error("Item not found: {0}")]
    NotFound(ItemRef),
    /// An item with this name already exists.
    #[error("Duplicate item name: {0}")]
    DuplicateName(String),
    /// Fewer than two items exist, so no pair can be drawn.
    #[error("Need at least two items to select a pair, found {available}")]
    InsufficientItems {
        /// Number of items currently in the store.
        available: usize,
    },
    /// The outcome cannot be applied (e.g. winner and loser are the same item).
    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),
    /// The persistent store failed or could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),
    /// The store file already exists and initialization would clobber it.
    #[error("Store already exists at {}", .0.display())]
    AlreadyInitialized(PathBuf),
    /// The image directory to seed from does not exist.
    #[error("Image directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    /// A file without a supported image extension was found while seeding.
    #[error("Unsupported asset: {}", .0.display())]
    UnsupportedAsset(PathBuf),
    /// Filesystem error while seeding or writing reports.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV serialization failed.
    #[error("Report error: {0}")]
    Report(#[from] csv::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EchelonError>;
