//! Seeding a new store from a directory of images.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::db::{init_db, lock, now_timestamp, DbPool};
use crate::error::{EchelonError, Result};
use crate::models::Item;
use crate::repo::items;

/// File extensions accepted as images (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// What seeding produced.
#[derive(Debug)]
pub struct SeedSummary {
    /// Handle on the freshly created store.
    pub db: DbPool,
    /// Items created, in file name order.
    pub created: Vec<Item>,
    /// Files skipped because their extension is not supported or their
    /// name is not valid UTF-8.
    pub skipped: Vec<PathBuf>,
}

/// Check that `path` looks like an image we can rank.
///
/// # Errors
///
/// Returns [`EchelonError::UnsupportedAsset`] for any other extension.
pub fn check_asset(path: &Path) -> Result<()> {
    let supported = path
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);

    if supported {
        Ok(())
    } else {
        Err(EchelonError::UnsupportedAsset(path.to_path_buf()))
    }
}

/// Create the store at `db_path` and add one item per image in `image_dir`.
///
/// Each item is named after its file and located at the file's absolute
/// path. Unsupported files and files whose name is not UTF-8 are logged and
/// skipped; subdirectories are ignored. All items are inserted in one
/// transaction, and if that fails the new store file is removed again.
///
/// # Errors
///
/// - [`EchelonError::AlreadyInitialized`] if `db_path` already exists
/// - [`EchelonError::MissingDirectory`] if `image_dir` is not a directory
pub fn initialize(db_path: &Path, image_dir: &Path, initial_rating: f64) -> Result<SeedSummary> {
    info!(db = %db_path.display(), images = %image_dir.display(), "Initializing store");

    if db_path.exists() {
        return Err(EchelonError::AlreadyInitialized(db_path.to_path_buf()));
    }
    if !image_dir.is_dir() {
        return Err(EchelonError::MissingDirectory(image_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(image_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = init_db(db_path).map_err(|err| {
        let _ = std::fs::remove_file(db_path);
        err
    })?;

    let (created, skipped) = match populate(&db, files, initial_rating) {
        Ok(seeded) => seeded,
        Err(err) => {
            discard_partial_store(db, db_path);
            return Err(err);
        }
    };

    info!(
        created = created.len(),
        skipped = skipped.len(),
        "Store initialized"
    );
    Ok(SeedSummary {
        db,
        created,
        skipped,
    })
}

fn populate(
    db: &DbPool,
    files: Vec<PathBuf>,
    initial_rating: f64,
) -> Result<(Vec<Item>, Vec<PathBuf>)> {
    let mut created = Vec::new();
    let mut skipped = Vec::new();

    let mut conn = lock(db);
    let tx = conn.transaction()?;
    for path in files {
        if let Err(err) = check_asset(&path) {
            warn!("Skipping file: {}", err);
            skipped.push(path);
            continue;
        }
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            warn!("Skipping file with a non UTF-8 name: {}", path.display());
            skipped.push(path);
            continue;
        };
        let name = name.to_string();
        let location = std::fs::canonicalize(&path)?;
        let item = items::create_in(
            &tx,
            &name,
            &location.to_string_lossy(),
            initial_rating,
            &now_timestamp(),
        )?;
        created.push(item);
    }
    tx.commit()?;
    Ok((created, skipped))
}

/// Close and delete a store whose seeding failed, so a retry starts clean.
fn discard_partial_store(db: DbPool, db_path: &Path) {
    drop(db);
    if let Err(err) = std::fs::remove_file(db_path) {
        warn!(db = %db_path.display(), "Failed to remove partial store: {}", err);
    }
}
