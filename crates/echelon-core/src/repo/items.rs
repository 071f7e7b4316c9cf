//! Item repository: item records and their rating aggregates.

use rusqlite::{Connection, OptionalExtension};

use crate::db::{lock, now_timestamp, DbPool};
use crate::elo::DEFAULT_RATING;
use crate::error::{EchelonError, ItemRef, Result};
use crate::models::Item;

/// Repository for item database operations.
#[derive(Clone)]
pub struct ItemRepo {
    db: DbPool,
    initial_rating: f64,
}

impl ItemRepo {
    /// Create a repository that gives new items the default rating of 1200.
    pub fn new(db: DbPool) -> Self {
        Self::with_initial_rating(db, DEFAULT_RATING)
    }

    /// Create a repository with a custom rating for new items.
    pub fn with_initial_rating(db: DbPool, initial_rating: f64) -> Self {
        Self { db, initial_rating }
    }

    /// Create a new item with zero wins and losses.
    ///
    /// # Errors
    ///
    /// Returns [`EchelonError::DuplicateName`] if the name is taken.
    pub fn create(&self, name: &str, location: &str) -> Result<Item> {
        let conn = lock(&self.db);
        create_in(&conn, name, location, self.initial_rating, &now_timestamp())
    }

    /// Get an item by id.
    ///
    /// # Errors
    ///
    /// Returns [`EchelonError::NotFound`] if no item has this id.
    pub fn get(&self, id: i64) -> Result<Item> {
        let conn = lock(&self.db);
        resolve_in(&conn, &ItemRef::Id(id))
    }

    /// Get an item by unique name.
    pub fn get_by_name(&self, name: &str) -> Result<Item> {
        let conn = lock(&self.db);
        resolve_in(&conn, &ItemRef::Name(name.to_string()))
    }

    /// Resolve a reference by id or by name.
    pub fn resolve(&self, item: &ItemRef) -> Result<Item> {
        let conn = lock(&self.db);
        resolve_in(&conn, item)
    }

    /// List every item in creation order.
    pub fn list(&self) -> Result<Vec<Item>> {
        let conn = lock(&self.db);
        list_in(&conn)
    }

    /// Number of items in the store.
    pub fn count(&self) -> Result<usize> {
        let conn = lock(&self.db);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Apply a decided comparison to both items in one transaction.
    ///
    /// Increments the winner's wins and the loser's losses, stores both new
    /// ratings and stamps both rows with `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`EchelonError::InvalidOutcome`] if the ids are equal and
    /// [`EchelonError::NotFound`] if either item is missing. Nothing is
    /// written in either case.
    pub fn apply_outcome(
        &self,
        winner_id: i64,
        loser_id: i64,
        winner_rating_after: f64,
        loser_rating_after: f64,
        timestamp: &str,
    ) -> Result<()> {
        let mut conn = lock(&self.db);
        let tx = conn.transaction()?;
        apply_outcome_in(
            &tx,
            winner_id,
            loser_id,
            winner_rating_after,
            loser_rating_after,
            timestamp,
        )?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn create_in(
    conn: &Connection,
    name: &str,
    location: &str,
    rating: f64,
    timestamp: &str,
) -> Result<Item> {
    let taken: Option<i64> = conn
        .query_row("SELECT id FROM items WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;
    if taken.is_some() {
        return Err(EchelonError::DuplicateName(name.to_string()));
    }

    conn.execute(
        "INSERT INTO items (name, location, rating, wins, losses, updated)
         VALUES (?1, ?2, ?3, 0, 0, ?4)",
        (name, location, rating, timestamp),
    )?;

    Ok(Item {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        location: location.to_string(),
        rating,
        wins: 0,
        losses: 0,
        updated: timestamp.to_string(),
    })
}

pub(crate) fn resolve_in(conn: &Connection, item: &ItemRef) -> Result<Item> {
    let found = match item {
        ItemRef::Id(id) => conn
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", Item::COLUMNS),
                [id],
                Item::map_row,
            )
            .optional()?,
        ItemRef::Name(name) => conn
            .query_row(
                &format!("SELECT {} FROM items WHERE name = ?1", Item::COLUMNS),
                [name],
                Item::map_row,
            )
            .optional()?,
    };
    found.ok_or_else(|| EchelonError::NotFound(item.clone()))
}

pub(crate) fn list_in(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM items ORDER BY id", Item::COLUMNS))?;
    let items = stmt
        .query_map([], Item::map_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

pub(crate) fn apply_outcome_in(
    conn: &Connection,
    winner_id: i64,
    loser_id: i64,
    winner_rating_after: f64,
    loser_rating_after: f64,
    timestamp: &str,
) -> Result<()> {
    if winner_id == loser_id {
        return Err(EchelonError::InvalidOutcome(format!(
            "item {} cannot beat itself",
            winner_id
        )));
    }

    let updated = conn.execute(
        "UPDATE items SET rating = ?1, wins = wins + 1, updated = ?2 WHERE id = ?3",
        (winner_rating_after, timestamp, winner_id),
    )?;
    if updated == 0 {
        return Err(EchelonError::NotFound(ItemRef::Id(winner_id)));
    }

    let updated = conn.execute(
        "UPDATE items SET rating = ?1, losses = losses + 1, updated = ?2 WHERE id = ?3",
        (loser_rating_after, timestamp, loser_id),
    )?;
    if updated == 0 {
        return Err(EchelonError::NotFound(ItemRef::Id(loser_id)));
    }

    Ok(())
}
