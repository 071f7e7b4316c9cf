//! Record types for items and matches.

use serde::{Deserialize, Serialize};

/// An image being ranked, with its rating aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable id assigned at creation.
    pub id: i64,
    /// Unique name (the image file name).
    pub name: String,
    /// Opaque reference to the underlying asset (absolute path or URI).
    pub location: String,
    /// Current rating.
    pub rating: f64,
    /// Comparisons won.
    pub wins: i64,
    /// Comparisons lost.
    pub losses: i64,
    /// Time of the last rating change (or of creation).
    pub updated: String,
}

impl Item {
    /// Total comparisons this item took part in.
    pub fn matches(&self) -> i64 {
        self.wins + self.losses
    }

    /// Column list matching [`Item::map_row`].
    pub(crate) const COLUMNS: &'static str = "id, name, location, rating, wins, losses, updated";

    pub(crate) fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            location: row.get(2)?,
            rating: row.get(3)?,
            wins: row.get(4)?,
            losses: row.get(5)?,
            updated: row.get(6)?,
        })
    }
}

/// Public view of an item handed out for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    /// Item id.
    pub id: i64,
    /// Item name.
    pub name: String,
    /// Asset location.
    pub location: String,
    /// Current rating.
    pub rating: f64,
    /// Time of the last rating change.
    pub updated: String,
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            location: item.location,
            rating: item.rating,
            updated: item.updated,
        }
    }
}

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Sequence id, strictly increasing in insertion order.
    pub match_id: i64,
    /// Item that was preferred.
    pub winner_id: i64,
    /// Item that was not preferred.
    pub loser_id: i64,
    /// Winner rating before the match.
    pub winner_rating_before: f64,
    /// Winner rating after the match.
    pub winner_rating_after: f64,
    /// Loser rating before the match.
    pub loser_rating_before: f64,
    /// Loser rating after the match.
    pub loser_rating_after: f64,
    /// When the outcome was recorded.
    pub timestamp: String,
}

impl Match {
    /// Column list matching [`Match::map_row`].
    pub(crate) const COLUMNS: &'static str = "match_id, winner_id, loser_id, \
         winner_rating_before, winner_rating_after, loser_rating_before, loser_rating_after, \
         timestamp";

    pub(crate) fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            match_id: row.get(0)?,
            winner_id: row.get(1)?,
            loser_id: row.get(2)?,
            winner_rating_before: row.get(3)?,
            winner_rating_after: row.get(4)?,
            loser_rating_before: row.get(5)?,
            loser_rating_after: row.get(6)?,
            timestamp: row.get(7)?,
        })
    }
}

/// One side of a recorded outcome, after the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSide {
    /// Item id.
    pub id: i64,
    /// Item name.
    pub name: String,
    /// Rating before the match.
    pub rating_before: f64,
    /// Rating after the match.
    pub rating: f64,
    /// Wins after the match.
    pub wins: i64,
    /// Losses after the match.
    pub losses: i64,
    /// Update timestamp.
    pub updated: String,
}

/// Result of recording one decided comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    /// Ledger id of the new match record.
    pub match_id: i64,
    /// K-factor that was applied.
    pub k: f64,
    /// Winner after the update.
    pub winner: OutcomeSide,
    /// Loser after the update.
    pub loser: OutcomeSide,
}
