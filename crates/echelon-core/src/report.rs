//! Ranking and detail reports.
//!
//! Both reports are pure projections of the item store and the ledger. Each
//! is built under a single lock so the rows reflect one point in time.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::db::{lock, DbPool};
use crate::error::Result;

/// Header of the ranking report.
pub const RANKING_HEADER: [&str; 5] = ["image", "rating", "matches", "wins", "losses"];

/// Header of the detail report.
pub const DETAIL_HEADER: [&str; 6] = [
    "match_number",
    "winner_name",
    "winner_rating",
    "loser_name",
    "loser_rating",
    "match_time",
];

/// One row of the ranking report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    /// Item name.
    pub name: String,
    /// Current rating.
    pub rating: f64,
    /// Comparisons played (wins + losses).
    pub total_matches: i64,
    /// Comparisons won.
    pub wins: i64,
    /// Comparisons lost.
    pub losses: i64,
}

/// One row of the detail report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    /// Ledger sequence id.
    pub match_id: i64,
    /// Name of the preferred item.
    pub winner_name: String,
    /// Winner rating right after this match.
    pub winner_rating_after: f64,
    /// Name of the other item.
    pub loser_name: String,
    /// Loser rating right after this match.
    pub loser_rating_after: f64,
    /// When the match was recorded.
    pub timestamp: String,
}

/// Builds reports from the store.
#[derive(Clone)]
pub struct ReportGenerator {
    db: DbPool,
}

impl ReportGenerator {
    /// Create a report generator on the given database.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Items ordered by rating, highest first. Ties keep creation order.
    pub fn ranking_report(&self) -> Result<Vec<RankingRow>> {
        let conn = lock(&self.db);
        let mut stmt = conn.prepare(
            "SELECT name, rating, wins + losses, wins, losses
             FROM items ORDER BY rating DESC, id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RankingRow {
                    name: row.get(0)?,
                    rating: row.get(1)?,
                    total_matches: row.get(2)?,
                    wins: row.get(3)?,
                    losses: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Ledger entries with item names, ordered by match id.
    pub fn detail_report(&self) -> Result<Vec<DetailRow>> {
        let conn = lock(&self.db);
        let mut stmt = conn.prepare(
            "SELECT m.match_id, w.name, m.winner_rating_after, l.name, m.loser_rating_after,
                    m.timestamp
             FROM matches m
             JOIN items w ON w.id = m.winner_id
             JOIN items l ON l.id = m.loser_id
             ORDER BY m.match_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DetailRow {
                    match_id: row.get(0)?,
                    winner_name: row.get(1)?,
                    winner_rating_after: row.get(2)?,
                    loser_name: row.get(3)?,
                    loser_rating_after: row.get(4)?,
                    timestamp: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// Shortest text that parses back to exactly `rating`.
fn format_rating(rating: f64) -> String {
    rating.to_string()
}

fn writer<W: Write>(out: W, delimiter: u8) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out)
}

/// Write the ranking report with a header row.
///
/// `delimiter` is `b','` for CSV downloads and `b'\t'` for TSV files.
pub fn write_ranking_csv<W: Write>(rows: &[RankingRow], out: W, delimiter: u8) -> Result<()> {
    let mut wtr = writer(out, delimiter);
    wtr.write_record(RANKING_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.name.clone(),
            format_rating(row.rating),
            row.total_matches.to_string(),
            row.wins.to_string(),
            row.losses.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the detail report with a header row.
pub fn write_detail_csv<W: Write>(rows: &[DetailRow], out: W, delimiter: u8) -> Result<()> {
    let mut wtr = writer(out, delimiter);
    wtr.write_record(DETAIL_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.match_id.to_string(),
            row.winner_name.clone(),
            format_rating(row.winner_rating_after),
            row.loser_name.clone(),
            format_rating(row.loser_rating_after),
            row.timestamp.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
