//! Match ledger: append-only record of resolved comparisons.
//!
//! There is no update or delete. The schema backs this up with triggers, so
//! even a raw statement against the table cannot rewrite history.

use rusqlite::{Connection, OptionalExtension};

use crate::db::{lock, DbPool};
use crate::error::{EchelonError, ItemRef, Result};
use crate::models::Match;

/// A match about to be appended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewMatch<'a> {
    /// Item that was preferred.
    pub winner_id: i64,
    /// Item that was not preferred.
    pub loser_id: i64,
    /// Winner rating before the match.
    pub winner_before: f64,
    /// Winner rating after the match.
    pub winner_after: f64,
    /// Loser rating before the match.
    pub loser_before: f64,
    /// Loser rating after the match.
    pub loser_after: f64,
    /// When the outcome was decided.
    pub timestamp: &'a str,
}

/// Repository for the match ledger.
#[derive(Clone)]
pub struct MatchRepo {
    db: DbPool,
}

impl MatchRepo {
    /// Create a new ledger handle on the given database.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Append a record and return its sequence id.
    ///
    /// Both items must exist and differ; the store rejects anything else.
    pub fn record(&self, new: &NewMatch<'_>) -> Result<i64> {
        let conn = lock(&self.db);
        record_in(&conn, new)
    }

    /// Get a match by sequence id.
    ///
    /// Returns `None` if the match doesn't exist.
    pub fn get(&self, match_id: i64) -> Result<Option<Match>> {
        let conn = lock(&self.db);
        let found = conn
            .query_row(
                &format!("SELECT {} FROM matches WHERE match_id = ?1", Match::COLUMNS),
                [match_id],
                Match::map_row,
            )
            .optional()?;
        Ok(found)
    }

    /// Every match, ordered by `match_id` ascending.
    pub fn list_all(&self) -> Result<Vec<Match>> {
        let mut all = Vec::new();
        self.for_each(|m| {
            all.push(m);
            Ok(())
        })?;
        Ok(all)
    }

    /// Stream every match to `visit` in `match_id` order without
    /// materializing the ledger.
    ///
    /// The connection stays locked for the whole walk, so the visitor sees a
    /// consistent ledger. Stops at the first error.
    pub fn for_each<F>(&self, visit: F) -> Result<()>
    where
        F: FnMut(Match) -> Result<()>,
    {
        let conn = lock(&self.db);
        for_each_in(&conn, visit)
    }

    /// Number of matches in the ledger.
    pub fn count(&self) -> Result<u64> {
        let conn = lock(&self.db);
        count_in(&conn)
    }

    /// Number of matches naming `item_id` as winner or loser.
    pub fn count_for_item(&self, item_id: i64) -> Result<i64> {
        let conn = lock(&self.db);
        let count = conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE winner_id = ?1 OR loser_id = ?1",
            [item_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

pub(crate) fn record_in(conn: &Connection, new: &NewMatch<'_>) -> Result<i64> {
    if new.winner_id == new.loser_id {
        return Err(EchelonError::InvalidOutcome(format!(
            "item {} cannot beat itself",
            new.winner_id
        )));
    }
    for id in [new.winner_id, new.loser_id] {
        let known = conn
            .query_row("SELECT 1 FROM items WHERE id = ?1", [id], |_| Ok(()))
            .optional()?;
        if known.is_none() {
            return Err(EchelonError::NotFound(ItemRef::Id(id)));
        }
    }

    conn.execute(
        "INSERT INTO matches (winner_id, loser_id, winner_rating_before, winner_rating_after,
                              loser_rating_before, loser_rating_after, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            new.winner_id,
            new.loser_id,
            new.winner_before,
            new.winner_after,
            new.loser_before,
            new.loser_after,
            new.timestamp,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn for_each_in<F>(conn: &Connection, mut visit: F) -> Result<()>
where
    F: FnMut(Match) -> Result<()>,
{
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM matches ORDER BY match_id ASC",
        Match::COLUMNS
    ))?;
    for row in stmt.query_map([], Match::map_row)? {
        visit(row?)?;
    }
    Ok(())
}

pub(crate) fn count_in(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::repo::ItemRepo;

    /// Helper to set up a ledger with two items.
    fn setup() -> (MatchRepo, i64, i64) {
        let db = init_db(":memory:").unwrap();
        let items = ItemRepo::new(db.clone());
        let a = items.create("a.png", "/a").unwrap();
        let b = items.create("b.png", "/b").unwrap();
        (MatchRepo::new(db), a.id, b.id)
    }

    fn new_match(winner_id: i64, loser_id: i64, timestamp: &str) -> NewMatch<'_> {
        NewMatch {
            winner_id,
            loser_id,
            winner_before: 1200.0,
            winner_after: 1216.0,
            loser_before: 1200.0,
            loser_after: 1184.0,
            timestamp,
        }
    }

    #[test]
    fn test_list_all_empty() {
        let (repo, _, _) = setup();
        assert!(repo.list_all().unwrap().is_empty());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_record_and_get() {
        let (repo, a, b) = setup();
        let id = repo.record(&new_match(a, b, "2025-01-01 10:00:00.000000")).unwrap();

        let m = repo.get(id).unwrap().unwrap();
        assert_eq!(m.match_id, id);
        assert_eq!(m.winner_id, a);
        assert_eq!(m.loser_id, b);
        assert_eq!(m.winner_rating_after, 1216.0);
        assert_eq!(m.loser_rating_after, 1184.0);
        assert_eq!(m.timestamp, "2025-01-01 10:00:00.000000");
    }

    #[test]
    fn test_get_nonexistent_match() {
        let (repo, _, _) = setup();
        assert!(repo.get(1).unwrap().is_none());
    }

    #[test]
    fn test_ids_strictly_increasing() {
        let (repo, a, b) = setup();
        let ids: Vec<i64> = (0..5)
            .map(|i| {
                let (w, l) = if i % 2 == 0 { (a, b) } else { (b, a) };
                repo.record(&new_match(w, l, "t")).unwrap()
            })
            .collect();

        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let listed: Vec<i64> = repo.list_all().unwrap().iter().map(|m| m.match_id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_records_reread_identically() {
        let (repo, a, b) = setup();
        repo.record(&new_match(a, b, "t1")).unwrap();
        repo.record(&new_match(b, a, "t2")).unwrap();

        let first = repo.list_all().unwrap();
        let second = repo.list_all().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_record_rejects_unknown_item() {
        let (repo, a, _) = setup();
        let result = repo.record(&new_match(a, 404, "t"));
        assert!(matches!(
            result,
            Err(EchelonError::NotFound(ItemRef::Id(404)))
        ));
        let result = repo.record(&new_match(405, a, "t"));
        assert!(matches!(
            result,
            Err(EchelonError::NotFound(ItemRef::Id(405)))
        ));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_record_rejects_self_match() {
        let (repo, a, _) = setup();
        let result = repo.record(&new_match(a, a, "t"));
        assert!(matches!(result, Err(EchelonError::InvalidOutcome(_))));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_count_for_item() {
        let (repo, a, b) = setup();
        repo.record(&new_match(a, b, "t1")).unwrap();
        repo.record(&new_match(b, a, "t2")).unwrap();
        repo.record(&new_match(a, b, "t3")).unwrap();

        assert_eq!(repo.count_for_item(a).unwrap(), 3);
        assert_eq!(repo.count_for_item(b).unwrap(), 3);
        assert_eq!(repo.count_for_item(999).unwrap(), 0);
        assert_eq!(repo.count().unwrap(), 3);
    }

    #[test]
    fn test_for_each_stops_on_error() {
        let (repo, a, b) = setup();
        for _ in 0..3 {
            repo.record(&new_match(a, b, "t")).unwrap();
        }

        let mut seen = 0;
        let result = repo.for_each(|_| {
            seen += 1;
            if seen == 2 {
                Err(EchelonError::InvalidOutcome("stop".into()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(seen, 2);
    }
}
