//! Ledger replay and rating drift audit.
//!
//! Replaying folds every match, in ledger order, into fresh ratings using an
//! Elo model. Comparing the result with the stored aggregates shows how far
//! the stored ratings have drifted from what the ledger implies (for example
//! after the K schedule was changed) and whether the win/loss counters agree
//! with the ledger.

use std::collections::HashMap;

use crate::db::{lock, DbPool};
use crate::elo::EloModel;
use crate::error::{EchelonError, ItemRef, Result};
use crate::models::{Item, Match};
use crate::repo::{items, matches};

/// Rating of one item as implied by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayedRating {
    /// Item id.
    pub item_id: i64,
    /// Item name.
    pub name: String,
    /// Rating after folding every match.
    pub rating: f64,
    /// Wins found in the ledger.
    pub wins: i64,
    /// Losses found in the ledger.
    pub losses: i64,
}

/// Incremental ledger fold.
pub struct Replayer<'a> {
    model: &'a EloModel,
    ratings: Vec<ReplayedRating>,
    index: HashMap<i64, usize>,
    ordinal: u64,
}

impl<'a> Replayer<'a> {
    /// Start a replay where every item begins at `initial_rating`.
    pub fn new(items: &[Item], model: &'a EloModel, initial_rating: f64) -> Self {
        let ratings: Vec<_> = items
            .iter()
            .map(|item| ReplayedRating {
                item_id: item.id,
                name: item.name.clone(),
                rating: initial_rating,
                wins: 0,
                losses: 0,
            })
            .collect();
        let index = ratings
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.item_id, pos))
            .collect();
        Self {
            model,
            ratings,
            index,
            ordinal: 0,
        }
    }

    /// Fold one match. Matches must arrive in ledger order.
    ///
    /// The K-factor is keyed on the match ordinal, exactly as when the
    /// outcome was first recorded.
    pub fn apply(&mut self, m: &Match) -> Result<()> {
        let w = self.position(m.winner_id)?;
        let l = self.position(m.loser_id)?;
        self.ordinal += 1;

        let change = self
            .model
            .rate_win(self.ratings[w].rating, self.ratings[l].rating, self.ordinal);
        self.ratings[w].rating = change.winner_after;
        self.ratings[w].wins += 1;
        self.ratings[l].rating = change.loser_after;
        self.ratings[l].losses += 1;
        Ok(())
    }

    /// Replayed ratings, highest first; ties keep item order.
    pub fn finish(mut self) -> Vec<ReplayedRating> {
        self.ratings.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        self.ratings
    }

    fn position(&self, item_id: i64) -> Result<usize> {
        self.index
            .get(&item_id)
            .copied()
            .ok_or(EchelonError::NotFound(ItemRef::Id(item_id)))
    }
}

/// Replay an in-memory ledger.
pub fn replay<'m, I>(
    items: &[Item],
    ledger: I,
    model: &EloModel,
    initial_rating: f64,
) -> Result<Vec<ReplayedRating>>
where
    I: IntoIterator<Item = &'m Match>,
{
    let mut replayer = Replayer::new(items, model, initial_rating);
    for m in ledger {
        replayer.apply(m)?;
    }
    Ok(replayer.finish())
}

/// Stored state of one item next to its replayed state.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftEntry {
    /// Item id.
    pub item_id: i64,
    /// Item name.
    pub name: String,
    /// Rating held by the item store.
    pub stored_rating: f64,
    /// Rating implied by the ledger.
    pub replayed_rating: f64,
    /// Wins + losses held by the item store.
    pub stored_matches: i64,
    /// Matches naming this item in the ledger.
    pub ledger_matches: i64,
}

impl DriftEntry {
    /// `replayed - stored`.
    pub fn drift(&self) -> f64 {
        self.replayed_rating - self.stored_rating
    }

    /// True when the counters disagree with the ledger.
    pub fn count_mismatch(&self) -> bool {
        self.stored_matches != self.ledger_matches
    }
}

/// Outcome of an audit.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    /// Number of ledger records folded.
    pub matches_replayed: u64,
    /// One entry per item, ordered by replayed rating (highest first).
    pub entries: Vec<DriftEntry>,
}

impl AuditReport {
    /// Entries whose absolute drift exceeds `tolerance`.
    pub fn drifted(&self, tolerance: f64) -> Vec<&DriftEntry> {
        self.entries
            .iter()
            .filter(|e| e.drift().abs() > tolerance)
            .collect()
    }

    /// Entries whose win/loss counters disagree with the ledger.
    pub fn count_mismatches(&self) -> Vec<&DriftEntry> {
        self.entries.iter().filter(|e| e.count_mismatch()).collect()
    }
}

/// Replay the stored ledger and compare it with the item store.
///
/// Items and ledger are read under one lock, so the audit sees a single
/// point in time.
pub fn audit(db: &DbPool, model: &EloModel, initial_rating: f64) -> Result<AuditReport> {
    let conn = lock(db);
    let stored = items::list_in(&conn)?;

    let mut replayer = Replayer::new(&stored, model, initial_rating);
    matches::for_each_in(&conn, |m| replayer.apply(&m))?;
    let matches_replayed = replayer.ordinal;
    let replayed = replayer.finish();

    let by_id: HashMap<i64, &Item> = stored.iter().map(|item| (item.id, item)).collect();
    let entries = replayed
        .into_iter()
        .filter_map(|r| {
            by_id.get(&r.item_id).map(|item| DriftEntry {
                item_id: r.item_id,
                name: r.name,
                stored_rating: item.rating,
                replayed_rating: r.rating,
                stored_matches: item.matches(),
                ledger_matches: r.wins + r.losses,
            })
        })
        .collect();

    Ok(AuditReport {
        matches_replayed,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingConfig;
    use crate::db::init_db;
    use crate::elo::KStep;
    use crate::service::Echelon;

    fn item(id: i64, name: &str) -> Item {
        Item {
            id,
            name: name.to_string(),
            location: format!("/images/{}", name),
            rating: 1200.0,
            wins: 0,
            losses: 0,
            updated: "t".to_string(),
        }
    }

    fn m(match_id: i64, winner_id: i64, loser_id: i64) -> Match {
        Match {
            match_id,
            winner_id,
            loser_id,
            winner_rating_before: 0.0,
            winner_rating_after: 0.0,
            loser_rating_before: 0.0,
            loser_rating_after: 0.0,
            timestamp: "t".to_string(),
        }
    }

    #[test]
    fn test_replay_empty_ledger() {
        let items = vec![item(1, "a.png"), item(2, "b.png")];
        let model = EloModel::with_constant_k(200.0, 32.0);
        let ledger: Vec<Match> = Vec::new();
        let replayed = replay(&items, &ledger, &model, 1200.0).unwrap();
        assert_eq!(replayed.len(), 2);
        assert!(replayed.iter().all(|r| r.rating == 1200.0 && r.wins == 0));
    }

    #[test]
    fn test_replay_single_match() {
        let items = vec![item(1, "a.png"), item(2, "b.png")];
        let model = EloModel::with_constant_k(200.0, 32.0);
        let ledger = vec![m(1, 2, 1)];

        let replayed = replay(&items, &ledger, &model, 1200.0).unwrap();
        assert_eq!(replayed[0].name, "b.png");
        assert!((replayed[0].rating - 1216.0).abs() < 1e-9);
        assert_eq!((replayed[0].wins, replayed[0].losses), (1, 0));
        assert!((replayed[1].rating - 1184.0).abs() < 1e-9);
    }

    #[test]
    fn test_replay_unknown_item() {
        let items = vec![item(1, "a.png")];
        let model = EloModel::default();
        let result = replay(&items, &[m(1, 1, 9)], &model, 1200.0);
        assert!(matches!(result, Err(EchelonError::NotFound(ItemRef::Id(9)))));
    }

    fn recorded_store(rating: &RatingConfig) -> Echelon {
        let echelon = Echelon::new(init_db(":memory:").unwrap(), rating);
        for name in ["a.png", "b.png", "c.png"] {
            echelon.items().create(name, name).unwrap();
        }
        for (w, l) in [(1, 2), (1, 3), (2, 3), (3, 1), (1, 2)] {
            echelon
                .record_outcome(&ItemRef::Id(w), &ItemRef::Id(l))
                .unwrap();
        }
        echelon
    }

    #[test]
    fn test_audit_consistent_store_has_no_drift() {
        let rating = RatingConfig {
            k: 16.0,
            k_schedule: vec![KStep { threshold: 2, k: 48.0 }],
            ..RatingConfig::default()
        };
        let echelon = recorded_store(&rating);

        let report = audit(echelon.db(), echelon.model(), rating.initial_rating).unwrap();
        assert_eq!(report.matches_replayed, 5);
        assert_eq!(report.entries.len(), 3);
        assert!(report.drifted(1e-9).is_empty());
        assert!(report.count_mismatches().is_empty());
    }

    #[test]
    fn test_audit_detects_drift_from_different_model() {
        let rating = RatingConfig {
            k: 32.0,
            ..RatingConfig::default()
        };
        let echelon = recorded_store(&rating);

        let other = EloModel::with_constant_k(200.0, 8.0);
        let report = audit(echelon.db(), &other, rating.initial_rating).unwrap();
        assert!(!report.drifted(0.5).is_empty());
        assert!(report.count_mismatches().is_empty());
    }

    #[test]
    fn test_audit_detects_count_mismatch() {
        let rating = RatingConfig::default();
        let echelon = recorded_store(&rating);
        {
            let conn = lock(echelon.db());
            conn.execute("UPDATE items SET wins = wins + 1 WHERE id = 1", [])
                .unwrap();
        }

        let report = audit(echelon.db(), echelon.model(), rating.initial_rating).unwrap();
        let mismatched = report.count_mismatches();
        assert_eq!(mismatched.len(), 1);
        assert_eq!(mismatched[0].item_id, 1);
    }
}
