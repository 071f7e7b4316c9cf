//! Outcome recording and the facade tying the components together.

use rand::Rng;
use tracing::debug;

use crate::config::RatingConfig;
use crate::db::{lock, now_timestamp, DbPool};
use crate::elo::EloModel;
use crate::error::{EchelonError, ItemRef, Result};
use crate::models::{Item, OutcomeSide, OutcomeSummary};
use crate::repo::{items, matches, ItemRepo, MatchRepo, NewMatch};
use crate::report::{DetailRow, RankingRow, ReportGenerator};
use crate::selector::MatchupSelector;

/// Entry point for callers: pair selection, outcome recording, reports.
///
/// Cheap to clone; every clone shares the same connection.
#[derive(Clone)]
pub struct Echelon {
    db: DbPool,
    model: EloModel,
    initial_rating: f64,
    selector: MatchupSelector,
    reports: ReportGenerator,
}

impl Echelon {
    /// Build the facade over an initialized database.
    pub fn new(db: DbPool, rating: &RatingConfig) -> Self {
        Self {
            model: rating.model(),
            initial_rating: rating.initial_rating,
            selector: MatchupSelector::new(db.clone()),
            reports: ReportGenerator::new(db.clone()),
            db,
        }
    }

    /// Elo model in use.
    pub fn model(&self) -> &EloModel {
        &self.model
    }

    /// Database handle.
    pub fn db(&self) -> &DbPool {
        &self.db
    }

    /// Item repository sharing this facade's connection and initial rating.
    pub fn items(&self) -> ItemRepo {
        ItemRepo::with_initial_rating(self.db.clone(), self.initial_rating)
    }

    /// Ledger sharing this facade's connection.
    pub fn ledger(&self) -> MatchRepo {
        MatchRepo::new(self.db.clone())
    }

    /// Draw two distinct items for comparison.
    pub fn select_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Item, Item)> {
        self.selector.select_pair(rng)
    }

    /// Record that `winner` was preferred over `loser`.
    ///
    /// The rating update of both items and the ledger append happen in one
    /// transaction. The K-factor is chosen from the schedule using the
    /// ordinal of this match (matches already recorded + 1).
    ///
    /// # Errors
    ///
    /// - [`EchelonError::NotFound`] if either reference is unknown
    /// - [`EchelonError::InvalidOutcome`] if both refer to the same item
    /// - [`EchelonError::StoreUnavailable`] on storage failure
    ///
    /// On any error nothing is written.
    pub fn record_outcome(&self, winner: &ItemRef, loser: &ItemRef) -> Result<OutcomeSummary> {
        let mut conn = lock(&self.db);
        let tx = conn.transaction()?;

        let winner = items::resolve_in(&tx, winner)?;
        let loser = items::resolve_in(&tx, loser)?;
        if winner.id == loser.id {
            return Err(EchelonError::InvalidOutcome(format!(
                "'{}' cannot be compared with itself",
                winner.name
            )));
        }

        let ordinal = matches::count_in(&tx)? + 1;
        let change = self.model.rate_win(winner.rating, loser.rating, ordinal);
        let timestamp = now_timestamp();

        items::apply_outcome_in(
            &tx,
            winner.id,
            loser.id,
            change.winner_after,
            change.loser_after,
            &timestamp,
        )?;
        let match_id = matches::record_in(
            &tx,
            &NewMatch {
                winner_id: winner.id,
                loser_id: loser.id,
                winner_before: change.winner_before,
                winner_after: change.winner_after,
                loser_before: change.loser_before,
                loser_after: change.loser_after,
                timestamp: &timestamp,
            },
        )?;
        tx.commit()?;

        debug!(
            match_id,
            winner = %winner.name,
            loser = %loser.name,
            k = change.k,
            winner_delta = change.winner_delta(),
            loser_delta = change.loser_delta(),
            "Outcome recorded"
        );

        Ok(OutcomeSummary {
            match_id,
            k: change.k,
            winner: OutcomeSide {
                id: winner.id,
                name: winner.name,
                rating_before: change.winner_before,
                rating: change.winner_after,
                wins: winner.wins + 1,
                losses: winner.losses,
                updated: timestamp.clone(),
            },
            loser: OutcomeSide {
                id: loser.id,
                name: loser.name,
                rating_before: change.loser_before,
                rating: change.loser_after,
                wins: loser.wins,
                losses: loser.losses + 1,
                updated: timestamp,
            },
        })
    }

    /// Ranking report, highest rating first.
    pub fn ranking_report(&self) -> Result<Vec<RankingRow>> {
        self.reports.ranking_report()
    }

    /// Detail report, one row per match in ledger order.
    pub fn detail_report(&self) -> Result<Vec<DetailRow>> {
        self.reports.detail_report()
    }
}
