//! Matchup selection.
//!
//! Draws two distinct items uniformly at random (sampling without
//! replacement). Selection is memoryless: nothing about earlier pairs is
//! remembered between calls. The random source is supplied by the caller so
//! tests can seed it.

use rand::seq::index;
use rand::Rng;

use crate::db::DbPool;
use crate::error::{EchelonError, Result};
use crate::models::Item;
use crate::repo::ItemRepo;

/// Read-only pair selector over the item store.
#[derive(Clone)]
pub struct MatchupSelector {
    items: ItemRepo,
}

impl MatchupSelector {
    /// Create a selector reading from the given database.
    pub fn new(db: DbPool) -> Self {
        Self {
            items: ItemRepo::new(db),
        }
    }

    /// Draw two distinct items.
    ///
    /// # Errors
    ///
    /// Returns [`EchelonError::InsufficientItems`] if fewer than two items
    /// exist.
    pub fn select_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Item, Item)> {
        let population = self.items.list()?;
        pick_pair(&population, rng)
    }
}

/// Draw two distinct items from `population`.
///
/// Every item has probability 1/N of landing in each slot.
pub fn pick_pair<R: Rng + ?Sized>(population: &[Item], rng: &mut R) -> Result<(Item, Item)> {
    if population.len() < 2 {
        return Err(EchelonError::InsufficientItems {
            available: population.len(),
        });
    }

    let picks = index::sample(rng, population.len(), 2);
    Ok((
        population[picks.index(0)].clone(),
        population[picks.index(1)].clone(),
    ))
}
