//! Repository modules for database operations.

pub mod items;
pub mod matches;

pub use items::ItemRepo;
pub use matches::{MatchRepo, NewMatch};
