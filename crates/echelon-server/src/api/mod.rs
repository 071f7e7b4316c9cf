//! API handlers for the ranking server.

pub mod items;
pub mod outcome;
pub mod pair;
pub mod reports;
pub mod settings;
