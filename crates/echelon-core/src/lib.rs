//! Image Echelon - pairwise image ranking.
//!
//! Images are shown to people two at a time. Each decision is folded into
//! an Elo rating and appended to an immutable match ledger, from which
//! rankings and audit reports are built.
//!
//! # Modules
//!
//! - [`repo`] - SQLite item store and match ledger
//! - [`elo`] - rating calculations and the variable K schedule
//! - [`selector`] - uniform random pair selection
//! - [`service`] - the [`Echelon`] facade and atomic outcome recording
//! - [`report`] - ranking/detail reports and CSV/TSV output
//! - [`seed`] - creating a store from a directory of images
//! - [`replay`] - recomputing ratings from the ledger and auditing drift
//! - [`config`] - TOML configuration

pub mod config;
pub mod db;
pub mod elo;
pub mod error;
pub mod models;
pub mod replay;
pub mod repo;
pub mod report;
pub mod seed;
pub mod selector;
pub mod service;

pub use config::{ConfigError, DisplayConfig, EchelonConfig, RatingConfig, ReferenceImage};
pub use db::{init_db, DbPool};
pub use elo::{EloModel, KSchedule, KStep, Outcome};
pub use error::{EchelonError, ItemRef, Result};
pub use models::{Item, ItemView, Match, OutcomeSide, OutcomeSummary};
pub use report::{DetailRow, RankingRow, ReportGenerator};
pub use selector::MatchupSelector;
pub use service::Echelon;
