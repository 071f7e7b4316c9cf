//! Offline commands run from the command line: seeding, TSV reports, audit.

use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use echelon_core::replay::{audit, AuditReport};
use echelon_core::report::{write_detail_csv, write_ranking_csv};
use echelon_core::seed::{initialize, SeedSummary};
use echelon_core::{Echelon, EchelonConfig, Result};

/// Ranking TSV written by `reports`.
pub const RANKING_TSV: &str = "rankings_report.tsv";
/// Detail TSV written by `reports`.
pub const DETAIL_TSV: &str = "detail_results.tsv";

/// Seed a new store, letting command-line flags override the configured paths.
pub fn init(
    config: &EchelonConfig,
    image_dir: Option<&Path>,
    db: Option<&Path>,
) -> Result<SeedSummary> {
    let image_dir = image_dir.unwrap_or(config.image_dir.as_path());
    let db = db.unwrap_or(config.db.as_path());
    initialize(db, image_dir, config.rating.initial_rating)
}

/// Write both reports as tab-separated files into `out_dir`.
///
/// Returns the paths written, ranking first.
pub fn write_reports(echelon: &Echelon, out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir)?;

    let ranking_path = out_dir.join(RANKING_TSV);
    let ranking = echelon.ranking_report()?;
    write_ranking_csv(&ranking, BufWriter::new(File::create(&ranking_path)?), b'\t')?;

    let detail_path = out_dir.join(DETAIL_TSV);
    let detail = echelon.detail_report()?;
    write_detail_csv(&detail, BufWriter::new(File::create(&detail_path)?), b'\t')?;

    tracing::info!(
        items = ranking.len(),
        matches = detail.len(),
        dir = %out_dir.display(),
        "Reports written"
    );
    Ok((ranking_path, detail_path))
}

/// Replay the ledger of `echelon` with its own model.
pub fn run_audit(echelon: &Echelon, config: &EchelonConfig) -> Result<AuditReport> {
    audit(echelon.db(), echelon.model(), config.rating.initial_rating)
}

/// Human-readable audit summary: the top `top` replayed ratings, then any
/// item drifting more than `tolerance` or with mismatched counters.
pub fn format_audit(report: &AuditReport, top: usize, tolerance: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Replayed {} matches over {} items",
        report.matches_replayed,
        report.entries.len()
    );
    let _ = writeln!(
        out,
        "{:>4}  {:<32} {:>10} {:>10} {:>9}",
        "rank", "image", "replayed", "stored", "drift"
    );
    for (rank, entry) in report.entries.iter().take(top).enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<32} {:>10.4} {:>10.4} {:>+9.4}",
            rank + 1,
            entry.name,
            entry.replayed_rating,
            entry.stored_rating,
            entry.drift()
        );
    }

    let drifted = report.drifted(tolerance);
    if drifted.is_empty() {
        let _ = writeln!(out, "No rating drift above {}", tolerance);
    } else {
        let _ = writeln!(out, "{} items drift above {}:", drifted.len(), tolerance);
        for entry in drifted {
            let _ = writeln!(out, "  {} {:+.4}", entry.name, entry.drift());
        }
    }

    for entry in report.count_mismatches() {
        let _ = writeln!(
            out,
            "Count mismatch: {} stores {} matches, ledger has {}",
            entry.name, entry.stored_matches, entry.ledger_matches
        );
    }
    out
}
