//! One end-to-end scan: universe, benchmark, evaluation, selection.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    error::ScanError,
    evaluate::BenchmarkContext,
    scanner::{ScanProgress, ScanReport, Scanner},
    select::{Selection, select_top},
    universe::Universe,
};

/// Counts describing how a scan went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Symbols the universe resolved to.
    pub universe_size: usize,
    /// Symbols handed to the scanner after truncation.
    pub scanned: usize,
    /// Symbols that finished.
    pub processed: usize,
    /// Results at or above the threshold.
    pub qualifying: usize,
    /// Results below the threshold.
    pub below_threshold: usize,
    /// Skips per reason kind.
    pub skipped: BTreeMap<&'static str, usize>,
    /// Cancellation left symbols unprocessed.
    pub cancelled: bool,
}

impl ScanSummary {
    fn from_report(universe_size: usize, report: &ScanReport) -> Self {
        Self {
            universe_size,
            scanned: report.total,
            processed: report.processed,
            qualifying: report.qualifying.len(),
            below_threshold: report.below_threshold,
            skipped: report.skip_counts(),
            cancelled: report.cancelled,
        }
    }
}

/// Result of [`run_scan`].
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    /// The benchmark every candidate was compared against.
    pub benchmark: BenchmarkContext,
    /// Score of a ticker satisfying every criterion.
    pub max_score: u8,
    /// Best setups, or an explicit "nothing found".
    pub selection: Selection,
    /// Counts for the run.
    pub summary: ScanSummary,
}

/// Resolves the universe, scans its first `scan.max_tickers` symbols and
/// ranks the qualifying ones.
///
/// Fails only when the benchmark cannot be evaluated; per-ticker faults are
/// skips and show up in [`ScanSummary::skipped`].
pub async fn run_scan<F>(
    universe: &Universe,
    scanner: &Scanner,
    cancel: &CancellationToken,
    on_progress: F,
) -> Result<ScanOutcome, ScanError>
where
    F: FnMut(ScanProgress),
{
    let config = scanner.config();
    let all = universe.tickers().await;
    let tickers: Vec<String> = all.iter().take(config.scan.max_tickers).cloned().collect();
    info!(universe = all.len(), scanning = tickers.len(), "universe resolved");

    let benchmark = scanner.benchmark().await?;
    let report = scanner.scan(&tickers, &benchmark, cancel, on_progress).await;
    let summary = ScanSummary::from_report(all.len(), &report);
    let selection = select_top(report.qualifying, &config.selection);

    Ok(ScanOutcome {
        benchmark,
        max_score: config.scoring.max_score(),
        selection,
        summary,
    })
}
