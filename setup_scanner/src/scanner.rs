//! Concurrent evaluation of a ticker universe.
//!
//! Ticker jobs are driven as a stream with a bounded number in flight. The
//! task calling [`Scanner::scan`] is the only place results are collected, so
//! no state is shared between jobs besides the read-only benchmark.
//!
//! Cancellation stops new jobs from being launched; jobs already in flight
//! run to completion and are still collected.

use std::{collections::BTreeMap, pin::pin, sync::Arc};

use futures::{StreamExt, future, stream};
use indexmap::IndexMap;
use market_data_ingestor::{models::asset::AssetClass, providers::DataProvider};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::{
    config::ScannerConfig,
    error::{ScanError, SkipReason},
    evaluate::{BenchmarkContext, EvaluationResult, evaluate_series},
    series::fetch_daily_history,
};

/// Progress after a ticker finished, successfully or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// Tickers finished so far.
    pub processed: usize,
    /// Tickers in the scan.
    pub total: usize,
}

impl ScanProgress {
    /// Completed fraction in `0.0..=1.0`; an empty scan counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Everything a scan produced.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Results at or above the threshold, in universe order.
    pub qualifying: Vec<EvaluationResult>,
    /// Tickers that produced no evaluation, in universe order.
    pub skipped: IndexMap<String, SkipReason>,
    /// Tickers evaluated below the threshold.
    pub below_threshold: usize,
    /// Tickers finished.
    pub processed: usize,
    /// Tickers in the scan.
    pub total: usize,
    /// `true` when cancellation left tickers unprocessed.
    pub cancelled: bool,
}

impl ScanReport {
    /// Number of skips per [`SkipReason::kind`].
    pub fn skip_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for reason in self.skipped.values() {
            *counts.entry(reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// Fetches and scores tickers against one price provider.
#[derive(Clone)]
pub struct Scanner {
    provider: Arc<dyn DataProvider>,
    config: Arc<ScannerConfig>,
}

impl Scanner {
    /// Creates a scanner over `provider`.
    pub fn new(provider: Arc<dyn DataProvider>, config: Arc<ScannerConfig>) -> Self {
        Self { provider, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Fetches the configured benchmark and computes its change.
    pub async fn benchmark(&self) -> Result<BenchmarkContext, ScanError> {
        BenchmarkContext::fetch(self.provider.as_ref(), &self.config).await
    }

    /// Fetches one ticker's history and scores it, regardless of threshold.
    pub async fn evaluate_ticker(
        &self,
        symbol: &str,
        benchmark: &BenchmarkContext,
    ) -> Result<EvaluationResult, SkipReason> {
        let series = fetch_daily_history(
            self.provider.as_ref(),
            symbol,
            AssetClass::UsEquity,
            self.config.indicators.min_history,
            self.config.scan.fetch_timeout(),
        )
        .await?;
        evaluate_series(series, benchmark, &self.config)
    }

    /// Evaluates every ticker with at most `scan.concurrency` in flight.
    ///
    /// `on_progress` is called once per finished ticker with a strictly
    /// increasing `processed` count.
    pub async fn scan<F>(
        &self,
        tickers: &[String],
        benchmark: &BenchmarkContext,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> ScanReport
    where
        F: FnMut(ScanProgress),
    {
        let total = tickers.len();
        let min_score = self.config.selection.min_score;
        let concurrency = self.config.scan.concurrency.max(1);
        info!(total, concurrency, benchmark = %benchmark.symbol, "scan started");

        let mut jobs = pin!(
            stream::iter(tickers.iter().enumerate())
                .take_while(|_| future::ready(!cancel.is_cancelled()))
                .map(|(idx, symbol)| async move {
                    (idx, symbol, self.evaluate_ticker(symbol, benchmark).await)
                })
                .buffer_unordered(concurrency)
        );

        let mut qualifying = Vec::new();
        let mut skipped = Vec::new();
        let mut below_threshold = 0;
        let mut processed = 0;

        while let Some((idx, symbol, outcome)) = jobs.next().await {
            processed += 1;
            match outcome {
                Ok(result) if result.qualifies(min_score) => {
                    debug!(symbol = %symbol, score = result.score, "setup found");
                    qualifying.push((idx, result));
                }
                Ok(result) => {
                    trace!(symbol = %symbol, score = result.score, "below threshold");
                    below_threshold += 1;
                }
                Err(reason) => {
                    debug!(symbol = %symbol, kind = reason.kind(), %reason, "ticker skipped");
                    skipped.push((idx, symbol.clone(), reason));
                }
            }
            on_progress(ScanProgress { processed, total });
        }

        qualifying.sort_by_key(|(idx, _)| *idx);
        skipped.sort_by_key(|(idx, _, _)| *idx);

        let report = ScanReport {
            qualifying: qualifying.into_iter().map(|(_, r)| r).collect(),
            skipped: skipped
                .into_iter()
                .map(|(_, symbol, reason)| (symbol, reason))
                .collect(),
            below_threshold,
            processed,
            total,
            cancelled: cancel.is_cancelled() && processed < total,
        };
        info!(
            processed,
            total,
            qualifying = report.qualifying.len(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            "scan finished"
        );
        report
    }
}
