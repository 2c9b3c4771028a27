//! Per-ticker evaluation: one bar series in, one scored result out.

use market_data_ingestor::{
    models::{asset::AssetClass, bar_series::BarSeries},
    providers::DataProvider,
};
use serde::Serialize;
use tracing::info;

use crate::{
    config::ScannerConfig,
    error::{ScanError, SkipReason},
    indicators::{is_above_trend, latest_sma, outperforms, pct_change},
    pattern::evaluate_pattern,
    score::{Criteria, Signal, aggregate},
    series::{OhlcColumns, ensure_evaluable, fetch_daily_history},
};

/// The benchmark's trailing change, computed once per scan and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkContext {
    /// Benchmark symbol.
    pub symbol: String,
    /// Percent change (fraction) over the relative-strength look-back.
    pub change: f64,
}

impl BenchmarkContext {
    /// Builds the context from an already fetched benchmark series.
    pub fn from_series(series: &BarSeries, lookback: usize) -> Result<Self, SkipReason> {
        ensure_evaluable(series, lookback + 1)?;
        let change = pct_change(&series.closes(), lookback).ok_or_else(|| SkipReason::Malformed {
            detail: format!("cannot compute a {lookback}-bar change"),
        })?;
        Ok(Self {
            symbol: series.symbol.clone(),
            change,
        })
    }

    /// Fetches the configured benchmark and computes its change.
    pub async fn fetch(provider: &dyn DataProvider, config: &ScannerConfig) -> Result<Self, ScanError> {
        let lookback = config.indicators.rs_lookback;
        let to_scan_error = |reason| ScanError::Benchmark {
            symbol: config.benchmark.clone(),
            reason,
        };

        let series = fetch_daily_history(
            provider,
            &config.benchmark,
            AssetClass::Etf,
            lookback + 1,
            config.scan.fetch_timeout(),
        )
        .await
        .map_err(to_scan_error)?;

        let ctx = Self::from_series(&series, lookback).map_err(to_scan_error)?;
        info!(
            benchmark = %ctx.symbol,
            change_pct = ctx.change * 100.0,
            "benchmark change computed"
        );
        Ok(ctx)
    }
}

/// A scored ticker.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    /// Ticker symbol.
    pub symbol: String,
    /// Sum of the weights of `signals`.
    pub score: u8,
    /// Latest close.
    pub price: f64,
    /// The ticker's own trailing change (fraction), used as ranking tie-break.
    pub relative_strength: f64,
    /// Latest moving-average value the trend criterion compared against.
    pub trend_average: f64,
    /// Satisfied criteria in evaluation order.
    pub signals: Vec<Signal>,
    /// The evaluated history, kept for display.
    #[serde(skip)]
    pub series: BarSeries,
}

impl EvaluationResult {
    /// Labels of the satisfied criteria, in evaluation order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.signals.iter().map(|s| s.label()).collect()
    }

    /// `true` when the score reaches the inclusive threshold.
    pub fn qualifies(&self, min_score: u8) -> bool {
        self.score >= min_score
    }
}

/// Scores one series against the benchmark.
///
/// Takes ownership of the series so the result can carry it for display.
pub fn evaluate_series(
    series: BarSeries,
    benchmark: &BenchmarkContext,
    config: &ScannerConfig,
) -> Result<EvaluationResult, SkipReason> {
    let ind = &config.indicators;
    ensure_evaluable(&series, ind.min_history)?;

    let (today, yesterday) = series.last_two().ok_or(SkipReason::InsufficientHistory {
        have: series.len(),
        need: 2,
    })?;
    let pattern = evaluate_pattern(today, yesterday, &config.pattern);

    let columns = OhlcColumns::from_series(&series);
    let change = pct_change(&columns.close, ind.rs_lookback).ok_or_else(|| SkipReason::Malformed {
        detail: format!("cannot compute a {}-bar change", ind.rs_lookback),
    })?;
    let average = latest_sma(&columns.close, ind.ma_period).ok_or(SkipReason::InsufficientHistory {
        have: columns.len(),
        need: ind.ma_period,
    })?;

    let criteria = Criteria {
        location: pattern.location,
        contraction: pattern.contraction,
        relative_strength: outperforms(change, benchmark.change),
        trend: is_above_trend(today.close, average),
    };
    let card = aggregate(&criteria, &config.scoring);
    let price = today.close;

    Ok(EvaluationResult {
        symbol: series.symbol.clone(),
        score: card.score,
        price,
        relative_strength: change,
        trend_average: average,
        signals: card.signals,
        series,
    })
}
