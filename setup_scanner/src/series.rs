//! Retrieval of daily history and the gate every series passes before scoring.
//!
//! A series is evaluable when it has at least `min_history` bars and every bar
//! is well formed. Anything else becomes a [`SkipReason`]; no partial scoring
//! happens on a short or broken series.

use std::time::Duration;

use chrono::Utc;
use market_data_ingestor::{
    models::{
        asset::AssetClass,
        bar_series::BarSeries,
        request_params::{BarsRequestParams, HistoryPeriod},
    },
    providers::DataProvider,
};
use tracing::trace;

use crate::error::SkipReason;

/// Per-day price columns of a series, indexable by bar position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OhlcColumns {
    /// Opening prices.
    pub open: Vec<f64>,
    /// Highs.
    pub high: Vec<f64>,
    /// Lows.
    pub low: Vec<f64>,
    /// Closes.
    pub close: Vec<f64>,
}

impl OhlcColumns {
    /// Splits a series into one column per price field.
    pub fn from_series(series: &BarSeries) -> Self {
        let n = series.len();
        let mut cols = OhlcColumns {
            open: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
        };
        for bar in &series.bars {
            cols.open.push(bar.open);
            cols.high.push(bar.high);
            cols.low.push(bar.low);
            cols.close.push(bar.close);
        }
        cols
    }

    /// Number of bars.
    pub fn len(&self) -> usize {
        self.close.len()
    }

    /// `true` when there are no bars.
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}

/// Checks the history length and bar sanity of a series.
pub fn ensure_evaluable(series: &BarSeries, min_history: usize) -> Result<(), SkipReason> {
    if series.is_empty() {
        return Err(SkipReason::NoData);
    }
    if series.len() < min_history {
        return Err(SkipReason::InsufficientHistory {
            have: series.len(),
            need: min_history,
        });
    }
    if let Some((idx, bar)) = series
        .bars
        .iter()
        .enumerate()
        .find(|(_, b)| !b.is_well_formed())
    {
        return Err(SkipReason::Malformed {
            detail: format!(
                "bar {idx} at {}: open={} high={} low={} close={}",
                bar.timestamp, bar.open, bar.high, bar.low, bar.close
            ),
        });
    }
    Ok(())
}

/// Fetches up to one year of daily bars for `symbol`, bounded by `timeout`.
///
/// Only the length gate is applied here (`min_history`); the bar sanity check
/// runs during evaluation via [`ensure_evaluable`].
pub async fn fetch_daily_history(
    provider: &dyn DataProvider,
    symbol: &str,
    asset_class: AssetClass,
    min_history: usize,
    timeout: Duration,
) -> Result<BarSeries, SkipReason> {
    let params = BarsRequestParams::daily_history(symbol, HistoryPeriod::OneYear, Utc::now())
        .with_asset_class(asset_class);

    let fetched = tokio::time::timeout(timeout, provider.fetch_bars(params))
        .await
        .map_err(|_| SkipReason::Timeout { after: timeout })??;

    let series = fetched
        .into_iter()
        .find(|s| s.symbol == symbol)
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::NoData)?;

    trace!(symbol, bars = series.len(), "history fetched");

    if series.len() < min_history {
        return Err(SkipReason::InsufficientHistory {
            have: series.len(),
            need: min_history,
        });
    }
    Ok(series)
}
