//! Close-price indicators: trailing percent change and simple moving average.

/// Percent change (as a fraction) between the latest close and the close
/// `lookback` bars earlier: `close[t] / close[t - lookback] - 1`.
///
/// Returns `None` when there are fewer than `lookback + 1` closes or the base
/// close is not a positive number.
pub fn pct_change(closes: &[f64], lookback: usize) -> Option<f64> {
    let last = closes.len().checked_sub(1)?;
    let base_idx = last.checked_sub(lookback)?;
    let (base, latest) = (closes[base_idx], closes[last]);
    if !(base.is_finite() && base > 0.0 && latest.is_finite()) {
        return None;
    }
    Some(latest / base - 1.0)
}

/// Average of the last `period` closes, or `None` with fewer closes than that.
pub fn latest_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Relative-strength criterion: the candidate outperformed the benchmark.
pub fn outperforms(candidate_change: f64, benchmark_change: f64) -> bool {
    candidate_change > benchmark_change
}

/// Trend criterion: the latest close is strictly above its moving average.
pub fn is_above_trend(latest_close: f64, average: f64) -> bool {
    latest_close > average
}
