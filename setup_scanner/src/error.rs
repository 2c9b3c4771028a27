//! Typed outcomes for tickers that could not be scored, and scan-level failures.

use std::time::Duration;

use market_data_ingestor::providers::ProviderError;
use thiserror::Error;

/// Why a ticker produced no evaluation.
///
/// Every per-ticker fault ends up here; none of them stops a scan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    /// The provider failed (network, HTTP status, vendor error payload).
    #[error("retrieval failed: {message}")]
    Provider {
        /// Rendered provider error.
        message: String,
    },

    /// Retrieval did not finish within the per-ticker budget.
    #[error("retrieval timed out after {}s", .after.as_secs_f64())]
    Timeout {
        /// The budget that elapsed.
        after: Duration,
    },

    /// The provider answered but had no bars for the symbol.
    #[error("no price history returned")]
    NoData,

    /// Too few bars for stable indicators.
    #[error("insufficient history: {have} bars, need {need}")]
    InsufficientHistory {
        /// Bars received.
        have: usize,
        /// Bars required.
        need: usize,
    },

    /// Prices that cannot be evaluated (non-finite, non-positive, high below low).
    #[error("malformed series: {detail}")]
    Malformed {
        /// What was wrong, with the offending bar index.
        detail: String,
    },
}

impl SkipReason {
    /// Short stable name, used to group skips in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Provider { .. } => "provider",
            SkipReason::Timeout { .. } => "timeout",
            SkipReason::NoData => "no_data",
            SkipReason::InsufficientHistory { .. } => "insufficient_history",
            SkipReason::Malformed { .. } => "malformed",
        }
    }
}

impl From<ProviderError> for SkipReason {
    fn from(err: ProviderError) -> Self {
        SkipReason::Provider {
            message: err.to_string(),
        }
    }
}

/// Failures that abort a whole scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Without the benchmark change there is nothing to measure relative strength against.
    #[error("benchmark {symbol} unavailable: {reason}")]
    Benchmark {
        /// Benchmark symbol.
        symbol: String,
        /// Why it could not be used.
        reason: SkipReason,
    },
}
