//! Yahoo Finance chart (v8) REST provider.
//!
//! One HTTP request per symbol against `/v8/finance/chart/{symbol}`. Requests
//! are throttled with a process-local rate limiter and bounded by the client
//! timeout.

pub mod params;
pub mod provider;
pub mod response;

pub use params::YahooChartParams;
pub use provider::{YahooChartConfig, YahooChartProvider};
