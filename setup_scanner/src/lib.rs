//! Screener for the "high & tight" baby-bar setup.
//!
//! For every ticker of an index universe the scanner pulls a year of daily
//! bars, scores four criteria (location of today's bar inside yesterday's,
//! range contraction, 5-day strength against a benchmark, close above the
//! 50-day average) and ranks the best candidates.
//!
//! - [`session::run_scan`] drives a full scan.
//! - [`scanner::Scanner`] evaluates tickers concurrently.
//! - [`evaluate::evaluate_series`] scores a single already-fetched series.
//! - [`report`] renders the outcome for a terminal or as JSON.

pub mod config;
pub mod error;
pub mod evaluate;
pub mod indicators;
pub mod pattern;
pub mod report;
pub mod scanner;
pub mod score;
pub mod select;
pub mod series;
pub mod session;
pub mod universe;
