//! Vendor-agnostic market data models and providers.
//!
//! [`models`] holds the canonical bar types every provider produces, and
//! [`providers`] holds the [`DataProvider`](providers::DataProvider) trait plus
//! its concrete implementations.

pub mod models;
pub mod providers;
