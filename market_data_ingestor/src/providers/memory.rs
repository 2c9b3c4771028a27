//! An in-memory [`DataProvider`] backed by pre-loaded bars.
//!
//! Useful for offline runs and for exercising code that consumes providers
//! without touching the network. The request's date range is not applied:
//! every bar held for a symbol is returned.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::{
    models::{bar::Bar, bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{DataProvider, ProviderError, ValidationSnafu},
};

#[derive(Debug, Default, Clone)]
pub struct InMemoryProvider {
    bars: IndexMap<String, Vec<Bar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the bars served for `symbol`.
    pub fn with_series(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(symbol.into(), bars);
    }
}

#[async_trait]
impl DataProvider for InMemoryProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        if params.symbols.is_empty() {
            return ValidationSnafu {
                message: "at least one symbol is required",
            }
            .fail();
        }

        Ok(params
            .symbols
            .iter()
            .filter_map(|symbol| {
                self.bars
                    .get(symbol)
                    .map(|bars| BarSeries::new(symbol.clone(), params.timeframe, bars.clone()))
            })
            .collect())
    }
}
