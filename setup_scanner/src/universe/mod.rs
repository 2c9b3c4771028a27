//! The ticker universe: index constituents merged, normalized and cached.
//!
//! [`Universe::tickers`] serves the cached list while it is fresh. Otherwise
//! it asks every source, and if any of them fails, or together they return
//! nothing, it logs a warning and serves the configured fallback list. The
//! fallback is never cached, so the next call retries the sources.

pub mod cache;
pub mod wikipedia;

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use cache::TtlCache;
pub use wikipedia::WikipediaIndexSource;

use crate::config::UniverseParams;

/// Failures while fetching index constituents.
#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no table with a `{column}` column at {url}")]
    ColumnNotFound { url: String, column: String },

    #[error("invalid selector {0}")]
    Selector(String),
}

/// Something that lists raw ticker symbols.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Raw symbols, before normalization.
    async fn fetch(&self) -> Result<Vec<String>, UniverseError>;
}

/// A fixed list of symbols.
#[derive(Clone, Debug, Default)]
pub struct StaticUniverse {
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UniverseSource for StaticUniverse {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<String>, UniverseError> {
        Ok(self.symbols.clone())
    }
}

/// Trims, uppercases and maps `.` to `-` (the price provider's share-class
/// notation).
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase().replace('.', "-")
}

/// [`normalize_symbol`] over every entry, then dedupes and sorts.
pub fn normalize_universe<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| normalize_symbol(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sources, cache and fallback list behind one call.
pub struct Universe {
    sources: Vec<Box<dyn UniverseSource>>,
    cache: Arc<TtlCache<Vec<String>>>,
    fallback: Vec<String>,
}

impl Universe {
    pub fn new(
        sources: Vec<Box<dyn UniverseSource>>,
        cache: Arc<TtlCache<Vec<String>>>,
        fallback: Vec<String>,
    ) -> Self {
        Self {
            sources,
            cache,
            fallback: normalize_universe(fallback),
        }
    }

    /// Wikipedia sources and fallback list from configuration.
    pub fn from_params(
        params: &UniverseParams,
        client: reqwest::Client,
        cache: Arc<TtlCache<Vec<String>>>,
    ) -> Self {
        let sources = params
            .sources
            .iter()
            .map(|cfg| {
                Box::new(WikipediaIndexSource::from_config(client.clone(), cfg)) as Box<dyn UniverseSource>
            })
            .collect();
        Self::new(sources, cache, params.fallback.clone())
    }

    /// The normalized universe.
    pub async fn tickers(&self) -> Arc<Vec<String>> {
        if let Some(cached) = self.cache.get() {
            debug!(count = cached.len(), "universe served from cache");
            return cached;
        }

        match self.fetch_all().await {
            Ok(symbols) if !symbols.is_empty() => {
                info!(count = symbols.len(), "universe refreshed");
                self.cache.insert(symbols)
            }
            Ok(_) => {
                warn!(
                    fallback = self.fallback.len(),
                    "universe sources returned no symbols; using fallback list"
                );
                Arc::new(self.fallback.clone())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    fallback = self.fallback.len(),
                    "universe source failed; using fallback list"
                );
                Arc::new(self.fallback.clone())
            }
        }
    }

    async fn fetch_all(&self) -> Result<Vec<String>, UniverseError> {
        let mut raw = Vec::new();
        for source in &self.sources {
            let symbols = source.fetch().await?;
            debug!(source = source.name(), count = symbols.len(), "source fetched");
            raw.extend(symbols);
        }
        Ok(normalize_universe(raw))
    }
}
