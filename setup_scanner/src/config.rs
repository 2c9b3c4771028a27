//! Scanner configuration: parsing, defaults, and validation.
//!
//! Everything that tunes a scan lives in one TOML document:
//! - scoring weights and the pattern contraction ratio
//! - indicator windows (relative-strength look-back, moving-average period,
//!   minimum history)
//! - selection threshold and result count
//! - scan size, concurrency and per-ticker timeout
//! - universe sources, fallback list and cache TTL
//! - price provider endpoint and rate limit
//!
//! Every section is optional; missing keys take the defaults below, unknown
//! keys are rejected.
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]
//! - Explicit path, then `SETUP_SCANNER_CONFIG`, then defaults: [`resolve_config`]

use std::{num::NonZeroU32, ops::RangeInclusive, path::Path, time::Duration};

use anyhow::{Context, bail};
use market_data_ingestor::providers::yahoo_chart::{YahooChartConfig, provider::DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var_opt;
use tracing::debug;

/// Environment variable naming a config file when none is passed explicitly.
pub const CONFIG_ENV_VAR: &str = "SETUP_SCANNER_CONFIG";

/// Allowed number of tickers per scan.
pub const SCAN_SIZE_RANGE: RangeInclusive<usize> = 50..=500;

/// Top-level scanner configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScannerConfig {
    /// Symbol whose 5-day change every candidate is compared against.
    pub benchmark: String,
    /// Points awarded per satisfied criterion.
    pub scoring: ScoringWeights,
    /// Price-action pattern parameters.
    pub pattern: PatternParams,
    /// Indicator windows and the history gate.
    pub indicators: IndicatorParams,
    /// Threshold and result count for ranking.
    pub selection: SelectionParams,
    /// Scan size and worker settings.
    pub scan: ScanParams,
    /// Where the ticker universe comes from.
    pub universe: UniverseParams,
    /// Price-history provider settings.
    pub provider: ProviderSettings,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            benchmark: "SPY".to_string(),
            scoring: ScoringWeights::default(),
            pattern: PatternParams::default(),
            indicators: IndicatorParams::default(),
            selection: SelectionParams::default(),
            scan: ScanParams::default(),
            universe: UniverseParams::default(),
            provider: ProviderSettings::default(),
        }
    }
}

/// Weight of each criterion in the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScoringWeights {
    /// Today's bar sits in the upper half of yesterday's.
    pub location: u8,
    /// Today's range contracted against yesterday's.
    pub contraction: u8,
    /// Outperformed the benchmark over the look-back window.
    pub relative_strength: u8,
    /// Closed above the moving average.
    pub trend: u8,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            location: 3,
            contraction: 2,
            relative_strength: 2,
            trend: 1,
        }
    }
}

impl ScoringWeights {
    /// Score of a ticker that satisfies every criterion.
    pub fn max_score(&self) -> u8 {
        self.location
            .saturating_add(self.contraction)
            .saturating_add(self.relative_strength)
            .saturating_add(self.trend)
    }

    fn total(&self) -> u16 {
        [self.location, self.contraction, self.relative_strength, self.trend]
            .iter()
            .map(|w| u16::from(*w))
            .sum()
    }
}

/// Price-action pattern parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PatternParams {
    /// Today's range must be strictly below this fraction of yesterday's.
    pub contraction_ratio: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            contraction_ratio: 0.7,
        }
    }
}

/// Indicator windows and the minimum-history gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct IndicatorParams {
    /// Bars between the two closes of the percent-change comparison.
    pub rs_lookback: usize,
    /// Period of the simple moving average used as trend filter.
    pub ma_period: usize,
    /// Series shorter than this are never scored.
    pub min_history: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rs_lookback: 5,
            ma_period: 50,
            min_history: 100,
        }
    }
}

/// Ranking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SelectionParams {
    /// Inclusive minimum score for a ticker to qualify.
    pub min_score: u8,
    /// Number of ranked setups to keep.
    pub top_n: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            min_score: 5,
            top_n: 5,
        }
    }
}

/// Scan size and worker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScanParams {
    /// How many tickers from the head of the universe are scanned.
    pub max_tickers: usize,
    /// Tickers fetched and evaluated at the same time.
    pub concurrency: usize,
    /// Per-ticker retrieval budget; slower tickers are skipped.
    pub fetch_timeout_secs: u64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            max_tickers: 200,
            concurrency: 8,
            fetch_timeout_secs: 5,
        }
    }
}

impl ScanParams {
    /// [`Self::fetch_timeout_secs`] as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// One index-membership page and the table column holding its symbols.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSourceCfg {
    /// Page URL.
    pub url: String,
    /// Header text of the symbol column (e.g. "Symbol", "Ticker").
    pub column: String,
}

/// Universe sources, fallback and cache lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct UniverseParams {
    /// How long a fetched universe is reused.
    pub cache_ttl_secs: u64,
    /// Served when every source fails.
    pub fallback: Vec<String>,
    /// Index-membership pages merged into one universe.
    pub sources: Vec<IndexSourceCfg>,
}

impl Default for UniverseParams {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            fallback: ["AAPL", "MSFT", "NVDA", "AMD", "TSLA", "AMZN", "META", "GOOGL"]
                .into_iter()
                .map(String::from)
                .collect(),
            sources: vec![
                IndexSourceCfg {
                    url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".to_string(),
                    column: "Symbol".to_string(),
                },
                IndexSourceCfg {
                    url: "https://en.wikipedia.org/wiki/Nasdaq-100".to_string(),
                    column: "Ticker".to_string(),
                },
            ],
        }
    }
}

impl UniverseParams {
    /// [`Self::cache_ttl_secs`] as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Price-history provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderSettings {
    /// Chart API scheme + host.
    pub base_url: String,
    /// Outbound request budget.
    pub requests_per_second: u32,
    /// Split/dividend-adjust every price of a bar.
    pub auto_adjust: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_second: 10,
            auto_adjust: true,
        }
    }
}

impl ScannerConfig {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.benchmark.trim().is_empty() {
            bail!("benchmark symbol must not be empty");
        }
        if self.scoring.total() > u16::from(u8::MAX) {
            bail!("scoring weights sum to {}, above {}", self.scoring.total(), u8::MAX);
        }
        if self.selection.min_score > self.scoring.max_score() {
            bail!(
                "selection.min_score ({}) exceeds the maximum score ({})",
                self.selection.min_score,
                self.scoring.max_score()
            );
        }
        if self.selection.top_n == 0 {
            bail!("selection.top_n must be at least 1");
        }
        let ratio = self.pattern.contraction_ratio;
        if !(ratio.is_finite() && ratio > 0.0) {
            bail!("pattern.contraction_ratio must be a positive number, got {ratio}");
        }
        let ind = &self.indicators;
        if ind.rs_lookback == 0 || ind.ma_period == 0 {
            bail!("indicators.rs_lookback and indicators.ma_period must be at least 1");
        }
        let needed = ind.ma_period.max(ind.rs_lookback + 1).max(2);
        if ind.min_history < needed {
            bail!(
                "indicators.min_history ({}) must cover the indicator windows (at least {needed})",
                ind.min_history
            );
        }
        if !SCAN_SIZE_RANGE.contains(&self.scan.max_tickers) {
            bail!(
                "scan.max_tickers ({}) must be within {}..={}",
                self.scan.max_tickers,
                SCAN_SIZE_RANGE.start(),
                SCAN_SIZE_RANGE.end()
            );
        }
        if self.scan.concurrency == 0 {
            bail!("scan.concurrency must be at least 1");
        }
        if self.scan.fetch_timeout_secs == 0 {
            bail!("scan.fetch_timeout_secs must be at least 1");
        }
        if self.provider.requests_per_second == 0 {
            bail!("provider.requests_per_second must be at least 1");
        }
        Ok(())
    }

    /// Connection settings for the Yahoo chart provider.
    pub fn yahoo_config(&self) -> YahooChartConfig {
        YahooChartConfig {
            base_url: self.provider.base_url.clone(),
            timeout: self.scan.fetch_timeout(),
            requests_per_second: NonZeroU32::new(self.provider.requests_per_second)
                .unwrap_or(NonZeroU32::MIN),
            auto_adjust: self.provider.auto_adjust,
            ..YahooChartConfig::default()
        }
    }
}

/// Parse and validate a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<ScannerConfig> {
    let cfg: ScannerConfig = toml::from_str(toml_str).context("failed to parse scanner TOML")?;
    cfg.validate().context("invalid scanner configuration")?;
    Ok(cfg)
}

/// Read a configuration file from disk, parse, and validate it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<ScannerConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

/// Loads the explicit `path`, else the file named by [`CONFIG_ENV_VAR`], else defaults.
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<ScannerConfig> {
    if let Some(path) = path {
        return load_config_path(path);
    }
    match get_env_var_opt(CONFIG_ENV_VAR) {
        Some(from_env) => {
            debug!(path = %from_env, "loading config named by {CONFIG_ENV_VAR}");
            load_config_path(from_env)
        }
        None => Ok(ScannerConfig::default()),
    }
}
