use serde::{Deserialize, Serialize};

/// Broad asset class of a requested symbol, used by providers for routing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    UsEquity,
    /// Exchange-traded funds such as `SPY`, typically used as benchmarks.
    Etf,
    Index,
}
