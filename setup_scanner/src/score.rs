//! Weighted aggregation of the four criteria into a score and ordered labels.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::ScoringWeights;

/// A satisfied criterion, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Today's bar sits in the upper half of yesterday's.
    BabyBarUpperHalf,
    /// Today's range contracted against yesterday's.
    TightRestingBar,
    /// Outperformed the benchmark.
    StrongerThanMarket,
    /// Closed above the moving average.
    AboveTrendAverage,
}

impl Signal {
    /// Every signal, in evaluation order.
    pub const ALL: [Signal; 4] = [
        Signal::BabyBarUpperHalf,
        Signal::TightRestingBar,
        Signal::StrongerThanMarket,
        Signal::AboveTrendAverage,
    ];

    /// Human-readable label shown next to a setup.
    pub fn label(self) -> &'static str {
        match self {
            Signal::BabyBarUpperHalf => "Baby Bar in upper 50%",
            Signal::TightRestingBar => "Tight Resting Bar",
            Signal::StrongerThanMarket => "Stronger than Market",
            Signal::AboveTrendAverage => "Above Trend Average",
        }
    }

    /// Points this signal contributes under `weights`.
    pub fn weight(self, weights: &ScoringWeights) -> u8 {
        match self {
            Signal::BabyBarUpperHalf => weights.location,
            Signal::TightRestingBar => weights.contraction,
            Signal::StrongerThanMarket => weights.relative_strength,
            Signal::AboveTrendAverage => weights.trend,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Raw boolean outcome of every criterion for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Criteria {
    /// Location criterion.
    pub location: bool,
    /// Contraction criterion.
    pub contraction: bool,
    /// Relative-strength criterion.
    pub relative_strength: bool,
    /// Trend criterion.
    pub trend: bool,
}

impl Criteria {
    fn holds(&self, signal: Signal) -> bool {
        match signal {
            Signal::BabyBarUpperHalf => self.location,
            Signal::TightRestingBar => self.contraction,
            Signal::StrongerThanMarket => self.relative_strength,
            Signal::AboveTrendAverage => self.trend,
        }
    }
}

/// Score plus the signals that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scorecard {
    /// Sum of the weights of `signals`.
    pub score: u8,
    /// Satisfied criteria in evaluation order.
    pub signals: Vec<Signal>,
}

impl Scorecard {
    /// Labels of the satisfied criteria, in evaluation order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.signals.iter().map(|s| s.label()).collect()
    }
}

/// Sums the weights of the satisfied criteria in fixed order.
pub fn aggregate(criteria: &Criteria, weights: &ScoringWeights) -> Scorecard {
    let signals: Vec<Signal> = Signal::ALL
        .into_iter()
        .filter(|s| criteria.holds(*s))
        .collect();
    let score = signals
        .iter()
        .fold(0u8, |acc, s| acc.saturating_add(s.weight(weights)));
    Scorecard { score, signals }
}
