//! Two-bar price-action criteria: where today's bar sits and how tight it is.

use market_data_ingestor::models::bar::Bar;
use serde::Serialize;

use crate::config::PatternParams;

/// Outcome of the two price-action criteria for one pair of bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PatternSignals {
    /// Today's whole range sits in the upper half of yesterday's.
    pub location: bool,
    /// Today's range contracted against yesterday's.
    pub contraction: bool,
}

/// "High and tight": today's low holds at or above yesterday's midpoint.
pub fn is_high_and_tight(today: &Bar, yesterday: &Bar) -> bool {
    today.low >= yesterday.midpoint()
}

/// Today's range is strictly below `ratio` times yesterday's range.
///
/// A flat yesterday (zero range) never counts as a contraction.
pub fn is_contracting(today: &Bar, yesterday: &Bar, ratio: f64) -> bool {
    today.range() < yesterday.range() * ratio
}

/// Evaluates both criteria for the two most recent bars.
pub fn evaluate_pattern(today: &Bar, yesterday: &Bar, params: &PatternParams) -> PatternSignals {
    PatternSignals {
        location: is_high_and_tight(today, yesterday),
        contraction: is_contracting(today, yesterday, params.contraction_ratio),
    }
}
