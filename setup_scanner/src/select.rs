//! Ranking of qualifying results and truncation to the top N.

use market_data_ingestor::models::bar::Bar;
use serde::Serialize;

use crate::{config::SelectionParams, evaluate::EvaluationResult, report::chart_url, score::Signal};

/// One entry of the final ranking.
#[derive(Debug, Clone, Serialize)]
pub struct RankedSetup {
    /// 1-based position.
    pub rank: usize,
    /// The scored ticker.
    #[serde(flatten)]
    pub result: EvaluationResult,
    /// Chart page for manual review.
    pub chart_url: String,
}

impl RankedSetup {
    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.result.symbol
    }

    /// Satisfied criteria in evaluation order.
    pub fn signals(&self) -> &[Signal] {
        &self.result.signals
    }

    /// The trailing `n` bars of the evaluated history.
    pub fn recent_bars(&self, n: usize) -> &[Bar] {
        self.result.series.tail(n)
    }
}

/// Outcome of a selection: a non-empty ranking, or an explicit "nothing found".
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "setups", rename_all = "snake_case")]
pub enum Selection {
    /// Between 1 and `top_n` setups, best first.
    Ranked(Vec<RankedSetup>),
    /// No ticker reached the threshold.
    NoSetups,
}

impl Selection {
    /// The ranked setups; empty for [`Selection::NoSetups`].
    pub fn setups(&self) -> &[RankedSetup] {
        match self {
            Selection::Ranked(setups) => setups,
            Selection::NoSetups => &[],
        }
    }

    /// `true` for [`Selection::NoSetups`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::NoSetups)
    }
}

/// Orders results by score, then relative strength, both descending.
///
/// The sort is stable: results with equal score and equal relative strength
/// keep their input order.
pub fn rank(results: &mut [EvaluationResult]) {
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.relative_strength.total_cmp(&a.relative_strength))
    });
}

/// Filters to the threshold, ranks, and keeps the best `top_n`.
pub fn select_top(results: Vec<EvaluationResult>, params: &SelectionParams) -> Selection {
    let mut qualifying: Vec<EvaluationResult> = results
        .into_iter()
        .filter(|r| r.qualifies(params.min_score))
        .collect();
    if qualifying.is_empty() {
        return Selection::NoSetups;
    }

    rank(&mut qualifying);
    qualifying.truncate(params.top_n);

    Selection::Ranked(
        qualifying
            .into_iter()
            .enumerate()
            .map(|(i, result)| RankedSetup {
                rank: i + 1,
                chart_url: chart_url(&result.symbol),
                result,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use market_data_ingestor::models::{bar_series::BarSeries, timeframe::TimeFrame};
    use proptest::prelude::*;

    use super::*;

    fn result(symbol: &str, score: u8, rs: f64) -> EvaluationResult {
        EvaluationResult {
            symbol: symbol.to_string(),
            score,
            price: 10.0,
            relative_strength: rs,
            trend_average: 9.0,
            signals: vec![],
            series: BarSeries::new(symbol, TimeFrame::day(), vec![]),
        }
    }

    fn symbols(selection: &Selection) -> Vec<&str> {
        selection.setups().iter().map(|s| s.symbol()).collect()
    }

    #[test]
    fn score_then_relative_strength() {
        let results = vec![
            result("A", 5, 0.10),
            result("B", 8, 0.01),
            result("C", 6, 0.02),
            result("D", 6, 0.05),
        ];
        let selection = select_top(results, &SelectionParams::default());
        assert_eq!(symbols(&selection), vec!["B", "D", "C", "A"]);
        assert_eq!(selection.setups()[0].rank, 1);
        assert_eq!(selection.setups()[3].rank, 4);
    }

    #[test]
    fn threshold_is_inclusive_and_filters() {
        let results = vec![result("LOW", 4, 0.9), result("EDGE", 5, 0.0)];
        let selection = select_top(results, &SelectionParams::default());
        assert_eq!(symbols(&selection), vec!["EDGE"]);
    }

    #[test]
    fn nothing_qualifying_is_explicit() {
        let selection = select_top(vec![result("X", 3, 0.2)], &SelectionParams::default());
        assert!(matches!(selection, Selection::NoSetups));
        assert!(selection.is_empty());

        let selection = select_top(vec![], &SelectionParams::default());
        assert!(selection.is_empty());
    }

    #[test]
    fn exact_ties_keep_input_order() {
        let results = vec![
            result("FIRST", 7, 0.03),
            result("SECOND", 7, 0.03),
            result("THIRD", 7, 0.03),
        ];
        let selection = select_top(results, &SelectionParams::default());
        assert_eq!(symbols(&selection), vec!["FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn no_setups_serializes_with_status() {
        let json = serde_json::to_value(Selection::NoSetups).unwrap();
        assert_eq!(json, serde_json::json!({"status": "no_setups"}));
    }

    proptest! {
        #[test]
        fn at_most_top_n_and_sorted(
            entries in proptest::collection::vec((0u8..=8, -0.5f64..0.5), 0..40),
        ) {
            let params = SelectionParams::default();
            let results: Vec<_> = entries
                .iter()
                .enumerate()
                .map(|(i, (score, rs))| result(&format!("T{i}"), *score, *rs))
                .collect();
            let qualifying = entries.iter().filter(|(s, _)| *s >= params.min_score).count();

            let selection = select_top(results, &params);
            let setups = selection.setups();

            prop_assert_eq!(setups.len(), qualifying.min(params.top_n));
            prop_assert_eq!(selection.is_empty(), qualifying == 0);
            for pair in setups.windows(2) {
                let (a, b) = (&pair[0].result, &pair[1].result);
                prop_assert!(a.score > b.score
                    || (a.score == b.score && a.relative_strength >= b.relative_strength));
            }
        }
    }
}
