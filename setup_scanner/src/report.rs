//! Terminal and JSON presentation of a scan.

use std::fmt::Write as _;

use market_data_ingestor::models::bar::Bar;

use crate::{
    evaluate::EvaluationResult,
    select::{RankedSetup, Selection},
    session::{ScanOutcome, ScanSummary},
};

/// Message shown when no ticker reached the threshold.
pub const NO_SETUPS_MESSAGE: &str = "No high & tight setups found";

const CHART_BASE_URL: &str = "https://www.tradingview.com/chart/?symbol=";

/// Layout of the text report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Trailing bars drawn per setup; 0 disables the chart.
    pub candle_bars: usize,
    /// Rows of the chart.
    pub candle_height: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            candle_bars: 30,
            candle_height: 10,
        }
    }
}

/// Chart page for `symbol`.
pub fn chart_url(symbol: &str) -> String {
    format!("{CHART_BASE_URL}{symbol}")
}

/// ASCII candlestick chart, one column per bar, oldest on the left.
///
/// Bodies are `#` for bars closing at or above their open and `=` otherwise;
/// wicks are `|`. Trailing spaces are trimmed from every row.
pub fn render_candles(bars: &[Bar], height: usize) -> String {
    if bars.is_empty() || height == 0 {
        return String::new();
    }
    let lo = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let hi = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    let top = height - 1;
    let row_of = |price: f64| -> usize {
        if span <= 0.0 {
            return top / 2;
        }
        (((price - lo) / span) * top as f64).round().clamp(0.0, top as f64) as usize
    };

    let columns: Vec<[usize; 4]> = bars
        .iter()
        .map(|b| {
            [
                row_of(b.low),
                row_of(b.open.min(b.close)),
                row_of(b.open.max(b.close)),
                row_of(b.high),
            ]
        })
        .collect();

    let mut lines = Vec::with_capacity(height);
    for row in (0..height).rev() {
        let line: String = bars
            .iter()
            .zip(&columns)
            .map(|(bar, [wick_lo, body_lo, body_hi, wick_hi])| {
                if (*body_lo..=*body_hi).contains(&row) {
                    if bar.is_bullish() { '#' } else { '=' }
                } else if (*wick_lo..=*wick_hi).contains(&row) {
                    '|'
                } else {
                    ' '
                }
            })
            .collect();
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// One scored ticker as a text block, chart included when enabled.
pub fn render_evaluation(result: &EvaluationResult, max_score: u8, opts: &ReportOptions) -> String {
    let mut out = format!(
        "{}  score {}/{}  close {:.2}  RS {:+.2}%\n",
        result.symbol,
        result.score,
        max_score,
        result.price,
        result.relative_strength * 100.0
    );
    let _ = writeln!(out, "   {}", result.labels().join(", "));
    let _ = writeln!(out, "   {}", chart_url(&result.symbol));

    if opts.candle_bars > 0 {
        let chart = render_candles(result.series.tail(opts.candle_bars), opts.candle_height);
        for line in chart.lines() {
            let _ = writeln!(out, "   {line}");
        }
    }
    out
}

/// One ranked setup: its rank followed by [`render_evaluation`].
pub fn render_setup(setup: &RankedSetup, max_score: u8, opts: &ReportOptions) -> String {
    format!("#{} {}", setup.rank, render_evaluation(&setup.result, max_score, opts))
}

/// The whole selection, best first.
pub fn render_selection(selection: &Selection, max_score: u8, opts: &ReportOptions) -> String {
    match selection {
        Selection::NoSetups => format!("{NO_SETUPS_MESSAGE}\n"),
        Selection::Ranked(setups) => setups
            .iter()
            .map(|s| render_setup(s, max_score, opts))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// One line of counts.
pub fn render_summary(summary: &ScanSummary) -> String {
    let skipped: usize = summary.skipped.values().sum();
    let mut line = format!(
        "scanned {} of {} tickers: {} qualifying, {} below threshold, {} skipped",
        summary.processed, summary.universe_size, summary.qualifying, summary.below_threshold, skipped
    );
    if skipped > 0 {
        let kinds: Vec<String> = summary
            .skipped
            .iter()
            .map(|(kind, n)| format!("{kind}={n}"))
            .collect();
        let _ = write!(line, " ({})", kinds.join(", "));
    }
    if summary.cancelled {
        let _ = write!(line, "; cancelled after {} of {}", summary.processed, summary.scanned);
    }
    line
}

/// Full text report: benchmark line, selection, summary.
pub fn render_outcome(outcome: &ScanOutcome, opts: &ReportOptions) -> String {
    format!(
        "Benchmark {} {:+.2}%\n\n{}\n{}\n",
        outcome.benchmark.symbol,
        outcome.benchmark.change * 100.0,
        render_selection(&outcome.selection, outcome.max_score, opts),
        render_summary(&outcome.summary)
    )
}

/// Pretty-printed JSON of the outcome.
pub fn to_json(outcome: &ScanOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use market_data_ingestor::models::{bar_series::BarSeries, timeframe::TimeFrame};

    use super::*;
    use crate::score::Signal;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 3, 21, 0, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 10.0,
        }
    }

    fn setup() -> RankedSetup {
        RankedSetup {
            rank: 1,
            chart_url: chart_url("NVDA"),
            result: EvaluationResult {
                symbol: "NVDA".into(),
                score: 8,
                price: 106.0,
                relative_strength: 0.06,
                trend_average: 100.28,
                signals: Signal::ALL.to_vec(),
                series: BarSeries::new(
                    "NVDA",
                    TimeFrame::day(),
                    vec![
                        bar(10.0, 13.0, 9.0, 12.0),
                        bar(12.0, 12.5, 10.0, 11.0),
                        bar(11.0, 14.0, 11.0, 13.0),
                    ],
                ),
            },
        }
    }

    #[test]
    fn chart_link() {
        assert_eq!(chart_url("BRK-B"), "https://www.tradingview.com/chart/?symbol=BRK-B");
    }

    #[test]
    fn candles_mark_bodies_and_wicks() {
        let s = setup();
        let chart = render_candles(s.recent_bars(30), 5);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines, vec!["  |", "||#", "#=#", "#|", "|"]);
    }

    #[test]
    fn flat_bars_and_empty_input() {
        let flat = [bar(5.0, 5.0, 5.0, 5.0); 3];
        let chart = render_candles(&flat, 4);
        assert_eq!(chart.lines().filter(|l| l.is_empty()).count(), 3);
        assert!(chart.contains("###"));
        assert_eq!(render_candles(&[], 10), "");
    }

    #[test]
    fn setup_block() {
        let opts = ReportOptions {
            candle_bars: 0,
            ..Default::default()
        };
        insta::assert_snapshot!(render_setup(&setup(), 8, &opts), @r"
        #1 NVDA  score 8/8  close 106.00  RS +6.00%
           Baby Bar in upper 50%, Tight Resting Bar, Stronger than Market, Above Trend Average
           https://www.tradingview.com/chart/?symbol=NVDA
        ");
    }

    #[test]
    fn setup_block_includes_chart() {
        let text = render_setup(&setup(), 8, &ReportOptions::default());
        assert_eq!(text.lines().count(), 3 + 10);
        assert!(text.contains("#=#"));
    }

    #[test]
    fn no_setups_message() {
        let text = render_selection(&Selection::NoSetups, 8, &ReportOptions::default());
        assert_eq!(text.trim_end(), "No high & tight setups found");
    }

    #[test]
    fn summary_line() {
        let summary = ScanSummary {
            universe_size: 503,
            scanned: 200,
            processed: 120,
            qualifying: 3,
            below_threshold: 110,
            skipped: BTreeMap::from([("no_data", 2), ("timeout", 5)]),
            cancelled: true,
        };
        insta::assert_snapshot!(
            render_summary(&summary),
            @"scanned 120 of 503 tickers: 3 qualifying, 110 below threshold, 7 skipped (no_data=2, timeout=5); cancelled after 120 of 200"
        );
    }

    #[test]
    fn ranked_setup_json() {
        insta::assert_json_snapshot!(setup(), @r#"
        {
          "rank": 1,
          "symbol": "NVDA",
          "score": 8,
          "price": 106.0,
          "relative_strength": 0.06,
          "trend_average": 100.28,
          "signals": [
            "Baby Bar in upper 50%",
            "Tight Resting Bar",
            "Stronger than Market",
            "Above Trend Average"
          ],
          "chart_url": "https://www.tradingview.com/chart/?symbol=NVDA"
        }
        "#);
    }
}
