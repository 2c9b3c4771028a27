use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::bar::Bar;

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Deserialize, Debug)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(d) => write!(f, "{}: {}", self.code, d),
            None => f.write_str(&self.code),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
pub struct ChartMeta {
    pub symbol: String,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

// Yahoo emits `null` for sessions without trades, hence the options.
#[derive(Deserialize, Debug, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

impl ChartResult {
    /// Converts the column-oriented payload into chronological [`Bar`]s.
    ///
    /// Rows with a missing open, high, low or close are dropped. With
    /// `auto_adjust`, prices are rescaled by `adjclose / close` when an
    /// adjusted close is available for the row.
    pub fn into_bars(self, auto_adjust: bool) -> Vec<Bar> {
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let adjclose = self
            .indicators
            .adjclose
            .into_iter()
            .next()
            .unwrap_or_default()
            .adjclose;

        let mut bars: Vec<Bar> = self
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let timestamp = DateTime::<Utc>::from_timestamp(ts, 0)?;
                let (open, high, low, close) = (
                    at(&quote.open, i)?,
                    at(&quote.high, i)?,
                    at(&quote.low, i)?,
                    at(&quote.close, i)?,
                );
                let factor = match at(&adjclose, i) {
                    Some(adj) if auto_adjust && close != 0.0 => adj / close,
                    _ => 1.0,
                };
                Some(Bar {
                    timestamp,
                    open: open * factor,
                    high: high * factor,
                    low: low * factor,
                    close: close * factor,
                    volume: at(&quote.volume, i).unwrap_or(0.0),
                })
            })
            .collect();

        bars.sort_by_key(|b| b.timestamp);
        bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "currency": "USD"},
                "timestamp": [1735828200, 1735914600, 1736001000],
                "indicators": {
                    "quote": [{
                        "open":   [100.0, null, 104.0],
                        "high":   [110.0, 111.0, 106.0],
                        "low":    [100.0, 101.0, 103.0],
                        "close":  [108.0, 109.0, 105.0],
                        "volume": [1000, 2000, null]
                    }],
                    "adjclose": [{"adjclose": [54.0, 54.5, 52.5]}]
                }
            }],
            "error": null
        }
    }"#;

    fn parse() -> ChartResult {
        let envelope: ChartEnvelope = serde_json::from_str(BODY).unwrap();
        envelope.chart.result.unwrap().into_iter().next().unwrap()
    }

    #[test]
    fn drops_rows_with_missing_prices() {
        let bars = parse().into_bars(false);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 108.0);
        assert_eq!(bars[1].open, 104.0);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn auto_adjust_rescales_every_price() {
        let bars = parse().into_bars(true);
        // adjclose / close = 0.5 on both remaining rows
        assert_eq!(bars[0].high, 55.0);
        assert_eq!(bars[0].low, 50.0);
        assert_eq!(bars[0].close, 54.0);
        assert_eq!(bars[1].open, 52.0);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn error_payload_parses() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.chart.result.is_none());
        let err = envelope.chart.error.unwrap();
        assert_eq!(err.to_string(), "Not Found: No data found, symbol may be delisted");
    }
}
