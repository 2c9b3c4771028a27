use serde::{Deserialize, Serialize};

use crate::{
    models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Yahoo-specific parameters for a chart request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct YahooChartParams {
    /// Rescale open/high/low/close by `adjclose / close` so the whole bar is
    /// split- and dividend-adjusted. Defaults to the provider setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_adjust: Option<bool>,
    /// Include pre- and post-market data for intraday intervals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_pre_post: Option<bool>,
}

impl YahooChartParams {
    /// Picks the Yahoo parameters out of a universal request, if present.
    pub fn from_request(params: &BarsRequestParams) -> Option<&YahooChartParams> {
        match &params.provider_specific {
            ProviderParams::YahooChart(p) => Some(p),
            ProviderParams::None => None,
        }
    }
}

/// Maps a [`TimeFrame`] onto a Yahoo `interval` value.
pub fn interval_for(timeframe: &TimeFrame) -> Result<&'static str, ProviderError> {
    let interval = match (timeframe.unit, timeframe.amount) {
        (TimeFrameUnit::Minute, 1) => "1m",
        (TimeFrameUnit::Minute, 2) => "2m",
        (TimeFrameUnit::Minute, 5) => "5m",
        (TimeFrameUnit::Minute, 15) => "15m",
        (TimeFrameUnit::Minute, 30) => "30m",
        (TimeFrameUnit::Minute, 60) | (TimeFrameUnit::Hour, 1) => "1h",
        (TimeFrameUnit::Minute, 90) => "90m",
        (TimeFrameUnit::Day, 1) => "1d",
        (TimeFrameUnit::Day, 5) => "5d",
        (TimeFrameUnit::Week, 1) => "1wk",
        (TimeFrameUnit::Month, 1) => "1mo",
        (TimeFrameUnit::Month, 3) => "3mo",
        _ => {
            return ValidationSnafu {
                message: format!("Yahoo chart does not support a {timeframe} interval"),
            }
            .fail();
        }
    };
    Ok(interval)
}

/// Validates the request before any network traffic happens.
pub fn validate_request(params: &BarsRequestParams) -> Result<(), ProviderError> {
    interval_for(&params.timeframe)?;
    if params.symbols.is_empty() {
        return ValidationSnafu {
            message: "at least one symbol is required",
        }
        .fail();
    }
    if params.start >= params.end {
        return ValidationSnafu {
            message: format!("start ({}) must be before end ({})", params.start, params.end),
        }
        .fail();
    }
    Ok(())
}

/// Builds the query string for one symbol's chart request.
pub fn construct_params(params: &BarsRequestParams) -> Result<Vec<(String, String)>, ProviderError> {
    let interval = interval_for(&params.timeframe)?;
    let include_pre_post = YahooChartParams::from_request(params)
        .and_then(|p| p.include_pre_post)
        .unwrap_or(false);

    Ok(vec![
        ("period1".to_string(), params.start.timestamp().to_string()),
        ("period2".to_string(), params.end.timestamp().to_string()),
        ("interval".to_string(), interval.to_string()),
        ("includePrePost".to_string(), include_pre_post.to_string()),
        ("events".to_string(), "div|split".to_string()),
    ])
}
