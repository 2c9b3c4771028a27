use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, header};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, DecodeSnafu, InvalidHeaderSnafu, ProviderError,
        ProviderInitError, ReqwestSnafu,
        yahoo_chart::{
            params::{YahooChartParams, construct_params, validate_request},
            response::ChartEnvelope,
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Connection settings for [`YahooChartProvider`].
#[derive(Clone, Debug)]
pub struct YahooChartConfig {
    /// Scheme + host, without a trailing slash. Tests point this at a mock server.
    pub base_url: String,
    /// Upper bound for a single HTTP request, connect included.
    pub timeout: Duration,
    /// Outbound request budget shared by every caller of the provider.
    pub requests_per_second: NonZeroU32,
    pub user_agent: String,
    /// Default for [`YahooChartParams::auto_adjust`] when a request leaves it unset.
    pub auto_adjust: bool,
}

impl Default for YahooChartConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
            requests_per_second: nonzero!(10u32),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            auto_adjust: true,
        }
    }
}

pub struct YahooChartProvider {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
    auto_adjust: bool,
}

impl YahooChartProvider {
    pub fn with_config(config: YahooChartConfig) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent).context(InvalidHeaderSnafu)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_second(config.requests_per_second)),
            auto_adjust: config.auto_adjust,
        })
    }

    async fn fetch_symbol(
        &self,
        symbol: &str,
        params: &BarsRequestParams,
        query: &[(String, String)],
        auto_adjust: bool,
    ) -> Result<Option<BarSeries>, ProviderError> {
        self.limiter.until_ready().await;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = response.text().await.context(ReqwestSnafu)?;

        // Yahoo reports unknown symbols with a 404 that still carries a chart
        // error payload, so the body is inspected before the status.
        let envelope: ChartEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return ApiSnafu {
                    message: format!("{symbol}: HTTP {status}"),
                }
                .fail();
            }
            Err(e) => return Err(e).context(DecodeSnafu),
        };

        if let Some(err) = envelope.chart.error {
            return ApiSnafu {
                message: format!("{symbol}: {err}"),
            }
            .fail();
        }

        let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
            debug!(symbol, "chart response carried no result");
            return Ok(None);
        };

        let bars = result.into_bars(auto_adjust);
        debug!(symbol, bars = bars.len(), "fetched chart");
        Ok(Some(BarSeries::new(symbol, params.timeframe, bars)))
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        validate_request(&params)?;

        let query = construct_params(&params)?;
        let auto_adjust = YahooChartParams::from_request(&params)
            .and_then(|p| p.auto_adjust)
            .unwrap_or(self.auto_adjust);

        let mut result = Vec::with_capacity(params.symbols.len());
        for symbol in &params.symbols {
            if let Some(series) = self
                .fetch_symbol(symbol, &params, &query, auto_adjust)
                .await?
            {
                result.push(series);
            }
        }

        Ok(result)
    }
}
