use std::time::Duration;

use chrono::{TimeZone, Utc};
use market_data_ingestor::{
    models::request_params::{BarsRequestParams, HistoryPeriod, ProviderParams},
    providers::{
        DataProvider, ProviderError,
        yahoo_chart::{YahooChartConfig, YahooChartParams, YahooChartProvider},
    },
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const AAPL_BODY: &str = r#"{
    "chart": {
        "result": [{
            "meta": {"symbol": "AAPL"},
            "timestamp": [1735828200, 1735914600],
            "indicators": {
                "quote": [{
                    "open":   [102.0, 105.0],
                    "high":   [110.0, 106.0],
                    "low":    [100.0, 105.0],
                    "close":  [108.0, 106.0],
                    "volume": [1500, 900]
                }],
                "adjclose": [{"adjclose": [108.0, 106.0]}]
            }
        }],
        "error": null
    }
}"#;

fn provider_for(server: &MockServer) -> YahooChartProvider {
    YahooChartProvider::with_config(YahooChartConfig {
        base_url: server.uri(),
        timeout: Duration::from_millis(500),
        ..Default::default()
    })
    .expect("Failed to create YahooChartProvider")
}

fn request(symbol: &str) -> BarsRequestParams {
    let now = Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap();
    BarsRequestParams::daily_history(symbol, HistoryPeriod::OneYear, now)
}

#[tokio::test]
async fn test_yahoo_provider_fetch_bars() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider_for(&server).fetch_bars(request("AAPL")).await;
    assert!(result.is_ok(), "fetch_bars returned an error: {:?}", result.err());

    let series = result.unwrap();
    assert_eq!(series.len(), 1, "Expected 1 BarSeries for AAPL");

    let aapl = &series[0];
    assert_eq!(aapl.symbol, "AAPL");
    assert_eq!(aapl.len(), 2);
    assert!(aapl.bars[0].timestamp < aapl.bars[1].timestamp);
    let (today, yesterday) = aapl.last_two().unwrap();
    assert_eq!(today.low, 105.0);
    assert_eq!(yesterday.high, 110.0);
}

#[tokio::test]
async fn test_unknown_symbol_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/ZZZZ"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        ))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .fetch_bars(request("ZZZZ"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Api { .. }));
    assert!(err.to_string().contains("symbol may be delisted"));
}

#[tokio::test]
async fn test_non_json_failure_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .fetch_bars(request("MSFT"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_slow_response_hits_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(AAPL_BODY)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .fetch_bars(request("AAPL"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Reqwest { .. }));
}

#[tokio::test]
async fn test_request_can_disable_adjustment() {
    let server = MockServer::start().await;
    let body = AAPL_BODY.replace(r#"[108.0, 106.0]}"#, r#"[54.0, 53.0]}"#);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = provider_for(&server);

    let adjusted = provider.fetch_bars(request("AAPL")).await.unwrap();
    assert_eq!(adjusted[0].bars[0].high, 55.0);

    let mut raw_request = request("AAPL");
    raw_request.provider_specific = ProviderParams::YahooChart(YahooChartParams {
        auto_adjust: Some(false),
        ..Default::default()
    });
    let raw = provider.fetch_bars(raw_request).await.unwrap();
    assert_eq!(raw[0].bars[0].high, 110.0);
}
