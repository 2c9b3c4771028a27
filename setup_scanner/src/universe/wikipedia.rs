//! Index constituents scraped from Wikipedia list pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{UniverseError, UniverseSource};
use crate::config::IndexSourceCfg;

const USER_AGENT: &str = "Mozilla/5.0";

/// Builds the HTTP client shared by every index page download.
pub fn http_client(timeout: Duration) -> Result<Client, UniverseError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(UniverseError::Client)
}

/// One index-membership page and the table column holding its symbols.
#[derive(Clone, Debug)]
pub struct WikipediaIndexSource {
    client: Client,
    url: String,
    column: String,
}

impl WikipediaIndexSource {
    pub fn new(client: Client, url: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            column: column.into(),
        }
    }

    pub fn from_config(client: Client, cfg: &IndexSourceCfg) -> Self {
        Self::new(client, &cfg.url, &cfg.column)
    }
}

#[async_trait]
impl UniverseSource for WikipediaIndexSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<String>, UniverseError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| UniverseError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UniverseError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|source| UniverseError::Request {
            url: self.url.clone(),
            source,
        })?;

        let symbols = symbols_from_html(&html, &self.column)?.ok_or_else(|| {
            UniverseError::ColumnNotFound {
                url: self.url.clone(),
                column: self.column.clone(),
            }
        })?;
        debug!(url = %self.url, count = symbols.len(), "index constituents parsed");
        Ok(symbols)
    }
}

fn selector(css: &str) -> Result<Selector, UniverseError> {
    Selector::parse(css).map_err(|e| UniverseError::Selector(format!("{css}: {e:?}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Reads `column` from the first table whose header row has it.
///
/// Returns `Ok(None)` when no table carries the column or the column is empty.
pub fn symbols_from_html(html: &str, column: &str) -> Result<Option<Vec<String>>, UniverseError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let header_sel = selector("th")?;
    let cell_sel = selector("th, td")?;

    for table in document.select(&table_sel) {
        let mut rows = table.select(&row_sel);
        let Some(header) = rows.by_ref().find(|row| row.select(&header_sel).next().is_some()) else {
            continue;
        };
        let Some(idx) = header
            .select(&cell_sel)
            .position(|cell| cell_text(cell).eq_ignore_ascii_case(column))
        else {
            continue;
        };

        let symbols: Vec<String> = rows
            .filter_map(|row| row.select(&cell_sel).nth(idx))
            .map(cell_text)
            .filter(|s| !s.is_empty())
            .collect();
        if !symbols.is_empty() {
            return Ok(Some(symbols));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    const SP500_PAGE: &str = r#"
        <html><body>
        <table class="infobox"><tr><td>Index facts</td></tr></table>
        <table class="wikitable" id="constituents">
          <tbody>
            <tr><th>Symbol</th><th>Security</th><th>GICS Sector</th></tr>
            <tr><td><a href="/x">MMM</a></td><td>3M</td><td>Industrials</td></tr>
            <tr><td>BRK.B</td><td>Berkshire Hathaway</td><td>Financials</td></tr>
            <tr><td> aapl </td><td>Apple Inc.</td><td>Information Technology</td></tr>
          </tbody>
        </table>
        <table class="wikitable">
          <tr><th>Date</th><th>Symbol</th></tr>
          <tr><td>2024-01-01</td><td>OLD</td></tr>
        </table>
        </body></html>
    "#;

    const NDX_PAGE: &str = r#"
        <table><tr><th>Year</th><th>Return</th></tr><tr><td>2023</td><td>54%</td></tr></table>
        <table>
          <tr><th>Company</th><th>Ticker</th></tr>
          <tr><td>Adobe Inc.</td><td>ADBE</td></tr>
          <tr><td>Apple Inc.</td><td>AAPL</td></tr>
        </table>
    "#;

    #[test]
    fn reads_first_table_with_column() {
        let symbols = symbols_from_html(SP500_PAGE, "Symbol").unwrap().unwrap();
        assert_eq!(symbols, vec!["MMM", "BRK.B", "aapl"]);

        let symbols = symbols_from_html(NDX_PAGE, "Ticker").unwrap().unwrap();
        assert_eq!(symbols, vec!["ADBE", "AAPL"]);
    }

    #[test]
    fn missing_column_is_none() {
        assert_eq!(symbols_from_html(NDX_PAGE, "Symbol").unwrap(), None);
        assert_eq!(symbols_from_html("<p>moved</p>", "Ticker").unwrap(), None);
    }

    #[tokio::test]
    async fn fetches_page_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/sp500"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SP500_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let client = http_client(Duration::from_secs(2)).unwrap();
        let source = WikipediaIndexSource::new(
            client,
            format!("{}/wiki/sp500", server.uri()),
            "Symbol",
        );
        let symbols = source.fetch().await.unwrap();
        assert_eq!(symbols.len(), 3);
    }

    #[tokio::test]
    async fn error_status_and_layout_change_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NDX_PAGE))
            .mount(&server)
            .await;

        let client = http_client(Duration::from_secs(2)).unwrap();

        let down = WikipediaIndexSource::new(client.clone(), format!("{}/down", server.uri()), "Ticker");
        let err = down.fetch().await.unwrap_err();
        assert!(matches!(err, UniverseError::Status { status: 503, .. }));

        let moved = WikipediaIndexSource::new(client, format!("{}/moved", server.uri()), "Symbol");
        let err = moved.fetch().await.unwrap_err();
        assert!(matches!(err, UniverseError::ColumnNotFound { .. }));
        assert!(err.to_string().contains("Symbol"));
    }
}
