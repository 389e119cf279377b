//! Stock quote lookups with per-symbol failure isolation

use crate::config::QuotesConfig;
use crate::models::{QuoteLine, QuoteOutcome, QuoteReport};
use crate::{DigestError, Result};
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

// Yahoo rejects requests without a browser-like agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Market-data provider seam
pub trait QuoteSource {
    /// Latest regular-market price, `Ok(None)` when the provider has none
    fn regular_market_price(&self, symbol: &str) -> Result<Option<f64>>;
}

/// Look up every symbol in order; a failing symbol never aborts the rest
#[instrument(skip(source))]
pub fn fetch_quotes<S: QuoteSource + ?Sized>(source: &S, symbols: &[String]) -> QuoteReport {
    let start_time = Instant::now();

    let report: QuoteReport = symbols
        .iter()
        .map(|symbol| {
            let outcome = match source.regular_market_price(symbol) {
                Ok(Some(price)) => QuoteOutcome::Price(price),
                Ok(None) => {
                    debug!("No price data for {}", symbol);
                    QuoteOutcome::NoData
                }
                Err(e) => {
                    warn!("Quote lookup for {} failed: {}", symbol, e);
                    QuoteOutcome::Failed(e.to_string())
                }
            };
            QuoteLine::new(symbol.as_str(), outcome)
        })
        .collect();

    info!(
        "Fetched {} quotes ({} failed) in {:.3}s",
        report.len(),
        report.failures(),
        start_time.elapsed().as_secs_f64()
    );

    report
}

/// Blocking Yahoo Finance chart client
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(config: &QuotesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl QuoteSource for YahooFinanceClient {
    fn regular_market_price(&self, symbol: &str) -> Result<Option<f64>> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url,
            urlencoding::encode(symbol)
        );
        debug!("Yahoo Finance request URL: {}", url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;

        match parse_chart_response(&body) {
            Ok(price) => Ok(price),
            // Unknown symbols come back as 404 with a JSON error body, which
            // the parser already turned into a readable message.
            Err(e @ DigestError::Quote { .. }) => Err(e),
            Err(_) if !status.is_success() => {
                Err(DigestError::quote(format!("HTTP {status}")))
            }
            Err(e) => Err(e),
        }
    }
}

/// Decode a `/v8/finance/chart` body into the regular-market price
pub fn parse_chart_response(body: &str) -> Result<Option<f64>> {
    let response: yahoo::ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        return Err(DigestError::quote(
            error.description.unwrap_or(error.code),
        ));
    }

    Ok(response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|result| result.meta.regular_market_price))
}

/// Yahoo Finance API response structures
mod yahoo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ChartResponse {
        pub chart: Chart,
    }

    #[derive(Debug, Deserialize)]
    pub struct Chart {
        pub result: Option<Vec<ChartResult>>,
        pub error: Option<ChartError>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ChartResult {
        pub meta: Meta,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Meta {
        pub regular_market_price: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ChartError {
        pub code: String,
        pub description: Option<String>,
    }
}
