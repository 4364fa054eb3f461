use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use stability_core::{OhlcBar, QuoteFeed, StabilityError};

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Client for the Yahoo Finance v8 chart API. No retries here: a failed
/// or timed-out request is a per-symbol failure the coordinator handles
/// with its own fallback policy.
#[derive(Clone)]
pub struct YahooChartClient {
    base_url: String,
    client: Client,
}

impl YahooChartClient {
    pub fn new(timeout: Duration) -> Self {
        let base_url =
            std::env::var("QUOTE_FEED_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; stability-pipeline)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { base_url, client }
    }

    async fn fetch_chart(&self, symbol: &str, period: &str) -> Result<ChartResult, StabilityError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", period), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| StabilityError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StabilityError::UpstreamUnavailable(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| StabilityError::UpstreamUnavailable(e.to_string()))?;

        if let Some(err) = chart.chart.error {
            return Err(StabilityError::UpstreamUnavailable(format!(
                "{}: {}",
                err.code, err.description
            )));
        }

        chart
            .chart
            .result
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| {
                StabilityError::UpstreamUnavailable(format!("no chart result for {}", symbol))
            })
    }
}

#[async_trait]
impl QuoteFeed for YahooChartClient {
    async fn get_history(
        &self,
        symbol: &str,
        period: &str,
    ) -> Result<Vec<OhlcBar>, StabilityError> {
        let result = self.fetch_chart(symbol, period).await?;
        let bars = bars_from_chart(&result);

        if bars.is_empty() {
            return Err(StabilityError::UpstreamUnavailable(format!(
                "empty history for {}",
                symbol
            )));
        }

        tracing::debug!("Fetched {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }
}

/// Convert a chart result into bars, skipping rows where the feed
/// returned nulls (Yahoo pads holidays and halts that way).
fn bars_from_chart(result: &ChartResult) -> Vec<OhlcBar> {
    let quote = match result.indicators.quote.first() {
        Some(q) => q,
        None => return Vec::new(),
    };

    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            Some(OhlcBar {
                date,
                open: *quote.open.get(i)?.as_ref()?,
                high: *quote.high.get(i)?.as_ref()?,
                low: *quote.low.get(i)?.as_ref()?,
                close: *quote.close.get(i)?.as_ref()?,
                volume: quote.volume.get(i).and_then(|v| *v).unwrap_or(0.0),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
