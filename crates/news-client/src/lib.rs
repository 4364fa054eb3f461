use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use stability_core::{NewsFeed, NewsHeadline, StabilityError};

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// News search client. The upstream is treated as unreliable: any
/// failure, and the empty-result case, degrade to a single deterministic
/// placeholder headline so downstream sentiment always has input.
#[derive(Clone)]
pub struct NewsClient {
    base_url: String,
    client: Client,
}

impl NewsClient {
    pub fn new(timeout: Duration) -> Self {
        let base_url =
            std::env::var("NEWS_FEED_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; stability-pipeline)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { base_url, client }
    }

    async fn try_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsHeadline>, StabilityError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let count = max_results.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("newsCount", &count), ("quotesCount", "0")])
            .send()
            .await
            .map_err(|e| StabilityError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StabilityError::UpstreamUnavailable(format!(
                "HTTP {} from news feed",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| StabilityError::UpstreamUnavailable(e.to_string()))?;

        Ok(body
            .news
            .into_iter()
            .take(max_results)
            .map(|item| NewsHeadline {
                title: item.title,
                link: item.link.unwrap_or_else(|| "#".to_string()),
                source: item.publisher.unwrap_or_else(|| "Unknown".to_string()),
                published: item
                    .provider_publish_time
                    .and_then(|ts| DateTime::from_timestamp(ts, 0))
                    .unwrap_or_else(Utc::now),
            })
            .collect())
    }
}

/// Deterministic item returned when the feed yields nothing usable
pub fn placeholder_headline() -> NewsHeadline {
    NewsHeadline {
        title: "Sample: RBI announces monetary policy review".to_string(),
        link: "#".to_string(),
        source: "Sample Source".to_string(),
        published: Utc::now(),
    }
}

#[async_trait]
impl NewsFeed for NewsClient {
    async fn search(&self, query: &str, max_results: usize) -> Vec<NewsHeadline> {
        match self.try_search(query, max_results).await {
            Ok(headlines) if !headlines.is_empty() => headlines,
            Ok(_) => {
                tracing::warn!("News feed returned no articles for '{}'", query);
                vec![placeholder_headline()]
            }
            Err(e) => {
                tracing::warn!("News fetch failed for '{}': {}", query, e);
                vec![placeholder_headline()]
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
struct SearchNewsItem {
    title: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default, rename = "providerPublishTime")]
    provider_publish_time: Option<i64>,
}
