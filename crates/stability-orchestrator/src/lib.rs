use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use forecast_engine::{normalize_forecast_score, summarize, synthetic, ForecastEngine};
use news_client::NewsClient;
use quote_client::YahooChartClient;
use sentiment_engine::{normalize_sentiment_score, SentimentEngine};
use stability_core::{
    AggregateSentiment, ForecastPoint, ForecastSummary, MarketSnapshot, NewsFeed, PipelineConfig,
    QuoteFeed, SentimentVerdict, StabilityError, StabilityResult,
};
use stability_score::{economic_indicators_score, StabilityCalculator};

pub mod acquisition;
pub mod sample;

#[cfg(test)]
mod tests;

const MARKET_SUBSCORE: &str = "market";
const SENTIMENT_SUBSCORE: &str = "sentiment";

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// Process-wide pipeline handle. Owns the upstream clients, the
/// train-once forecaster, the sentiment engine, the calculator, and
/// every cache; request handlers get this injected instead of touching
/// shared globals.
pub struct StabilityOrchestrator {
    config: PipelineConfig,
    quote_feed: Arc<dyn QuoteFeed>,
    news_feed: Arc<dyn NewsFeed>,
    forecaster: ForecastEngine,
    sentiment: SentimentEngine,
    calculator: StabilityCalculator,
    /// Single snapshot slot, replaced wholesale on each live cycle
    snapshot_slot: RwLock<Option<MarketSnapshot>>,
    /// Normalized [0,1] sub-scores keyed "market" / "sentiment"
    subscores: DashMap<&'static str, CacheEntry<f64>>,
    refresh_in_flight: AtomicBool,
}

/// Forecast operation result
#[derive(Debug, Clone, Serialize)]
pub struct ForecastOutcome {
    pub points: Vec<ForecastPoint>,
    pub summary: ForecastSummary,
    /// Normalized forecast score on the 0-100 scale
    pub forecast_score: f64,
    pub current_value: f64,
    pub model: String,
}

/// One analyzed headline
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSentiment {
    pub title: String,
    pub source: String,
    pub link: String,
    pub sentiment: SentimentVerdict,
}

/// Sentiment operation result
#[derive(Debug, Clone, Serialize)]
pub struct SentimentOutcome {
    /// Normalized sentiment score on the 0-100 scale
    pub sentiment_score: f64,
    pub aggregate: AggregateSentiment,
    pub articles: Vec<ArticleSentiment>,
}

/// Stability operation result
#[derive(Debug, Clone, Serialize)]
pub struct StabilityOutcome {
    #[serde(flatten)]
    pub result: StabilityResult,
    /// False when stale/missing sub-scores forced the neutral defaults
    pub from_cached_subscores: bool,
    pub timestamp: DateTime<Utc>,
}

impl StabilityOrchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        let fetch_timeout = Duration::from_secs(config.fetch_timeout_secs);
        let quote_feed: Arc<dyn QuoteFeed> = Arc::new(YahooChartClient::new(fetch_timeout));
        let news_feed: Arc<dyn NewsFeed> = Arc::new(NewsClient::new(fetch_timeout));
        Self::with_feeds(config, quote_feed, news_feed)
    }

    pub fn with_feeds(
        config: PipelineConfig,
        quote_feed: Arc<dyn QuoteFeed>,
        news_feed: Arc<dyn NewsFeed>,
    ) -> Self {
        Self {
            forecaster: ForecastEngine::new(config.clone()),
            sentiment: SentimentEngine::new(),
            calculator: StabilityCalculator::new(&config),
            snapshot_slot: RwLock::new(None),
            subscores: DashMap::new(),
            refresh_in_flight: AtomicBool::new(false),
            quote_feed,
            news_feed,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Acquire (or serve from cache) the market snapshot. Expiry is
    /// purely time-based; sample snapshots are never memoized.
    pub async fn get_market_snapshot(&self) -> MarketSnapshot {
        {
            let slot = self.snapshot_slot.read().await;
            if let Some(snapshot) = slot.as_ref() {
                if self.is_fresh(snapshot.fetched_at, self.config.market_ttl_secs) {
                    return snapshot.clone();
                }
            }
        }

        // Write lock serializes concurrent refreshes; re-check freshness
        // in case another request already repopulated the slot.
        let mut slot = self.snapshot_slot.write().await;
        if let Some(snapshot) = slot.as_ref() {
            if self.is_fresh(snapshot.fetched_at, self.config.market_ttl_secs) {
                return snapshot.clone();
            }
        }

        let snapshot = acquisition::acquire(
            Arc::clone(&self.quote_feed),
            &self.config.instruments,
            &self.config.history_period,
            Duration::from_secs(self.config.fetch_timeout_secs),
            self.config.pool_cap,
        )
        .await;

        if snapshot.is_live {
            *slot = Some(snapshot.clone());
        }
        snapshot
    }

    /// Train (at most once) and produce a forecast for the configured
    /// instrument, plus its normalized sub-score.
    pub async fn get_forecast(&self, horizon: usize) -> Result<ForecastOutcome, StabilityError> {
        if horizon == 0 {
            return Err(StabilityError::InvalidInput(
                "forecast horizon must be at least 1 day".to_string(),
            ));
        }

        let series = self.history_series().await;

        if !self.forecaster.is_trained().await {
            self.forecaster.train(&series).await;
        }

        let forecast = self.forecaster.forecast(horizon).await?;
        let summary = summarize(&forecast);
        let current_value = series
            .last()
            .map(|(_, v)| *v)
            .unwrap_or(self.config.sample_base_level);

        let score = normalize_forecast_score(&summary, current_value, &self.config);
        self.record_subscore(MARKET_SUBSCORE, score);

        Ok(ForecastOutcome {
            points: forecast.points,
            summary,
            forecast_score: round2(score * 100.0),
            current_value: round2(current_value),
            model: forecast.model,
        })
    }

    /// Fetch headlines, score them, and reduce to an aggregate plus the
    /// normalized sub-score. Never fails: the news feed degrades to a
    /// placeholder internally.
    pub async fn get_sentiment(
        &self,
        query: Option<&str>,
        max_results: Option<usize>,
    ) -> SentimentOutcome {
        let query = query.unwrap_or(&self.config.default_news_query);
        let max_results = max_results.unwrap_or(self.config.default_max_headlines);

        let headlines = self.news_feed.search(query, max_results).await;
        let titles: Vec<String> = headlines.iter().map(|h| h.title.clone()).collect();

        let verdicts = self.sentiment.analyze_batch(&titles);
        let aggregate = self.sentiment.aggregate(&verdicts);

        let score = normalize_sentiment_score(&aggregate, &self.config);
        self.record_subscore(SENTIMENT_SUBSCORE, score);

        let articles = headlines
            .into_iter()
            .zip(verdicts)
            .map(|(headline, sentiment)| ArticleSentiment {
                title: headline.title,
                source: headline.source,
                link: headline.link,
                sentiment,
            })
            .collect();

        SentimentOutcome {
            sentiment_score: round2(score * 100.0),
            aggregate,
            articles,
        }
    }

    /// Combine the sub-scores into the final indicator. Answers
    /// immediately from the sub-score cache; stale or missing entries
    /// are replaced by neutral defaults while a background refresh
    /// repopulates them, so worst-case latency stays bounded.
    pub async fn get_stability_score(
        self: Arc<Self>,
        inflation_rate: Option<f64>,
        repo_rate: Option<f64>,
    ) -> StabilityOutcome {
        let market = self.fresh_subscore(MARKET_SUBSCORE);
        let sentiment = self.fresh_subscore(SENTIMENT_SUBSCORE);

        let (market_score, sentiment_score, cached) = match (market, sentiment) {
            (Some(m), Some(s)) => (m, s, true),
            _ => {
                tracing::info!("Sub-score cache stale or incomplete, using neutral defaults");
                Self::spawn_subscore_refresh(&self);
                (0.5, 0.5, false)
            }
        };

        let economic = if inflation_rate.is_some() || repo_rate.is_some() {
            Some(economic_indicators_score(inflation_rate, repo_rate))
        } else {
            None
        };

        let result = self
            .calculator
            .calculate(market_score, sentiment_score, economic);

        StabilityOutcome {
            result,
            from_cached_subscores: cached,
            timestamp: Utc::now(),
        }
    }

    /// Close-price series for the forecast instrument, time-boxed with
    /// a hard wall-clock bound; a slow or failing feed yields generated
    /// history so the forecaster is never stalled by an upstream.
    async fn history_series(&self) -> Vec<(NaiveDate, f64)> {
        if let Some(spec) = self.config.instrument(&self.config.forecast_instrument) {
            let deadline = Duration::from_secs(self.config.history_timeout_secs);
            match tokio::time::timeout(
                deadline,
                self.quote_feed
                    .get_history(&spec.symbol, &self.config.history_period),
            )
            .await
            {
                Ok(Ok(bars)) if !bars.is_empty() => {
                    return bars.iter().map(|b| (b.date, b.close)).collect();
                }
                Ok(Ok(_)) => tracing::warn!("Empty training history for {}", spec.symbol),
                Ok(Err(e)) => tracing::warn!("Training history fetch failed: {}", e),
                Err(_) => tracing::warn!("Training history fetch timed out"),
            }
        }

        tracing::warn!("Generating synthetic training history");
        synthetic::sample_history(self.config.sample_base_level, 90)
    }

    fn record_subscore(&self, key: &'static str, score: f64) {
        self.subscores.insert(
            key,
            CacheEntry {
                data: score,
                cached_at: Utc::now(),
            },
        );
    }

    fn fresh_subscore(&self, key: &'static str) -> Option<f64> {
        let entry = self.subscores.get(key)?;
        self.is_fresh(entry.cached_at, self.config.subscore_ttl_secs)
            .then_some(entry.data)
    }

    fn is_fresh(&self, cached_at: DateTime<Utc>, ttl_secs: i64) -> bool {
        (Utc::now() - cached_at).num_seconds() < ttl_secs
    }

    /// Fire-and-forget sub-score recomputation, single-flight guarded
    fn spawn_subscore_refresh(this: &Arc<Self>) {
        if this
            .refresh_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let this = Arc::clone(this);
        tokio::spawn(async move {
            if let Err(e) = this.get_forecast(this.config.default_horizon).await {
                tracing::warn!("Background forecast refresh failed: {}", e);
            }
            let _ = this.get_sentiment(None, None).await;
            this.refresh_in_flight.store(false, Ordering::SeqCst);
        });
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
