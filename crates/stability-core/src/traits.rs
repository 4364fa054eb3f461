use async_trait::async_trait;

use crate::{ForecastPoint, NewsHeadline, OhlcBar, PolarityScores, StabilityError};

/// A source of historical price data for one symbol. Unreliable by
/// contract: callers must treat any error as a per-symbol failure and
/// apply their own fallback.
#[async_trait]
pub trait QuoteFeed: Send + Sync {
    async fn get_history(&self, symbol: &str, period: &str)
        -> Result<Vec<OhlcBar>, StabilityError>;
}

/// A news search source. Degradation happens behind this seam: an empty
/// or failing upstream yields a deterministic placeholder item, so the
/// result is never empty and never an error.
#[async_trait]
pub trait NewsFeed: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Vec<NewsHeadline>;
}

/// Text polarity scoring capability. Consumed as a black box; the
/// aggregation layer only depends on the output distribution shape.
pub trait PolarityScorer: Send + Sync {
    fn score(&self, text: &str) -> PolarityScores;
}

/// Statistical trend-fitting capability: fit may reject a series, and a
/// fitted model produces a fixed-horizon forecast with intervals.
pub trait TrendModel: Send + Sync {
    fn fit(
        &self,
        series: &[(chrono::NaiveDate, f64)],
    ) -> Result<Box<dyn FittedTrendModel>, StabilityError>;
}

pub trait FittedTrendModel: Send + Sync {
    fn predict(&self, horizon: usize) -> Vec<ForecastPoint>;
}
