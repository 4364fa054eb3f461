use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw OHLCV history row as returned by the quote feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// An instrument to acquire: stable id plus primary and fallback feed symbols
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub id: String,
    pub symbol: String,
    /// Tried exactly once if the primary symbol fails. One hop, no chains.
    pub fallback: String,
}

impl InstrumentSpec {
    pub fn new(id: &str, symbol: &str, fallback: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            fallback: fallback.to_string(),
        }
    }
}

/// Latest quote for one instrument, with fields derived from its raw window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentQuote {
    pub instrument: String,
    pub current: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
    pub change: f64,
    pub change_percent: f64,
    /// Stddev of simple returns over the fetch window, as a percentage
    pub volatility: f64,
}

/// One acquisition cycle's result. Missing instruments are present as `None`
/// so callers can tell "tried and failed" from "never requested".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub quotes: BTreeMap<String, Option<InstrumentQuote>>,
    pub fetched_at: DateTime<Utc>,
    /// True only if at least one instrument fetch succeeded
    pub is_live: bool,
    #[serde(default)]
    pub note: Option<String>,
}

impl MarketSnapshot {
    pub fn present_count(&self) -> usize {
        self.quotes.values().filter(|q| q.is_some()).count()
    }
}

/// A single forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub upper: f64,
    pub lower: f64,
    /// 0.0 to 1.0
    pub confidence: f64,
}

/// Ordered fixed-horizon forecast, chronologically ascending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonForecast {
    pub points: Vec<ForecastPoint>,
    /// Which generator produced the points ("linear-trend" or
    /// "synthetic-random-walk")
    pub model: String,
}

/// Summary statistics extracted from a horizon forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub trend: String,
    pub avg_predicted: f64,
    pub min_predicted: f64,
    pub max_predicted: f64,
    pub avg_confidence: f64,
    /// Mean width of the prediction interval across the horizon
    pub volatility: f64,
}

/// Raw polarity distribution from the scoring capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub compound: f64,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl PolarityScores {
    pub fn neutral() -> Self {
        Self {
            compound: 0.0,
            positive: 0.0,
            neutral: 1.0,
            negative: 0.0,
        }
    }
}

/// Sentiment polarity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Threshold a compound score: >= 0.05 positive, <= -0.05 negative
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.05 {
            SentimentLabel::Positive
        } else if compound <= -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

/// Verdict for one input text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentVerdict {
    pub text: String,
    pub label: SentimentLabel,
    pub compound: f64,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// Reduction of a batch of verdicts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSentiment {
    pub avg_compound: f64,
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
    pub overall_label: SentimentLabel,
    pub total_texts: usize,
}

impl AggregateSentiment {
    pub fn empty() -> Self {
        Self {
            avg_compound: 0.0,
            positive_count: 0,
            neutral_count: 0,
            negative_count: 0,
            overall_label: SentimentLabel::Neutral,
            total_texts: 0,
        }
    }
}

/// News headline as returned by the news feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsHeadline {
    pub title: String,
    pub link: String,
    pub source: String,
    pub published: DateTime<Utc>,
}

/// Stability category over the final 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityCategory {
    Stable,
    Moderate,
    Unstable,
}

impl StabilityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StabilityCategory::Stable => "Stable",
            StabilityCategory::Moderate => "Moderate",
            StabilityCategory::Unstable => "Unstable",
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            StabilityCategory::Stable => {
                "Economic indicators suggest a stable environment with positive market trends."
            }
            StabilityCategory::Moderate => {
                "Economic conditions show mixed signals; close monitoring is advised."
            }
            StabilityCategory::Unstable => {
                "Economic indicators suggest instability; trends require careful observation."
            }
        }
    }
}

/// Weighted contribution of each component, scaled to 0-100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityBreakdown {
    pub market_contribution: f64,
    pub sentiment_contribution: f64,
    pub economic_contribution: f64,
}

/// Raw component sub-scores, scaled to 0-100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityComponents {
    pub market_trend: f64,
    pub sentiment: f64,
    pub economic_indicators: f64,
}

/// Final composite stability indicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityResult {
    pub stability_score: f64,
    pub category: StabilityCategory,
    pub interpretation: String,
    pub breakdown: StabilityBreakdown,
    pub components: StabilityComponents,
}
