pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::PipelineConfig;
pub use error::StabilityError;
pub use traits::{FittedTrendModel, NewsFeed, PolarityScorer, QuoteFeed, TrendModel};
pub use types::{
    AggregateSentiment, ForecastPoint, ForecastSummary, HorizonForecast, InstrumentQuote,
    InstrumentSpec, MarketSnapshot, NewsHeadline, OhlcBar, PolarityScores, SentimentLabel,
    SentimentVerdict, StabilityBreakdown, StabilityCategory, StabilityComponents,
    StabilityResult,
};
