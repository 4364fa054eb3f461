use crate::types::InstrumentSpec;

/// Tunable constants for the whole pipeline. The defaults are the
/// authoritative values; the server binary may override individual
/// fields from the environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Instruments acquired per cycle, each with one fallback symbol
    pub instruments: Vec<InstrumentSpec>,
    /// Instrument whose history feeds the forecaster
    pub forecast_instrument: String,
    /// History window requested from the quote feed
    pub history_period: String,

    /// Market snapshot cache validity, seconds
    pub market_ttl_secs: i64,
    /// Aggregator sub-score cache validity, seconds
    pub subscore_ttl_secs: i64,
    /// Per-instrument fetch timeout, seconds
    pub fetch_timeout_secs: u64,
    /// Hard wall-clock bound on the forecaster's history fetch, seconds
    pub history_timeout_secs: u64,
    /// Upper bound on concurrent fetch tasks
    pub pool_cap: usize,

    /// Minimum observations before real training is attempted
    pub min_training_history: usize,
    /// Forecast horizon when the caller does not specify one
    pub default_horizon: usize,
    /// Constant confidence reported by the synthetic generator
    pub synthetic_confidence: f64,
    /// Uniform per-step perturbation range of the synthetic walk
    pub synthetic_step_min: f64,
    pub synthetic_step_max: f64,
    /// Half-width of synthetic bounds, as a fraction of each point
    pub synthetic_bound_pct: f64,
    /// Base level for generated sample history
    pub sample_base_level: f64,

    /// Forecast normalization mix
    pub forecast_trend_weight: f64,
    pub forecast_confidence_weight: f64,
    pub forecast_volatility_weight: f64,

    /// Sentiment normalization mix
    pub sentiment_compound_weight: f64,
    pub sentiment_positive_weight: f64,
    pub sentiment_negative_weight: f64,

    /// Stability score mix
    pub market_weight: f64,
    pub sentiment_weight: f64,
    pub economic_weight: f64,
    /// Category boundaries on the 0-100 scale, inclusive
    pub stable_threshold: f64,
    pub moderate_threshold: f64,

    /// Default news query and result cap
    pub default_news_query: String,
    pub default_max_headlines: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            instruments: vec![
                InstrumentSpec::new("nifty", "^NSEI", "NIFTYBEES.NS"),
                InstrumentSpec::new("sensex", "^BSESN", "SENSEXBEES.NS"),
                InstrumentSpec::new("banknifty", "^NSEBANK", "BANKBEES.NS"),
                InstrumentSpec::new("usdinr", "USDINR=X", "INR=X"),
                InstrumentSpec::new("gold", "GC=F", "GOLDBEES.NS"),
                InstrumentSpec::new("crude", "CL=F", "BZ=F"),
            ],
            forecast_instrument: "nifty".to_string(),
            history_period: "3mo".to_string(),

            market_ttl_secs: 86_400,
            subscore_ttl_secs: 300,
            fetch_timeout_secs: 10,
            history_timeout_secs: 15,
            pool_cap: 8,

            min_training_history: 30,
            default_horizon: 7,
            synthetic_confidence: 0.85,
            synthetic_step_min: -0.01,
            synthetic_step_max: 0.015,
            synthetic_bound_pct: 0.02,
            sample_base_level: 22_000.0,

            forecast_trend_weight: 0.4,
            forecast_confidence_weight: 0.4,
            forecast_volatility_weight: 0.2,

            sentiment_compound_weight: 0.6,
            sentiment_positive_weight: 0.3,
            sentiment_negative_weight: 0.1,

            market_weight: 0.40,
            sentiment_weight: 0.30,
            economic_weight: 0.30,
            stable_threshold: 71.0,
            moderate_threshold: 41.0,

            default_news_query: "India economy RBI inflation stock market".to_string(),
            default_max_headlines: 20,
        }
    }
}

impl PipelineConfig {
    pub fn instrument(&self, id: &str) -> Option<&InstrumentSpec> {
        self.instruments.iter().find(|i| i.id == id)
    }
}
