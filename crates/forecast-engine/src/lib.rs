use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use stability_core::{
    FittedTrendModel, ForecastSummary, HorizonForecast, PipelineConfig, StabilityError, TrendModel,
};

pub mod synthetic;
pub mod trend;

pub use trend::LinearTrendModel;

pub const MODEL_TRAINED: &str = "linear-trend";
pub const MODEL_SYNTHETIC: &str = "synthetic-random-walk";

const EPSILON: f64 = 1e-6;

enum ModelState {
    Untrained,
    Trained {
        fitted: Box<dyn FittedTrendModel>,
        anchor: NaiveDate,
    },
    Synthetic {
        last_value: f64,
        anchor: NaiveDate,
    },
}

/// Train-once forecaster. The state moves out of `Untrained` exactly
/// once per process lifetime; the transition is re-checked under the
/// lock so concurrent first requests cannot double-train.
pub struct ForecastEngine {
    state: Mutex<ModelState>,
    trend: Box<dyn TrendModel>,
    config: PipelineConfig,
}

impl ForecastEngine {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_model(config, Box::new(LinearTrendModel::new()))
    }

    pub fn with_model(config: PipelineConfig, trend: Box<dyn TrendModel>) -> Self {
        Self {
            state: Mutex::new(ModelState::Untrained),
            trend,
            config,
        }
    }

    pub async fn is_trained(&self) -> bool {
        !matches!(*self.state.lock().await, ModelState::Untrained)
    }

    /// Train on a close-price series. Never fails: a short series or a
    /// fitting error lands in the synthetic fallback mode instead of
    /// surfacing to the caller. Subsequent calls are no-ops.
    pub async fn train(&self, series: &[(NaiveDate, f64)]) {
        let mut state = self.state.lock().await;
        if !matches!(*state, ModelState::Untrained) {
            tracing::debug!("Forecaster already trained, skipping");
            return;
        }

        let last_value = series
            .last()
            .map(|(_, v)| *v)
            .unwrap_or(self.config.sample_base_level);
        let anchor = series
            .last()
            .map(|(d, _)| *d)
            .unwrap_or_else(|| Utc::now().date_naive());

        if series.len() < self.config.min_training_history {
            tracing::info!(
                "History too short for training ({} < {}), entering synthetic mode",
                series.len(),
                self.config.min_training_history
            );
            *state = ModelState::Synthetic { last_value, anchor };
            return;
        }

        match self.trend.fit(series) {
            Ok(fitted) => {
                tracing::info!(
                    "Trend model trained on {} observations (anchor {})",
                    series.len(),
                    anchor
                );
                *state = ModelState::Trained { fitted, anchor };
            }
            Err(e) => {
                tracing::warn!("Trend fit failed, entering synthetic mode: {}", e);
                *state = ModelState::Synthetic { last_value, anchor };
            }
        }
    }

    /// Produce a fixed-horizon forecast. Only valid after `train`.
    pub async fn forecast(&self, horizon: usize) -> Result<HorizonForecast, StabilityError> {
        if horizon == 0 {
            return Err(StabilityError::InvalidInput(
                "forecast horizon must be at least 1 day".to_string(),
            ));
        }

        let state = self.state.lock().await;
        match &*state {
            ModelState::Untrained => Err(StabilityError::ModelNotReady),
            ModelState::Trained { fitted, .. } => Ok(HorizonForecast {
                points: fitted.predict(horizon),
                model: MODEL_TRAINED.to_string(),
            }),
            ModelState::Synthetic { last_value, anchor } => Ok(HorizonForecast {
                points: synthetic::random_walk(*last_value, *anchor, horizon, &self.config),
                model: MODEL_SYNTHETIC.to_string(),
            }),
        }
    }
}

/// Extract summary statistics from a forecast
pub fn summarize(forecast: &HorizonForecast) -> ForecastSummary {
    let points = &forecast.points;
    let n = points.len().max(1) as f64;

    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f.predicted, l.predicted),
        _ => (0.0, 0.0),
    };

    ForecastSummary {
        trend: if last > first { "upward" } else { "downward" }.to_string(),
        avg_predicted: points.iter().map(|p| p.predicted).sum::<f64>() / n,
        min_predicted: points.iter().map(|p| p.lower).fold(f64::INFINITY, f64::min),
        max_predicted: points
            .iter()
            .map(|p| p.upper)
            .fold(f64::NEG_INFINITY, f64::max),
        avg_confidence: points.iter().map(|p| p.confidence).sum::<f64>() / n,
        volatility: points.iter().map(|p| p.upper - p.lower).sum::<f64>() / n,
    }
}

/// Map a forecast summary onto [0, 1]: direction, confidence and
/// interval tightness in a fixed mix.
pub fn normalize_forecast_score(
    summary: &ForecastSummary,
    current_value: f64,
    config: &PipelineConfig,
) -> f64 {
    let trend_score = if summary.trend == "upward" { 0.7 } else { 0.3 };

    let volatility_score =
        (1.0 - summary.volatility / (current_value.abs().max(EPSILON) * 0.1)).max(0.0);

    let score = config.forecast_trend_weight * trend_score
        + config.forecast_confidence_weight * summary.avg_confidence
        + config.forecast_volatility_weight * volatility_score;

    score.clamp(0.0, 1.0)
}
