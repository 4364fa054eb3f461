//! Endpoint handlers. Thin by design: validation and serialization
//! only, everything else lives in the orchestrator.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use stability_core::{MarketSnapshot, StabilityError};
use stability_orchestrator::{ForecastOutcome, SentimentOutcome, StabilityOutcome};

use crate::{ApiResponse, AppError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/market-data", get(get_market_data))
        .route("/forecast", get(get_forecast))
        .route("/sentiment", get(get_sentiment))
        .route("/stability-score", get(get_stability_score))
        .route("/health", get(health))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Economic Stability API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "available_endpoints": [
            "/market-data",
            "/forecast",
            "/sentiment",
            "/stability-score",
            "/health"
        ]
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

async fn get_market_data(
    State(state): State<AppState>,
) -> Json<ApiResponse<MarketSnapshot>> {
    let snapshot = state.orchestrator.get_market_snapshot().await;
    Json(ApiResponse::ok(snapshot))
}

#[derive(Deserialize)]
pub struct ForecastQuery {
    /// Forecast horizon in days
    pub days: Option<i64>,
}

#[derive(Serialize)]
pub struct ForecastResponse {
    #[serde(flatten)]
    pub outcome: ForecastOutcome,
    pub note: &'static str,
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ApiResponse<ForecastResponse>>, AppError> {
    let horizon = validate_horizon(
        query.days,
        state.orchestrator.config().default_horizon,
    )?;

    let outcome = state.orchestrator.get_forecast(horizon).await?;

    Ok(Json(ApiResponse::ok(ForecastResponse {
        outcome,
        note: "Forecast represents market trend, not exact values",
    })))
}

fn validate_horizon(days: Option<i64>, default: usize) -> Result<usize, StabilityError> {
    match days {
        None => Ok(default),
        Some(d) if d >= 1 => Ok(d as usize),
        Some(d) => Err(StabilityError::InvalidInput(format!(
            "forecast horizon must be at least 1 day, got {}",
            d
        ))),
    }
}

#[derive(Deserialize)]
pub struct SentimentQuery {
    pub query: Option<String>,
    pub max_results: Option<usize>,
}

async fn get_sentiment(
    State(state): State<AppState>,
    Query(query): Query<SentimentQuery>,
) -> Json<ApiResponse<SentimentOutcome>> {
    let outcome = state
        .orchestrator
        .get_sentiment(query.query.as_deref(), query.max_results)
        .await;
    Json(ApiResponse::ok(outcome))
}

#[derive(Deserialize)]
pub struct StabilityQuery {
    pub inflation_rate: Option<f64>,
    pub repo_rate: Option<f64>,
}

#[derive(Serialize)]
pub struct StabilityResponse {
    #[serde(flatten)]
    pub outcome: StabilityOutcome,
    pub disclaimer: &'static str,
}

async fn get_stability_score(
    State(state): State<AppState>,
    Query(query): Query<StabilityQuery>,
) -> Json<ApiResponse<StabilityResponse>> {
    let outcome = Arc::clone(&state.orchestrator)
        .get_stability_score(query.inflation_rate, query.repo_rate)
        .await;

    Json(ApiResponse::ok(StabilityResponse {
        outcome,
        disclaimer: "Educational indicator. Not financial advice.",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_horizon_uses_the_default() {
        assert_eq!(validate_horizon(None, 7).unwrap(), 7);
    }

    #[test]
    fn explicit_horizon_is_passed_through() {
        assert_eq!(validate_horizon(Some(14), 7).unwrap(), 14);
    }

    #[test]
    fn non_positive_horizon_is_rejected() {
        assert!(validate_horizon(Some(0), 7).is_err());
        let err = validate_horizon(Some(-3), 7).unwrap_err();
        assert!(err.is_client_error());
    }
}
