use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stability_core::{PipelineConfig, StabilityError};
use stability_orchestrator::StabilityOrchestrator;

mod routes;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<StabilityOrchestrator>,
}

/// Standard response envelope
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error wrapper: contract violations surface as client errors, anything
/// else is a server-side failure (upstream failures never get this far —
/// the pipeline degrades internally).
pub struct AppError(anyhow::Error);

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<StabilityError>() {
            Some(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.0);
        }

        let body = Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
        });

        (status, body).into_response()
    }
}

/// Read the pipeline configuration, applying environment overrides
fn config_from_env() -> PipelineConfig {
    let mut config = PipelineConfig::default();

    if let Some(ttl) = env_parse::<i64>("MARKET_TTL_SECS") {
        config.market_ttl_secs = ttl;
    }
    if let Some(ttl) = env_parse::<i64>("SUBSCORE_TTL_SECS") {
        config.subscore_ttl_secs = ttl;
    }
    if let Some(timeout) = env_parse::<u64>("FETCH_TIMEOUT_SECS") {
        config.fetch_timeout_secs = timeout;
    }
    if let Some(query) = std::env::var("NEWS_QUERY").ok().filter(|q| !q.is_empty()) {
        config.default_news_query = query;
    }

    config
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

pub async fn run_server() -> anyhow::Result<()> {
    let config = config_from_env();
    let state = AppState {
        orchestrator: Arc::new(StabilityOrchestrator::new(config)),
    };

    let app = routes::router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env_parse("PORT").unwrap_or(8000);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("Stability API listening on {}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
