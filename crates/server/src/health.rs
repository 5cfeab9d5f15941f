use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use shopfront_core::config::AppConfig;
use shopfront_core::reviews::ExternalProductCache;
use shopfront_reviews::{probe_upstreams, UpstreamStatus};
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    config: Arc<AppConfig>,
    client: reqwest::Client,
    cache: Arc<ExternalProductCache>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub review_cache: HealthCheck,
    pub upstreams: Vec<UpstreamStatus>,
    pub checked_at: String,
}

pub fn router(
    config: AppConfig,
    client: reqwest::Client,
    cache: Arc<ExternalProductCache>,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { config: Arc::new(config), client, cache })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let upstreams = probe_upstreams(&state.client, &state.config).await;
    let ready = upstreams.iter().all(UpstreamStatus::is_reachable);

    if !ready {
        let unreachable: Vec<&str> = upstreams
            .iter()
            .filter(|upstream| !upstream.is_reachable())
            .map(|upstream| upstream.name)
            .collect();
        warn!(
            event_name = "system.health.degraded",
            unreachable = ?unreachable,
            "one or more upstreams are unreachable"
        );
    }

    let review_cache = if state.cache.is_populated().await {
        HealthCheck { status: "warm", detail: "external product list cached".to_string() }
    } else {
        HealthCheck { status: "cold", detail: "populated on first review request".to_string() }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "shopfront-server runtime initialized".to_string(),
        },
        review_cache,
        upstreams,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
