//! Review endpoints consumed by the storefront UI.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use serde::Serialize;
use shopfront_core::domain::product::ProductId;
use shopfront_core::domain::review::{AllReviewsResponse, ExternalProduct, ExternalReviewResponse};
use shopfront_core::{ApplicationError, InterfaceError};
use shopfront_reviews::{ReviewService, ReviewsError};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReviewsState {
    service: ReviewService,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn from_reviews(error: ReviewsError, correlation_id: String) -> Self {
        warn!(
            event_name = "http.reviews.failed",
            correlation_id = %correlation_id,
            error_class = error.class(),
            error = %error,
            "review request failed"
        );
        Self(ApplicationError::from(error).into_interface(correlation_id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(service: ReviewService) -> Router {
    Router::new()
        .route("/api/v1/products/{id}/reviews", get(all_reviews))
        .route("/api/v1/products/{id}/reviews/random", get(random_review))
        .route("/api/v1/products/{id}/external-match", get(external_match))
        .route("/api/v1/reviews/cache", delete(clear_cache))
        .with_state(ReviewsState { service })
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

async fn all_reviews(
    State(state): State<ReviewsState>,
    Path(id): Path<String>,
) -> Result<Json<AllReviewsResponse>, ApiError> {
    let correlation_id = correlation_id();
    let product_id = ProductId(id);

    let response = state
        .service
        .fetch_all_product_reviews_by_guid(&product_id)
        .await
        .map_err(|error| ApiError::from_reviews(error, correlation_id.clone()))?;

    info!(
        event_name = "http.reviews.served",
        correlation_id = %correlation_id,
        product_id = %product_id,
        review_count = response.reviews.len(),
        source = response.source.as_str(),
        "reviews served"
    );
    Ok(Json(response))
}

async fn random_review(
    State(state): State<ReviewsState>,
    Path(id): Path<String>,
) -> Result<Json<ExternalReviewResponse>, ApiError> {
    let correlation_id = correlation_id();

    state
        .service
        .fetch_product_reviews_by_guid(&ProductId(id))
        .await
        .map(Json)
        .map_err(|error| ApiError::from_reviews(error, correlation_id))
}

async fn external_match(
    State(state): State<ReviewsState>,
    Path(id): Path<String>,
) -> Result<Json<ExternalProduct>, ApiError> {
    let correlation_id = correlation_id();
    let product_id = ProductId(id);

    let matched = state
        .service
        .find_matching_external_product(&product_id)
        .await
        .map_err(|error| ApiError::from_reviews(error, correlation_id.clone()))?;

    matched.map(Json).ok_or_else(|| {
        ApiError(
            ApplicationError::NotFound(format!("external match for `{product_id}`"))
                .into_interface(correlation_id),
        )
    })
}

async fn clear_cache(State(state): State<ReviewsState>) -> StatusCode {
    state.service.cache().clear().await;
    info!(event_name = "http.reviews.cache_cleared", "external product cache cleared");
    StatusCode::NO_CONTENT
}
