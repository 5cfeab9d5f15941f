use std::sync::Arc;

use shopfront_core::config::AppConfig;
use shopfront_core::reviews::ExternalProductCache;
use shopfront_reviews::http::build_client;
use shopfront_reviews::{ReviewService, ReviewsError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub cache: Arc<ExternalProductCache>,
    pub reviews: ReviewService,
    pub probe_client: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("reviews integration setup failed: {0}")]
    Reviews(#[from] ReviewsError),
}

/// Wires the application from an already loaded config, so logging can be
/// initialised from the same config before anything else runs.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let cache = Arc::new(ExternalProductCache::new());
    let reviews = ReviewService::from_config(&config, cache.clone())?;
    let probe_client = build_client(config.reviews.request_timeout())?;

    info!(
        event_name = "system.bootstrap.reviews_ready",
        correlation_id = "bootstrap",
        external_base_url = %config.reviews.external_base_url,
        mock_base_url = %config.reviews.mock_base_url,
        request_timeout_ms = config.reviews.request_timeout_ms,
        "reviews integration wired"
    );

    Ok(Application { config, cache, reviews, probe_client })
}
