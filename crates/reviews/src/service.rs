//! Review resolution for internal products.
//!
//! The primary tier resolves the internal product, finds its counterpart at
//! the external provider and returns that product's reviews, fetching them
//! only when the cached list carries none. Any failure in the primary tier
//! switches to the mock reviews API. Nothing is retried.

use std::sync::Arc;

use rand::seq::SliceRandom;
use shopfront_core::config::AppConfig;
use shopfront_core::domain::product::{Product, ProductId};
use shopfront_core::domain::review::{
    AllReviewsResponse, ExternalProduct, ExternalProductId, ExternalReviewResponse, ProductInfo,
};
use shopfront_core::reviews::{
    find_best_match, ExternalProductCache, ResolutionStage, StageTracker,
};
use tracing::{info, warn};

use crate::catalog::{HttpProductCatalog, ProductCatalog};
use crate::error::ReviewsError;
use crate::external::{ExternalReviewsApi, HttpExternalReviewsApi};
use crate::fallback::{FallbackReviewsApi, HttpMockReviewsApi};
use crate::http::build_client;

#[derive(Clone)]
pub struct ReviewService {
    catalog: Arc<dyn ProductCatalog>,
    external: Arc<dyn ExternalReviewsApi>,
    fallback: Arc<dyn FallbackReviewsApi>,
    cache: Arc<ExternalProductCache>,
}

impl ReviewService {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        external: Arc<dyn ExternalReviewsApi>,
        fallback: Arc<dyn FallbackReviewsApi>,
        cache: Arc<ExternalProductCache>,
    ) -> Self {
        Self { catalog, external, fallback, cache }
    }

    /// Wires the HTTP clients for every upstream. The cache is passed in so
    /// its lifetime is decided by the caller.
    pub fn from_config(
        config: &AppConfig,
        cache: Arc<ExternalProductCache>,
    ) -> Result<Self, ReviewsError> {
        let catalog_client = build_client(config.reviews.request_timeout())?;
        let catalog = HttpProductCatalog::new(catalog_client, &config.catalog);
        let external = HttpExternalReviewsApi::from_config(&config.reviews)?;
        let fallback = HttpMockReviewsApi::from_config(&config.reviews)?;

        Ok(Self::new(Arc::new(catalog), Arc::new(external), Arc::new(fallback), cache))
    }

    pub fn cache(&self) -> &Arc<ExternalProductCache> {
        &self.cache
    }

    /// The external product list, from cache when populated. Failures are
    /// logged and yield an empty list, which is not cached.
    pub async fn fetch_external_products(&self) -> Vec<ExternalProduct> {
        match self.cache.get_or_populate(|| self.external.list_products()).await {
            Ok(products) => products,
            Err(error) => {
                warn!(
                    event_name = "reviews.external.list_failed",
                    error = %error,
                    error_class = error.class(),
                    "external product list unavailable, continuing with empty list"
                );
                Vec::new()
            }
        }
    }

    pub async fn find_matching_external_product(
        &self,
        internal_id: &ProductId,
    ) -> Result<Option<ExternalProduct>, ReviewsError> {
        let Some(product) = self.catalog.find_by_id(internal_id).await? else {
            return Ok(None);
        };
        Ok(self.match_internal(&product).await)
    }

    pub async fn fetch_external_product_reviews(
        &self,
        external_id: ExternalProductId,
    ) -> Result<ExternalProduct, ReviewsError> {
        self.external.get_product(external_id).await
    }

    /// All reviews for an internal product, from the external provider or,
    /// failing that, from the mock reviews API.
    pub async fn fetch_all_product_reviews_by_guid(
        &self,
        internal_id: &ProductId,
    ) -> Result<AllReviewsResponse, ReviewsError> {
        let mut tracker = StageTracker::new(internal_id.to_string());
        let mut internal = None;

        let primary = match self.resolve_external(internal_id, &mut tracker, &mut internal).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        warn!(
            event_name = "reviews.fallback.engaged",
            product_id = %internal_id,
            stage = tracker.current().as_str(),
            error = %primary,
            error_class = primary.class(),
            "external reviews unavailable, using fallback tier"
        );
        if let Err(error) = tracker.advance(ResolutionStage::Fallback) {
            warn!(
                event_name = "reviews.flow.invalid_fallback",
                error = %error,
                "stage tracker rejected fallback"
            );
        }

        match self.fetch_fallback(internal_id, internal.as_ref()).await {
            Ok(response) => Ok(response),
            Err(fallback) => {
                warn!(
                    event_name = "reviews.fallback.failed",
                    product_id = %internal_id,
                    error = %fallback,
                    "fallback reviews unavailable"
                );
                Err(ReviewsError::AllSourcesFailed {
                    primary: Box::new(primary),
                    fallback: Box::new(fallback),
                })
            }
        }
    }

    /// One review picked uniformly at random from the full set.
    pub async fn fetch_product_reviews_by_guid(
        &self,
        internal_id: &ProductId,
    ) -> Result<ExternalReviewResponse, ReviewsError> {
        let all = self.fetch_all_product_reviews_by_guid(internal_id).await?;
        let picked = all.reviews.choose(&mut rand::thread_rng()).cloned();

        match picked {
            Some(review) => Ok(ExternalReviewResponse {
                review,
                product_info: all.product_info,
                source: all.source,
            }),
            None => Err(ReviewsError::EmptyReviewSet(internal_id.to_string())),
        }
    }

    async fn match_internal(&self, product: &Product) -> Option<ExternalProduct> {
        let external = self.fetch_external_products().await;
        if external.is_empty() {
            return None;
        }
        find_best_match(&external, product).cloned()
    }

    async fn resolve_external(
        &self,
        internal_id: &ProductId,
        tracker: &mut StageTracker,
        internal: &mut Option<Product>,
    ) -> Result<AllReviewsResponse, ReviewsError> {
        tracker.advance(ResolutionStage::ResolveInternal)?;
        let product = self
            .catalog
            .find_by_id(internal_id)
            .await?
            .ok_or_else(|| ReviewsError::InternalProductNotFound(internal_id.to_string()))?;
        *internal = Some(product.clone());

        tracker.advance(ResolutionStage::ResolveExternalList)?;
        let external = self.fetch_external_products().await;

        tracker.advance(ResolutionStage::Match)?;
        let matched = find_best_match(&external, &product)
            .cloned()
            .ok_or_else(|| ReviewsError::NoExternalMatch(internal_id.to_string()))?;

        if !matched.reviews.is_empty() {
            tracker.advance(ResolutionStage::UseCachedReviews)?;
            tracker.advance(ResolutionStage::Done)?;
            info!(
                event_name = "reviews.resolved",
                product_id = %internal_id,
                external_id = matched.product_id,
                review_count = matched.reviews.len(),
                cached = true,
                "reviews served from cached external product"
            );
            return Ok(AllReviewsResponse::from_external(&matched));
        }

        tracker.advance(ResolutionStage::FetchFreshReviews)?;
        let fresh = self.fetch_external_product_reviews(matched.product_id).await?;
        if fresh.reviews.is_empty() {
            return Err(ReviewsError::NoReviews { external_id: matched.product_id });
        }

        tracker.advance(ResolutionStage::UpdateCache)?;
        let response = AllReviewsResponse::from_external(&fresh);
        self.cache.update_by_id(fresh).await;
        tracker.advance(ResolutionStage::Done)?;

        info!(
            event_name = "reviews.resolved",
            product_id = %internal_id,
            external_id = response.product_info.product_id,
            review_count = response.reviews.len(),
            cached = false,
            "reviews fetched from external provider"
        );
        Ok(response)
    }

    async fn fetch_fallback(
        &self,
        internal_id: &ProductId,
        internal: Option<&Product>,
    ) -> Result<AllReviewsResponse, ReviewsError> {
        let mock = self.fallback.product_reviews(internal_id).await?;

        let product_info = internal
            .map(|product| ProductInfo {
                product_id: 0,
                name: product.name.clone(),
                category: product.category.clone().unwrap_or_default(),
            })
            .unwrap_or_default();

        let response = mock.into_all_reviews(product_info);
        info!(
            event_name = "reviews.fallback.resolved",
            product_id = %internal_id,
            review_count = response.reviews.len(),
            "reviews served from fallback tier"
        );
        Ok(response)
    }
}
