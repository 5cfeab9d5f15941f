//! Secondary reviews source used when the external provider cannot answer.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shopfront_core::config::ReviewsConfig;
use shopfront_core::domain::product::ProductId;
use shopfront_core::domain::review::MockReviewsResponse;

use crate::error::ReviewsError;
use crate::http::{build_client, join_url, require_json};

pub const FUNCTIONS_KEY_HEADER: &str = "x-functions-key";

#[async_trait]
pub trait FallbackReviewsApi: Send + Sync {
    /// `GET {base}/api/products/{id}/reviews`
    async fn product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<MockReviewsResponse, ReviewsError>;
}

pub struct HttpMockReviewsApi {
    client: Client,
    base_url: String,
    functions_key: Option<SecretString>,
}

impl HttpMockReviewsApi {
    pub fn from_config(config: &ReviewsConfig) -> Result<Self, ReviewsError> {
        let client = build_client(config.request_timeout())?;
        Self::new(client, config.mock_base_url.clone(), config.mock_functions_key.clone())
    }

    pub fn new(
        client: Client,
        base_url: String,
        functions_key: Option<SecretString>,
    ) -> Result<Self, ReviewsError> {
        if base_url.trim().is_empty() {
            return Err(ReviewsError::Configuration("mock reviews base url is missing".to_string()));
        }
        Ok(Self { client, base_url, functions_key })
    }
}

#[async_trait]
impl FallbackReviewsApi for HttpMockReviewsApi {
    async fn product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<MockReviewsResponse, ReviewsError> {
        let url = join_url(&self.base_url, &format!("api/products/{product_id}/reviews"));
        let mut request = self.client.get(&url);
        if let Some(key) = &self.functions_key {
            request = request.header(FUNCTIONS_KEY_HEADER, key.expose_secret());
        }
        require_json(&url, request).await
    }
}
