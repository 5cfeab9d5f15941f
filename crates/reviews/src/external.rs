//! Client for the third-party reviews provider.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shopfront_core::config::ReviewsConfig;
use shopfront_core::domain::review::{ExternalProduct, ExternalProductId};
use tracing::error;

use crate::error::ReviewsError;
use crate::http::{build_client, join_url, require_json};

pub const API_KEY_HEADER: &str = "X-API-KEY";

#[async_trait]
pub trait ExternalReviewsApi: Send + Sync {
    /// `GET {base}/product`
    async fn list_products(&self) -> Result<Vec<ExternalProduct>, ReviewsError>;

    /// `GET {base}/product/{id}`, full record including reviews.
    async fn get_product(
        &self,
        external_id: ExternalProductId,
    ) -> Result<ExternalProduct, ReviewsError>;
}

pub struct HttpExternalReviewsApi {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpExternalReviewsApi {
    pub fn from_config(config: &ReviewsConfig) -> Result<Self, ReviewsError> {
        let client = build_client(config.request_timeout())?;
        Self::new(client, config.external_base_url.clone(), config.external_api_key.clone())
    }

    pub fn new(
        client: Client,
        base_url: String,
        api_key: SecretString,
    ) -> Result<Self, ReviewsError> {
        if base_url.trim().is_empty() {
            error!(
                event_name = "reviews.external.config_missing",
                field = "external_base_url",
                "external reviews provider is not configured"
            );
            return Err(ReviewsError::Configuration(
                "external reviews base url is missing".to_string(),
            ));
        }
        if api_key.expose_secret().trim().is_empty() {
            error!(
                event_name = "reviews.external.config_missing",
                field = "external_api_key",
                "external reviews provider is not configured"
            );
            return Err(ReviewsError::Configuration(
                "external reviews api key is missing".to_string(),
            ));
        }

        Ok(Self { client, base_url, api_key })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ExternalReviewsApi for HttpExternalReviewsApi {
    async fn list_products(&self) -> Result<Vec<ExternalProduct>, ReviewsError> {
        let url = join_url(&self.base_url, "product");
        let request = self.client.get(&url).header(API_KEY_HEADER, self.api_key.expose_secret());
        require_json(&url, request).await
    }

    async fn get_product(
        &self,
        external_id: ExternalProductId,
    ) -> Result<ExternalProduct, ReviewsError> {
        let url = join_url(&self.base_url, &format!("product/{external_id}"));
        let request = self.client.get(&url).header(API_KEY_HEADER, self.api_key.expose_secret());
        require_json(&url, request).await
    }
}
