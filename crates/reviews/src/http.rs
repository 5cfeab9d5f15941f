use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ReviewsError;

const USER_AGENT: &str = concat!("shopfront/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> Result<Client, ReviewsError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .timeout(timeout)
        .build()
        .map_err(ReviewsError::ClientBuild)
}

pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Sends `request` and decodes a JSON body. `Ok(None)` on 404.
pub async fn send_json<T>(url: &str, request: RequestBuilder) -> Result<Option<T>, ReviewsError>
where
    T: DeserializeOwned,
{
    debug!(event_name = "reviews.http.request", url, "sending upstream request");

    let response = request
        .send()
        .await
        .map_err(|source| ReviewsError::Http { url: url.to_string(), source })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ReviewsError::UnexpectedStatus { url: url.to_string(), status: status.as_u16() });
    }

    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|source| ReviewsError::Decode { url: url.to_string(), source })
}

/// Like [`send_json`] but treats 404 as an error.
pub async fn require_json<T>(url: &str, request: RequestBuilder) -> Result<T, ReviewsError>
where
    T: DeserializeOwned,
{
    send_json(url, request)
        .await?
        .ok_or_else(|| ReviewsError::UnexpectedStatus { url: url.to_string(), status: 404 })
}
