use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use shopfront_core::config::{AppConfig, LoadOptions};
use shopfront_core::domain::product::ProductId;
use shopfront_core::reviews::ExternalProductCache;
use shopfront_reviews::{ReviewService, ReviewsError};

use crate::commands::CommandResult;

pub fn run(product_id: &str, random: bool) -> CommandResult {
    let product_id = ProductId::from(product_id);

    if random {
        with_service("reviews", |service| async move {
            let review = service.fetch_product_reviews_by_guid(&product_id).await?;
            Ok(("picked one review at random".to_string(), to_value(&review)))
        })
    } else {
        with_service("reviews", |service| async move {
            let response = service.fetch_all_product_reviews_by_guid(&product_id).await?;
            let message = format!(
                "resolved {} review(s) from the {} source",
                response.reviews.len(),
                response.source.as_str()
            );
            Ok((message, to_value(&response)))
        })
    }
}

pub fn run_match(product_id: &str) -> CommandResult {
    let product_id = ProductId::from(product_id);

    with_service("match", |service| async move {
        match service.find_matching_external_product(&product_id).await? {
            Some(product) => Ok((
                format!("matched external product {} `{}`", product.product_id, product.name),
                to_value(&product),
            )),
            None => Err(ReviewsError::NoExternalMatch(product_id.to_string())),
        }
    })
}

fn with_service<F, Fut>(command: &str, action: F) -> CommandResult
where
    F: FnOnce(ReviewService) -> Fut,
    Fut: Future<Output = Result<(String, Option<serde_json::Value>), ReviewsError>>,
{
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let service = match ReviewService::from_config(&config, Arc::new(ExternalProductCache::new())) {
        Ok(service) => service,
        Err(error) => {
            return CommandResult::failure(command, error.class(), error.to_string(), 2);
        }
    };

    match runtime.block_on(action(service)) {
        Ok((message, data)) => CommandResult::success(command, message, data),
        Err(error) => {
            CommandResult::failure(command, error.class(), error.to_string(), exit_code_for(&error))
        }
    }
}

fn exit_code_for(error: &ReviewsError) -> u8 {
    match error {
        ReviewsError::Configuration(_) | ReviewsError::ClientBuild(_) => 2,
        ReviewsError::InternalProductNotFound(_)
        | ReviewsError::NoExternalMatch(_)
        | ReviewsError::NoReviews { .. }
        | ReviewsError::EmptyReviewSet(_) => 5,
        ReviewsError::Stage(_) => 6,
        ReviewsError::Http { .. }
        | ReviewsError::UnexpectedStatus { .. }
        | ReviewsError::Decode { .. }
        | ReviewsError::AllSourcesFailed { .. } => 4,
    }
}

fn to_value<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}
