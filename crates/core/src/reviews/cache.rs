//! Application-scoped cache of the external provider's product list.
//!
//! The slot is either unset or holds the last list fetched (possibly empty).
//! There is no TTL; the slot lives until it is cleared or the process exits.
//! Population goes through [`ExternalProductCache::get_or_populate`], which
//! lets one caller fetch while concurrent callers wait for its result.

use std::future::Future;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::review::ExternalProduct;

#[derive(Debug, Default)]
pub struct ExternalProductCache {
    slot: RwLock<Option<Vec<ExternalProduct>>>,
    populate: Mutex<()>,
}

impl ExternalProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the slot is unset, which is distinct from `Some(vec![])`.
    pub async fn get(&self) -> Option<Vec<ExternalProduct>> {
        self.slot.read().await.clone()
    }

    pub async fn is_populated(&self) -> bool {
        self.slot.read().await.is_some()
    }

    pub async fn set(&self, products: Vec<ExternalProduct>) {
        debug!(
            event_name = "reviews.cache.set",
            product_count = products.len(),
            "external product cache replaced"
        );
        *self.slot.write().await = Some(products);
    }

    /// Replaces the entry with the same `product_id`. Returns `false` without
    /// touching anything when the slot is unset or the id is absent.
    pub async fn update_by_id(&self, product: ExternalProduct) -> bool {
        let mut slot = self.slot.write().await;
        let Some(products) = slot.as_mut() else {
            return false;
        };

        match products.iter_mut().find(|existing| existing.product_id == product.product_id) {
            Some(existing) => {
                debug!(
                    event_name = "reviews.cache.update",
                    external_id = product.product_id,
                    review_count = product.reviews.len(),
                    "external product cache entry replaced"
                );
                *existing = product;
                true
            }
            None => false,
        }
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
        debug!(event_name = "reviews.cache.clear", "external product cache cleared");
    }

    /// Returns the cached list, or runs `fetch` to fill the slot. Only one
    /// fetch runs at a time; callers that queued behind it reuse its result.
    /// A failed fetch leaves the slot unset.
    pub async fn get_or_populate<F, Fut, E>(&self, fetch: F) -> Result<Vec<ExternalProduct>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ExternalProduct>, E>>,
    {
        if let Some(products) = self.get().await {
            return Ok(products);
        }

        let _guard = self.populate.lock().await;
        if let Some(products) = self.get().await {
            debug!(
                event_name = "reviews.cache.populated_by_peer",
                product_count = products.len(),
                "external product cache filled while waiting"
            );
            return Ok(products);
        }

        let products = fetch().await?;
        self.set(products.clone()).await;
        Ok(products)
    }
}
