use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use shopfront_core::config::CatalogConfig;
use shopfront_core::domain::product::{Product, ProductId};
use tokio::sync::RwLock;

use crate::error::ReviewsError;
use crate::http::{join_url, send_json};

/// Lookup of internal products owned by the catalog backend.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ReviewsError>;
}

pub struct HttpProductCatalog {
    client: Client,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(client: Client, config: &CatalogConfig) -> Self {
        Self { client, base_url: config.base_url.clone() }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ReviewsError> {
        let url = join_url(&self.base_url, &format!("api/products/{id}"));
        send_json(&url, self.client.get(&url)).await
    }
}

#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductCatalog {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|product| (product.id.0.clone(), product)).collect();
        Self { products: RwLock::new(products) }
    }

    pub async fn save(&self, product: Product) {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ReviewsError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }
}
