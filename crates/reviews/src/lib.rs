//! Reviews integration for the storefront.
//!
//! - `catalog`: internal product lookup against the catalog backend
//! - `external`: the third-party reviews provider
//! - `fallback`: the mock reviews API used when the provider cannot answer
//! - `service`: resolution flow tying the three together around the shared
//!   external product cache

pub mod catalog;
pub mod error;
pub mod external;
pub mod fallback;
pub mod http;
pub mod probe;
pub mod service;

pub use catalog::{HttpProductCatalog, InMemoryProductCatalog, ProductCatalog};
pub use error::ReviewsError;
pub use external::{ExternalReviewsApi, HttpExternalReviewsApi};
pub use fallback::{FallbackReviewsApi, HttpMockReviewsApi};
pub use probe::{probe_upstreams, UpstreamStatus};
pub use service::ReviewService;
