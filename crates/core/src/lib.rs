pub mod config;
pub mod domain;
pub mod errors;
pub mod reviews;

pub use domain::product::{Product, ProductId};
pub use domain::review::{
    AllReviewsResponse, ExternalProduct, ExternalProductId, ExternalReview,
    ExternalReviewResponse, MockReview, MockReviewsResponse, ProductInfo, ReviewSource,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use reviews::{
    find_best_match, ExternalProductCache, MatchError, MatchStrategy, ResolutionStage,
    StageTracker,
};
