use shopfront_core::domain::review::ExternalProductId;
use shopfront_core::reviews::StageTransitionError;
use shopfront_core::ApplicationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewsError {
    #[error("reviews configuration error: {0}")]
    Configuration(String),
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request to `{url}` failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` returned status {status}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error("could not decode response from `{url}`: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("internal product `{0}` was not found")]
    InternalProductNotFound(String),
    #[error("no external product matches internal product `{0}`")]
    NoExternalMatch(String),
    #[error("external product {external_id} has no reviews")]
    NoReviews { external_id: ExternalProductId },
    #[error("review set for `{0}` is empty")]
    EmptyReviewSet(String),
    #[error(transparent)]
    Stage(#[from] StageTransitionError),
    #[error("external reviews failed ({primary}); fallback failed ({fallback})")]
    AllSourcesFailed { primary: Box<ReviewsError>, fallback: Box<ReviewsError> },
}

impl ReviewsError {
    /// Short machine-readable class used in logs and CLI output.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Configuration(_) | Self::ClientBuild(_) => "configuration",
            Self::Http { .. } => "http",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Decode { .. } => "decode",
            Self::InternalProductNotFound(_) => "internal_not_found",
            Self::NoExternalMatch(_) => "no_external_match",
            Self::NoReviews { .. } => "no_reviews",
            Self::EmptyReviewSet(_) => "empty_review_set",
            Self::Stage(_) => "stage_transition",
            Self::AllSourcesFailed { .. } => "all_sources_failed",
        }
    }
}

impl From<ReviewsError> for ApplicationError {
    fn from(value: ReviewsError) -> Self {
        match value {
            ReviewsError::Configuration(message) => Self::Configuration(message),
            ReviewsError::ClientBuild(error) => Self::Configuration(error.to_string()),
            ReviewsError::InternalProductNotFound(id) => {
                Self::NotFound(format!("internal product `{id}`"))
            }
            ReviewsError::Stage(error) => Self::Domain(error.into()),
            other => Self::Integration(other.to_string()),
        }
    }
}
