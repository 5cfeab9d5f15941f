use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Steps of a single review request. Nothing here is persisted; a tracker
/// lives for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    Start,
    ResolveInternal,
    ResolveExternalList,
    Match,
    UseCachedReviews,
    FetchFreshReviews,
    UpdateCache,
    Done,
    Fallback,
}

impl ResolutionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ResolveInternal => "resolve_internal",
            Self::ResolveExternalList => "resolve_external_list",
            Self::Match => "match",
            Self::UseCachedReviews => "use_cached_reviews",
            Self::FetchFreshReviews => "fetch_fresh_reviews",
            Self::UpdateCache => "update_cache",
            Self::Done => "done",
            Self::Fallback => "fallback",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Fallback)
    }

    /// Any non-terminal stage may drop into `Fallback`.
    pub fn can_advance_to(&self, next: ResolutionStage) -> bool {
        use ResolutionStage::*;

        if next == Fallback {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Start, ResolveInternal)
                | (ResolveInternal, ResolveExternalList)
                | (ResolveExternalList, Match)
                | (Match, UseCachedReviews)
                | (Match, FetchFreshReviews)
                | (UseCachedReviews, Done)
                | (FetchFreshReviews, UpdateCache)
                | (UpdateCache, Done)
        )
    }
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid review resolution transition from {from} to {to}")]
pub struct StageTransitionError {
    pub from: ResolutionStage,
    pub to: ResolutionStage,
}

/// Records the path a review request takes.
#[derive(Clone, Debug)]
pub struct StageTracker {
    subject: String,
    history: Vec<ResolutionStage>,
}

impl StageTracker {
    pub fn new(subject: impl Into<String>) -> Self {
        Self { subject: subject.into(), history: vec![ResolutionStage::Start] }
    }

    pub fn current(&self) -> ResolutionStage {
        self.history.last().copied().unwrap_or(ResolutionStage::Start)
    }

    pub fn history(&self) -> &[ResolutionStage] {
        &self.history
    }

    pub fn advance(&mut self, next: ResolutionStage) -> Result<(), StageTransitionError> {
        let from = self.current();
        if !from.can_advance_to(next) {
            return Err(StageTransitionError { from, to: next });
        }

        debug!(
            event_name = "reviews.flow.stage",
            product_id = %self.subject,
            from = from.as_str(),
            stage = next.as_str(),
            "review resolution advanced"
        );
        self.history.push(next);
        Ok(())
    }
}
