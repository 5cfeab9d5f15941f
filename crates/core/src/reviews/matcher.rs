//! Pairs an internal product with an external one by name.
//!
//! Strategies run in order and the first `Some` wins. A strategy that errors
//! is logged and skipped.

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::product::Product;
use crate::domain::review::ExternalProduct;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("internal product `{product_id}` has a blank name")]
    BlankName { product_id: String },
}

pub type StrategyFn =
    for<'a> fn(&'a [ExternalProduct], &str) -> Result<Option<&'a ExternalProduct>, MatchError>;

#[derive(Clone, Copy)]
pub struct MatchStrategy {
    pub name: &'static str,
    pub run: StrategyFn,
}

pub const DEFAULT_STRATEGIES: &[MatchStrategy] = &[
    MatchStrategy { name: "exact", run: exact_name },
    MatchStrategy { name: "partial", run: partial_name },
];

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn find_best_match<'a>(
    external: &'a [ExternalProduct],
    internal: &Product,
) -> Option<&'a ExternalProduct> {
    find_best_match_with(external, internal, DEFAULT_STRATEGIES)
}

pub fn find_best_match_with<'a>(
    external: &'a [ExternalProduct],
    internal: &Product,
    strategies: &[MatchStrategy],
) -> Option<&'a ExternalProduct> {
    if external.is_empty() {
        return None;
    }

    let target = normalize_name(&internal.name);
    for strategy in strategies {
        let outcome = if target.is_empty() {
            Err(MatchError::BlankName { product_id: internal.id.0.clone() })
        } else {
            (strategy.run)(external, &target)
        };

        match outcome {
            Ok(Some(found)) => {
                debug!(
                    event_name = "reviews.match.found",
                    strategy = strategy.name,
                    product_id = %internal.id,
                    external_id = found.product_id,
                    "external product matched"
                );
                return Some(found);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(
                    event_name = "reviews.match.strategy_failed",
                    strategy = strategy.name,
                    product_id = %internal.id,
                    error = %error,
                    "matching strategy failed, trying next"
                );
            }
        }
    }

    None
}

/// First item whose normalized name equals `target`.
pub fn exact_name<'a>(
    external: &'a [ExternalProduct],
    target: &str,
) -> Result<Option<&'a ExternalProduct>, MatchError> {
    Ok(external.iter().find(|candidate| normalize_name(&candidate.name) == target))
}

/// Items whose name contains, or is contained in, `target`. The one with the
/// most reviews wins; ties keep the earliest.
pub fn partial_name<'a>(
    external: &'a [ExternalProduct],
    target: &str,
) -> Result<Option<&'a ExternalProduct>, MatchError> {
    let mut best: Option<&ExternalProduct> = None;

    for candidate in external {
        let name = normalize_name(&candidate.name);
        if name.is_empty() {
            continue;
        }
        if !(name.contains(target) || target.contains(name.as_str())) {
            continue;
        }
        match best {
            Some(current) if current.review_count() >= candidate.review_count() => {}
            _ => best = Some(candidate),
        }
    }

    Ok(best)
}
