pub mod cache;
pub mod matcher;
pub mod stage;

pub use cache::ExternalProductCache;
pub use matcher::{find_best_match, normalize_name, MatchError, MatchStrategy};
pub use stage::{ResolutionStage, StageTracker, StageTransitionError};
