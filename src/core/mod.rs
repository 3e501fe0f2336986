// Core algorithm exports
pub mod filters;
pub mod matcher;
pub mod ranker;
pub mod recommender;
pub mod scoring;

pub use filters::{MenuFilter, MenuQuery, OrderFilter, OrderQuery, SortDirection, SortField, SortKey};
pub use matcher::{MatchOutcome, PreferenceMatcher};
pub use ranker::{HistoryRanker, RankedCandidates};
pub use recommender::{Recommendation, Recommender};
pub use scoring::{calculate_history_score, derive_signals, HistorySignals, ScoringError};
