//! Dinewise - restaurant menu, ordering and analytics service
//!
//! The library holds the recommendation pipeline (preference matching
//! followed by history-based ranking), the catalog and order stores, the
//! cached analytics aggregates and the text enrichment client.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{HistoryRanker, PreferenceMatcher, Recommender};
pub use error::ApiError;
pub use models::{CustomerPreferences, MenuItem, Order, OrderHistoryEntry, ScoredCandidate, ScoringWeights};
pub use routes::AppState;
