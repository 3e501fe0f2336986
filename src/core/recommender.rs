use crate::core::{
    matcher::PreferenceMatcher,
    ranker::HistoryRanker,
};
use crate::models::{CustomerPreferences, OrderHistoryEntry, ScoredCandidate};
use crate::services::store::{CatalogStore, StoreError};

/// Result of the recommendation pipeline
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub candidates: Vec<ScoredCandidate>,
    pub relaxed: bool,
    pub personalized: bool,
}

/// Preference matching followed by optional history ranking
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    matcher: PreferenceMatcher,
    ranker: HistoryRanker,
}

impl Recommender {
    pub fn new(matcher: PreferenceMatcher, ranker: HistoryRanker) -> Self {
        Self { matcher, ranker }
    }

    pub async fn recommend(
        &self,
        store: &dyn CatalogStore,
        preferences: &CustomerPreferences,
        history: &[OrderHistoryEntry],
    ) -> Result<Recommendation, StoreError> {
        let matched = self.matcher.find_candidates(store, preferences).await?;
        let ranked = self.ranker.rank(matched.items, history);

        Ok(Recommendation {
            candidates: ranked.candidates,
            relaxed: matched.relaxed,
            personalized: ranked.personalized,
        })
    }
}
