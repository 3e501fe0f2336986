use crate::core::scoring::{calculate_history_score, derive_signals, ScoringError};
use crate::models::{MenuItem, OrderHistoryEntry, ScoredCandidate, ScoringWeights};
use std::cmp::Ordering;

/// Ranker output
#[derive(Debug, Clone)]
pub struct RankedCandidates {
    pub candidates: Vec<ScoredCandidate>,
    /// False when history was absent or scoring failed
    pub personalized: bool,
}

impl RankedCandidates {
    fn unscored(items: Vec<MenuItem>) -> Self {
        Self {
            candidates: items
                .into_iter()
                .map(|item| ScoredCandidate { item, score: None })
                .collect(),
            personalized: false,
        }
    }
}

/// Re-orders candidates using signals derived from past orders
#[derive(Debug, Clone)]
pub struct HistoryRanker {
    weights: ScoringWeights,
}

impl HistoryRanker {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default())
    }

    /// Rank candidates against order history
    ///
    /// Output is always a permutation of `candidates`. Empty history or a
    /// scoring failure yields the input order with no scores.
    pub fn rank(&self, candidates: Vec<MenuItem>, history: &[OrderHistoryEntry]) -> RankedCandidates {
        if history.is_empty() || candidates.is_empty() {
            return RankedCandidates::unscored(candidates);
        }

        let scores = match self.score_all(&candidates, history) {
            Ok(scores) => scores,
            Err(e) => {
                tracing::warn!("History scoring failed, returning unranked candidates: {}", e);
                return RankedCandidates::unscored(candidates);
            }
        };

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .zip(scores)
            .map(|(item, score)| ScoredCandidate {
                item,
                score: Some(score),
            })
            .collect();

        // sort_by is stable, so equal scores keep their incoming order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        });

        RankedCandidates {
            candidates: scored,
            personalized: true,
        }
    }

    fn score_all(&self, candidates: &[MenuItem], history: &[OrderHistoryEntry]) -> Result<Vec<f64>, ScoringError> {
        let signals = derive_signals(history)?;
        tracing::debug!(
            "History signals: categories={:?}, ingredients={}, price band=[{:.2}, {:.2}]",
            signals.top_categories,
            signals.top_ingredients.len(),
            signals.price_band.min,
            signals.price_band.max
        );

        candidates
            .iter()
            .map(|item| calculate_history_score(item, &signals, &self.weights))
            .collect()
    }
}

impl Default for HistoryRanker {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, DietaryInfo, HistoryItem, MenuCategory, Rating};
    use chrono::Utc;
    use uuid::Uuid;

    fn create_candidate(name: &str, category: MenuCategory, rating: f64) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            category,
            price: 15.0,
            ingredients: vec![],
            dietary: DietaryInfo::default(),
            availability: Availability::Available,
            rating: Rating { average: rating, count: 1 },
            popularity: 0,
            tags: vec![],
            preparation_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn history(categories: &[MenuCategory], price: f64) -> Vec<OrderHistoryEntry> {
        categories
            .iter()
            .map(|c| OrderHistoryEntry {
                items: vec![HistoryItem {
                    name: None,
                    category: *c,
                    ingredients: vec![],
                    price,
                }],
            })
            .collect()
    }

    #[test]
    fn test_empty_history_is_passthrough() {
        let ranker = HistoryRanker::with_default_weights();
        let candidates = vec![
            create_candidate("a", MenuCategory::Main, 3.0),
            create_candidate("b", MenuCategory::Main, 5.0),
        ];

        let ranked = ranker.rank(candidates.clone(), &[]);
        assert!(!ranked.personalized);
        let names: Vec<_> = ranked.candidates.iter().map(|c| c.item.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(ranked.candidates.iter().all(|c| c.score.is_none()));
    }

    #[test]
    fn test_favoured_category_ranks_first() {
        let ranker = HistoryRanker::with_default_weights();
        let candidates = vec![
            create_candidate("cake", MenuCategory::Dessert, 4.0),
            create_candidate("steak", MenuCategory::Beverage, 4.0),
            create_candidate("pasta", MenuCategory::Main, 4.0),
        ];
        let history = history(&[MenuCategory::Main, MenuCategory::Main], 15.0);

        let ranked = ranker.rank(candidates, &history);
        assert!(ranked.personalized);
        assert_eq!(ranked.candidates[0].item.name, "pasta");
        // Ties keep incoming order
        assert_eq!(ranked.candidates[1].item.name, "cake");
        assert_eq!(ranked.candidates[2].item.name, "steak");
    }

    #[test]
    fn test_malformed_history_returns_original_order() {
        let ranker = HistoryRanker::with_default_weights();
        let candidates = vec![
            create_candidate("a", MenuCategory::Dessert, 1.0),
            create_candidate("b", MenuCategory::Main, 5.0),
        ];
        let history = history(&[MenuCategory::Main], f64::NAN);

        let ranked = ranker.rank(candidates, &history);
        assert!(!ranked.personalized);
        assert_eq!(ranked.candidates[0].item.name, "a");
        assert_eq!(ranked.candidates[1].item.name, "b");
    }
}
