//! Badge evaluator: end-of-game aggregates → unlocked badges
//!
//! Pure and deterministic. Called once per game, at the GAMEOVER transition.

use std::collections::BTreeSet;

use crate::types::{Badge, RoundAggregates};
use crate::{BADGE_CREATIVE_MIN_WORDS, BADGE_HIGHSCORE_MIN_SCORE, BADGE_STREAK_MIN_WINS};

/// Badge rules
#[derive(Debug, Default, Clone, Copy)]
pub struct BadgeEvaluator;

impl BadgeEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Every rule is independent; any subset may fire.
    ///
    /// `perfect` requires every round of the game to have ended in SUCCESS:
    /// `all_persuaded` and `rounds_completed == total_rounds`.
    pub fn evaluate(
        &self,
        aggregates: &RoundAggregates,
        final_score: f64,
        total_rounds: u32,
    ) -> BTreeSet<Badge> {
        let mut unlocked = BTreeSet::new();

        if aggregates.round_wins >= BADGE_STREAK_MIN_WINS {
            unlocked.insert(Badge::Streak);
        }
        if final_score >= BADGE_HIGHSCORE_MIN_SCORE {
            unlocked.insert(Badge::Highscore);
        }
        if aggregates.unique_word_count() >= BADGE_CREATIVE_MIN_WORDS {
            unlocked.insert(Badge::Creative);
        }
        if aggregates.all_persuaded && total_rounds > 0 && aggregates.rounds_completed == total_rounds {
            unlocked.insert(Badge::Perfect);
        }

        unlocked
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregates(wins: u32, words: usize, all_persuaded: bool, completed: u32) -> RoundAggregates {
        RoundAggregates {
            round_wins: wins,
            unique_words_seen: (0..words).map(|i| format!("word{}", i)).collect(),
            all_persuaded,
            rounds_completed: completed,
            peak_score: 0.0,
        }
    }

    #[test]
    fn test_streak_highscore_creative() {
        let agg = aggregates(3, 25, true, 5);
        let badges = BadgeEvaluator::new().evaluate(&agg, 9.0, 5);
        assert!(badges.contains(&Badge::Streak));
        assert!(badges.contains(&Badge::Highscore));
        assert!(badges.contains(&Badge::Creative));
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let agg = aggregates(3, 20, false, 5);
        let badges = BadgeEvaluator::new().evaluate(&agg, 8.0, 5);
        assert_eq!(
            badges,
            [Badge::Streak, Badge::Highscore, Badge::Creative].into_iter().collect()
        );
    }

    #[test]
    fn test_nothing_below_thresholds() {
        let agg = aggregates(2, 19, false, 5);
        assert!(BadgeEvaluator::new().evaluate(&agg, 7.9, 5).is_empty());
    }

    #[test]
    fn test_perfect_needs_every_round() {
        let eval = BadgeEvaluator::new();
        assert!(eval.evaluate(&aggregates(5, 0, true, 5), 0.0, 5).contains(&Badge::Perfect));
        assert!(!eval.evaluate(&aggregates(4, 0, true, 4), 0.0, 5).contains(&Badge::Perfect));
        assert!(!eval.evaluate(&aggregates(4, 0, false, 5), 0.0, 5).contains(&Badge::Perfect));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let agg = aggregates(4, 30, true, 5);
        let eval = BadgeEvaluator::new();
        assert_eq!(eval.evaluate(&agg, 9.0, 5), eval.evaluate(&agg, 9.0, 5));
    }
}
