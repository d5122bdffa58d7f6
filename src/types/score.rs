//! Score events produced by evaluation responses

use serde::{Deserialize, Serialize};

use crate::{MAX_RAW_SCORE, PERSUASION_BONUS_XP, XP_PER_SCORE_POINT};

/// XP earned from one evaluation. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    /// Evaluator score, clamped to 0..=10
    pub raw_score: f64,
    pub persuaded: bool,
    /// floor(raw_score × 10)
    pub base_xp: i64,
    /// 50 when persuaded
    pub bonus_xp: i64,
    /// base + bonus
    pub earned_xp: i64,
}

impl ScoreEvent {
    pub fn new(raw_score: f64, persuaded: bool) -> Self {
        // The backend may report negative scores for confrontational arguments
        let raw_score = if raw_score.is_finite() {
            raw_score.clamp(0.0, MAX_RAW_SCORE)
        } else {
            0.0
        };
        let base_xp = (raw_score * XP_PER_SCORE_POINT).floor() as i64;
        let bonus_xp = if persuaded { PERSUASION_BONUS_XP } else { 0 };
        Self {
            raw_score,
            persuaded,
            base_xp,
            bonus_xp,
            earned_xp: base_xp + bonus_xp,
        }
    }
}
