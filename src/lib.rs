//! LinguaQuest: round lifecycle core
//!
//! Countdown clock → round state machine → XP accrual → badges at game over,
//! plus the voice command interpreter that drives the same actions by speech.

pub mod config;
pub mod core;
pub mod types;

// =============================================================================
// ROUNDS [C]
// =============================================================================

/// Rounds per game
pub const TOTAL_ROUNDS: u32 = 5;

/// Countdown per round (seconds)
pub const ROUND_TIME_SECS: u32 = 50;

/// Pause on SUCCESS / FAIL before the next round or game over (milliseconds)
pub const ADVANCE_DELAY_MS: u64 = 2000;

/// Clock period (milliseconds)
pub const TICK_MS: u64 = 1000;

// =============================================================================
// XP [C]
// =============================================================================

/// XP per raw score point (score 0..10 → 0..100 base XP)
pub const XP_PER_SCORE_POINT: f64 = 10.0;

/// Bonus XP when the AI is persuaded
pub const PERSUASION_BONUS_XP: i64 = 50;

/// Highest raw score the evaluator reports
pub const MAX_RAW_SCORE: f64 = 10.0;

/// XP counter animation length (milliseconds)
pub const XP_ANIMATION_MS: u64 = 600;

/// XP counter animation frame (milliseconds) - 600 / 20 = 30 frames
pub const XP_STEP_MS: u64 = 20;

/// Daily goal used for the progress ring
pub const DAILY_GOAL_XP: i64 = 100;

/// One level every 100 XP
pub const XP_PER_LEVEL: i64 = 100;

// =============================================================================
// BADGES [C]
// =============================================================================

/// Round wins for the streak badge
pub const BADGE_STREAK_MIN_WINS: u32 = 3;

/// Peak raw score for the highscore badge
pub const BADGE_HIGHSCORE_MIN_SCORE: f64 = 8.0;

/// Distinct argument words for the creative badge
pub const BADGE_CREATIVE_MIN_WORDS: usize = 20;

// =============================================================================
// VOICE [C]
// =============================================================================

/// Hard cap on one listening session (milliseconds)
pub const VOICE_SAFETY_TIMEOUT_MS: u64 = 10000;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
