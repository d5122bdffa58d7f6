//! Snapshot published to presentation layers after every event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Badge, InFlight, ReasonCode, RoundState, Stance};

/// Read-only view of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub timestamp: DateTime<Utc>,
    pub round: u32,
    pub total_rounds: u32,
    pub state: RoundState,
    pub time_left_secs: u32,
    pub timer_active: bool,
    /// Animated counter
    pub displayed_xp: i64,
    /// Where the counter is heading
    pub target_xp: i64,
    pub daily_xp: i64,
    /// 0.0..=1.0
    pub daily_progress: f64,
    pub level: i64,
    pub category: String,
    pub difficulty: String,
    pub language: String,
    pub scenario: String,
    pub argument: String,
    pub translation: String,
    pub feedback: String,
    pub score: Option<f64>,
    pub ai_response: String,
    pub ai_stance: Stance,
    pub loading: InFlight,
    /// Fallback content is on screen
    pub demo_mode: bool,
    pub listening: bool,
    /// Unlocked at game over
    pub badges: Vec<Badge>,
    /// Transient message for the player
    pub notice: Option<String>,
    /// Last event that changed the game
    pub reason: ReasonCode,
}

impl RoundSnapshot {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.state.color_code();
        let reset = RoundState::color_reset();
        format!(
            "{}{} round {}/{} | state={} | {}s left | xp={} (lvl {}) | daily {:.0}% | {}{}",
            color,
            self.state.emoji(),
            self.round,
            self.total_rounds,
            self.state,
            self.time_left_secs,
            self.displayed_xp,
            self.level,
            self.daily_progress * 100.0,
            self.reason.code(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "round={}/{} | state={} | time_left={} | xp={} | level={} | daily={:.2} | reason={}",
            self.round,
            self.total_rounds,
            self.state,
            self.time_left_secs,
            self.displayed_xp,
            self.level,
            self.daily_progress,
            self.reason.code()
        )
    }
}
