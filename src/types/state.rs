//! Round state definitions

use serde::{Deserialize, Serialize};

/// The four possible states of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    /// Clock running, arguments accepted
    Playing,
    /// AI persuaded, waiting to advance
    Success,
    /// Clock ran out, waiting to advance
    Fail,
    /// Last round finished, terminal until a new game
    GameOver,
}

impl RoundState {
    /// Only PLAYING accepts arguments, translation, evaluation and dialogue
    pub fn accepts_actions(&self) -> bool {
        matches!(self, RoundState::Playing)
    }

    /// SUCCESS and FAIL auto-advance after the fixed delay
    pub fn is_transient(&self) -> bool {
        matches!(self, RoundState::Success | RoundState::Fail)
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            RoundState::Playing => "\x1b[36m",  // Cyan
            RoundState::Success => "\x1b[32m",  // Green
            RoundState::Fail => "\x1b[31m",     // Red
            RoundState::GameOver => "\x1b[35m", // Magenta
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for state
    pub fn emoji(&self) -> &'static str {
        match self {
            RoundState::Playing => "⏱",
            RoundState::Success => "🎉",
            RoundState::Fail => "😅",
            RoundState::GameOver => "🏆",
        }
    }
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoundState::Playing => "PLAYING",
            RoundState::Success => "SUCCESS",
            RoundState::Fail => "FAIL",
            RoundState::GameOver => "GAMEOVER",
        };
        write!(f, "{}", name)
    }
}
