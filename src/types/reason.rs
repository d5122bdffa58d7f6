//! Reason codes for state changes and round events

use serde::{Deserialize, Serialize};

/// Reason codes attached to every step of the round machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R001: Clock
    // =========================================================================
    /// One second elapsed
    R001_CLOCK_TICK,
    /// Tick arrived while the clock is inactive
    R001_CLOCK_IDLE,

    // =========================================================================
    // R002: Current state
    // =========================================================================
    /// State is PLAYING
    R002_STATE_PLAYING,
    /// State is SUCCESS
    R002_STATE_SUCCESS,
    /// State is FAIL
    R002_STATE_FAIL,
    /// State is GAMEOVER
    R002_STATE_GAMEOVER,

    // =========================================================================
    // R003: Transitions
    // =========================================================================
    /// PLAYING → FAIL, clock reached zero
    R003_TRANSITION_TO_FAIL,
    /// PLAYING → SUCCESS, AI persuaded
    R003_TRANSITION_TO_SUCCESS,
    /// SUCCESS / FAIL → PLAYING (next round)
    R003_TRANSITION_NEXT_ROUND,
    /// SUCCESS / FAIL → GAMEOVER
    R003_TRANSITION_TO_GAMEOVER,
    /// Any → PLAYING, round 1 of a fresh game
    R003_NEW_GAME,

    // =========================================================================
    // R004: Round content
    // =========================================================================
    /// Argument text stored
    R004_ARGUMENT_SUBMITTED,
    /// Remote request issued
    R004_REQUEST_ISSUED,
    /// Scenario text arrived
    R004_SCENARIO_LOADED,
    /// Translation arrived
    R004_TRANSLATION_LOADED,
    /// Evaluation scored, AI not persuaded
    R004_EVALUATION_SCORED,
    /// AI reply arrived
    R004_DIALOGUE_LOADED,

    // =========================================================================
    // R005: Voice and presentation
    // =========================================================================
    /// Transcript matched a command
    R005_VOICE_MATCHED,
    /// Transcript matched nothing
    R005_VOICE_NOT_RECOGNIZED,
    /// Recognition failed or was refused
    R005_VOICE_FAILED,
    /// XP counter moved one frame
    R005_XP_FRAME,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R001_CLOCK_TICK => "R001_CLOCK_TICK",
            Self::R001_CLOCK_IDLE => "R001_CLOCK_IDLE",
            Self::R002_STATE_PLAYING => "R002_STATE_PLAYING",
            Self::R002_STATE_SUCCESS => "R002_STATE_SUCCESS",
            Self::R002_STATE_FAIL => "R002_STATE_FAIL",
            Self::R002_STATE_GAMEOVER => "R002_STATE_GAMEOVER",
            Self::R003_TRANSITION_TO_FAIL => "R003_TRANSITION_TO_FAIL",
            Self::R003_TRANSITION_TO_SUCCESS => "R003_TRANSITION_TO_SUCCESS",
            Self::R003_TRANSITION_NEXT_ROUND => "R003_TRANSITION_NEXT_ROUND",
            Self::R003_TRANSITION_TO_GAMEOVER => "R003_TRANSITION_TO_GAMEOVER",
            Self::R003_NEW_GAME => "R003_NEW_GAME",
            Self::R004_ARGUMENT_SUBMITTED => "R004_ARGUMENT_SUBMITTED",
            Self::R004_REQUEST_ISSUED => "R004_REQUEST_ISSUED",
            Self::R004_SCENARIO_LOADED => "R004_SCENARIO_LOADED",
            Self::R004_TRANSLATION_LOADED => "R004_TRANSLATION_LOADED",
            Self::R004_EVALUATION_SCORED => "R004_EVALUATION_SCORED",
            Self::R004_DIALOGUE_LOADED => "R004_DIALOGUE_LOADED",
            Self::R005_VOICE_MATCHED => "R005_VOICE_MATCHED",
            Self::R005_VOICE_NOT_RECOGNIZED => "R005_VOICE_NOT_RECOGNIZED",
            Self::R005_VOICE_FAILED => "R005_VOICE_FAILED",
            Self::R005_XP_FRAME => "R005_XP_FRAME",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R001_CLOCK_TICK => "One second elapsed",
            Self::R001_CLOCK_IDLE => "Clock inactive",
            Self::R002_STATE_PLAYING => "Round in progress",
            Self::R002_STATE_SUCCESS => "AI persuaded",
            Self::R002_STATE_FAIL => "Time ran out",
            Self::R002_STATE_GAMEOVER => "Game complete",
            Self::R003_TRANSITION_TO_FAIL => "Entering FAIL state",
            Self::R003_TRANSITION_TO_SUCCESS => "Entering SUCCESS state",
            Self::R003_TRANSITION_NEXT_ROUND => "Starting next round",
            Self::R003_TRANSITION_TO_GAMEOVER => "Entering GAMEOVER state",
            Self::R003_NEW_GAME => "New game started",
            Self::R004_ARGUMENT_SUBMITTED => "Argument stored",
            Self::R004_REQUEST_ISSUED => "Request sent",
            Self::R004_SCENARIO_LOADED => "Scenario ready",
            Self::R004_TRANSLATION_LOADED => "Translation ready",
            Self::R004_EVALUATION_SCORED => "Argument scored",
            Self::R004_DIALOGUE_LOADED => "AI replied",
            Self::R005_VOICE_MATCHED => "Voice command matched",
            Self::R005_VOICE_NOT_RECOGNIZED => "Command not recognized",
            Self::R005_VOICE_FAILED => "Voice recognition failed",
            Self::R005_XP_FRAME => "XP counter updated",
        }
    }

    /// Whether this reason is a state transition
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            Self::R003_TRANSITION_TO_FAIL
                | Self::R003_TRANSITION_TO_SUCCESS
                | Self::R003_TRANSITION_NEXT_ROUND
                | Self::R003_TRANSITION_TO_GAMEOVER
                | Self::R003_NEW_GAME
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
