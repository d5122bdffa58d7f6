//! Error taxonomy of the round core

use thiserror::Error;

use crate::types::{OperationKind, RemoteError, RoundState, RoundToken, VoiceError};

/// Errors surfaced by the round machine and the game driver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// Action requires PLAYING
    #[error("{action} is disabled while {state}")]
    NotPlaying { action: &'static str, state: RoundState },
    /// A request of the same kind is still in flight
    #[error("{0} request already in flight")]
    Busy(OperationKind),
    /// Translate / evaluate need an argument first
    #[error("no argument submitted")]
    EmptyArgument,
    /// Advance requested outside SUCCESS / FAIL
    #[error("cannot advance while {0}")]
    NotAdvancing(RoundState),
    /// Response or timer for a superseded round
    #[error("stale response for round {got} (current {current})")]
    StaleResponse { current: RoundToken, got: RoundToken },
    #[error("network failure: {0}")]
    NetworkFailure(#[from] RemoteError),
    #[error("voice: {0}")]
    Voice(#[from] VoiceError),
    #[error("invalid input: {0}")]
    ValidationFailure(String),
    /// The driver task has stopped
    #[error("game session closed")]
    SessionClosed,
}

impl GameError {
    /// Rejections are expected gating, not faults
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GameError::NotPlaying { .. }
                | GameError::Busy(_)
                | GameError::EmptyArgument
                | GameError::NotAdvancing(_)
        )
    }
}
