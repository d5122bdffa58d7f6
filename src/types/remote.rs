//! Request / response shapes for the backend, and their failures

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Badge;

/// Remote operations the core awaits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOp {
    Scenario,
    Translation,
    Evaluation,
    Dialogue,
    SubmitScore,
    IncrementStreak,
    AwardBadge,
    StartSession,
    EndSession,
    UpdateLevel,
}

impl RemoteOp {
    /// Failure name used in logs
    pub fn failure_name(&self) -> &'static str {
        match self {
            RemoteOp::Scenario => "ScenarioUnavailable",
            RemoteOp::Translation => "TranslationUnavailable",
            RemoteOp::Evaluation => "EvaluationUnavailable",
            RemoteOp::Dialogue => "DialogueUnavailable",
            RemoteOp::SubmitScore => "SubmitScoreFailed",
            RemoteOp::IncrementStreak => "IncrementStreakFailed",
            RemoteOp::AwardBadge => "AwardBadgeFailed",
            RemoteOp::StartSession => "StartSessionFailed",
            RemoteOp::EndSession => "EndSessionFailed",
            RemoteOp::UpdateLevel => "UpdateLevelFailed",
        }
    }
}

impl std::fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.failure_name())
    }
}

/// Why a remote operation failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("{op}: backend unreachable: {reason}")]
    Unreachable { op: RemoteOp, reason: String },
    #[error("{op}: timed out")]
    Timeout { op: RemoteOp },
    #[error("{op}: HTTP {status}")]
    Status { op: RemoteOp, status: u16 },
    #[error("{op}: malformed response: {reason}")]
    Decode { op: RemoteOp, reason: String },
    #[error("{op}: offline mode")]
    Offline { op: RemoteOp },
}

impl RemoteError {
    pub fn op(&self) -> RemoteOp {
        match self {
            RemoteError::Unreachable { op, .. }
            | RemoteError::Timeout { op }
            | RemoteError::Status { op, .. }
            | RemoteError::Decode { op, .. }
            | RemoteError::Offline { op } => *op,
        }
    }
}

// =============================================================================
// Round content
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub category: String,
    pub difficulty: String,
    pub language: String,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResponse {
    pub scenario: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub src_lang: String,
    pub tgt_lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub argument: String,
    pub tone: String,
    pub scenario: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub persuaded: bool,
    pub feedback: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub scenario: String,
    pub user_argument: String,
    pub ai_stance: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub ai_response: String,
    pub new_stance: String,
}

/// A response, or the fallback substituted for a failed call
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered<T> {
    pub value: T,
    pub fallback: bool,
}

impl<T> Delivered<T> {
    pub fn live(value: T) -> Self {
        Self { value, fallback: false }
    }

    pub fn fallback(value: T) -> Self {
        Self { value, fallback: true }
    }
}

// =============================================================================
// Persistence (fire-and-forget)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_session_id: Option<String>,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStart {
    pub session_id: String,
    pub category: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEnd {
    pub end_time: String,
    pub total_score: i64,
    pub rounds_played: u32,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpdate {
    pub level: i64,
}

/// Badge award payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub badge_type: String,
    pub badge_name: String,
    pub badge_description: String,
}

impl From<Badge> for BadgeAward {
    fn from(badge: Badge) -> Self {
        Self {
            badge_type: badge.id().to_string(),
            badge_name: badge.name().to_string(),
            badge_description: badge.description().to_string(),
        }
    }
}
