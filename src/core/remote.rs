//! Remote operations: the backend the round core talks to
//!
//! Content calls (scenario, translate, evaluate, dialogue) live at the backend
//! root. Persistence calls (scores, streak, badges, sessions, level) live under the
//! API prefix and are fire-and-forget from the game's point of view.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ConfigError, GameConfig};
use crate::types::{
    BadgeAward, DialogueRequest, DialogueResponse, EvaluateRequest, EvaluateResponse, LevelUpdate,
    RemoteError, RemoteOp, ScenarioRequest, ScenarioResponse, ScoreSubmission, SessionEnd,
    SessionStart, TranslateRequest, TranslationResponse,
};

/// Everything the game awaits from the outside world
#[async_trait]
pub trait RemoteOps: Send + Sync {
    async fn fetch_scenario(&self, request: &ScenarioRequest) -> Result<ScenarioResponse, RemoteError>;

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationResponse, RemoteError>;

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<EvaluateResponse, RemoteError>;

    async fn dialogue(&self, request: &DialogueRequest) -> Result<DialogueResponse, RemoteError>;

    async fn submit_score(&self, nickname: &str, score: &ScoreSubmission) -> Result<(), RemoteError>;

    async fn increment_streak(&self, nickname: &str) -> Result<(), RemoteError>;

    async fn award_badge(&self, nickname: &str, badge: &BadgeAward) -> Result<(), RemoteError>;

    async fn start_game_session(&self, nickname: &str, start: &SessionStart) -> Result<(), RemoteError>;

    async fn end_game_session(&self, session_id: &str, end: &SessionEnd) -> Result<(), RemoteError>;

    async fn update_level(&self, nickname: &str, level: &LevelUpdate) -> Result<(), RemoteError>;
}

// =============================================================================
// HTTP backend
// =============================================================================

/// reqwest client for the LinguaQuest backend
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
    api_prefix: String,
}

impl HttpRemote {
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let base_url = config.backend_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::Invalid {
                field: "backend_url",
                reason: "must not be empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::Invalid {
                field: "request_timeout_ms",
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            api_prefix: config.api_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Content endpoint
    fn content_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Persistence endpoint under the API prefix
    fn api_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, self.api_prefix, path)
    }

    async fn post_json<B, T>(&self, op: RemoteOp, url: String, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!("{} → POST {}", op, url);
        let response = send(op, self.client.post(url).json(body)).await?;
        response.json::<T>().await.map_err(|e| RemoteError::Decode {
            op,
            reason: e.to_string(),
        })
    }

    async fn fire(&self, op: RemoteOp, request: RequestBuilder) -> Result<(), RemoteError> {
        send(op, request).await.map(|_| ())
    }
}

/// Send and map transport / status failures
async fn send(op: RemoteOp, request: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            RemoteError::Timeout { op }
        } else {
            RemoteError::Unreachable {
                op,
                reason: e.to_string(),
            }
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            op,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

#[async_trait]
impl RemoteOps for HttpRemote {
    async fn fetch_scenario(&self, request: &ScenarioRequest) -> Result<ScenarioResponse, RemoteError> {
        self.post_json(RemoteOp::Scenario, self.content_url("scenario"), request)
            .await
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationResponse, RemoteError> {
        self.post_json(RemoteOp::Translation, self.content_url("translate"), request)
            .await
    }

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<EvaluateResponse, RemoteError> {
        self.post_json(RemoteOp::Evaluation, self.content_url("evaluate"), request)
            .await
    }

    async fn dialogue(&self, request: &DialogueRequest) -> Result<DialogueResponse, RemoteError> {
        self.post_json(RemoteOp::Dialogue, self.content_url("dialogue"), request)
            .await
    }

    async fn submit_score(&self, nickname: &str, score: &ScoreSubmission) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.api_url("scores"))
            .query(&[("nickname", nickname)])
            .json(score);
        self.fire(RemoteOp::SubmitScore, request).await
    }

    async fn increment_streak(&self, nickname: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.api_url("streak/increment"))
            .query(&[("nickname", nickname)]);
        self.fire(RemoteOp::IncrementStreak, request).await
    }

    async fn award_badge(&self, nickname: &str, badge: &BadgeAward) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.api_url(&format!("badges/{}", nickname)))
            .query(badge);
        self.fire(RemoteOp::AwardBadge, request).await
    }

    async fn start_game_session(&self, nickname: &str, start: &SessionStart) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.api_url("sessions"))
            .query(&[("nickname", nickname)])
            .json(start);
        self.fire(RemoteOp::StartSession, request).await
    }

    async fn end_game_session(&self, session_id: &str, end: &SessionEnd) -> Result<(), RemoteError> {
        let request = self
            .client
            .put(self.api_url(&format!("sessions/{}", session_id)))
            .json(end);
        self.fire(RemoteOp::EndSession, request).await
    }

    async fn update_level(&self, nickname: &str, level: &LevelUpdate) -> Result<(), RemoteError> {
        let request = self
            .client
            .patch(self.api_url("level"))
            .query(&[("nickname", nickname)])
            .json(level);
        self.fire(RemoteOp::UpdateLevel, request).await
    }
}

// =============================================================================
// Offline
// =============================================================================

/// Backend that is never there; every round plays on fallback content
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteOps for OfflineRemote {
    async fn fetch_scenario(&self, _: &ScenarioRequest) -> Result<ScenarioResponse, RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::Scenario })
    }

    async fn translate(&self, _: &TranslateRequest) -> Result<TranslationResponse, RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::Translation })
    }

    async fn evaluate(&self, _: &EvaluateRequest) -> Result<EvaluateResponse, RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::Evaluation })
    }

    async fn dialogue(&self, _: &DialogueRequest) -> Result<DialogueResponse, RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::Dialogue })
    }

    async fn submit_score(&self, _: &str, _: &ScoreSubmission) -> Result<(), RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::SubmitScore })
    }

    async fn increment_streak(&self, _: &str) -> Result<(), RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::IncrementStreak })
    }

    async fn award_badge(&self, _: &str, _: &BadgeAward) -> Result<(), RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::AwardBadge })
    }

    async fn start_game_session(&self, _: &str, _: &SessionStart) -> Result<(), RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::StartSession })
    }

    async fn end_game_session(&self, _: &str, _: &SessionEnd) -> Result<(), RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::EndSession })
    }

    async fn update_level(&self, _: &str, _: &LevelUpdate) -> Result<(), RemoteError> {
        Err(RemoteError::Offline { op: RemoteOp::UpdateLevel })
    }
}
