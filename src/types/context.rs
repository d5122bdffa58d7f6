//! Player context passed to every game driver

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::Tone;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Who is playing and how. Created at login, replaced at logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Backend nickname; persistence calls are skipped when absent
    pub nickname: Option<String>,
    /// Recognizer / synthesizer language tag
    pub voice_language: String,
    pub tone: Tone,
    /// Play success / fail cues
    pub sound: bool,
    /// Backend game-session id
    pub session_id: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            nickname: None,
            voice_language: "en-US".to_string(),
            tone: Tone::default(),
            sound: true,
            session_id: generate_session_id(),
        }
    }
}

impl SessionContext {
    pub fn for_player(nickname: impl Into<String>) -> Self {
        Self {
            nickname: Some(nickname.into()),
            ..Self::default()
        }
    }

    pub fn with_voice_language(mut self, tag: impl Into<String>) -> Self {
        self.voice_language = tag.into();
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

/// Generate a game-session id
pub fn generate_session_id() -> String {
    format!(
        "game_{:x}_{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        SESSION_COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}
