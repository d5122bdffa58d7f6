//! Core types for LinguaQuest

mod state;
mod reason;
mod session;
mod score;
mod aggregates;
mod badge;
mod voice;
mod remote;
mod error;
mod context;
mod output;

pub use state::RoundState;
pub use reason::ReasonCode;
pub use session::{
    GameSession, InFlight, OperationKind, RoundContent, RoundToken, Stance, Tone,
    DEFAULT_LANGUAGE, LANGUAGES,
};
pub use score::ScoreEvent;
pub use aggregates::{tokenize, RoundAggregates};
pub use badge::Badge;
pub use voice::{RecognitionError, VoiceAction, VoiceCommand, VoiceError};
pub use remote::{
    BadgeAward, Delivered, DialogueRequest, DialogueResponse, EvaluateRequest, EvaluateResponse,
    LevelUpdate, RemoteError, RemoteOp, ScenarioRequest, ScenarioResponse, ScoreSubmission, SessionEnd,
    SessionStart, TranslateRequest, TranslationResponse,
};
pub use error::GameError;
pub use context::{generate_session_id, SessionContext};
pub use output::RoundSnapshot;
