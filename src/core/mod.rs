//! Core modules for LinguaQuest

pub mod clock;
pub mod round;
pub mod xp;
pub mod badges;
pub mod voice;
pub mod remote;
pub mod fallback;
pub mod game;
pub mod api;

pub use clock::Clock;
pub use round::{Effect, GameSummary, RoundMachine, Step};
pub use xp::{daily_progress, daily_xp, level_for, XpAnimation, XpLedger};
pub use badges::BadgeEvaluator;
pub use voice::{
    LogSynthesizer, NoRecognizer, ScriptedRecognizer, SpeechRecognizer, SpeechSynthesizer,
    VoiceController, VoiceInterpreter, VoiceOutcome, VOICE_COMMANDS,
};
pub use remote::{HttpRemote, OfflineRemote, RemoteOps};
pub use game::{CommandReply, GameCommand, GameDriver, GameHandle};
pub use api::{create_router, run_server, AppState};
