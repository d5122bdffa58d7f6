//! Voice command vocabulary and recognition failures

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actions a spoken command can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceAction {
    Next,
    Repeat,
    Leaderboard,
    Settings,
    Start,
    Profile,
    Help,
    Back,
    Home,
    Exit,
}

impl VoiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceAction::Next => "next",
            VoiceAction::Repeat => "repeat",
            VoiceAction::Leaderboard => "leaderboard",
            VoiceAction::Settings => "settings",
            VoiceAction::Start => "start",
            VoiceAction::Profile => "profile",
            VoiceAction::Help => "help",
            VoiceAction::Back => "back",
            VoiceAction::Home => "home",
            VoiceAction::Exit => "exit",
        }
    }

    /// Actions handled by the presentation layer, not the round machine
    pub fn is_navigation(&self) -> bool {
        !matches!(self, VoiceAction::Next | VoiceAction::Repeat | VoiceAction::Start)
    }
}

impl std::fmt::Display for VoiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the static phrase table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceCommand {
    /// Lowercase trigger phrases, matched as substrings
    pub phrases: &'static [&'static str],
    pub action: VoiceAction,
    /// Spoken back as confirmation
    pub description: &'static str,
}

/// Errors reported by the recognizer itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("not-allowed")]
    NotAllowed,
    #[error("service-not-allowed")]
    ServiceNotAllowed,
    #[error("no-speech")]
    NoSpeech,
    #[error("audio-capture")]
    AudioCapture,
    #[error("network")]
    Network,
    #[error("bad-grammar")]
    BadGrammar,
    #[error("language-not-supported")]
    LanguageNotSupported,
    #[error("aborted")]
    Aborted,
    #[error("{0}")]
    Other(String),
}

impl RecognitionError {
    /// Classify a recognizer error code
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "bad-grammar" => Self::BadGrammar,
            "language-not-supported" => Self::LanguageNotSupported,
            "aborted" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }

    /// User-stopped sessions are not surfaced
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// User-facing notice
    pub fn message(&self) -> String {
        match self {
            Self::NotAllowed => "Microphone permission was denied or blocked. Allow microphone access in your browser settings and try again.".to_string(),
            Self::ServiceNotAllowed => "Speech recognition service is not allowed by your browser or device. Try Chrome or Edge with microphone access enabled.".to_string(),
            Self::NoSpeech => "No speech was detected. Please try speaking more clearly or try again.".to_string(),
            Self::AudioCapture => "No microphone was found. Please ensure your microphone is connected.".to_string(),
            Self::Network => "Network error occurred. Voice recognition requires internet access.".to_string(),
            Self::BadGrammar => "Speech recognition grammar error. Please try again.".to_string(),
            Self::LanguageNotSupported => "The selected language is not supported. Please try English or change the voice language setting.".to_string(),
            Self::Aborted => String::new(),
            Self::Other(code) => format!("Voice recognition failed: {}. Please try again or use the regular buttons.", code),
        }
    }
}

/// Reasons a voice command produced no action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no microphone found")]
    NoDevice,
    #[error("no network connection")]
    Offline,
    #[error("speech service blocked")]
    ServiceBlocked,
    #[error("a listening session is already active")]
    AlreadyListening,
    #[error("listening timed out")]
    TimedOut,
    #[error("recognition failed: {0}")]
    Recognition(#[from] RecognitionError),
}

impl VoiceError {
    /// User-facing notice; empty for silently ignored failures
    pub fn message(&self) -> String {
        match self {
            Self::Unsupported => "Speech recognition is not supported here. You can still use the regular buttons.".to_string(),
            Self::PermissionDenied => "Microphone permission was denied. Allow microphone access and try again.".to_string(),
            Self::NoDevice => "No microphone was found. Please connect a microphone and try again.".to_string(),
            Self::Offline => "No internet connection detected. Voice recognition requires an internet connection.".to_string(),
            Self::ServiceBlocked => "Microphone access is not supported by this browser. Please use the regular buttons instead.".to_string(),
            Self::AlreadyListening => "Already listening for a command.".to_string(),
            Self::TimedOut => "Listening timed out. Please try again.".to_string(),
            Self::Recognition(err) => err.message(),
        }
    }
}
