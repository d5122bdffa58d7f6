//! Voice command interpreter
//!
//! listen: capability check → preflight → one session at a time → recognize
//! (bounded by the safety timeout) → match transcript → speak confirmation.
//!
//! Matching lower-cases the transcript and takes the first table entry with
//! any phrase contained in it. Phrases of three characters or fewer must be
//! a whole word ("fi" is not found inside "profile"). Table order is the
//! only tie-break, so "next" beats "start" for "next, then start".

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::types::{tokenize, RecognitionError, VoiceAction, VoiceCommand, VoiceError};

/// Spoken and shown when nothing in the table matches
pub const NOT_RECOGNIZED: &str =
    "Command not recognized. Try Next, Repeat, Leaderboard, Settings, Start, Profile, Help, Back, Home, or Exit.";

/// Phrase table, matched in declaration order
pub static VOICE_COMMANDS: [VoiceCommand; 10] = [
    VoiceCommand {
        phrases: &["next", "continue", "proceed", "suivant", "weiter", "siguiente", "ɛdi so"],
        action: VoiceAction::Next,
        description: "Go to next round",
    },
    VoiceCommand {
        phrases: &["repeat", "again", "répéter", "nochmal", "otra vez", "san ka bio"],
        action: VoiceAction::Repeat,
        description: "Repeat AI response",
    },
    VoiceCommand {
        phrases: &["leaderboard", "scores", "classement", "rangliste", "tabla", "mpuntuo"],
        action: VoiceAction::Leaderboard,
        description: "Show leaderboard",
    },
    VoiceCommand {
        phrases: &["settings", "options", "paramètres", "einstellungen", "ajustes", "nhyehyɛe"],
        action: VoiceAction::Settings,
        description: "Open settings",
    },
    VoiceCommand {
        phrases: &["start", "play", "begin", "démarrer", "commencer", "starten", "empezar", "fi"],
        action: VoiceAction::Start,
        description: "Start game",
    },
    VoiceCommand {
        phrases: &["profile", "account", "profil", "konto", "perfil", "me ho nsɛm"],
        action: VoiceAction::Profile,
        description: "Open profile",
    },
    VoiceCommand {
        phrases: &["help", "ayuda", "aide", "hilfe", "boa me"],
        action: VoiceAction::Help,
        description: "Show help",
    },
    VoiceCommand {
        phrases: &["back", "return", "volver", "retour", "zurück", "san kɔ"],
        action: VoiceAction::Back,
        description: "Go back",
    },
    VoiceCommand {
        phrases: &["home", "main", "inicio", "accueil", "heim", "fie"],
        action: VoiceAction::Home,
        description: "Go to home",
    },
    VoiceCommand {
        phrases: &["exit", "quit", "salir", "quitter", "beenden", "pue"],
        action: VoiceAction::Exit,
        description: "Exit game",
    },
];

/// Transcript → command
#[derive(Debug, Default, Clone, Copy)]
pub struct VoiceInterpreter;

impl VoiceInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// First entry with a phrase contained in the lower-cased transcript
    pub fn interpret(&self, transcript: &str) -> Option<&'static VoiceCommand> {
        let lowered = transcript.to_lowercase();
        let words: Vec<String> = tokenize(&lowered).collect();
        VOICE_COMMANDS.iter().find(|cmd| {
            cmd.phrases
                .iter()
                .any(|p| phrase_matches(&lowered, &words, p))
        })
    }
}

/// Longest phrase that only matches as a whole word
const SHORT_PHRASE_CHARS: usize = 3;

fn phrase_matches(lowered: &str, words: &[String], phrase: &str) -> bool {
    if phrase.chars().count() <= SHORT_PHRASE_CHARS {
        words.iter().any(|w| w == phrase)
    } else {
        lowered.contains(phrase)
    }
}

// =============================================================================
// Platform seams
// =============================================================================

/// Speech-to-text backend
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// The platform can recognize speech at all
    fn is_supported(&self) -> bool;

    /// Microphone permission and connectivity
    async fn preflight(&self) -> Result<(), VoiceError>;

    /// One utterance in `language` (BCP-47 tag)
    async fn recognize(&self, language: &str) -> Result<String, RecognitionError>;

    /// Stop a running recognition
    fn abort(&self);
}

/// Text-to-speech backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, language: &str);
}

/// Platform without speech recognition
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecognizer;

#[async_trait]
impl SpeechRecognizer for NoRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn preflight(&self) -> Result<(), VoiceError> {
        Err(VoiceError::Unsupported)
    }

    async fn recognize(&self, _language: &str) -> Result<String, RecognitionError> {
        Err(RecognitionError::ServiceNotAllowed)
    }

    fn abort(&self) {}
}

/// Recognizer fed from a queue of prepared results.
/// An empty queue never answers, which leaves the safety timeout to fire.
#[derive(Debug, Default)]
pub struct ScriptedRecognizer {
    queue: Mutex<VecDeque<Result<String, RecognitionError>>>,
    preflight: Mutex<Option<VoiceError>>,
    aborted: AtomicBool,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transcript(&self, transcript: impl Into<String>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(Ok(transcript.into()));
        }
    }

    pub fn push_error(&self, error: RecognitionError) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(Err(error));
        }
    }

    /// Make the next preflight fail
    pub fn fail_preflight(&self, error: VoiceError) {
        if let Ok(mut slot) = self.preflight.lock() {
            *slot = Some(error);
        }
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn preflight(&self) -> Result<(), VoiceError> {
        match self.preflight.lock().ok().and_then(|mut slot| slot.take()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn recognize(&self, _language: &str) -> Result<String, RecognitionError> {
        let next = self.queue.lock().ok().and_then(|mut queue| queue.pop_front());
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }
}

/// Synthesizer that logs what it would say and keeps a transcript of it
#[derive(Debug, Default)]
pub struct LogSynthesizer {
    spoken: Mutex<Vec<(String, String)>>,
}

impl LogSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (text, language) pairs in order
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for LogSynthesizer {
    async fn speak(&self, text: &str, language: &str) {
        info!("🔊 [{}] {}", language, text);
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push((text.to_string(), language.to_string()));
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// What a finished listening session produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoiceOutcome {
    Matched {
        transcript: String,
        action: VoiceAction,
    },
    NotRecognized {
        transcript: String,
    },
}

impl VoiceOutcome {
    pub fn action(&self) -> Option<VoiceAction> {
        match self {
            VoiceOutcome::Matched { action, .. } => Some(*action),
            VoiceOutcome::NotRecognized { .. } => None,
        }
    }
}

/// One listening session at a time, always cleaned up
pub struct VoiceController {
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    interpreter: VoiceInterpreter,
    language: String,
    timeout: Duration,
    listening: AtomicBool,
    /// Signals the running session to stop
    cancel_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl std::fmt::Debug for VoiceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceController")
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .field("listening", &self.is_listening())
            .finish()
    }
}

impl VoiceController {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            recognizer,
            synthesizer,
            interpreter: VoiceInterpreter::new(),
            language: language.into(),
            timeout,
            listening: AtomicBool::new(false),
            cancel_tx: Mutex::new(None),
        }
    }

    /// Terminal default: no recognizer, logged speech
    pub fn unsupported(language: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            Arc::new(NoRecognizer),
            Arc::new(LogSynthesizer::new()),
            language,
            timeout,
        )
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Run one listening session
    pub async fn listen(&self) -> Result<VoiceOutcome, VoiceError> {
        if !self.recognizer.is_supported() {
            return Err(VoiceError::Unsupported);
        }
        self.recognizer.preflight().await?;

        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::AlreadyListening);
        }
        debug!("listening ({})", self.language);

        let (cancel_tx, cancel_rx) = oneshot::channel();
        if let Ok(mut slot) = self.cancel_tx.lock() {
            *slot = Some(cancel_tx);
        }

        let recognized = tokio::select! {
            result = tokio::time::timeout(self.timeout, self.recognizer.recognize(&self.language)) => Some(result),
            _ = cancel_rx => None,
        };
        self.clear_cancel();

        let transcript = match recognized {
            None => {
                debug!("listening cancelled");
                self.recognizer.abort();
                self.finish();
                return Err(VoiceError::Recognition(RecognitionError::Aborted));
            }
            Some(Err(_)) => {
                warn!("voice safety timeout after {:?}", self.timeout);
                self.recognizer.abort();
                self.finish();
                return Err(VoiceError::TimedOut);
            }
            Some(Ok(Err(error))) => {
                self.finish();
                if !error.is_silent() {
                    warn!("recognition failed: {}", error);
                }
                return Err(VoiceError::Recognition(error));
            }
            Some(Ok(Ok(transcript))) => {
                self.finish();
                transcript
            }
        };

        Ok(self.handle_transcript(&transcript).await)
    }

    /// Match a transcript and speak the confirmation (or the miss notice)
    pub async fn handle_transcript(&self, transcript: &str) -> VoiceOutcome {
        let transcript = transcript.trim().to_lowercase();
        match self.interpreter.interpret(&transcript) {
            Some(command) => {
                info!("voice \"{}\" → {}", transcript, command.action);
                self.speak(command.description).await;
                VoiceOutcome::Matched {
                    transcript,
                    action: command.action,
                }
            }
            None => {
                debug!("voice \"{}\" matched nothing", transcript);
                self.speak(NOT_RECOGNIZED).await;
                VoiceOutcome::NotRecognized { transcript }
            }
        }
    }

    pub async fn speak(&self, text: &str) {
        self.synthesizer.speak(text, &self.language).await;
    }

    /// Stop a running session. The session itself clears `listening`
    /// and reports `Aborted`. False when nothing was listening.
    pub fn cancel(&self) -> bool {
        let sender = self.cancel_tx.lock().ok().and_then(|mut slot| slot.take());
        match sender {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    fn clear_cancel(&self) {
        if let Ok(mut slot) = self.cancel_tx.lock() {
            slot.take();
        }
    }

    /// Clear the listening flag. True only for the call that cleared it.
    pub fn finish(&self) -> bool {
        self.listening.swap(false, Ordering::SeqCst)
    }
}

// =============================================================================
// TESTS
// =============================================================================
