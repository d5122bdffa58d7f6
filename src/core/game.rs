//! Game driver: the single writer
//!
//! One tokio task owns the round machine, the XP ledger and the clocks.
//! Player commands arrive through a [`GameHandle`]; clock ticks, XP frames,
//! advance timers and remote completions arrive on an internal channel.
//! Events are applied one at a time and every change publishes a
//! [`RoundSnapshot`] on a broadcast channel.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::json;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::GameConfig;
use crate::core::fallback;
use crate::core::round::{Effect, GameSummary, RoundMachine, Step};
use crate::core::voice::{VoiceController, VoiceOutcome, NOT_RECOGNIZED, VOICE_COMMANDS};
use crate::core::xp::{daily_progress, daily_xp, level_for, XpLedger};
use crate::core::{Clock, RemoteOps};
use crate::types::{
    generate_session_id, BadgeAward, Delivered, DialogueResponse, EvaluateResponse, GameError,
    LevelUpdate, ReasonCode, RemoteError, RoundSnapshot, RoundState, RoundToken, ScenarioResponse,
    ScoreSubmission, SessionContext, SessionEnd, SessionStart, Stance, Tone, TranslationResponse,
    VoiceAction, VoiceError, DEFAULT_LANGUAGE, LANGUAGES,
};

/// Snapshot buffer per subscriber
const UPDATE_CAPACITY: usize = 100;

/// Player-facing actions
#[derive(Debug, Clone, PartialEq)]
pub enum GameCommand {
    NewGame {
        category: String,
        difficulty: String,
        language: Option<String>,
    },
    SubmitArgument(String),
    Translate,
    Evaluate,
    Dialogue,
    Next,
    SetTone(Tone),
    ChangeLanguage(String),
    /// Interpret an already transcribed utterance
    VoiceTranscript(String),
    /// Open the microphone for one command
    Listen,
    /// Abort the listening session, if any
    CancelListen,
    Snapshot,
}

/// Answer to a command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    pub snapshot: RoundSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceOutcome>,
}

type Reply = oneshot::Sender<Result<CommandReply, GameError>>;

struct Request {
    command: GameCommand,
    reply: Reply,
}

/// Internal events, applied in arrival order
#[derive(Debug)]
enum Event {
    Tick(RoundToken),
    XpFrame(u64),
    Advance(RoundToken),
    ScenarioDone(RoundToken, Delivered<ScenarioResponse>),
    TranslationDone(RoundToken, Delivered<TranslationResponse>),
    EvaluationDone(RoundToken, Delivered<EvaluateResponse>),
    DialogueDone(RoundToken, Delivered<DialogueResponse>),
    VoiceHeard(Result<VoiceOutcome, VoiceError>, Reply),
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable front door to one running game
#[derive(Debug, Clone)]
pub struct GameHandle {
    commands: mpsc::UnboundedSender<Request>,
    updates: broadcast::Sender<RoundSnapshot>,
}

impl GameHandle {
    pub async fn dispatch(&self, command: GameCommand) -> Result<CommandReply, GameError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .map_err(|_| GameError::SessionClosed)?;
        response.await.map_err(|_| GameError::SessionClosed)?
    }

    /// Live snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<RoundSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> Result<RoundSnapshot, GameError> {
        Ok(self.dispatch(GameCommand::Snapshot).await?.snapshot)
    }

    pub async fn new_game(
        &self,
        category: &str,
        difficulty: &str,
        language: Option<&str>,
    ) -> Result<RoundSnapshot, GameError> {
        let reply = self
            .dispatch(GameCommand::NewGame {
                category: category.to_string(),
                difficulty: difficulty.to_string(),
                language: language.map(str::to_string),
            })
            .await?;
        Ok(reply.snapshot)
    }

    pub async fn submit_argument(&self, text: &str) -> Result<RoundSnapshot, GameError> {
        Ok(self
            .dispatch(GameCommand::SubmitArgument(text.to_string()))
            .await?
            .snapshot)
    }

    /// The driver task has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

// =============================================================================
// Driver
// =============================================================================

pub struct GameDriver {
    config: GameConfig,
    context: SessionContext,
    machine: RoundMachine,
    ledger: XpLedger,
    remote: Arc<dyn RemoteOps>,
    voice: Arc<VoiceController>,
    round_clock: Clock,
    xp_clock: Clock,
    advance_clock: Clock,
    commands: mpsc::UnboundedReceiver<Request>,
    events_tx: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
    updates: broadcast::Sender<RoundSnapshot>,
    notice: Option<String>,
    reason: ReasonCode,
}

impl GameDriver {
    /// Start the driver task and return its handle.
    /// The task ends when the last handle is dropped.
    pub fn spawn(
        config: GameConfig,
        context: SessionContext,
        remote: Arc<dyn RemoteOps>,
        voice: Arc<VoiceController>,
    ) -> GameHandle {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);

        let driver = GameDriver {
            machine: RoundMachine::new(config.total_rounds, config.round_secs),
            ledger: XpLedger::new(config.xp_steps()),
            round_clock: Clock::new(config.tick_period()),
            xp_clock: Clock::new(config.xp_step()),
            advance_clock: Clock::new(config.advance_delay()),
            config,
            context,
            remote,
            voice,
            commands,
            events_tx,
            events,
            updates: updates.clone(),
            notice: None,
            reason: ReasonCode::R002_STATE_GAMEOVER,
        };
        tokio::spawn(driver.run());

        GameHandle {
            commands: commands_tx,
            updates,
        }
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.commands.recv() => match request {
                    Some(Request { command, reply }) => self.on_command(command, reply),
                    None => break,
                },
                Some(event) = self.events.recv() => self.on_event(event),
            }
        }
        self.round_clock.stop();
        self.xp_clock.stop();
        self.advance_clock.stop();
        debug!("game driver stopped");
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn on_command(&mut self, command: GameCommand, reply: Reply) {
        // Reads leave the notice and subscribers alone
        if command == GameCommand::Snapshot {
            let _ = reply.send(Ok(CommandReply {
                snapshot: self.snapshot(),
                voice: None,
            }));
            return;
        }

        self.notice = None;
        match command {
            GameCommand::Listen => {
                let voice = self.voice.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let heard = voice.listen().await;
                    let _ = tx.send(Event::VoiceHeard(heard, reply));
                });
            }
            GameCommand::VoiceTranscript(transcript) => {
                let voice = self.voice.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let outcome = voice.handle_transcript(&transcript).await;
                    let _ = tx.send(Event::VoiceHeard(Ok(outcome), reply));
                });
            }
            other => {
                let result = self.execute(other);
                if let Err(e) = &result {
                    debug!("command rejected: {}", e);
                }
                let _ = reply.send(result);
            }
        }
    }

    fn execute(&mut self, command: GameCommand) -> Result<CommandReply, GameError> {
        let step = match command {
            GameCommand::NewGame {
                category,
                difficulty,
                language,
            } => {
                let category = require("category", &category)?;
                let difficulty = require("difficulty", &difficulty)?;
                let language = match language {
                    Some(language) => supported_language(&language)?,
                    None => DEFAULT_LANGUAGE.to_string(),
                };
                Some(self.machine.start_new_game(&category, &difficulty, &language))
            }
            GameCommand::SubmitArgument(text) => Some(self.machine.submit_argument(&text)?),
            GameCommand::Translate => Some(self.machine.request_translation()?),
            GameCommand::Evaluate => Some(self.machine.request_evaluation(self.context.tone)?),
            GameCommand::Dialogue => Some(self.machine.request_dialogue()?),
            GameCommand::Next => {
                let step = self.machine.next_round()?;
                self.advance_clock.stop();
                Some(step)
            }
            GameCommand::SetTone(tone) => {
                self.context.tone = tone;
                None
            }
            GameCommand::CancelListen => {
                if self.voice.cancel() {
                    self.notice = Some("Stopped listening.".to_string());
                }
                None
            }
            GameCommand::ChangeLanguage(language) => {
                let language = supported_language(&language)?;
                Some(self.machine.change_language(&language)?)
            }
            GameCommand::Snapshot | GameCommand::Listen | GameCommand::VoiceTranscript(_) => None,
        };

        match step {
            Some(step) => self.apply(step),
            None => self.reason = self.machine.current_reason(),
        }
        Ok(CommandReply {
            snapshot: self.publish(),
            voice: None,
        })
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn on_event(&mut self, event: Event) {
        let result = match event {
            Event::Tick(token) => self.machine.tick(token),
            Event::Advance(token) => self.machine.advance(token),
            Event::XpFrame(generation) => {
                if self.ledger.step(generation).is_some() {
                    self.reason = ReasonCode::R005_XP_FRAME;
                    self.publish();
                }
                return;
            }
            Event::ScenarioDone(token, delivered) => self.machine.scenario_loaded(token, delivered),
            Event::TranslationDone(token, delivered) => {
                self.machine.translation_finished(token, delivered)
            }
            Event::EvaluationDone(token, delivered) => {
                self.machine.evaluation_finished(token, delivered)
            }
            Event::DialogueDone(token, delivered) => self.machine.dialogue_finished(token, delivered),
            Event::VoiceHeard(heard, reply) => {
                let result = self.on_voice(heard);
                let _ = reply.send(result);
                return;
            }
        };

        match result {
            Ok(step) => {
                self.apply(step);
                self.publish();
            }
            // Stale or late events lost their race
            Err(e) => debug!("event dropped: {}", e),
        }
    }

    fn on_voice(
        &mut self,
        heard: Result<VoiceOutcome, VoiceError>,
    ) -> Result<CommandReply, GameError> {
        let outcome = match heard {
            Ok(outcome) => outcome,
            Err(error) => {
                let message = error.message();
                if !message.is_empty() {
                    self.notice = Some(message);
                }
                self.reason = ReasonCode::R005_VOICE_FAILED;
                self.publish();
                return Err(GameError::Voice(error));
            }
        };

        match outcome.action() {
            None => {
                self.notice = Some(NOT_RECOGNIZED.to_string());
                self.reason = ReasonCode::R005_VOICE_NOT_RECOGNIZED;
            }
            Some(action) => {
                self.reason = ReasonCode::R005_VOICE_MATCHED;
                self.voice_action(action);
            }
        }

        Ok(CommandReply {
            snapshot: self.publish(),
            voice: Some(outcome),
        })
    }

    fn voice_action(&mut self, action: VoiceAction) {
        if action.is_navigation() {
            let description = VOICE_COMMANDS
                .iter()
                .find(|c| c.action == action)
                .map(|c| c.description)
                .unwrap_or_else(|| action.as_str());
            self.notice = Some(description.to_string());
            return;
        }

        match action {
            VoiceAction::Next => {
                if self.machine.state().is_transient() {
                    if let Ok(step) = self.machine.next_round() {
                        self.advance_clock.stop();
                        self.apply(step);
                    }
                } else {
                    debug!("voice next ignored while {}", self.machine.state());
                }
            }
            VoiceAction::Repeat => {
                let last = self
                    .machine
                    .session()
                    .map(|s| s.round.ai_response.clone())
                    .unwrap_or_default();
                if last.is_empty() {
                    self.notice = Some("Nothing to repeat yet.".to_string());
                } else {
                    let voice = self.voice.clone();
                    tokio::spawn(async move { voice.speak(&last).await });
                }
            }
            VoiceAction::Start => {
                let restart = match self.machine.session() {
                    Some(s) if s.round_state == RoundState::GameOver => {
                        Some((s.category.clone(), s.difficulty.clone(), s.language.clone()))
                    }
                    Some(_) => None,
                    None => {
                        self.notice = Some("Choose a category to start a game.".to_string());
                        None
                    }
                };
                if let Some((category, difficulty, language)) = restart {
                    let step = self.machine.start_new_game(&category, &difficulty, &language);
                    self.apply(step);
                }
            }
            other => debug!("{} is not a game action", other.as_str()),
        }
    }

    // =========================================================================
    // Effects
    // =========================================================================

    fn apply(&mut self, step: Step) {
        self.reason = step.reason;
        for effect in step.effects {
            self.perform(effect);
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::StartClock { token } => {
                self.round_clock
                    .start(self.events_tx.clone(), move || Event::Tick(token));
            }
            Effect::StopClock => self.round_clock.stop(),
            Effect::ScheduleAdvance { token } => {
                self.advance_clock
                    .start_limited(self.events_tx.clone(), 1, move || Event::Advance(token));
            }
            Effect::FetchScenario { token, request } => {
                let remote = self.remote.clone();
                self.fetch(async move {
                    let delivered = match remote.fetch_scenario(&request).await {
                        Ok(response) => Delivered::live(response),
                        Err(e) => {
                            warn!("{}; using demo scenario", e);
                            Delivered::fallback(fallback::scenario(&request.category, &request.language))
                        }
                    };
                    Event::ScenarioDone(token, delivered)
                });
            }
            Effect::Translate { token, request } => {
                let remote = self.remote.clone();
                self.fetch(async move {
                    let delivered = match remote.translate(&request).await {
                        Ok(response) => Delivered::live(response),
                        Err(e) => {
                            warn!("{}; echoing argument", e);
                            Delivered::fallback(fallback::translation(&request.text))
                        }
                    };
                    Event::TranslationDone(token, delivered)
                });
            }
            Effect::Evaluate { token, request } => {
                let remote = self.remote.clone();
                self.fetch(async move {
                    let delivered = match remote.evaluate(&request).await {
                        Ok(response) => Delivered::live(response),
                        Err(e) => {
                            warn!("{}; using demo evaluation", e);
                            Delivered::fallback(fallback::evaluation(&request.argument))
                        }
                    };
                    Event::EvaluationDone(token, delivered)
                });
            }
            Effect::Dialogue {
                token,
                request,
                stance,
            } => {
                let remote = self.remote.clone();
                self.fetch(async move {
                    let delivered = match remote.dialogue(&request).await {
                        Ok(response) => Delivered::live(response),
                        Err(e) => {
                            warn!("{}; using demo reply", e);
                            Delivered::fallback(fallback::dialogue(stance))
                        }
                    };
                    Event::DialogueDone(token, delivered)
                });
            }
            Effect::ResetXp => {
                self.xp_clock.stop();
                self.ledger.reset();
            }
            Effect::AwardXp(event) => {
                let level = level_for(self.ledger.target());
                if let Some(generation) = self.ledger.award(&event) {
                    let frames = self.ledger.remaining_frames();
                    self.xp_clock.start_limited(self.events_tx.clone(), frames, move || {
                        Event::XpFrame(generation)
                    });
                }
                let reached = level_for(self.ledger.target());
                if reached != level {
                    let update = LevelUpdate { level: reached };
                    self.persist_for_player(move |remote, nickname| async move {
                        remote.update_level(&nickname, &update).await
                    });
                }
            }
            Effect::SubmitRoundScore { event, details } => {
                let submission = ScoreSubmission {
                    score: event.earned_xp,
                    game_session_id: Some(self.context.session_id.clone()),
                    details,
                };
                self.persist_for_player(move |remote, nickname| async move {
                    remote.submit_score(&nickname, &submission).await
                });
            }
            Effect::IncrementStreak => {
                self.persist_for_player(|remote, nickname| async move {
                    remote.increment_streak(&nickname).await
                });
            }
            Effect::Celebrate => {
                if self.context.sound {
                    info!("🎉 success cue");
                }
                self.notice = Some("🎉 You persuaded them!".to_string());
            }
            Effect::Commiserate => {
                if self.context.sound {
                    info!("⏰ fail cue");
                }
                self.notice = Some("⏰ Time's up!".to_string());
            }
            Effect::StartRemoteSession {
                category,
                difficulty,
            } => {
                self.context.session_id = generate_session_id();
                let start = SessionStart {
                    session_id: self.context.session_id.clone(),
                    category,
                    difficulty,
                };
                self.persist_for_player(move |remote, nickname| async move {
                    remote.start_game_session(&nickname, &start).await
                });
            }
            Effect::GameFinished(summary) => self.finish_game(summary),
        }
    }

    /// Game-over persistence: one award per badge, the summary score, the
    /// session end. Each call fails independently.
    fn finish_game(&mut self, summary: GameSummary) {
        let total_score = self.ledger.target();
        self.notice = Some(format!(
            "🏁 Game over: {} of {} rounds won, {} XP, {} badge(s)",
            summary.round_wins,
            summary.rounds_played,
            total_score,
            summary.badges.len()
        ));

        for badge in summary.badges.iter().copied() {
            let award = BadgeAward::from(badge);
            self.persist_for_player(move |remote, nickname| async move {
                remote.award_badge(&nickname, &award).await
            });
        }

        let submission = ScoreSubmission {
            score: total_score,
            game_session_id: Some(self.context.session_id.clone()),
            details: json!({
                "roundWins": summary.round_wins,
                "uniqueWords": summary.unique_words,
                "allPersuaded": summary.all_persuaded,
                "finalScore": summary.final_score,
                "badges": summary.badges.iter().map(|b| b.id()).collect::<Vec<_>>(),
            }),
        };
        self.persist_for_player(move |remote, nickname| async move {
            remote.submit_score(&nickname, &submission).await
        });

        let session_id = self.context.session_id.clone();
        let end = SessionEnd {
            end_time: Utc::now().to_rfc3339(),
            total_score,
            rounds_played: summary.rounds_played,
            status: "completed".to_string(),
        };
        self.persist_for_player(move |remote, _| async move {
            remote.end_game_session(&session_id, &end).await
        });
    }

    /// Run a remote call and post its completion back into the loop
    fn fetch<F>(&self, work: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }

    /// Fire-and-forget call for a logged-in player; failures are only logged
    fn persist_for_player<F, Fut>(&self, call: F)
    where
        F: FnOnce(Arc<dyn RemoteOps>, String) -> Fut,
        Fut: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        let Some(nickname) = self.context.nickname.clone() else {
            return;
        };
        let work = call(self.remote.clone(), nickname);
        tokio::spawn(async move {
            if let Err(e) = work.await {
                error!("{}", GameError::NetworkFailure(e));
            }
        });
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    fn publish(&self) -> RoundSnapshot {
        let snapshot = self.snapshot();
        let _ = self.updates.send(snapshot.clone());
        snapshot
    }

    fn snapshot(&self) -> RoundSnapshot {
        let displayed = self.ledger.displayed();
        let goal = self.config.daily_goal;
        let mut snapshot = RoundSnapshot {
            timestamp: Utc::now(),
            round: 0,
            total_rounds: self.machine.total_rounds(),
            state: self.machine.state(),
            time_left_secs: 0,
            timer_active: false,
            displayed_xp: displayed,
            target_xp: self.ledger.target(),
            daily_xp: daily_xp(displayed, goal),
            daily_progress: daily_progress(displayed, goal),
            level: level_for(displayed),
            category: String::new(),
            difficulty: String::new(),
            language: String::new(),
            scenario: String::new(),
            argument: String::new(),
            translation: String::new(),
            feedback: String::new(),
            score: None,
            ai_response: String::new(),
            ai_stance: Stance::default(),
            loading: Default::default(),
            demo_mode: false,
            listening: self.voice.is_listening(),
            badges: self.machine.badges().iter().copied().collect(),
            notice: self.notice.clone(),
            reason: self.reason,
        };

        if let Some(session) = self.machine.session() {
            snapshot.round = session.current_round;
            snapshot.total_rounds = session.total_rounds;
            snapshot.time_left_secs = session.time_left_secs;
            snapshot.timer_active = session.timer_active;
            snapshot.category = session.category.clone();
            snapshot.difficulty = session.difficulty.clone();
            snapshot.language = session.language.clone();
            snapshot.scenario = session.round.scenario.clone();
            snapshot.argument = session.round.argument.clone();
            snapshot.translation = session.round.translation.clone();
            snapshot.feedback = session.round.feedback.clone();
            snapshot.score = session.round.score;
            snapshot.ai_response = session.round.ai_response.clone();
            snapshot.ai_stance = session.round.ai_stance;
            snapshot.loading = session.round.loading;
            snapshot.demo_mode = session.round.demo_mode;
        }
        snapshot
    }
}

/// Lower-cased code of an offered target language
fn supported_language(value: &str) -> Result<String, GameError> {
    let language = require("language", value)?;
    if LANGUAGES.iter().any(|(code, _)| *code == language) {
        Ok(language)
    } else {
        let codes: Vec<&str> = LANGUAGES.iter().map(|(code, _)| *code).collect();
        Err(GameError::ValidationFailure(format!(
            "unsupported language {} (expected one of {})",
            language,
            codes.join(", ")
        )))
    }
}

fn require(field: &str, value: &str) -> Result<String, GameError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GameError::ValidationFailure(format!("{} must not be empty", field)));
    }
    Ok(value.to_lowercase())
}
