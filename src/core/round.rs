//! Round Machine: single source of truth for what the player may do
//!
//! State transitions:
//! - PLAYING → FAIL: clock ticks while at 0 seconds
//! - PLAYING → SUCCESS: evaluation reports `persuaded`
//! - SUCCESS / FAIL → PLAYING: advance, more rounds left
//! - SUCCESS / FAIL → GAMEOVER: advance after the last round
//! - any → PLAYING (round 1): start new game
//!
//! The machine is synchronous and performs no I/O. Every operation returns a
//! [`Step`] listing the effects (clock, remote calls, XP, persistence) the
//! driver must carry out. Every outstanding request is stamped with the
//! current [`RoundToken`]; completions carrying another token are stale.

use std::collections::BTreeSet;

use log::{debug, info};
use serde_json::json;

use crate::core::BadgeEvaluator;
use crate::types::{
    Badge, Delivered, DialogueRequest, DialogueResponse, EvaluateRequest, EvaluateResponse,
    GameError, GameSession, OperationKind, ReasonCode, RoundAggregates, RoundContent, RoundState,
    RoundToken, ScenarioRequest, ScenarioResponse, ScoreEvent, Stance, Tone, TranslateRequest,
    TranslationResponse,
};
use crate::{ROUND_TIME_SECS, TOTAL_ROUNDS};

/// Source language of typed arguments
pub const ARGUMENT_LANGUAGE: &str = "en";

/// Work the driver performs on behalf of the machine
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Arm the 1-second clock for this round (cancels any running one)
    StartClock { token: RoundToken },
    StopClock,
    FetchScenario { token: RoundToken, request: ScenarioRequest },
    Translate { token: RoundToken, request: TranslateRequest },
    Evaluate { token: RoundToken, request: EvaluateRequest },
    /// `stance` is kept if the dialogue call fails
    Dialogue { token: RoundToken, request: DialogueRequest, stance: Stance },
    /// Advance after the fixed delay
    ScheduleAdvance { token: RoundToken },
    ResetXp,
    AwardXp(ScoreEvent),
    /// Persist the round score (live evaluations only)
    SubmitRoundScore { event: ScoreEvent, details: serde_json::Value },
    IncrementStreak,
    /// Success cue (confetti, sound)
    Celebrate,
    /// Fail cue (shake, sound)
    Commiserate,
    /// Register the game with the backend
    StartRemoteSession { category: String, difficulty: String },
    GameFinished(GameSummary),
}

/// What the game amounted to, computed once at GAMEOVER
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub badges: BTreeSet<Badge>,
    pub final_score: f64,
    pub rounds_played: u32,
    pub round_wins: u32,
    pub unique_words: usize,
    pub all_persuaded: bool,
}

/// Result of one machine operation
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub reason: ReasonCode,
    pub effects: Vec<Effect>,
}

impl Step {
    fn new(reason: ReasonCode, effects: Vec<Effect>) -> Self {
        Self { reason, effects }
    }

    fn quiet(reason: ReasonCode) -> Self {
        Self::new(reason, Vec::new())
    }
}

/// Round lifecycle state machine
#[derive(Debug)]
pub struct RoundMachine {
    /// Rounds per game
    total_rounds: u32,
    /// Countdown per round
    round_secs: u32,
    /// Current game, None before the first one
    session: Option<GameSession>,
    aggregates: RoundAggregates,
    evaluator: BadgeEvaluator,
    /// Badges of the last finished game
    badges: BTreeSet<Badge>,
    /// Last issued token
    last_token: RoundToken,
}

impl Default for RoundMachine {
    fn default() -> Self {
        Self::new(TOTAL_ROUNDS, ROUND_TIME_SECS)
    }
}

impl RoundMachine {
    /// Create machine with no game in progress
    pub fn new(total_rounds: u32, round_secs: u32) -> Self {
        Self {
            total_rounds: total_rounds.max(1),
            round_secs: round_secs.max(1),
            session: None,
            aggregates: RoundAggregates::new(),
            evaluator: BadgeEvaluator::new(),
            badges: BTreeSet::new(),
            last_token: RoundToken::default(),
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Confirm category / difficulty: fresh session at round 1, XP and
    /// aggregates zeroed, clock armed, scenario requested.
    pub fn start_new_game(
        &mut self,
        category: &str,
        difficulty: &str,
        language: &str,
    ) -> Step {
        let token = self.issue_token();
        let mut session = GameSession::new(
            category,
            difficulty,
            language,
            self.total_rounds,
            self.round_secs,
            token,
        );
        session.round.loading.scenario = true;
        let request = scenario_request(&session);

        self.aggregates.reset();
        self.badges.clear();
        self.session = Some(session);

        info!(
            "new game: category={} difficulty={} language={} token={}",
            category, difficulty, language, token
        );

        Step::new(
            ReasonCode::R003_NEW_GAME,
            vec![
                Effect::ResetXp,
                Effect::StartClock { token },
                Effect::FetchScenario { token, request },
                Effect::StartRemoteSession {
                    category: category.to_string(),
                    difficulty: difficulty.to_string(),
                },
            ],
        )
    }

    /// One clock period elapsed
    pub fn tick(&mut self, token: RoundToken) -> Result<Step, GameError> {
        let session = self.current(token)?;

        if !session.timer_active || session.round_state != RoundState::Playing {
            return Ok(Step::new(ReasonCode::R001_CLOCK_IDLE, vec![Effect::StopClock]));
        }

        if session.time_left_secs == 0 {
            return Ok(self.fail_round());
        }

        session.time_left_secs -= 1;
        Ok(Step::quiet(ReasonCode::R001_CLOCK_TICK))
    }

    /// SUCCESS / FAIL delay elapsed
    pub fn advance(&mut self, token: RoundToken) -> Result<Step, GameError> {
        let session = self.current(token)?;
        if !session.round_state.is_transient() {
            return Err(GameError::NotAdvancing(session.round_state));
        }

        if session.is_last_round() {
            Ok(self.finish_game())
        } else {
            Ok(self.begin_next_round())
        }
    }

    /// Skip the remaining delay ("next" command)
    pub fn next_round(&mut self) -> Result<Step, GameError> {
        let token = self.session_ref("next round")?.token;
        self.advance(token)
    }

    // =========================================================================
    // Player actions (PLAYING only)
    // =========================================================================

    /// Store the argument text. Its words count toward the game
    /// vocabulary even if a later argument replaces it.
    pub fn submit_argument(&mut self, text: &str) -> Result<Step, GameError> {
        let session = self.playing("submit argument")?;
        session.round.argument = text.trim().to_string();
        self.aggregates.record_argument(text);
        Ok(Step::quiet(ReasonCode::R004_ARGUMENT_SUBMITTED))
    }

    /// Translate the argument into the target language
    pub fn request_translation(&mut self) -> Result<Step, GameError> {
        let session = self.playing("translate")?;
        ensure_idle(session, OperationKind::Translation)?;
        ensure_argument(session)?;

        session.round.loading.translation = true;
        let request = TranslateRequest {
            text: session.round.argument.clone(),
            src_lang: ARGUMENT_LANGUAGE.to_string(),
            tgt_lang: session.language.clone(),
        };
        Ok(Step::new(
            ReasonCode::R004_REQUEST_ISSUED,
            vec![Effect::Translate { token: session.token, request }],
        ))
    }

    /// Score the argument
    pub fn request_evaluation(&mut self, tone: Tone) -> Result<Step, GameError> {
        let session = self.playing("evaluate")?;
        ensure_idle(session, OperationKind::Evaluation)?;
        ensure_argument(session)?;

        session.round.loading.evaluation = true;
        let request = EvaluateRequest {
            argument: session.round.argument.clone(),
            tone: tone.as_str().to_string(),
            scenario: session.round.scenario.clone(),
        };
        Ok(Step::new(
            ReasonCode::R004_REQUEST_ISSUED,
            vec![Effect::Evaluate { token: session.token, request }],
        ))
    }

    /// Ask the AI character to reply
    pub fn request_dialogue(&mut self) -> Result<Step, GameError> {
        let session = self.playing("dialogue")?;
        ensure_idle(session, OperationKind::Dialogue)?;

        session.round.loading.dialogue = true;
        let stance = session.round.ai_stance;
        let request = DialogueRequest {
            scenario: session.round.scenario.clone(),
            user_argument: session.round.argument.clone(),
            ai_stance: stance.as_str().to_string(),
            language: session.language.clone(),
        };
        Ok(Step::new(
            ReasonCode::R004_REQUEST_ISSUED,
            vec![Effect::Dialogue { token: session.token, request, stance }],
        ))
    }

    /// Switch target language and refetch the scenario in it
    pub fn change_language(&mut self, language: &str) -> Result<Step, GameError> {
        let session = self.playing("change language")?;
        ensure_idle(session, OperationKind::Scenario)?;

        session.language = language.to_string();
        session.round.loading.scenario = true;
        let request = scenario_request(session);
        Ok(Step::new(
            ReasonCode::R004_REQUEST_ISSUED,
            vec![Effect::FetchScenario { token: session.token, request }],
        ))
    }

    // =========================================================================
    // Remote completions
    // =========================================================================

    pub fn scenario_loaded(
        &mut self,
        token: RoundToken,
        delivered: Delivered<ScenarioResponse>,
    ) -> Result<Step, GameError> {
        let session = self.current(token)?;
        session.round.loading.scenario = false;
        session.round.scenario = delivered.value.scenario;
        if !delivered.value.language.trim().is_empty() {
            session.language = delivered.value.language;
        }
        session.round.demo_mode |= delivered.fallback;
        Ok(Step::quiet(ReasonCode::R004_SCENARIO_LOADED))
    }

    pub fn translation_finished(
        &mut self,
        token: RoundToken,
        delivered: Delivered<TranslationResponse>,
    ) -> Result<Step, GameError> {
        let session = self.completion(token, OperationKind::Translation, "translate")?;
        session.round.translation = delivered.value.translated_text;
        session.round.demo_mode |= delivered.fallback;
        Ok(Step::quiet(ReasonCode::R004_TRANSLATION_LOADED))
    }

    /// Apply a score. A persuaded result ends the round in SUCCESS.
    pub fn evaluation_finished(
        &mut self,
        token: RoundToken,
        delivered: Delivered<EvaluateResponse>,
    ) -> Result<Step, GameError> {
        let fallback = delivered.fallback;
        let response = delivered.value;
        let session = self.completion(token, OperationKind::Evaluation, "evaluate")?;

        let event = ScoreEvent::new(response.score, response.persuaded);
        session.round.feedback = response.feedback.clone();
        session.round.score = Some(event.raw_score);
        session.round.demo_mode |= fallback;
        let argument = session.round.argument.clone();
        let scenario = session.round.scenario.clone();
        let round_token = session.token;

        self.aggregates.record_score(event.raw_score);

        let mut effects = vec![Effect::AwardXp(event)];
        if !fallback {
            effects.push(Effect::SubmitRoundScore {
                event,
                details: json!({
                    "argument": argument,
                    "feedback": response.feedback,
                    "persuasiveness": event.raw_score,
                    "scenario": scenario,
                    "bonusXp": event.bonus_xp,
                }),
            });
        }

        if !event.persuaded {
            return Ok(Step::new(ReasonCode::R004_EVALUATION_SCORED, effects));
        }

        if let Some(session) = self.session.as_mut() {
            session.round_state = RoundState::Success;
            session.timer_active = false;
        }
        self.aggregates.record_success(&argument);
        info!(
            "round {} → SUCCESS (score {:.1}, +{} xp)",
            round_token, event.raw_score, event.earned_xp
        );

        effects.push(Effect::StopClock);
        effects.push(Effect::Celebrate);
        if !fallback {
            effects.push(Effect::IncrementStreak);
        }
        effects.push(Effect::ScheduleAdvance { token: round_token });
        Ok(Step::new(ReasonCode::R003_TRANSITION_TO_SUCCESS, effects))
    }

    pub fn dialogue_finished(
        &mut self,
        token: RoundToken,
        delivered: Delivered<DialogueResponse>,
    ) -> Result<Step, GameError> {
        let session = self.completion(token, OperationKind::Dialogue, "dialogue")?;
        let current = session.round.ai_stance;
        session.round.ai_response = delivered.value.ai_response;
        session.round.ai_stance = Stance::parse_or(&delivered.value.new_stance, current);
        session.round.demo_mode |= delivered.fallback;
        Ok(Step::quiet(ReasonCode::R004_DIALOGUE_LOADED))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// GAMEOVER when no game has been started
    pub fn state(&self) -> RoundState {
        self.session
            .as_ref()
            .map(|s| s.round_state)
            .unwrap_or(RoundState::GameOver)
    }

    pub fn token(&self) -> Option<RoundToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn aggregates(&self) -> &RoundAggregates {
        &self.aggregates
    }

    /// Badges of the last finished game
    pub fn badges(&self) -> &BTreeSet<Badge> {
        &self.badges
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn round_secs(&self) -> u32 {
        self.round_secs
    }

    /// Reason describing the current state
    pub fn current_reason(&self) -> ReasonCode {
        match self.state() {
            RoundState::Playing => ReasonCode::R002_STATE_PLAYING,
            RoundState::Success => ReasonCode::R002_STATE_SUCCESS,
            RoundState::Fail => ReasonCode::R002_STATE_FAIL,
            RoundState::GameOver => ReasonCode::R002_STATE_GAMEOVER,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn fail_round(&mut self) -> Step {
        let Some(session) = self.session.as_mut() else {
            return Step::quiet(ReasonCode::R001_CLOCK_IDLE);
        };
        session.round_state = RoundState::Fail;
        session.timer_active = false;
        let token = session.token;
        let argument = session.round.argument.clone();
        self.aggregates.record_fail(&argument);
        info!("round {} → FAIL (time up)", token);

        Step::new(
            ReasonCode::R003_TRANSITION_TO_FAIL,
            vec![
                Effect::StopClock,
                Effect::Commiserate,
                Effect::ScheduleAdvance { token },
            ],
        )
    }

    fn begin_next_round(&mut self) -> Step {
        let token = self.issue_token();
        let round_secs = self.round_secs;
        let Some(session) = self.session.as_mut() else {
            return Step::quiet(ReasonCode::R002_STATE_GAMEOVER);
        };

        session.current_round += 1;
        session.token = token;
        session.round = RoundContent::default();
        session.round.loading.scenario = true;
        session.time_left_secs = round_secs;
        session.timer_active = true;
        session.round_state = RoundState::Playing;
        let request = scenario_request(session);
        info!("round {}/{} starting, token={}", session.current_round, session.total_rounds, token);

        Step::new(
            ReasonCode::R003_TRANSITION_NEXT_ROUND,
            vec![
                Effect::StartClock { token },
                Effect::FetchScenario { token, request },
            ],
        )
    }

    fn finish_game(&mut self) -> Step {
        let Some(session) = self.session.as_mut() else {
            return Step::quiet(ReasonCode::R002_STATE_GAMEOVER);
        };
        session.round_state = RoundState::GameOver;
        session.timer_active = false;
        let total_rounds = session.total_rounds;
        let rounds_played = session.current_round;

        let final_score = self.aggregates.peak_score;
        let badges = self.evaluator.evaluate(&self.aggregates, final_score, total_rounds);
        self.badges = badges.clone();

        let summary = GameSummary {
            badges,
            final_score,
            rounds_played,
            round_wins: self.aggregates.round_wins,
            unique_words: self.aggregates.unique_word_count(),
            all_persuaded: self.aggregates.all_persuaded,
        };
        info!(
            "game over: wins={} words={} peak={:.1} badges={:?}",
            summary.round_wins, summary.unique_words, summary.final_score, summary.badges
        );

        Step::new(
            ReasonCode::R003_TRANSITION_TO_GAMEOVER,
            vec![Effect::StopClock, Effect::GameFinished(summary)],
        )
    }

    // =========================================================================
    // Guards
    // =========================================================================

    fn issue_token(&mut self) -> RoundToken {
        self.last_token = self.last_token.next();
        self.last_token
    }

    fn session_ref(&self, action: &'static str) -> Result<&GameSession, GameError> {
        self.session.as_ref().ok_or(GameError::NotPlaying {
            action,
            state: RoundState::GameOver,
        })
    }

    /// Session whose token matches
    fn current(&mut self, token: RoundToken) -> Result<&mut GameSession, GameError> {
        let last = self.last_token;
        let session = self.session.as_mut().ok_or(GameError::StaleResponse {
            current: last,
            got: token,
        })?;
        if session.token != token {
            debug!("stale event for {} (current {})", token, session.token);
            return Err(GameError::StaleResponse {
                current: session.token,
                got: token,
            });
        }
        Ok(session)
    }

    /// Session in PLAYING
    fn playing(&mut self, action: &'static str) -> Result<&mut GameSession, GameError> {
        let session = self.session.as_mut().ok_or(GameError::NotPlaying {
            action,
            state: RoundState::GameOver,
        })?;
        if !session.round_state.accepts_actions() {
            debug!("{} rejected while {}", action, session.round_state);
            return Err(GameError::NotPlaying {
                action,
                state: session.round_state,
            });
        }
        Ok(session)
    }

    /// Current-round completion: clears the loading flag, then requires PLAYING.
    /// A response landing after SUCCESS / FAIL lost the race and is dropped.
    fn completion(
        &mut self,
        token: RoundToken,
        kind: OperationKind,
        action: &'static str,
    ) -> Result<&mut GameSession, GameError> {
        let session = self.current(token)?;
        session.round.loading.set(kind, false);
        if !session.round_state.accepts_actions() {
            debug!("late {} response dropped while {}", kind, session.round_state);
            return Err(GameError::NotPlaying {
                action,
                state: session.round_state,
            });
        }
        Ok(session)
    }
}

fn ensure_idle(session: &GameSession, kind: OperationKind) -> Result<(), GameError> {
    if session.round.loading.is_loading(kind) {
        return Err(GameError::Busy(kind));
    }
    Ok(())
}

fn ensure_argument(session: &GameSession) -> Result<(), GameError> {
    if session.round.argument.is_empty() {
        return Err(GameError::EmptyArgument);
    }
    Ok(())
}

fn scenario_request(session: &GameSession) -> ScenarioRequest {
    ScenarioRequest {
        category: session.category.clone(),
        difficulty: session.difficulty.clone(),
        language: session.language.clone(),
        round: session.current_round,
    }
}

// =============================================================================
// TESTS
// =============================================================================
