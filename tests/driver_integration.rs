//! Integration tests for the game driver
//!
//! Clock, XP frames, advance delay and remote races, all on paused tokio time.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use linguaquest::config::GameConfig;
use linguaquest::core::{
    GameCommand, GameDriver, GameHandle, LogSynthesizer, OfflineRemote, RemoteOps,
    ScriptedRecognizer, VoiceController,
};
use linguaquest::types::{
    Badge, BadgeAward, DialogueRequest, DialogueResponse, EvaluateRequest, EvaluateResponse,
    GameError, LevelUpdate, ReasonCode, RecognitionError, RemoteError, RemoteOp, RoundSnapshot,
    RoundState, ScenarioRequest, ScenarioResponse, ScoreSubmission, SessionContext, SessionEnd,
    SessionStart, TranslateRequest, TranslationResponse, VoiceAction, VoiceError,
};
use pretty_assertions::assert_eq;

/// Backend with fixed answers and a record of persistence calls
struct ScriptedRemote {
    score: f64,
    persuaded: bool,
    evaluation_delay: Duration,
    scores: Mutex<Vec<ScoreSubmission>>,
    streaks: AtomicU32,
    badges: Mutex<Vec<String>>,
    failing_badge: Option<&'static str>,
    starts: AtomicU32,
    ends: Mutex<Vec<SessionEnd>>,
    levels: Mutex<Vec<i64>>,
}

impl ScriptedRemote {
    fn new(score: f64, persuaded: bool) -> Self {
        Self {
            score,
            persuaded,
            evaluation_delay: Duration::ZERO,
            scores: Mutex::new(Vec::new()),
            streaks: AtomicU32::new(0),
            badges: Mutex::new(Vec::new()),
            failing_badge: None,
            starts: AtomicU32::new(0),
            ends: Mutex::new(Vec::new()),
            levels: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.evaluation_delay = delay;
        self
    }

    /// Answer 500 when this badge is awarded
    fn failing_badge(mut self, badge_type: &'static str) -> Self {
        self.failing_badge = Some(badge_type);
        self
    }
}

#[async_trait]
impl RemoteOps for ScriptedRemote {
    async fn fetch_scenario(&self, request: &ScenarioRequest) -> Result<ScenarioResponse, RemoteError> {
        Ok(ScenarioResponse {
            scenario: format!("Scenario {} about {}", request.round, request.category),
            language: request.language.clone(),
        })
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<TranslationResponse, RemoteError> {
        Ok(TranslationResponse {
            translated_text: format!("({}) {}", request.tgt_lang, request.text),
        })
    }

    async fn evaluate(&self, _: &EvaluateRequest) -> Result<EvaluateResponse, RemoteError> {
        if !self.evaluation_delay.is_zero() {
            tokio::time::sleep(self.evaluation_delay).await;
        }
        Ok(EvaluateResponse {
            persuaded: self.persuaded,
            feedback: "Scripted feedback".to_string(),
            score: self.score,
        })
    }

    async fn dialogue(&self, _: &DialogueRequest) -> Result<DialogueResponse, RemoteError> {
        Ok(DialogueResponse {
            ai_response: "Hmm, tell me more.".to_string(),
            new_stance: "neutral".to_string(),
        })
    }

    async fn submit_score(&self, _: &str, score: &ScoreSubmission) -> Result<(), RemoteError> {
        self.scores.lock().unwrap().push(score.clone());
        Ok(())
    }

    async fn increment_streak(&self, _: &str) -> Result<(), RemoteError> {
        self.streaks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn award_badge(&self, _: &str, badge: &BadgeAward) -> Result<(), RemoteError> {
        if self.failing_badge == Some(badge.badge_type.as_str()) {
            return Err(RemoteError::Status {
                op: RemoteOp::AwardBadge,
                status: 500,
            });
        }
        self.badges.lock().unwrap().push(badge.badge_type.clone());
        Ok(())
    }

    async fn start_game_session(&self, _: &str, _: &SessionStart) -> Result<(), RemoteError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn end_game_session(&self, _: &str, end: &SessionEnd) -> Result<(), RemoteError> {
        self.ends.lock().unwrap().push(end.clone());
        Ok(())
    }

    async fn update_level(&self, _: &str, level: &LevelUpdate) -> Result<(), RemoteError> {
        self.levels.lock().unwrap().push(level.level);
        Ok(())
    }
}

fn config(round_secs: u32) -> GameConfig {
    GameConfig {
        round_secs,
        ..GameConfig::default()
    }
}

fn spawn(config: GameConfig, context: SessionContext, remote: Arc<dyn RemoteOps>) -> GameHandle {
    let voice = VoiceController::unsupported("en-US", config.voice_timeout());
    GameDriver::spawn(config, context, remote, Arc::new(voice))
}

/// Poll snapshots until `pred` holds (virtual time)
async fn wait_for<F>(handle: &GameHandle, pred: F) -> RoundSnapshot
where
    F: Fn(&RoundSnapshot) -> bool,
{
    for _ in 0..20_000 {
        let snapshot = handle.snapshot().await.unwrap();
        if pred(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never reached");
}

#[tokio::test(start_paused = true)]
async fn test_new_game_loads_scenario() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(ScriptedRemote::new(5.0, false)));
    let snapshot = handle.new_game("food", "easy", Some("twi")).await.unwrap();
    assert_eq!(snapshot.state, RoundState::Playing);
    assert_eq!(snapshot.round, 1);
    assert_eq!(snapshot.time_left_secs, 50);

    let loaded = wait_for(&handle, |s| !s.loading.scenario).await;
    assert_eq!(loaded.scenario, "Scenario 1 about food");
    assert!(!loaded.demo_mode);
}

#[tokio::test(start_paused = true)]
async fn test_clock_counts_down_then_fails_and_advances() {
    let handle = spawn(config(3), SessionContext::default(), Arc::new(ScriptedRemote::new(5.0, false)));
    handle.new_game("travel", "easy", None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(handle.snapshot().await.unwrap().time_left_secs, 2);

    let failed = wait_for(&handle, |s| s.state == RoundState::Fail).await;
    assert_eq!(failed.time_left_secs, 0);
    assert!(!failed.timer_active);
    assert_eq!(failed.round, 1);

    let next = wait_for(&handle, |s| s.round == 2).await;
    assert_eq!(next.state, RoundState::Playing);
    assert_eq!(next.time_left_secs, 3);
    assert!(next.timer_active);
}

#[tokio::test(start_paused = true)]
async fn test_persuaded_evaluation_animates_xp() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(ScriptedRemote::new(9.0, true)));
    handle.new_game("food", "easy", None).await.unwrap();
    handle.submit_argument("You will love the waakye there").await.unwrap();
    handle.dispatch(GameCommand::Evaluate).await.unwrap();

    let success = wait_for(&handle, |s| s.state == RoundState::Success).await;
    assert_eq!(success.target_xp, 140);
    assert_eq!(success.score, Some(9.0));

    let settled = wait_for(&handle, |s| s.displayed_xp == 140).await;
    assert_eq!(settled.level, 2);
    assert_eq!(settled.daily_xp, 40);
    assert!((settled.daily_progress - 0.4).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_xp_counter_never_decreases() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(ScriptedRemote::new(9.0, true)));
    let mut updates = handle.subscribe();
    handle.new_game("food", "easy", None).await.unwrap();
    handle.submit_argument("Try it once").await.unwrap();
    handle.dispatch(GameCommand::Evaluate).await.unwrap();

    let mut last = 0;
    loop {
        let snapshot = updates.recv().await.unwrap();
        assert!(snapshot.displayed_xp >= last);
        last = snapshot.displayed_xp;
        if last == 140 {
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_beats_late_evaluation() {
    let remote = ScriptedRemote::new(9.0, true).with_delay(Duration::from_secs(4));
    let handle = spawn(config(2), SessionContext::default(), Arc::new(remote));
    handle.new_game("food", "easy", None).await.unwrap();
    handle.submit_argument("Slow but convincing").await.unwrap();
    handle.dispatch(GameCommand::Evaluate).await.unwrap();

    wait_for(&handle, |s| s.state == RoundState::Fail).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, RoundState::Fail);
    assert_eq!(snapshot.target_xp, 0);
    assert!(snapshot.feedback.is_empty());
    assert!(!snapshot.loading.evaluation);
}

#[tokio::test(start_paused = true)]
async fn test_actions_rejected_while_round_over() {
    let handle = spawn(config(1), SessionContext::default(), Arc::new(ScriptedRemote::new(5.0, false)));
    handle.new_game("food", "easy", None).await.unwrap();
    handle.submit_argument("too late").await.unwrap();
    wait_for(&handle, |s| s.state == RoundState::Fail).await;

    let err = handle.dispatch(GameCommand::Evaluate).await.unwrap_err();
    assert!(matches!(err, GameError::NotPlaying { state: RoundState::Fail, .. }));
    let err = handle.dispatch(GameCommand::Dialogue).await.unwrap_err();
    assert!(err.is_rejection());
}

#[tokio::test(start_paused = true)]
async fn test_full_game_persists_summary() {
    let remote = Arc::new(ScriptedRemote::new(9.0, true));
    let handle = spawn(config(50), SessionContext::for_player("ama"), remote.clone());
    handle.new_game("business", "medium", Some("gaa")).await.unwrap();

    for round in 1..=5 {
        wait_for(&handle, |s| s.round == round && s.state == RoundState::Playing).await;
        handle.submit_argument("Invest in our shea butter cooperative").await.unwrap();
        handle.dispatch(GameCommand::Evaluate).await.unwrap();
        wait_for(&handle, |s| s.round > round || s.state != RoundState::Playing).await;
    }

    let over = wait_for(&handle, |s| s.state == RoundState::GameOver).await;
    assert_eq!(over.badges, vec![Badge::Streak, Badge::Highscore, Badge::Perfect]);
    assert_eq!(over.target_xp, 700);
    assert_eq!(over.reason, ReasonCode::R003_TRANSITION_TO_GAMEOVER);

    for _ in 0..100 {
        if !remote.ends.lock().unwrap().is_empty()
            && remote.badges.lock().unwrap().len() == 3
            && remote.levels.lock().unwrap().len() == 5
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(remote.streaks.load(Ordering::SeqCst), 5);
    assert_eq!(remote.starts.load(Ordering::SeqCst), 1);
    let mut badges = remote.badges.lock().unwrap().clone();
    badges.sort();
    assert_eq!(badges, vec!["highscore", "perfect", "streak"]);
    let ends = remote.ends.lock().unwrap().clone();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].total_score, 700);
    assert_eq!(ends[0].rounds_played, 5);
    // Five round scores plus the game summary
    assert_eq!(remote.scores.lock().unwrap().len(), 6);
    // 140, 280, 420, 560, 700 XP
    let mut levels = remote.levels.lock().unwrap().clone();
    levels.sort();
    assert_eq!(levels, vec![2, 3, 5, 6, 8]);

    // Actions stay rejected until a new game
    assert!(handle.submit_argument("one more").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_failed_badge_award_is_isolated() {
    let remote = Arc::new(ScriptedRemote::new(9.0, true).failing_badge("highscore"));
    let mut config = config(50);
    config.total_rounds = 3;
    let handle = spawn(config, SessionContext::for_player("kwame"), remote.clone());
    handle.new_game("food", "easy", None).await.unwrap();

    for round in 1..=3 {
        wait_for(&handle, |s| s.round == round && s.state == RoundState::Playing).await;
        handle.submit_argument("Share the fufu").await.unwrap();
        handle.dispatch(GameCommand::Evaluate).await.unwrap();
        wait_for(&handle, |s| s.round > round || s.state != RoundState::Playing).await;
    }
    let over = wait_for(&handle, |s| s.state == RoundState::GameOver).await;
    assert_eq!(over.badges, vec![Badge::Streak, Badge::Highscore, Badge::Perfect]);

    for _ in 0..100 {
        if !remote.ends.lock().unwrap().is_empty() && remote.badges.lock().unwrap().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let mut badges = remote.badges.lock().unwrap().clone();
    badges.sort();
    assert_eq!(badges, vec!["perfect", "streak"]);
    assert_eq!(remote.ends.lock().unwrap().len(), 1);
    // Three round scores plus the game summary
    assert_eq!(remote.scores.lock().unwrap().len(), 4);

    let fresh = handle.new_game("travel", "hard", None).await.unwrap();
    assert_eq!(fresh.state, RoundState::Playing);
    assert_eq!(fresh.round, 1);
    assert!(fresh.badges.is_empty());
    assert_eq!(remote.starts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_anonymous_player_skips_persistence() {
    let remote = Arc::new(ScriptedRemote::new(9.0, true));
    let handle = spawn(config(50), SessionContext::default(), remote.clone());
    handle.new_game("food", "easy", None).await.unwrap();
    handle.submit_argument("Come eat with us").await.unwrap();
    handle.dispatch(GameCommand::Evaluate).await.unwrap();
    wait_for(&handle, |s| s.state == RoundState::Success).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(remote.streaks.load(Ordering::SeqCst), 0);
    assert!(remote.scores.lock().unwrap().is_empty());
    assert!(remote.levels.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_offline_plays_on_demo_content() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(OfflineRemote));
    handle.new_game("travel", "easy", None).await.unwrap();
    let loaded = wait_for(&handle, |s| !s.loading.scenario).await;
    assert!(loaded.scenario.ends_with("(Demo mode - server offline)"));
    assert!(loaded.demo_mode);

    handle.submit_argument("Ghana in December").await.unwrap();
    handle.dispatch(GameCommand::Translate).await.unwrap();
    let translated = wait_for(&handle, |s| !s.loading.translation).await;
    assert_eq!(
        translated.translation,
        "[Translation unavailable - server offline] Ghana in December"
    );

    handle.dispatch(GameCommand::Evaluate).await.unwrap();
    let scored = wait_for(&handle, |s| s.score.is_some()).await;
    let score = scored.score.unwrap();
    assert!((3.0..=9.0).contains(&score));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_request_is_busy() {
    let remote = ScriptedRemote::new(5.0, false).with_delay(Duration::from_secs(3));
    let handle = spawn(config(50), SessionContext::default(), Arc::new(remote));
    handle.new_game("food", "easy", None).await.unwrap();
    handle.submit_argument("patience").await.unwrap();
    handle.dispatch(GameCommand::Evaluate).await.unwrap();

    let err = handle.dispatch(GameCommand::Evaluate).await.unwrap_err();
    assert!(matches!(err, GameError::Busy(_)));
}

#[tokio::test(start_paused = true)]
async fn test_dialogue_moves_stance() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(ScriptedRemote::new(5.0, false)));
    handle.new_game("food", "easy", None).await.unwrap();
    handle.dispatch(GameCommand::Dialogue).await.unwrap();
    let replied = wait_for(&handle, |s| !s.ai_response.is_empty()).await;
    assert_eq!(replied.ai_response, "Hmm, tell me more.");
    assert_eq!(replied.ai_stance.as_str(), "neutral");
}

#[tokio::test(start_paused = true)]
async fn test_voice_next_only_after_round() {
    let handle = spawn(config(1), SessionContext::default(), Arc::new(ScriptedRemote::new(5.0, false)));
    handle.new_game("food", "easy", None).await.unwrap();

    let reply = handle
        .dispatch(GameCommand::VoiceTranscript("please go to the next one".to_string()))
        .await
        .unwrap();
    assert_eq!(reply.voice.unwrap().action(), Some(VoiceAction::Next));
    assert_eq!(reply.snapshot.round, 1);
    assert_eq!(reply.snapshot.state, RoundState::Playing);

    wait_for(&handle, |s| s.state == RoundState::Fail).await;
    let reply = handle
        .dispatch(GameCommand::VoiceTranscript("Next".to_string()))
        .await
        .unwrap();
    assert_eq!(reply.snapshot.round, 2);
    assert_eq!(reply.snapshot.state, RoundState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_voice_unrecognized_sets_notice() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(ScriptedRemote::new(5.0, false)));
    handle.new_game("food", "easy", None).await.unwrap();
    let reply = handle
        .dispatch(GameCommand::VoiceTranscript("banana".to_string()))
        .await
        .unwrap();
    assert_eq!(reply.voice.unwrap().action(), None);
    assert!(reply.snapshot.notice.unwrap().starts_with("Command not recognized"));
    assert_eq!(reply.snapshot.reason, ReasonCode::R005_VOICE_NOT_RECOGNIZED);
}

#[tokio::test(start_paused = true)]
async fn test_listen_without_recognizer() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(ScriptedRemote::new(5.0, false)));
    handle.new_game("food", "easy", None).await.unwrap();
    let err = handle.dispatch(GameCommand::Listen).await.unwrap_err();
    assert_eq!(err, GameError::Voice(VoiceError::Unsupported));

    let snapshot = handle.snapshot().await.unwrap();
    assert!(!snapshot.listening);
}

#[tokio::test(start_paused = true)]
async fn test_listen_with_recognizer() {
    let recognizer = Arc::new(ScriptedRecognizer::new());
    recognizer.push_transcript("show me the leaderboard");
    let synth = Arc::new(LogSynthesizer::new());
    let config = config(50);
    let voice = VoiceController::new(recognizer, synth.clone(), "fr-FR", config.voice_timeout());
    let handle = GameDriver::spawn(
        config,
        SessionContext::default(),
        Arc::new(ScriptedRemote::new(5.0, false)),
        Arc::new(voice),
    );
    handle.new_game("food", "easy", None).await.unwrap();

    let reply = handle.dispatch(GameCommand::Listen).await.unwrap();
    assert_eq!(reply.voice.unwrap().action(), Some(VoiceAction::Leaderboard));
    assert_eq!(reply.snapshot.notice.as_deref(), Some("Show leaderboard"));
    assert!(!reply.snapshot.listening);
    assert_eq!(synth.spoken()[0], ("Show leaderboard".to_string(), "fr-FR".to_string()));

    // Nothing queued: the safety timeout ends the session
    let err = handle.dispatch(GameCommand::Listen).await.unwrap_err();
    assert_eq!(err, GameError::Voice(VoiceError::TimedOut));
    assert!(!handle.snapshot().await.unwrap().listening);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_listen_ends_session() {
    let recognizer = Arc::new(ScriptedRecognizer::new());
    let config = config(50);
    let voice = VoiceController::new(
        recognizer.clone(),
        Arc::new(LogSynthesizer::new()),
        "en-US",
        config.voice_timeout(),
    );
    let handle = GameDriver::spawn(
        config,
        SessionContext::default(),
        Arc::new(ScriptedRemote::new(5.0, false)),
        Arc::new(voice),
    );
    handle.new_game("food", "easy", None).await.unwrap();

    let pending = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.dispatch(GameCommand::Listen).await })
    };
    wait_for(&handle, |s| s.listening).await;

    let reply = handle.dispatch(GameCommand::CancelListen).await.unwrap();
    assert_eq!(reply.snapshot.notice.as_deref(), Some("Stopped listening."));

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err, GameError::Voice(VoiceError::Recognition(RecognitionError::Aborted)));
    let snapshot = handle.snapshot().await.unwrap();
    assert!(!snapshot.listening);
    assert_eq!(snapshot.reason, ReasonCode::R005_VOICE_FAILED);

    // Nothing left to cancel
    let reply = handle.dispatch(GameCommand::CancelListen).await.unwrap();
    assert_eq!(reply.snapshot.notice, None);
    assert_eq!(reply.snapshot.reason, ReasonCode::R002_STATE_PLAYING);

    recognizer.push_transcript("help");
    let reply = handle.dispatch(GameCommand::Listen).await.unwrap();
    assert_eq!(reply.voice.unwrap().action(), Some(VoiceAction::Help));
}

#[tokio::test(start_paused = true)]
async fn test_new_game_resets_everything() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(ScriptedRemote::new(9.0, true)));
    handle.new_game("food", "easy", None).await.unwrap();
    handle.submit_argument("first game words").await.unwrap();
    handle.dispatch(GameCommand::Evaluate).await.unwrap();
    wait_for(&handle, |s| s.displayed_xp == 140).await;

    let fresh = handle.new_game("education", "hard", Some("ewe")).await.unwrap();
    assert_eq!(fresh.round, 1);
    assert_eq!(fresh.state, RoundState::Playing);
    assert_eq!(fresh.displayed_xp, 0);
    assert_eq!(fresh.target_xp, 0);
    assert_eq!(fresh.language, "ewe");
    assert!(fresh.argument.is_empty());
}

#[tokio::test]
async fn test_blank_category_rejected() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(OfflineRemote));
    assert!(!handle.is_closed());
    let err = handle
        .dispatch(GameCommand::NewGame {
            category: " ".to_string(),
            difficulty: "easy".to_string(),
            language: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::ValidationFailure(_)));
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_language_rejected() {
    let handle = spawn(config(50), SessionContext::default(), Arc::new(OfflineRemote));
    let err = handle.new_game("food", "easy", Some("yoruba")).await.unwrap_err();
    assert!(matches!(err, GameError::ValidationFailure(_)));

    let snapshot = handle.new_game("food", "easy", Some(" EWE ")).await.unwrap();
    assert_eq!(snapshot.language, "ewe");
    wait_for(&handle, |s| !s.loading.scenario).await;
    let err = handle
        .dispatch(GameCommand::ChangeLanguage("fr".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::ValidationFailure(_)));
    let reply = handle
        .dispatch(GameCommand::ChangeLanguage("gaa".to_string()))
        .await
        .unwrap();
    assert_eq!(reply.snapshot.language, "gaa");
}
