//! Game session model
//!
//! - GameSession = one game of `total_rounds` rounds
//! - RoundContent = the per-round fields cleared at every new round
//! - RoundToken = monotonic id stamped on every outstanding request

use serde::{Deserialize, Serialize};

use crate::types::RoundState;

/// Monotonic round id; bumped at every round start and every new game
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RoundToken(pub u64);

impl RoundToken {
    pub fn next(self) -> Self {
        RoundToken(self.0 + 1)
    }
}

impl std::fmt::Display for RoundToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the AI character stands on the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    #[default]
    Disagree,
    Neutral,
    Agree,
}

impl Stance {
    /// Parse the backend's stance string; unknown values keep `fallback`
    pub fn parse_or(raw: &str, fallback: Stance) -> Stance {
        match raw.trim().to_lowercase().as_str() {
            "disagree" => Stance::Disagree,
            "neutral" => Stance::Neutral,
            "agree" => Stance::Agree,
            _ => fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Disagree => "disagree",
            Stance::Neutral => "neutral",
            Stance::Agree => "agree",
        }
    }
}

/// Argument tone sent to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Polite,
    Passionate,
    Formal,
    Casual,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Polite, Tone::Passionate, Tone::Formal, Tone::Casual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Polite => "polite",
            Tone::Passionate => "passionate",
            Tone::Formal => "formal",
            Tone::Casual => "casual",
        }
    }

    pub fn parse(raw: &str) -> Option<Tone> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Target languages offered by the backend
pub const LANGUAGES: [(&str, &str); 3] = [("twi", "Twi"), ("gaa", "Ga"), ("ewe", "Ewe")];

/// Default target language
pub const DEFAULT_LANGUAGE: &str = "twi";

/// Remote operation kinds the player can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Scenario,
    Translation,
    Evaluation,
    Dialogue,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Scenario => "scenario",
            OperationKind::Translation => "translation",
            OperationKind::Evaluation => "evaluation",
            OperationKind::Dialogue => "dialogue",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loading flags, one per operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InFlight {
    pub scenario: bool,
    pub translation: bool,
    pub evaluation: bool,
    pub dialogue: bool,
}

impl InFlight {
    pub fn is_loading(&self, kind: OperationKind) -> bool {
        *self.slot(kind)
    }

    pub fn set(&mut self, kind: OperationKind, loading: bool) {
        *self.slot_mut(kind) = loading;
    }

    /// Any request outstanding
    pub fn any(&self) -> bool {
        self.scenario || self.translation || self.evaluation || self.dialogue
    }

    fn slot(&self, kind: OperationKind) -> &bool {
        match kind {
            OperationKind::Scenario => &self.scenario,
            OperationKind::Translation => &self.translation,
            OperationKind::Evaluation => &self.evaluation,
            OperationKind::Dialogue => &self.dialogue,
        }
    }

    fn slot_mut(&mut self, kind: OperationKind) -> &mut bool {
        match kind {
            OperationKind::Scenario => &mut self.scenario,
            OperationKind::Translation => &mut self.translation,
            OperationKind::Evaluation => &mut self.evaluation,
            OperationKind::Dialogue => &mut self.dialogue,
        }
    }
}

/// Per-round transient fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundContent {
    pub scenario: String,
    pub argument: String,
    pub translation: String,
    pub feedback: String,
    /// Raw score of the last evaluation this round
    pub score: Option<f64>,
    pub ai_response: String,
    pub ai_stance: Stance,
    /// Set when the fallback path filled any field this round
    pub demo_mode: bool,
    pub loading: InFlight,
}

/// One game of `total_rounds` rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// 1..=total_rounds
    pub current_round: u32,
    pub total_rounds: u32,
    /// Countdown re-armed to this at every round start
    pub round_secs: u32,
    pub time_left_secs: u32,
    pub timer_active: bool,
    pub round_state: RoundState,
    pub category: String,
    pub difficulty: String,
    pub language: String,
    pub token: RoundToken,
    pub round: RoundContent,
}

impl GameSession {
    /// Fresh session at round 1, clock armed
    pub fn new(
        category: impl Into<String>,
        difficulty: impl Into<String>,
        language: impl Into<String>,
        total_rounds: u32,
        round_secs: u32,
        token: RoundToken,
    ) -> Self {
        Self {
            current_round: 1,
            total_rounds,
            round_secs,
            time_left_secs: round_secs,
            timer_active: true,
            round_state: RoundState::Playing,
            category: category.into(),
            difficulty: difficulty.into(),
            language: language.into(),
            token,
            round: RoundContent::default(),
        }
    }

    /// Last round of the game
    pub fn is_last_round(&self) -> bool {
        self.current_round >= self.total_rounds
    }
}
