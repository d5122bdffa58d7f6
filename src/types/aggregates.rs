//! Per-game aggregates read by the badge evaluator

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Word separator for vocabulary counting (Unicode aware, keeps ɛ / ɔ)
    static ref RE_NON_WORD: Regex = Regex::new(r"\W+").unwrap();
}

/// Aggregates for one game. Reset when round 1 starts, read once at GAMEOVER.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundAggregates {
    /// Rounds that ended in SUCCESS
    pub round_wins: u32,
    /// Lowercase argument tokens across the game
    pub unique_words_seen: BTreeSet<String>,
    /// False as soon as any round ends in FAIL
    pub all_persuaded: bool,
    /// Rounds that reached SUCCESS or FAIL
    pub rounds_completed: u32,
    /// Highest raw score reported this game
    pub peak_score: f64,
}

impl Default for RoundAggregates {
    fn default() -> Self {
        Self {
            round_wins: 0,
            unique_words_seen: BTreeSet::new(),
            all_persuaded: true,
            rounds_completed: 0,
            peak_score: 0.0,
        }
    }
}

impl RoundAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to 0 / {} / true
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Round ended in SUCCESS
    pub fn record_success(&mut self, argument: &str) {
        self.round_wins += 1;
        self.rounds_completed += 1;
        self.absorb_words(argument);
    }

    /// Round ended in FAIL
    pub fn record_fail(&mut self, argument: &str) {
        self.all_persuaded = false;
        self.rounds_completed += 1;
        self.absorb_words(argument);
    }

    /// An argument was submitted while playing
    pub fn record_argument(&mut self, argument: &str) {
        self.absorb_words(argument);
    }

    /// Keep the highest score seen
    pub fn record_score(&mut self, raw_score: f64) {
        if raw_score > self.peak_score {
            self.peak_score = raw_score;
        }
    }

    pub fn unique_word_count(&self) -> usize {
        self.unique_words_seen.len()
    }

    fn absorb_words(&mut self, text: &str) {
        self.unique_words_seen.extend(tokenize(text));
    }
}

/// Lowercase word tokens of an argument
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    RE_NON_WORD
        .split(text)
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}
