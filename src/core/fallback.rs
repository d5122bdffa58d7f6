//! Offline content substituted when a remote call fails
//!
//! Every value produced here is marked as demo content so the player can tell
//! it apart from a live backend answer.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{
    DialogueResponse, EvaluateResponse, ScenarioResponse, Stance, TranslationResponse,
};

pub const DEMO_SUFFIX: &str = " (Demo mode - server offline)";
pub const DEMO_PREFIX: &str = "[Demo mode - server offline]";
pub const TRANSLATION_PREFIX: &str = "[Translation unavailable - server offline]";

/// Lowest / highest mock evaluation score
const MOCK_SCORE_MIN: u32 = 3;
const MOCK_SCORE_MAX: u32 = 9;
/// Mock scores at or above this persuade
const MOCK_PERSUADE_AT: u32 = 7;

const GENERIC_SCENARIO: &str = "You want to convince someone to learn the Twi language with you.";

const DIALOGUE_LINES: [&str; 5] = [
    "I understand your point, but I still have some concerns about this approach.",
    "That's an interesting perspective, though I'm not fully convinced yet.",
    "You make a valid argument, but let me think about this more.",
    "I can see the benefits you mentioned, but there might be some drawbacks to consider.",
    "Your reasoning is sound, but I'd like to explore other options as well.",
];

/// Placeholder scenario for a category
pub fn scenario(category: &str, language: &str) -> ScenarioResponse {
    let text = match category.trim().to_lowercase().as_str() {
        "food" => "You want to convince your friend to try a new restaurant that serves traditional Twi cuisine.",
        "travel" => "You need to persuade your family to visit Ghana for the holidays this year.",
        "education" => "You want to convince your teacher to allow you to present your project in Twi.",
        "business" => "You need to persuade a client to invest in your local business idea.",
        _ => GENERIC_SCENARIO,
    };
    ScenarioResponse {
        scenario: format!("{}{}", text, DEMO_SUFFIX),
        language: language.to_string(),
    }
}

/// Echo the argument back untranslated
pub fn translation(text: &str) -> TranslationResponse {
    TranslationResponse {
        translated_text: format!("{} {}", TRANSLATION_PREFIX, text),
    }
}

pub fn evaluation(argument: &str) -> EvaluateResponse {
    evaluation_with(argument, &mut rand::thread_rng())
}

/// score = clamp(len / 10 + rand(0..3), 3, 9)
pub fn evaluation_with<R: Rng + ?Sized>(argument: &str, rng: &mut R) -> EvaluateResponse {
    let length = argument.chars().count() as u32;
    let score = (length / 10 + rng.gen_range(0..3)).clamp(MOCK_SCORE_MIN, MOCK_SCORE_MAX);
    let persuaded = score >= MOCK_PERSUADE_AT;

    let strength = match score {
        s if s >= 7 => "strong",
        s if s >= 5 => "moderate",
        _ => "basic",
    };
    let verdict = if persuaded {
        "Well done!"
    } else {
        "Try adding more compelling reasons."
    };

    EvaluateResponse {
        persuaded,
        feedback: format!(
            "{} Your argument shows {} persuasive elements. {}",
            DEMO_PREFIX, strength, verdict
        ),
        score: score as f64,
    }
}

pub fn dialogue(stance: Stance) -> DialogueResponse {
    dialogue_with(stance, &mut rand::thread_rng())
}

/// A canned stalling line; the stance does not move
pub fn dialogue_with<R: Rng + ?Sized>(stance: Stance, rng: &mut R) -> DialogueResponse {
    let line = DIALOGUE_LINES.choose(rng).copied().unwrap_or(DIALOGUE_LINES[0]);
    DialogueResponse {
        ai_response: format!("{} {}", DEMO_PREFIX, line),
        new_stance: stance.as_str().to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_known_and_generic_scenarios() {
        let food = scenario("food", "twi");
        assert!(food.scenario.starts_with("You want to convince your friend"));
        assert!(food.scenario.ends_with(DEMO_SUFFIX));

        let other = scenario("sports", "ewe");
        assert!(other.scenario.starts_with(GENERIC_SCENARIO));
        assert_eq!(other.language, "ewe");
    }

    #[test]
    fn test_translation_echo() {
        assert_eq!(
            translation("hello").translated_text,
            "[Translation unavailable - server offline] hello"
        );
    }

    #[test]
    fn test_mock_score_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [0usize, 5, 40, 75, 300] {
            let argument = "x".repeat(len);
            for _ in 0..20 {
                let eval = evaluation_with(&argument, &mut rng);
                assert!((3.0..=9.0).contains(&eval.score));
                assert_eq!(eval.persuaded, eval.score >= 7.0);
                assert!(eval.feedback.starts_with(DEMO_PREFIX));
            }
        }
    }

    #[test]
    fn test_short_argument_never_persuades() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(!evaluation_with("short", &mut rng).persuaded);
        }
    }

    #[test]
    fn test_long_argument_always_persuades() {
        let mut rng = StdRng::seed_from_u64(2);
        let argument = "a".repeat(120);
        for _ in 0..50 {
            let eval = evaluation_with(&argument, &mut rng);
            assert!(eval.persuaded);
            assert_eq!(eval.score, 9.0);
        }
    }

    #[test]
    fn test_dialogue_keeps_stance() {
        let mut rng = StdRng::seed_from_u64(3);
        let reply = dialogue_with(Stance::Neutral, &mut rng);
        assert_eq!(reply.new_stance, "neutral");
        assert!(DIALOGUE_LINES
            .iter()
            .any(|line| reply.ai_response.ends_with(line)));
    }
}
