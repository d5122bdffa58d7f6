//! Achievement badges

use serde::{Deserialize, Serialize};

/// Badges unlocked at game over
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    /// Won 3 or more rounds in a game
    Streak,
    /// Peak score of 8 or more
    Highscore,
    /// 20 or more distinct argument words
    Creative,
    /// Persuaded the AI in every round
    Perfect,
}

impl Badge {
    pub const ALL: [Badge; 4] = [Badge::Streak, Badge::Highscore, Badge::Creative, Badge::Perfect];

    /// Identifier sent to the backend as `badge_type`
    pub fn id(&self) -> &'static str {
        match self {
            Badge::Streak => "streak",
            Badge::Highscore => "highscore",
            Badge::Creative => "creative",
            Badge::Perfect => "perfect",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Badge::Streak => "Streak Master",
            Badge::Highscore => "High Scorer",
            Badge::Creative => "Creative Thinker",
            Badge::Perfect => "Perfect Player",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Badge::Streak => "Won 3 or more rounds in a game",
            Badge::Highscore => "Achieved a high score of 8 or more",
            Badge::Creative => "Used 20 or more unique words",
            Badge::Perfect => "Persuaded AI in all rounds",
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}
