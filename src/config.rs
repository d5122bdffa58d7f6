//! Game configuration
//!
//! Defaults come from the crate constants; a JSON file and CLI flags may
//! override them. Validation runs once, before a driver is spawned.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::{
    ADVANCE_DELAY_MS, DAILY_GOAL_XP, ROUND_TIME_SECS, TICK_MS, TOTAL_ROUNDS,
    VOICE_SAFETY_TIMEOUT_MS, XP_ANIMATION_MS, XP_STEP_MS,
};

/// Default backend for scenario / translate / evaluate / dialogue
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for one game driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Rounds per game
    pub total_rounds: u32,
    /// Countdown per round (seconds)
    pub round_secs: u32,
    /// Clock period (milliseconds)
    pub tick_ms: u64,
    /// Pause on SUCCESS / FAIL before advancing (milliseconds)
    pub advance_delay_ms: u64,
    /// XP animation length (milliseconds)
    pub xp_animation_ms: u64,
    /// XP animation frame (milliseconds)
    pub xp_step_ms: u64,
    /// Daily XP goal
    pub daily_goal: i64,
    /// Listening session cap (milliseconds)
    pub voice_timeout_ms: u64,
    /// Backend base URL
    pub backend_url: String,
    /// Prefix for persistence endpoints (scores, streak, badges, sessions)
    pub api_prefix: String,
    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: TOTAL_ROUNDS,
            round_secs: ROUND_TIME_SECS,
            tick_ms: TICK_MS,
            advance_delay_ms: ADVANCE_DELAY_MS,
            xp_animation_ms: XP_ANIMATION_MS,
            xp_step_ms: XP_STEP_MS,
            daily_goal: DAILY_GOAL_XP,
            voice_timeout_ms: VOICE_SAFETY_TIMEOUT_MS,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            api_prefix: "/api/v1".to_string(),
            request_timeout_ms: 8000,
        }
    }
}

impl GameConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: GameConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the state machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_rounds == 0 {
            return Err(invalid("total_rounds", "must be at least 1"));
        }
        if self.round_secs == 0 {
            return Err(invalid("round_secs", "must be at least 1"));
        }
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "must be at least 1"));
        }
        if self.xp_step_ms == 0 {
            return Err(invalid("xp_step_ms", "must be at least 1"));
        }
        if self.daily_goal <= 0 {
            return Err(invalid("daily_goal", "must be positive"));
        }
        if self.backend_url.trim().is_empty() {
            return Err(invalid("backend_url", "must not be empty"));
        }
        Ok(())
    }

    /// Number of XP animation frames (600 / 20 = 30 by default)
    pub fn xp_steps(&self) -> u32 {
        let steps = self.xp_animation_ms.div_ceil(self.xp_step_ms.max(1));
        u32::try_from(steps).unwrap_or(u32::MAX).max(1)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn xp_step(&self) -> Duration {
        Duration::from_millis(self.xp_step_ms)
    }

    pub fn voice_timeout(&self) -> Duration {
        Duration::from_millis(self.voice_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = GameConfig::default();
        assert_eq!(config.total_rounds, 5);
        assert_eq!(config.round_secs, 50);
        assert_eq!(config.xp_steps(), 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"round_secs": 30}"#).unwrap();
        assert_eq!(config.round_secs, 30);
        assert_eq!(config.total_rounds, TOTAL_ROUNDS);
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let config = GameConfig {
            total_rounds: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "total_rounds", .. })
        ));
    }

    #[test]
    fn test_zero_step_rejected() {
        let config = GameConfig {
            xp_step_ms: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_xp_steps_saturate() {
        let config = GameConfig {
            xp_animation_ms: u64::MAX,
            xp_step_ms: 1,
            ..GameConfig::default()
        };
        assert_eq!(config.xp_steps(), u32::MAX);

        let config = GameConfig {
            xp_animation_ms: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.xp_steps(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
