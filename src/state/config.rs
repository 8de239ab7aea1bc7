//! Session tuning.
//!
//! All constants the controller and input resolver need, loadable from JSON
//! so a host can tweak balance without rebuilding.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::game::GameState;

/// Points awarded per star.
pub const DEFAULT_STAR_POINTS: u32 = 1;

/// Horizontal run speed (pixels/s).
pub const DEFAULT_RUN_SPEED: f32 = 160.0;

/// Upward impulse applied on a grounded jump (pixels/s).
pub const DEFAULT_JUMP_IMPULSE: f32 = 330.0;

/// Frames a pointer press keeps steering the player.
pub const DEFAULT_POINTER_HOLD_FRAMES: u32 = 25;

/// How the immunity counter evolves once per tick.
///
/// The controller applies this when it processes the per-tick telemetry
/// intent, so the rule runs exactly once per orchestrated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImmunityDecay {
    /// Subtract `step` every tick; keeps going below zero so the collider
    /// switches on once the window has fully passed. `step` must be positive.
    Countdown { step: u32 },
    /// Set once at session start, never refreshed.
    Frozen,
}

impl Default for ImmunityDecay {
    fn default() -> Self {
        Self::Countdown { step: 1 }
    }
}

impl ImmunityDecay {
    pub fn next(&self, immunity: i32) -> i32 {
        match self {
            Self::Countdown { step } => immunity.saturating_sub_unsigned(*step),
            Self::Frozen => immunity,
        }
    }
}

/// Game configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub star_points: u32,
    pub run_speed: f32,
    pub jump_impulse: f32,
    pub initial_immunity: i32,
    pub immunity_decay: ImmunityDecay,
    pub pointer_hold_frames: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            star_points: DEFAULT_STAR_POINTS,
            run_speed: DEFAULT_RUN_SPEED,
            jump_impulse: DEFAULT_JUMP_IMPULSE,
            initial_immunity: 0,
            immunity_decay: ImmunityDecay::default(),
            pointer_hold_frames: DEFAULT_POINTER_HOLD_FRAMES,
        }
    }
}

impl GameConfig {
    /// Load a config, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde cannot rule out by type alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let ImmunityDecay::Countdown { step: 0 } = self.immunity_decay {
            return Err(ConfigError::Invalid(
                "immunity countdown step must be positive; use `frozen` to stop decay",
            ));
        }
        Ok(())
    }

    /// State a new session starts from.
    pub fn start_state(&self) -> GameState {
        GameState::with_immunity(self.initial_immunity)
    }
}

/// Error loading a [`GameConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// Not valid JSON, or a field has the wrong type.
    Parse(serde_json::Error),
    /// Well-formed but out of range.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Invalid game config: {}", e),
            Self::Invalid(reason) => write!(f, "Invalid game config: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}
