//! Game state and intents.
//!
//! [`GameState`] is the single immutable value the [`Store`](super::Store)
//! owns. [`Intent`] is the only way to ask for a new one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Macro-state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Collecting stars
    #[default]
    Playing,
    /// Hit a bomb outside the immunity window (terminal)
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::GameOver => "game_over",
        }
    }

    /// Check if the phase can never change again within the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver)
    }
}

/// Animation the player sprite should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    Left,
    Right,
    #[default]
    Turn,
}

impl Animation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Turn => "turn",
        }
    }
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player velocity and the animation chosen with it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub animation: Animation,
}

/// Integer player coordinates captured for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub x: i32,
    pub y: i32,
}

/// Telemetry saved into the state every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Info {
    pub player: PlayerInfo,
}

impl Info {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            player: PlayerInfo { x, y },
        }
    }
}

/// Movement flags requested for one tick.
///
/// Only compared across ticks to decide whether a new `MoveTo` is needed;
/// never stored in [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Direction {
    pub left: bool,
    pub right: bool,
    pub up: bool,
}

impl Direction {
    pub const NONE: Self = Self {
        left: false,
        right: false,
        up: false,
    };

    pub fn new(left: bool, right: bool, up: bool) -> Self {
        Self { left, right, up }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::NONE
    }
}

/// What the player collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionKind {
    Star,
    Bomb,
}

impl CollisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Star => "star",
            Self::Bomb => "bomb",
        }
    }
}

/// The authoritative game state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameState {
    /// Stars collected, never decreases within a session
    pub score: u32,

    /// Monotone false -> true
    pub game_over: bool,

    pub velocity: Velocity,

    /// Ticks of bomb immunity left; negative once the window has passed
    pub immunity: i32,

    /// Last telemetry snapshot, `None` until the first tick
    pub info: Option<Info>,
}

impl GameState {
    /// Fresh session state with the given immunity window.
    pub fn with_immunity(immunity: i32) -> Self {
        Self {
            immunity,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.game_over {
            GamePhase::GameOver
        } else {
            GamePhase::Playing
        }
    }

    /// Bomb collisions are ignored while this holds.
    pub fn is_immune(&self) -> bool {
        self.immunity > 0
    }

    /// Whether the external player/bomb collider should respond.
    pub fn bomb_collider_active(&self) -> bool {
        self.immunity < 0
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "score": self.score,
            "game_over": self.game_over,
            "velocity": {
                "x": self.velocity.x,
                "y": self.velocity.y,
                "animation": self.velocity.animation.as_str()
            },
            "immunity": self.immunity,
            "info": self.info.map(|info| serde_json::json!({
                "player": { "x": info.player.x, "y": info.player.y }
            }))
        })
    }
}

/// Intent kinds accepted on the serialized boundary.
pub const INTENT_KINDS: [&str; 3] = ["game/moveTo", "game/collision", "game/setInfo"];

/// An immutable description of what happened.
///
/// Intents carry no behavior; only the [`Controller`](super::Controller)
/// interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Intent {
    /// Move in a direction. `grounded` is sampled from the physics body when
    /// the intent is built; the controller only jumps when it is set.
    #[serde(rename = "game/moveTo")]
    MoveTo {
        direction: Direction,
        #[serde(default)]
        grounded: bool,
    },

    #[serde(rename = "game/collision")]
    Collision(CollisionKind),

    #[serde(rename = "game/setInfo")]
    SetInfo(Info),
}

impl Intent {
    pub fn move_to(direction: Direction, grounded: bool) -> Self {
        Self::MoveTo {
            direction,
            grounded,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MoveTo { .. } => INTENT_KINDS[0],
            Self::Collision(_) => INTENT_KINDS[1],
            Self::SetInfo(_) => INTENT_KINDS[2],
        }
    }

    /// Telemetry is dispatched every tick and logged at trace level only.
    pub fn is_telemetry(&self) -> bool {
        matches!(self, Self::SetInfo(_))
    }

    /// Decode an intent from its serialized form.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, InvalidIntentError> {
        let kind = match value.get("type").and_then(|t| t.as_str()) {
            Some(kind) => kind,
            None => {
                return Err(InvalidIntentError::new(
                    "<missing>",
                    "intent has no string `type` field",
                ))
            }
        };

        if !INTENT_KINDS.iter().any(|known| *known == kind) {
            return Err(InvalidIntentError::new(kind, "unrecognized intent kind"));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| InvalidIntentError::new(kind, e.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Derived Serialize only fails on non-string map keys, which intents don't have.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Error when a dispatched intent cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIntentError {
    pub kind: String,
    pub reason: String,
}

impl InvalidIntentError {
    pub fn new(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InvalidIntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid intent {}: {}", self.kind, self.reason)
    }
}

impl std::error::Error for InvalidIntentError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_state() {
        let state = GameState::default();
        assert_eq!(state.score, 0);
        assert!(!state.game_over);
        assert_eq!(state.velocity.animation, Animation::Turn);
        assert_eq!(state.info, None);
        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(!state.is_immune());
        assert!(!state.bomb_collider_active());
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(GamePhase::Playing.as_str(), "playing");
        assert_eq!(GamePhase::GameOver.as_str(), "game_over");
        assert!(GamePhase::GameOver.is_terminal());
        assert_eq!(
            serde_json::to_value(GamePhase::GameOver).unwrap(),
            json!(GamePhase::GameOver.as_str())
        );
    }

    #[test]
    fn test_direction_idle() {
        assert!(Direction::NONE.is_idle());
        assert!(Direction::default().is_idle());
        assert!(!Direction::new(false, false, true).is_idle());
    }

    #[test]
    fn test_immunity_flags() {
        assert!(GameState::with_immunity(3).is_immune());
        assert!(!GameState::with_immunity(3).bomb_collider_active());
        assert!(GameState::with_immunity(-1).bomb_collider_active());
    }

    #[test]
    fn test_to_json_matches_serde_shape() {
        let mut state = GameState::with_immunity(5);
        state.info = Some(Info::at(100, 450));
        state.velocity = Velocity {
            x: -160.0,
            y: 0.0,
            animation: Animation::Left,
        };

        assert_eq!(state.to_json(), serde_json::to_value(&state).unwrap());
        assert_eq!(state.to_json()["velocity"]["animation"], json!("left"));
        assert_eq!(GameState::default().to_json()["info"], json!(null));
    }

    #[test]
    fn test_intent_wire_format() {
        let intent = Intent::Collision(CollisionKind::Star);
        assert_eq!(
            intent.to_json(),
            json!({"type": "game/collision", "payload": "star"})
        );

        let intent = Intent::move_to(Direction::new(true, false, false), true);
        assert_eq!(
            intent.to_json(),
            json!({
                "type": "game/moveTo",
                "payload": {
                    "direction": {"left": true, "right": false, "up": false},
                    "grounded": true
                }
            })
        );
    }

    #[test]
    fn test_intent_from_json() {
        let intent = Intent::from_json(&json!({
            "type": "game/setInfo",
            "payload": {"player": {"x": 3, "y": 4}}
        }))
        .unwrap();
        assert_eq!(intent, Intent::SetInfo(Info::at(3, 4)));

        // Missing direction flags default to not pressed
        let intent = Intent::from_json(&json!({
            "type": "game/moveTo",
            "payload": {"direction": {"up": true}}
        }))
        .unwrap();
        assert_eq!(intent, Intent::move_to(Direction::new(false, false, true), false));
    }

    #[test]
    fn test_intent_from_json_rejects_unknown_kind() {
        let err = Intent::from_json(&json!({"type": "game/teleport"})).unwrap_err();
        assert_eq!(err.kind, "game/teleport");
        assert_eq!(err.reason, "unrecognized intent kind");

        let err = Intent::from_json(&json!({"payload": 1})).unwrap_err();
        assert_eq!(err.kind, "<missing>");
    }

    #[test]
    fn test_intent_from_json_rejects_unknown_collision() {
        let err = Intent::from_json(&json!({"type": "game/collision", "payload": "rock"}))
            .unwrap_err();
        assert_eq!(err.kind, "game/collision");
        assert!(format!("{}", err).starts_with("Invalid intent game/collision"));
    }

    #[test]
    fn test_intent_kind() {
        assert_eq!(Intent::SetInfo(Info::default()).kind(), "game/setInfo");
        assert!(Intent::SetInfo(Info::default()).is_telemetry());
        assert!(!Intent::Collision(CollisionKind::Bomb).is_telemetry());
    }
}
