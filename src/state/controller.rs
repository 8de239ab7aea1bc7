//! The game controller: a pure transition function.
//!
//! # State Diagram
//!
//! ```text
//! ┌─────────────┐   collision(bomb), immunity <= 0   ┌────────────┐
//! │   Playing   │───────────────────────────────────▶│  GameOver  │
//! └──────┬──────┘                                    └────────────┘
//!        │ collision(star) / moveTo / setInfo            (terminal,
//!        │ collision(bomb) while immune                  absorbs all
//!        └──────────────▶ Playing                        intents)
//! ```

use log::{debug, info};

use super::config::GameConfig;
use super::game::{Animation, CollisionKind, Direction, GameState, Info, Intent, Velocity};

/// Maps `(state, intent)` to the next state.
///
/// Total and deterministic: never fails, never reads anything but its config
/// and its arguments.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    config: GameConfig,
}

impl Controller {
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Apply an intent, returning the new state.
    pub fn apply(&self, state: &GameState, intent: &Intent) -> GameState {
        if state.phase().is_terminal() {
            debug!("absorbing {} after game over", intent.kind());
            return state.clone();
        }

        match intent {
            Intent::Collision(kind) => self.collide(state, *kind),
            Intent::MoveTo {
                direction,
                grounded,
            } => GameState {
                velocity: self.velocity_for(direction, *grounded),
                ..state.clone()
            },
            Intent::SetInfo(info) => self.save_info(state, *info),
        }
    }

    fn collide(&self, state: &GameState, kind: CollisionKind) -> GameState {
        match kind {
            CollisionKind::Star => GameState {
                score: state.score.saturating_add(self.config.star_points),
                ..state.clone()
            },
            CollisionKind::Bomb if state.is_immune() => {
                debug!("bomb ignored, {} immunity ticks left", state.immunity);
                state.clone()
            }
            CollisionKind::Bomb => {
                info!("game over with score {}", state.score);
                GameState {
                    game_over: true,
                    ..state.clone()
                }
            }
        }
    }

    /// Left wins when both horizontal flags are set.
    fn velocity_for(&self, direction: &Direction, grounded: bool) -> Velocity {
        let (x, animation) = if direction.left {
            (-self.config.run_speed, Animation::Left)
        } else if direction.right {
            (self.config.run_speed, Animation::Right)
        } else {
            (0.0, Animation::Turn)
        };

        let y = if direction.up && grounded {
            -self.config.jump_impulse
        } else {
            0.0
        };

        Velocity { x, y, animation }
    }

    fn save_info(&self, state: &GameState, info: Info) -> GameState {
        GameState {
            info: Some(info),
            immunity: self.config.immunity_decay.next(state.immunity),
            ..state.clone()
        }
    }
}
