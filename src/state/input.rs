//! Input resolution.
//!
//! Turns the raw pointer and keyboard state of one frame into the
//! [`Direction`] the player wants to move in.
//!
//! A pointer press steers for a fixed number of frames. While it has frames
//! left the keyboard is ignored; each consulted frame spends one.

use log::warn;
use serde::{Deserialize, Serialize};

use super::game::Direction;

/// Cursor keys currently held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
}

impl KeyboardState {
    pub fn direction(&self) -> Direction {
        Direction::new(self.left, self.right, self.up)
    }
}

/// Where the pointer was pressed and how many frames it keeps steering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub frames_remaining: u32,
}

impl PointerState {
    pub fn new(x: f32, y: f32, frames_remaining: u32) -> Self {
        Self {
            x,
            y,
            frames_remaining,
        }
    }

    pub fn is_active(&self) -> bool {
        self.frames_remaining > 0
    }
}

/// Physics-body position of the player, in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
}

impl PlayerPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Raw input for one frame, as handed over by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInput {
    pub keyboard: KeyboardState,
    pub pointer: Option<PointerState>,
}

impl RawInput {
    pub fn keyboard(left: bool, right: bool, up: bool) -> Self {
        Self {
            keyboard: KeyboardState { left, right, up },
            pointer: None,
        }
    }

    /// Record a pointer press that steers for `hold_frames` frames.
    pub fn press_pointer(&mut self, x: f32, y: f32, hold_frames: u32) {
        self.pointer = Some(PointerState::new(x, y, hold_frames));
    }

    /// Parse a host snapshot. Anything missing reads as not pressed, and a
    /// snapshot that does not parse at all reads as no input.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(input) => input,
            Err(e) => {
                warn!("malformed input snapshot, treating as idle: {}", e);
                Self::default()
            }
        }
    }
}

/// Resolve this frame's movement.
///
/// With an active pointer, the dominant axis between pointer and player
/// decides: a strictly larger vertical distance gives a jump (only if the
/// pointer is above), otherwise the pointer's side gives left or right.
/// Otherwise the keyboard flags pass through unchanged.
pub fn resolve(
    pointer: Option<&mut PointerState>,
    keyboard: &KeyboardState,
    player: PlayerPosition,
) -> Direction {
    let pointer = match pointer {
        Some(pointer) if pointer.is_active() => pointer,
        _ => return keyboard.direction(),
    };

    let dx = (pointer.x - player.x).abs();
    let dy = (pointer.y - player.y).abs();

    let direction = if dy > dx {
        // Screen y grows downward
        Direction::new(false, false, pointer.y < player.y)
    } else {
        Direction::new(pointer.x < player.x, pointer.x > player.x, false)
    };

    pointer.frames_remaining -= 1;
    direction
}
