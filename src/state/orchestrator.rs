//! Per-frame loop driver.
//!
//! Called once per frame by the host. Reads the state, gates on game over,
//! syncs the bomb collider with the immunity window, resolves input and
//! dispatches at most one `MoveTo` (only when the direction changed) plus
//! one telemetry `SetInfo`.

use log::trace;

use super::game::{CollisionKind, Direction, Info, Intent};
use super::input::{self, PlayerPosition, RawInput};
use super::store::Store;

/// The engine-side objects the loop reads from and toggles.
pub trait Scene {
    /// Current physics-body position of the player.
    fn player_position(&self) -> PlayerPosition;

    /// Whether the player is standing on something.
    fn player_grounded(&self) -> bool;

    /// Enable or disable the player/bomb collider.
    fn set_bomb_collider_active(&mut self, active: bool);
}

/// What a single [`LoopOrchestrator::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// The session was over; nothing ran.
    pub halted: bool,
    pub move_dispatched: bool,
    pub info_dispatched: bool,
}

/// Drives one session frame by frame.
#[derive(Debug, Clone, Default)]
pub struct LoopOrchestrator {
    last_move_to: Option<Direction>,
    ticks: u64,
}

impl LoopOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direction dispatched most recently, if any.
    pub fn last_move_to(&self) -> Option<Direction> {
        self.last_move_to
    }

    /// Frames processed, not counting frames after game over.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one frame.
    pub fn tick<S: Scene + ?Sized>(
        &mut self,
        store: &Store,
        input: &mut RawInput,
        scene: &mut S,
    ) -> TickReport {
        let state = store.get_state();
        if state.game_over {
            return TickReport {
                halted: true,
                ..TickReport::default()
            };
        }
        self.ticks += 1;

        scene.set_bomb_collider_active(state.bomb_collider_active());

        let position = scene.player_position();
        let next = input::resolve(input.pointer.as_mut(), &input.keyboard, position);

        let move_dispatched = self.last_move_to != Some(next);
        if move_dispatched {
            self.last_move_to = Some(next);
            store.dispatch(Intent::move_to(next, scene.player_grounded()));
        } else {
            trace!(
                "tick {}: direction unchanged ({}), skipping moveTo",
                self.ticks,
                if next.is_idle() { "idle" } else { "held" }
            );
        }

        store.dispatch(Intent::SetInfo(telemetry(position)));

        TickReport {
            halted: false,
            move_dispatched,
            info_dispatched: true,
        }
    }
}

/// Telemetry for a body position, truncated toward zero.
pub fn telemetry(position: PlayerPosition) -> Info {
    Info::at(position.x as i32, position.y as i32)
}

/// Physics callback: the player overlapped a star.
pub fn on_star_overlap(store: &Store) {
    store.dispatch(Intent::Collision(CollisionKind::Star));
}

/// Physics callback: the player touched a bomb.
pub fn on_bomb_contact(store: &Store) {
    store.dispatch(Intent::Collision(CollisionKind::Bomb));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::config::GameConfig;
    use crate::state::controller::Controller;
    use crate::state::game::{Animation, GameState};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct TestScene {
        position: PlayerPosition,
        grounded: bool,
        collider: Option<bool>,
    }

    impl Scene for TestScene {
        fn player_position(&self) -> PlayerPosition {
            self.position
        }

        fn player_grounded(&self) -> bool {
            self.grounded
        }

        fn set_bomb_collider_active(&mut self, active: bool) {
            self.collider = Some(active);
        }
    }

    fn scene() -> TestScene {
        TestScene {
            position: PlayerPosition::new(100.0, 450.0),
            grounded: true,
            collider: None,
        }
    }

    fn counting(store: &Store) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        store.subscribe(move |_| counter.set(counter.get() + 1));
        count
    }

    #[test]
    fn test_throttles_unchanged_direction() {
        let store = Store::new(Controller::default());
        let notifications = counting(&store);
        let mut orchestrator = LoopOrchestrator::new();
        let mut input = RawInput::keyboard(true, false, false);
        let mut scene = scene();

        let first = orchestrator.tick(&store, &mut input, &mut scene);
        let second = orchestrator.tick(&store, &mut input, &mut scene);

        assert!(first.move_dispatched);
        assert!(!second.move_dispatched);
        assert!(first.info_dispatched && second.info_dispatched);
        // moveTo + setInfo, then setInfo alone
        assert_eq!(notifications.get(), 3);
        assert_eq!(store.get_state().velocity.animation, Animation::Left);
        assert_eq!(orchestrator.ticks(), 2);
    }

    #[test]
    fn test_first_idle_tick_still_dispatches() {
        let store = Store::new(Controller::default());
        let mut orchestrator = LoopOrchestrator::new();
        let mut input = RawInput::default();

        let report = orchestrator.tick(&store, &mut input, &mut scene());
        assert!(report.move_dispatched);
        assert_eq!(orchestrator.last_move_to(), Some(Direction::NONE));
    }

    #[test]
    fn test_direction_change_dispatches() {
        let store = Store::new(Controller::default());
        let mut orchestrator = LoopOrchestrator::new();
        let mut scene = scene();

        orchestrator.tick(&store, &mut RawInput::keyboard(true, false, false), &mut scene);
        let report = orchestrator.tick(&store, &mut RawInput::keyboard(false, true, false), &mut scene);
        assert!(report.move_dispatched);
        assert_eq!(store.get_state().velocity.animation, Animation::Right);
    }

    #[test]
    fn test_game_over_halts() {
        let store = Store::with_state(
            Controller::default(),
            GameState {
                game_over: true,
                ..GameState::default()
            },
        );
        let notifications = counting(&store);
        let mut orchestrator = LoopOrchestrator::new();
        let mut scene = scene();

        let report = orchestrator.tick(&store, &mut RawInput::keyboard(true, false, false), &mut scene);
        assert!(report.halted);
        assert_eq!(notifications.get(), 0);
        assert_eq!(scene.collider, None);
        assert_eq!(orchestrator.ticks(), 0);
    }

    #[test]
    fn test_collider_follows_immunity() {
        let store = Store::from_config(GameConfig {
            initial_immunity: 1,
            ..GameConfig::default()
        });
        let mut orchestrator = LoopOrchestrator::new();
        let mut scene = scene();
        let mut input = RawInput::default();

        let mut seen = Vec::new();
        for _ in 0..3 {
            orchestrator.tick(&store, &mut input, &mut scene);
            seen.push(scene.collider);
        }
        // Immunity 1 -> 0 -> -1; the collider reads the value before decay
        assert_eq!(seen, vec![Some(false), Some(false), Some(true)]);
    }

    #[test]
    fn test_pointer_frames_consumed() {
        let store = Store::new(Controller::default());
        let mut orchestrator = LoopOrchestrator::new();
        let mut scene = scene();
        let mut input = RawInput::default();
        input.press_pointer(100.0, 300.0, 3);

        orchestrator.tick(&store, &mut input, &mut scene);
        assert_eq!(input.pointer.map(|p| p.frames_remaining), Some(2));
        assert_eq!(orchestrator.last_move_to(), Some(Direction::new(false, false, true)));
        assert_eq!(store.get_state().velocity.y, -GameConfig::default().jump_impulse);
    }

    #[test]
    fn test_telemetry_truncates() {
        assert_eq!(telemetry(PlayerPosition::new(100.9, 450.2)), Info::at(100, 450));
        assert_eq!(telemetry(PlayerPosition::new(-3.7, 0.0)), Info::at(-3, 0));

        let store = Store::new(Controller::default());
        let mut scene = TestScene {
            position: PlayerPosition::new(12.5, 34.9),
            ..TestScene::default()
        };
        LoopOrchestrator::new().tick(&store, &mut RawInput::default(), &mut scene);
        assert_eq!(store.get_state().info, Some(Info::at(12, 34)));
    }

    #[test]
    fn test_collision_handlers() {
        let store = Store::new(Controller::default());
        on_star_overlap(&store);
        on_star_overlap(&store);
        assert_eq!(store.get_state().score, 2);

        on_bomb_contact(&store);
        assert!(store.get_state().game_over);
    }
}
