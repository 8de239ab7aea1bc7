//! Render bindings.
//!
//! The three watches that keep the engine in sync with the state: game over
//! halts the world, score updates the HUD text, velocity drives the player
//! sprite.

use std::cell::RefCell;
use std::rc::Rc;

use super::game::{GameState, Velocity};
use super::watch::{WatchPath, WatchRegistration};

/// Engine-side presentation the watches drive.
pub trait Presenter {
    /// Pause physics, tint the player and show the idle frame.
    fn halt(&mut self);

    /// Undo [`halt`](Presenter::halt): resume physics and clear the tint.
    fn resume(&mut self);

    /// Replace the score text.
    fn show_score(&mut self, text: &str);

    /// Apply a velocity to the player body and play its animation.
    fn drive_player(&mut self, velocity: &Velocity);
}

pub fn score_label(score: u32) -> String {
    format!("Score: {}", score)
}

/// Push a whole state to `presenter` at once.
///
/// Watches only report changes, so a presenter bound to a fresh store needs
/// this to drop whatever the previous session left on screen.
pub fn sync_presenter<P>(presenter: &Rc<RefCell<P>>, state: &GameState)
where
    P: Presenter + ?Sized,
{
    let mut presenter = presenter.borrow_mut();
    if state.game_over {
        presenter.halt();
    } else {
        presenter.resume();
    }
    presenter.show_score(&score_label(state.score));
    presenter.drive_player(&state.velocity);
}

/// Build the render watches for `presenter`.
pub fn presentation_watches<P>(presenter: &Rc<RefCell<P>>) -> Vec<WatchRegistration>
where
    P: Presenter + ?Sized + 'static,
{
    let on_game_over = Rc::clone(presenter);
    let on_score = Rc::clone(presenter);
    let on_velocity = Rc::clone(presenter);

    vec![
        WatchRegistration::select(
            "game_over",
            |s: &GameState| s.game_over,
            move |over: &bool, _: &bool, _: &WatchPath| {
                if *over {
                    on_game_over.borrow_mut().halt();
                }
            },
        ),
        WatchRegistration::select(
            "score",
            |s: &GameState| s.score,
            move |score: &u32, _: &u32, _: &WatchPath| {
                on_score.borrow_mut().show_score(&score_label(*score));
            },
        ),
        WatchRegistration::select(
            "velocity",
            |s: &GameState| s.velocity,
            move |velocity: &Velocity, _: &Velocity, _: &WatchPath| {
                on_velocity.borrow_mut().drive_player(velocity);
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::controller::Controller;
    use crate::state::game::{Animation, CollisionKind, Direction, Info, Intent};
    use crate::state::store::Store;
    use crate::state::watch::watch;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct RecordingPresenter {
        calls: Vec<String>,
    }

    impl Presenter for RecordingPresenter {
        fn halt(&mut self) {
            self.calls.push("halt".to_string());
        }

        fn resume(&mut self) {
            self.calls.push("resume".to_string());
        }

        fn show_score(&mut self, text: &str) {
            self.calls.push(text.to_string());
        }

        fn drive_player(&mut self, velocity: &Velocity) {
            self.calls
                .push(format!("drive {} {} {}", velocity.x, velocity.y, velocity.animation));
        }
    }

    #[test]
    fn test_bindings_follow_state() {
        let store = Store::new(Controller::default());
        let presenter = Rc::new(RefCell::new(RecordingPresenter::default()));
        let handle = watch(&store, presentation_watches(&presenter)).unwrap();
        assert_eq!(handle.paths().len(), 3);

        store.dispatch(Intent::move_to(Direction::new(false, true, false), true));
        store.dispatch(Intent::SetInfo(Info::at(1, 1)));
        store.dispatch(Intent::Collision(CollisionKind::Star));
        store.dispatch(Intent::Collision(CollisionKind::Bomb));

        assert_eq!(
            presenter.borrow().calls,
            vec![
                "drive 160 0 right".to_string(),
                "Score: 1".to_string(),
                "halt".to_string(),
            ]
        );
    }

    #[test]
    fn test_immune_bomb_does_not_halt() {
        let store = Store::with_state(
            Controller::default(),
            GameState::with_immunity(10),
        );
        let presenter = Rc::new(RefCell::new(RecordingPresenter::default()));
        watch(&store, presentation_watches(&presenter)).unwrap();

        store.dispatch(Intent::Collision(CollisionKind::Bomb));
        assert!(presenter.borrow().calls.is_empty());
        assert_eq!(store.get_state().velocity.animation, Animation::Turn);
    }

    #[test]
    fn test_sync_pushes_whole_state() {
        let presenter = Rc::new(RefCell::new(RecordingPresenter::default()));
        sync_presenter(&presenter, &GameState::default());
        assert_eq!(
            presenter.borrow().calls,
            vec![
                "resume".to_string(),
                "Score: 0".to_string(),
                "drive 0 0 turn".to_string(),
            ]
        );

        let presenter = Rc::new(RefCell::new(RecordingPresenter::default()));
        let over = GameState {
            score: 3,
            game_over: true,
            ..GameState::default()
        };
        sync_presenter(&presenter, &over);
        assert_eq!(presenter.borrow().calls[..2], ["halt".to_string(), "Score: 3".to_string()]);
    }

    #[test]
    fn test_score_label() {
        assert_eq!(score_label(0), "Score: 0");
        assert_eq!(score_label(42), "Score: 42");
    }
}
