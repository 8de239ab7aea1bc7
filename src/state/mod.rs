//! State synchronization for Starfall.
//!
//! - `game` - the state value and the intents that change it
//! - `config` - tuning, including the immunity decay rule
//! - `controller` - the pure transition function
//! - `store` - single owner of the state, dispatch and subscriptions
//! - `watch` - per-path change notification on top of the store
//! - `input` - pointer/keyboard resolution for one frame
//! - `orchestrator` - the per-frame driver and collision callbacks
//! - `presentation` - the render watches
//!
//! # Architecture
//!
//! ```text
//!  physics events ──▶ on_star_overlap / on_bomb_contact ──┐
//!                                                          │
//!  frame tick ──▶ LoopOrchestrator::tick ──▶ resolve()    │
//!                        │                                 │
//!                        ▼ dispatch(MoveTo / SetInfo)      ▼ dispatch(Collision)
//!                 ┌──────────────────────────────────────────────┐
//!                 │ Store                                        │
//!                 │   state' = Controller::apply(state, intent)  │
//!                 │   notify listeners                           │
//!                 └──────────────────────┬───────────────────────┘
//!                                        ▼
//!                                 watch(): diff paths
//!                                        │
//!                                        ▼
//!                                 Presenter (engine objects)
//! ```
//!
//! Callbacks never reach back into the controller except through a later
//! dispatch.

pub mod config;
pub mod controller;
pub mod game;
pub mod input;
pub mod orchestrator;
pub mod presentation;
pub mod store;
pub mod watch;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::info;

// Re-export commonly used types
pub use config::{ConfigError, GameConfig, ImmunityDecay};
pub use controller::Controller;
pub use game::{
    Animation, CollisionKind, Direction, GamePhase, GameState, Info, Intent, InvalidIntentError,
    PlayerInfo, Velocity,
};
pub use input::{resolve, KeyboardState, PlayerPosition, PointerState, RawInput};
pub use orchestrator::{on_bomb_contact, on_star_overlap, LoopOrchestrator, Scene, TickReport};
pub use presentation::{presentation_watches, score_label, sync_presenter, Presenter};
pub use store::{Store, Subscription};
pub use watch::{watch, MalformedPathError, WatchHandle, WatchPath, WatchRegistration};

/// One play session: a store, its frame driver and optional render watches.
///
/// This is a convenience wrapper; the pieces can be used directly.
pub struct GameSession {
    store: Store,
    orchestrator: LoopOrchestrator,
    presenter: Option<Rc<RefCell<dyn Presenter>>>,
    watcher: Option<WatchHandle>,
}

impl GameSession {
    /// Start a session without render bindings.
    pub fn new(config: GameConfig) -> Self {
        Self {
            store: Store::from_config(config),
            orchestrator: LoopOrchestrator::new(),
            presenter: None,
            watcher: None,
        }
    }

    /// Start a session whose state changes drive `presenter`.
    pub fn with_presenter(
        config: GameConfig,
        presenter: Rc<RefCell<dyn Presenter>>,
    ) -> Result<Self, MalformedPathError> {
        let mut session = Self::new(config);
        session.watcher = Some(watch(&session.store, presentation_watches(&presenter))?);
        session.presenter = Some(presenter);
        Ok(session)
    }

    pub fn config(&self) -> &GameConfig {
        self.store.controller().config()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> Rc<GameState> {
        self.store.get_state()
    }

    pub fn is_over(&self) -> bool {
        self.store.get_state().game_over
    }

    /// Run one frame.
    pub fn tick<S: Scene + ?Sized>(&mut self, input: &mut RawInput, scene: &mut S) -> TickReport {
        self.orchestrator.tick(&self.store, input, scene)
    }

    pub fn on_star_overlap(&self) {
        on_star_overlap(&self.store);
    }

    pub fn on_bomb_contact(&self) {
        on_bomb_contact(&self.store);
    }

    /// Throw the current session away and start over from the configured
    /// start state. Render watches move to the new store and the presenter
    /// is brought back in line with the start state.
    pub fn restart(&mut self) -> Result<(), MalformedPathError> {
        if let Some(watcher) = self.watcher.take() {
            watcher.unwatch();
        }

        let previous = self.store.get_state();
        info!(
            "restarting session ({}, score was {})",
            previous.phase().as_str(),
            previous.score
        );
        self.store = Store::from_config(self.config().clone());
        self.orchestrator = LoopOrchestrator::new();

        if let Some(presenter) = &self.presenter {
            self.watcher = Some(watch(&self.store, presentation_watches(presenter))?);
            sync_presenter(presenter, &self.store.get_state());
        }
        Ok(())
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("store", &self.store)
            .field("orchestrator", &self.orchestrator)
            .field("has_presenter", &self.presenter.is_some())
            .field("watcher", &self.watcher)
            .finish()
    }
}
