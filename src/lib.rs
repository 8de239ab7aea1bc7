//! Starfall State Library
//!
//! This crate provides the state-synchronization core of Starfall, a small
//! platformer where the player collects falling stars and dodges bombs.
//!
//! # Overview
//!
//! - **Controller** - A pure, deterministic transition function from the
//!   current state and an intent to the next state.
//!
//! - **Store** - Single owner of the immutable game state. Every change goes
//!   through `dispatch`; listeners are notified synchronously.
//!
//! - **Path Watcher** - Compares selected values between consecutive
//!   snapshots and calls back only for the ones that changed.
//!
//! - **Input & Loop** - Resolves pointer/keyboard input each frame and
//!   dispatches movement only when it changes.
//!
//! # Design Principles
//!
//! 1. **Intents are the only way in** - Nothing mutates state except
//!    `Store::dispatch`.
//!
//! 2. **No engine** - Rendering and physics are reached through the `Scene`
//!    and `Presenter` traits.
//!
//! 3. **Serialization-ready** - State, intents and config convert to JSON.
//!
//! # Example
//!
//! ```rust
//! use starfall_state::{
//!     watch, Controller, GameState, Intent, CollisionKind, Store, WatchPath, WatchRegistration,
//! };
//!
//! let store = Store::new(Controller::default());
//!
//! let _watcher = watch(
//!     &store,
//!     vec![WatchRegistration::select(
//!         "score",
//!         |s: &GameState| s.score,
//!         |new: &u32, old: &u32, _: &WatchPath| println!("score {} -> {}", old, new),
//!     )],
//! )
//! .unwrap();
//!
//! store.dispatch(Intent::Collision(CollisionKind::Star));
//! assert_eq!(store.get_state().score, 1);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
