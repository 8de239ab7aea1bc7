//! The state store.
//!
//! Owns the current [`GameState`] and serializes every change through
//! [`Store::dispatch`]. Listeners are notified synchronously after each
//! applied intent and read the new state with [`Store::get_state`].
//!
//! Dispatching from inside a listener is allowed but never nested: the intent
//! is queued and applied after the current notification round completes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, error, trace};

use super::config::GameConfig;
use super::controller::Controller;
use super::game::{GameState, Intent, InvalidIntentError};

type Listener = Rc<RefCell<dyn FnMut(&Store)>>;

struct StoreInner {
    controller: Controller,
    state: RefCell<Rc<GameState>>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener_id: Cell<u64>,
    /// Intents waiting to be applied, in dispatch order
    pending: RefCell<VecDeque<Intent>>,
    dispatching: Cell<bool>,
}

/// Single owner of the game state.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.listener_count())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}

impl Store {
    /// Create a store starting from the controller's configured start state.
    pub fn new(controller: Controller) -> Self {
        let state = controller.config().start_state();
        Self::with_state(controller, state)
    }

    pub fn from_config(config: GameConfig) -> Self {
        Self::new(Controller::new(config))
    }

    /// Create a store starting from an explicit state.
    pub fn with_state(controller: Controller, state: GameState) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                controller,
                state: RefCell::new(Rc::new(state)),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// Current immutable snapshot.
    pub fn get_state(&self) -> Rc<GameState> {
        Rc::clone(&*self.inner.state.borrow())
    }

    pub fn controller(&self) -> &Controller {
        &self.inner.controller
    }

    /// Apply an intent and notify every listener.
    ///
    /// Listeners run even when the new state equals the old one. Called from
    /// within a listener, the intent is deferred until the running
    /// notification round has finished.
    pub fn dispatch(&self, intent: Intent) {
        self.inner.pending.borrow_mut().push_back(intent);

        if self.inner.dispatching.get() {
            debug!("deferring dispatch issued during notification");
            return;
        }

        let _guard = DispatchGuard::enter(&self.inner);
        while let Some(intent) = self.next_pending() {
            self.apply(&intent);
            self.notify();
        }
    }

    /// Decode and dispatch a serialized intent.
    pub fn dispatch_json(&self, value: &serde_json::Value) -> Result<(), InvalidIntentError> {
        match Intent::from_json(value) {
            Ok(intent) => {
                self.dispatch(intent);
                Ok(())
            }
            Err(e) => {
                error!("rejected dispatch: {}", e);
                Err(e)
            }
        }
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is unsubscribed.
    pub fn subscribe(&self, listener: impl FnMut(&Store) + 'static) -> Subscription {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);

        let listener: Listener = Rc::new(RefCell::new(listener));
        self.inner.listeners.borrow_mut().push((id, listener));

        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn next_pending(&self) -> Option<Intent> {
        self.inner.pending.borrow_mut().pop_front()
    }

    fn apply(&self, intent: &Intent) {
        if intent.is_telemetry() {
            trace!("dispatch {}", intent.kind());
        } else {
            debug!("dispatch {:?}", intent);
        }

        let next = {
            let current = self.inner.state.borrow();
            self.inner.controller.apply(&current, intent)
        };
        *self.inner.state.borrow_mut() = Rc::new(next);
    }

    fn notify(&self) {
        // Snapshot so listeners may subscribe or unsubscribe while running.
        let listeners: Vec<(u64, Listener)> = self.inner.listeners.borrow().clone();

        for (id, listener) in listeners {
            if !self.is_subscribed(id) {
                continue;
            }
            let mut listener = listener.borrow_mut();
            (*listener)(self);
        }
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.inner
            .listeners
            .borrow()
            .iter()
            .any(|(listener_id, _)| *listener_id == id)
    }
}

/// Clears the dispatching flag even if a listener panics.
struct DispatchGuard<'a> {
    inner: &'a StoreInner,
}

impl<'a> DispatchGuard<'a> {
    fn enter(inner: &'a StoreInner) -> Self {
        inner.dispatching.set(true);
        Self { inner }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.inner.dispatching.set(false);
        self.inner.pending.borrow_mut().clear();
    }
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// Remove the listener. Safe to call more than once.
    pub fn unsubscribe(&self) {
        match self.store.upgrade() {
            Some(inner) => {
                inner
                    .listeners
                    .borrow_mut()
                    .retain(|(listener_id, _)| *listener_id != self.id);
            }
            None => debug!("unsubscribe after store was dropped"),
        }
    }

    pub fn is_active(&self) -> bool {
        match self.store.upgrade() {
            Some(inner) => {
                let listeners = inner.listeners.borrow();
                listeners.iter().any(|(listener_id, _)| *listener_id == self.id)
            }
            None => false,
        }
    }
}
