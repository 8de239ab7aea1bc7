//! Path watcher.
//!
//! Turns "the store changed" into "this particular value changed". Each
//! [`WatchRegistration`] names a path into the state and a callback; after
//! every dispatch the watcher compares the value at each path between the
//! previous and current snapshots and calls back for the ones that differ.
//!
//! Two flavors of registration exist:
//!
//! - [`WatchRegistration::select`] - a typed accessor, compared with
//!   `PartialEq`. The path is a label, still validated against the state
//!   shape so logs and callbacks name a real field.
//! - [`WatchRegistration::json_path`] - a dotted path walked over the JSON
//!   form of the state, compared structurally.
//!
//! All registrations in one notification compare against the same previous
//! snapshot, in registration order, and every callback returns before the
//! next check starts.

use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use log::trace;
use serde_json::Value;

use super::game::{GameState, Info};
use super::store::{Store, Subscription};

static NULL: Value = Value::Null;

/// Dotted path into the state, e.g. `velocity.animation`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchPath {
    segments: Vec<String>,
}

impl WatchPath {
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve against a JSON value. Missing fields resolve to `Null`.
    pub fn resolve<'a>(&self, root: &'a Value) -> &'a Value {
        let mut node = root;
        for segment in &self.segments {
            match node.get(segment.as_str()) {
                Some(child) => node = child,
                None => return &NULL,
            }
        }
        node
    }

    /// Check that every segment names a field of `shape`.
    fn validate(&self, shape: &Value) -> Result<(), MalformedPathError> {
        let invalid = |segment: &str, reason: &'static str| MalformedPathError {
            path: self.to_string(),
            segment: segment.to_string(),
            reason,
        };

        let mut node = shape;
        for segment in &self.segments {
            if segment.is_empty() {
                return Err(invalid(segment, "empty path segment"));
            }
            match node {
                Value::Object(fields) => match fields.get(segment) {
                    Some(child) => node = child,
                    None => return Err(invalid(segment, "no such field")),
                },
                _ => return Err(invalid(segment, "parent is not a structure")),
            }
        }
        Ok(())
    }
}

impl fmt::Display for WatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Error when a registration path does not fit the state shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedPathError {
    pub path: String,
    pub segment: String,
    pub reason: &'static str,
}

impl fmt::Display for MalformedPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Malformed watch path '{}' at '{}': {}",
            self.path, self.segment, self.reason
        )
    }
}

impl std::error::Error for MalformedPathError {}

/// JSON shape every path is validated against, with optional branches filled.
fn state_shape() -> Value {
    GameState {
        info: Some(Info::default()),
        ..GameState::default()
    }
    .to_json()
}

/// One state snapshot, with its JSON form built on first use.
struct Snapshot {
    state: Rc<GameState>,
    json: OnceCell<Value>,
}

impl Snapshot {
    fn new(state: Rc<GameState>) -> Self {
        Self {
            state,
            json: OnceCell::new(),
        }
    }

    fn json(&self) -> &Value {
        self.json.get_or_init(|| self.state.to_json())
    }
}

trait Probe {
    /// Compare the watched value and call back when it changed.
    fn check(&mut self, previous: &Snapshot, current: &Snapshot, path: &WatchPath) -> bool;
}

struct Selected<T, A, F> {
    accessor: A,
    on_change: F,
    value: PhantomData<fn(&GameState) -> T>,
}

impl<T, A, F> Probe for Selected<T, A, F>
where
    T: PartialEq,
    A: Fn(&GameState) -> T,
    F: FnMut(&T, &T, &WatchPath),
{
    fn check(&mut self, previous: &Snapshot, current: &Snapshot, path: &WatchPath) -> bool {
        let old = (self.accessor)(&*previous.state);
        let new = (self.accessor)(&*current.state);
        if new == old {
            return false;
        }
        (self.on_change)(&new, &old, path);
        true
    }
}

struct JsonPath<F> {
    on_change: F,
}

impl<F> Probe for JsonPath<F>
where
    F: FnMut(&Value, &Value, &WatchPath),
{
    fn check(&mut self, previous: &Snapshot, current: &Snapshot, path: &WatchPath) -> bool {
        let old = path.resolve(previous.json());
        let new = path.resolve(current.json());
        if new == old {
            return false;
        }
        (self.on_change)(new, old, path);
        true
    }
}

/// A path and the callback to run when the value there changes.
///
/// Callbacks receive `(new, old, path)`.
pub struct WatchRegistration {
    path: WatchPath,
    probe: Box<dyn Probe>,
}

impl fmt::Debug for WatchRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRegistration")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl WatchRegistration {
    /// Watch the value produced by `accessor`.
    pub fn select<T, A, F>(path: &str, accessor: A, on_change: F) -> Self
    where
        T: PartialEq + 'static,
        A: Fn(&GameState) -> T + 'static,
        F: FnMut(&T, &T, &WatchPath) + 'static,
    {
        Self {
            path: WatchPath::parse(path),
            probe: Box::new(Selected {
                accessor,
                on_change,
                value: PhantomData,
            }),
        }
    }

    /// Watch the JSON value found at a dotted path.
    pub fn json_path<F>(path: &str, on_change: F) -> Self
    where
        F: FnMut(&Value, &Value, &WatchPath) + 'static,
    {
        Self {
            path: WatchPath::parse(path),
            probe: Box::new(JsonPath { on_change }),
        }
    }

    pub fn path(&self) -> &WatchPath {
        &self.path
    }
}

/// Live watcher, returned by [`watch`].
#[derive(Debug)]
pub struct WatchHandle {
    subscription: Subscription,
    paths: Vec<WatchPath>,
}

impl WatchHandle {
    pub fn paths(&self) -> &[WatchPath] {
        &self.paths
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop watching. Idempotent.
    pub fn unwatch(&self) {
        self.subscription.unsubscribe();
    }
}

/// Subscribe `registrations` to `store`.
///
/// Fails before subscribing if any path does not exist in the state shape.
pub fn watch(
    store: &Store,
    registrations: Vec<WatchRegistration>,
) -> Result<WatchHandle, MalformedPathError> {
    let shape = state_shape();
    for registration in &registrations {
        registration.path().validate(&shape)?;
    }

    let paths = registrations.iter().map(|r| r.path().clone()).collect();
    let mut registrations = registrations;
    let mut previous = Snapshot::new(store.get_state());

    let subscription = store.subscribe(move |store| {
        let current = Snapshot::new(store.get_state());

        for registration in registrations.iter_mut() {
            if registration
                .probe
                .check(&previous, &current, &registration.path)
            {
                trace!("watch fired for {}", registration.path);
            }
        }

        previous = current;
    });

    Ok(WatchHandle {
        subscription,
        paths,
    })
}
