//! Reactive Store Implementation
//!
//! A Store is the deep reactive wrapper around a map or list of [`Value`]s.
//! Where a signal has a single value slot, a store has one trackable slot
//! per key (or index) plus a structural slot that iteration-shaped reads
//! subscribe to.
//!
//! # Deep Reactivity
//!
//! Nested plain containers are not wrapped when the store is created.
//! Instead, the first read of a nested map/list wraps it into a child store
//! and writes the handle back into the slot, so:
//!
//! - wrapping cost is paid only for the parts of the state tree that are
//!   actually read, and
//! - repeated reads of the same nested container return the *identical*
//!   store handle (stable identity, which list diffing and equality checks
//!   elsewhere rely on).
//!
//! # Mutation Notifications
//!
//! - Replacing a key's value notifies that key's slot, and only if the
//!   value actually changed.
//! - Inserting a previously absent key or removing a key notifies the key's
//!   slot *and* the structural slot, so subscribers of `len()`/`keys()`/
//!   snapshots re-run.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::graph::DepKey;

use super::runtime::Runtime;
use super::subscriber::TargetId;
use super::value::Value;

/// The underlying storage of a store.
enum Backing {
    Map(IndexMap<String, Value>),
    List(Vec<Value>),
}

struct StoreInner {
    /// Identity of this store in the dependency graph.
    target: TargetId,

    /// The runtime this store (and every child it wraps) belongs to.
    runtime: Arc<Runtime>,

    data: RwLock<Backing>,
}

/// A deep reactive map or list. Cloning shares the same storage and
/// identity; equality is pointer identity.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    fn from_backing(backing: Backing, runtime: Arc<Runtime>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                target: TargetId::new(),
                runtime,
                data: RwLock::new(backing),
            }),
        }
    }

    /// Create a map-backed store from plain entries, bound to the ambient
    /// runtime.
    pub fn from_map(entries: IndexMap<String, Value>) -> Self {
        Self::from_backing(Backing::Map(entries), Runtime::current())
    }

    /// Create a list-backed store from plain items, bound to the ambient
    /// runtime.
    pub fn from_list(items: Vec<Value>) -> Self {
        Self::from_backing(Backing::List(items), Runtime::current())
    }

    /// Create an empty map-backed store.
    pub fn new_map() -> Self {
        Self::from_map(IndexMap::new())
    }

    /// Create an empty list-backed store.
    pub fn new_list() -> Self {
        Self::from_list(Vec::new())
    }

    /// This store's identity in the dependency graph.
    pub fn target_id(&self) -> TargetId {
        self.inner.target
    }

    pub fn is_map(&self) -> bool {
        matches!(
            *self.inner.data.read().expect("store lock poisoned"),
            Backing::Map(_)
        )
    }

    pub fn is_list(&self) -> bool {
        !self.is_map()
    }

    /// Wrap a plain container into a child store on this store's runtime.
    fn wrap_child(&self, value: Value) -> Store {
        let backing = match value {
            Value::Map(entries) => Backing::Map(entries),
            Value::List(items) => Backing::List(items),
            // Callers only pass containers.
            other => Backing::List(vec![other]),
        };
        Store::from_backing(backing, Arc::clone(&self.inner.runtime))
    }

    /// Read a map entry, tracking the key's slot.
    ///
    /// A nested plain container is wrapped into a child store on first read
    /// and the handle is memoized in place, so repeated reads return the
    /// identical store. Missing keys read as [`Value::Null`].
    pub fn get(&self, key: &str) -> Value {
        self.inner
            .runtime
            .track(self.inner.target, DepKey::prop(key));

        self.read_slot(|backing| match backing {
            Backing::Map(entries) => entries.get(key).cloned(),
            Backing::List(_) => None,
        })
        .map(|value| self.resolve(value, SlotRef::Key(key)))
        .unwrap_or(Value::Null)
    }

    /// Read a map entry without tracking (and without lazy wrapping).
    pub fn get_untracked(&self, key: &str) -> Value {
        self.read_slot(|backing| match backing {
            Backing::Map(entries) => entries.get(key).cloned(),
            Backing::List(_) => None,
        })
        .unwrap_or(Value::Null)
    }

    /// Read a list element, tracking the index slot.
    pub fn index(&self, i: usize) -> Value {
        self.inner
            .runtime
            .track(self.inner.target, DepKey::Index(i));

        self.read_slot(|backing| match backing {
            Backing::List(items) => items.get(i).cloned(),
            Backing::Map(_) => None,
        })
        .map(|value| self.resolve(value, SlotRef::Index(i)))
        .unwrap_or(Value::Null)
    }

    fn read_slot<R>(&self, f: impl FnOnce(&Backing) -> Option<R>) -> Option<R> {
        let guard = self.inner.data.read().expect("store lock poisoned");
        f(&guard)
    }

    /// Upgrade a just-read slot value: plain containers become memoized
    /// child stores, everything else passes through.
    fn resolve(&self, value: Value, slot: SlotRef<'_>) -> Value {
        if !matches!(value, Value::Map(_) | Value::List(_)) {
            return value;
        }

        let mut guard = self.inner.data.write().expect("store lock poisoned");

        // Re-read under the write lock: another reader may have wrapped the
        // slot between our read and now. The memoized handle wins.
        let current = match (&*guard, slot) {
            (Backing::Map(entries), SlotRef::Key(key)) => entries.get(key).cloned(),
            (Backing::List(items), SlotRef::Index(i)) => items.get(i).cloned(),
            _ => None,
        };

        match current {
            Some(Value::Reactive(store)) => Value::Reactive(store),
            Some(plain @ (Value::Map(_) | Value::List(_))) => {
                let child = self.wrap_child(plain);
                let wrapped = Value::Reactive(child);
                match (&mut *guard, slot) {
                    (Backing::Map(entries), SlotRef::Key(key)) => {
                        entries.insert(key.to_string(), wrapped.clone());
                    }
                    (Backing::List(items), SlotRef::Index(i)) => {
                        if let Some(item) = items.get_mut(i) {
                            *item = wrapped.clone();
                        }
                    }
                    _ => {}
                }
                wrapped
            }
            Some(other) => other,
            None => Value::Null,
        }
    }

    /// Write a map entry. Notifies the key's slot only if the value
    /// changed; inserting a new key also notifies the structural slot.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();

        let outcome = {
            let mut guard = self.inner.data.write().expect("store lock poisoned");
            match &mut *guard {
                Backing::Map(entries) => {
                    let old = entries.get(key);
                    let structural = old.is_none();
                    if old == Some(&value) {
                        None
                    } else {
                        entries.insert(key.to_string(), value);
                        Some(structural)
                    }
                }
                Backing::List(_) => {
                    tracing::warn!(key, "set() by key on a list-backed store; ignoring");
                    None
                }
            }
        };

        // Lock released before the graph walk.
        match outcome {
            Some(true) => self
                .inner
                .runtime
                .trigger(self.inner.target, &[DepKey::prop(key), DepKey::Iterate]),
            Some(false) => self
                .inner
                .runtime
                .trigger(self.inner.target, &[DepKey::prop(key)]),
            None => {}
        }
    }

    /// Remove a map entry. Notifies the key's slot and the structural slot
    /// when the key existed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = {
            let mut guard = self.inner.data.write().expect("store lock poisoned");
            match &mut *guard {
                Backing::Map(entries) => entries.shift_remove(key),
                Backing::List(_) => {
                    tracing::warn!(key, "remove() by key on a list-backed store; ignoring");
                    None
                }
            }
        };

        if removed.is_some() {
            self.inner
                .runtime
                .trigger(self.inner.target, &[DepKey::prop(key), DepKey::Iterate]);
        }
        removed
    }

    /// Write a list element in place. Out-of-range writes are ignored with
    /// a warning.
    pub fn set_index(&self, i: usize, value: impl Into<Value>) {
        let value = value.into();

        let changed = {
            let mut guard = self.inner.data.write().expect("store lock poisoned");
            match &mut *guard {
                Backing::List(items) => match items.get_mut(i) {
                    Some(slot) if *slot != value => {
                        *slot = value;
                        true
                    }
                    Some(_) => false,
                    None => {
                        tracing::warn!(index = i, len = items.len(), "set_index() out of range");
                        false
                    }
                },
                Backing::Map(_) => {
                    tracing::warn!(index = i, "set_index() on a map-backed store; ignoring");
                    false
                }
            }
        };

        if changed {
            self.inner
                .runtime
                .trigger(self.inner.target, &[DepKey::Index(i)]);
        }
    }

    /// Append to a list store. Notifies the new index and the structural
    /// slot.
    pub fn push(&self, value: impl Into<Value>) {
        let value = value.into();

        let new_index = {
            let mut guard = self.inner.data.write().expect("store lock poisoned");
            match &mut *guard {
                Backing::List(items) => {
                    items.push(value);
                    Some(items.len() - 1)
                }
                Backing::Map(_) => {
                    tracing::warn!("push() on a map-backed store; ignoring");
                    None
                }
            }
        };

        if let Some(i) = new_index {
            self.inner
                .runtime
                .trigger(self.inner.target, &[DepKey::Index(i), DepKey::Iterate]);
        }
    }

    /// Remove and return the last list element.
    pub fn pop(&self) -> Option<Value> {
        let popped = {
            let mut guard = self.inner.data.write().expect("store lock poisoned");
            match &mut *guard {
                Backing::List(items) => items.pop().map(|v| (items.len(), v)),
                Backing::Map(_) => {
                    tracing::warn!("pop() on a map-backed store; ignoring");
                    None
                }
            }
        };

        popped.map(|(i, value)| {
            self.inner
                .runtime
                .trigger(self.inner.target, &[DepKey::Index(i), DepKey::Iterate]);
            value
        })
    }

    /// Number of entries. Tracks the structural slot.
    pub fn len(&self) -> usize {
        self.inner.runtime.track(self.inner.target, DepKey::Iterate);

        let guard = self.inner.data.read().expect("store lock poisoned");
        match &*guard {
            Backing::Map(entries) => entries.len(),
            Backing::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map keys in insertion order. Tracks the structural slot.
    pub fn keys(&self) -> Vec<String> {
        self.inner.runtime.track(self.inner.target, DepKey::Iterate);

        let guard = self.inner.data.read().expect("store lock poisoned");
        match &*guard {
            Backing::Map(entries) => entries.keys().cloned().collect(),
            Backing::List(_) => Vec::new(),
        }
    }

    /// Map keys without tracking. For framework bookkeeping that must not
    /// subscribe the surrounding computation (e.g. a parent forwarding
    /// props while its own render effect is current).
    pub(crate) fn keys_untracked(&self) -> Vec<String> {
        let guard = self.inner.data.read().expect("store lock poisoned");
        match &*guard {
            Backing::Map(entries) => entries.keys().cloned().collect(),
            Backing::List(_) => Vec::new(),
        }
    }

    /// Whether a map key is present. Tracks the key's slot (insertion and
    /// removal both notify it).
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .runtime
            .track(self.inner.target, DepKey::prop(key));

        let guard = self.inner.data.read().expect("store lock poisoned");
        match &*guard {
            Backing::Map(entries) => entries.contains_key(key),
            Backing::List(_) => false,
        }
    }

    /// Deep plain copy of the store's current contents. Tracks the
    /// structural slot of this store and of every nested store it copies.
    pub fn snapshot(&self) -> Value {
        self.inner.runtime.track(self.inner.target, DepKey::Iterate);

        // Clone the raw entries first so no lock is held while nested
        // stores take theirs.
        enum Raw {
            Map(Vec<(String, Value)>),
            List(Vec<Value>),
        }

        let raw = {
            let guard = self.inner.data.read().expect("store lock poisoned");
            match &*guard {
                Backing::Map(entries) => Raw::Map(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
                Backing::List(items) => Raw::List(items.clone()),
            }
        };

        match raw {
            Raw::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.to_plain()))
                    .collect(),
            ),
            Raw::List(items) => Value::List(items.into_iter().map(|v| v.to_plain()).collect()),
        }
    }
}

/// Which slot of the backing a read came from.
#[derive(Clone, Copy)]
enum SlotRef<'a> {
    Key(&'a str),
    Index(usize),
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_map() { "map" } else { "list" };
        f.debug_struct("Store")
            .field("target", &self.inner.target.raw())
            .field("kind", &kind)
            .finish()
    }
}

/// Wrap a plain container value into a reactive store.
///
/// Maps and lists become live stores; a value that is already reactive
/// passes through unchanged. Wrapping a primitive is tolerated: it logs a
/// warning and returns the input untouched, because callers are allowed to
/// apply this indiscriminately.
pub fn reactive(value: Value) -> Value {
    match value {
        Value::Map(entries) => Value::Reactive(Store::from_map(entries)),
        Value::List(items) => Value::Reactive(Store::from_list(items)),
        Value::Reactive(_) => value,
        other => {
            tracing::warn!(
                kind = other.type_name(),
                "reactive() called on a non-container value; returning it unchanged"
            );
            other
        }
    }
}
