//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive: a single-value cell that
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a tracking context (effect, computed,
//!    render), the runtime registers that computation as a subscriber of
//!    the signal's value slot.
//!
//! 2. When a signal's value changes, all subscribers are notified.
//!
//! 3. Writing a value equal to the current one is a hard no-op: no
//!    notification is sent. This is a correctness requirement, not an
//!    optimization, since retriggering on equal writes makes computed chains
//!    prone to visible infinite loops.
//!
//! # Thread Safety
//!
//! Signals are thread-safe. The value is protected by a RwLock and all
//! graph bookkeeping goes through the owning runtime.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use crate::graph::DepKey;

use super::runtime::Runtime;
use super::subscriber::TargetId;

/// A reactive cell holding a value of type T.
///
/// Cloning a signal produces another handle to the same cell: both clones
/// read and write the same storage and share the same subscribers.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value (tracked when inside an effect)
/// let value = count.get();
///
/// // Update the value (notifies subscribers if it changed)
/// count.set(5);
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Identity of this cell in the dependency graph.
    target: TargetId,

    /// The runtime this cell was created under.
    runtime: Arc<Runtime>,

    /// The current value.
    value: Arc<RwLock<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value, bound to the
    /// ambient runtime.
    pub fn new(value: T) -> Self {
        Self {
            target: TargetId::new(),
            runtime: Runtime::current(),
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Get this cell's target ID.
    pub fn target_id(&self) -> TargetId {
        self.target
    }

    /// Get the current value.
    ///
    /// If called within a tracking context, this also registers the current
    /// computation as a subscriber.
    pub fn get(&self) -> T {
        self.runtime.track(self.target, DepKey::Value);

        self.value.read().expect("value lock poisoned").clone()
    }

    /// Get the current value without tracking a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().expect("value lock poisoned").clone()
    }

    /// Set a new value and notify subscribers if it differs from the
    /// current one.
    pub fn set(&self, value: T) {
        let changed = {
            let mut guard = self.value.write().expect("value lock poisoned");
            if *guard == value {
                false
            } else {
                *guard = value;
                true
            }
        };

        // The lock is released before walking the graph: subscribers may
        // read this signal while they run.
        if changed {
            self.runtime.trigger(self.target, &[DepKey::Value]);
        }
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read().expect("value lock poisoned");
            f(&guard)
        };
        self.set(new_value);
    }

    /// Number of computations currently subscribed to this cell.
    pub fn subscriber_count(&self) -> usize {
        self.runtime.subscriber_count(self.target, &DepKey::Value)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            runtime: Arc::clone(&self.runtime),
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("target", &self.target.raw())
            .field("value", &self.get_untracked())
            .finish()
    }
}

/// Create a new signal bound to the ambient runtime.
pub fn signal<T>(value: T) -> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Signal::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);

        signal2.set(100);
        assert_eq!(signal1.get(), 100);
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);

        assert_ne!(s1.target_id(), s2.target_id());
    }

    #[test]
    fn untracked_read_matches_tracked_read() {
        let signal = Signal::new("a".to_string());
        assert_eq!(signal.get(), signal.get_untracked());
    }
}
