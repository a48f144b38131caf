//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, stores,
//! computed values, and effects. It owns the dependency graph, the registry
//! of live subscribers, and the tick queue that coalesces deferred updates.
//!
//! # How It Works
//!
//! 1. When a reactive source is read inside a tracking context, the runtime
//!    records a `(target, key) -> subscriber` edge in the graph.
//!
//! 2. When a source's value changes, the runtime collects the subscribers of
//!    the changed slots, excludes the computation that is currently running
//!    (an effect's own write must not retrigger itself), and asks each
//!    survivor to schedule: effects with a scheduler override defer through
//!    the tick queue, everything else re-runs synchronously.
//!
//! 3. Computed values are lazy: their schedule marks them dirty and
//!    invalidates downstream, and recomputation waits for the next read.
//!
//! # Isolation
//!
//! The runtime is an explicit object, not a hidden module singleton. Every
//! primitive captures the ambient runtime at creation time, so independent
//! applications (or tests) can run against isolated runtimes by entering a
//! runtime scope. A process-wide default runtime backs the common case where
//! no scope is active. All primitives of one application must be created
//! under the same runtime.

use std::cell::RefCell;
use std::sync::{Arc, OnceLock, RwLock, Weak};

use dashmap::DashMap;

use crate::graph::{DepGraph, DepKey, TickQueue};

use super::context::ReactiveContext;
use super::subscriber::{SubscriberId, TargetId};

/// A computation registered with the runtime that can be notified when one
/// of its dependencies changes.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID for this computation.
    fn subscriber_id(&self) -> SubscriberId;

    /// React to a dependency change. Effects re-run (directly or through
    /// their scheduler); computed values mark themselves dirty and
    /// invalidate their own dependents.
    fn schedule(&self);
}

thread_local! {
    /// Stack of explicitly entered runtimes on this thread.
    static RUNTIME_STACK: RefCell<Vec<Arc<Runtime>>> = RefCell::new(Vec::new());
}

/// The process-wide default runtime.
static DEFAULT_RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();

/// Guard returned by [`Runtime::enter`]; leaving the scope pops the runtime.
pub struct RuntimeGuard {
    _private: (),
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The reactive runtime: dependency graph, subscriber registry, tick queue.
#[derive(Default)]
pub struct Runtime {
    /// Keyed dependency edges between targets and subscribers.
    graph: RwLock<DepGraph>,

    /// Live subscribers by raw ID. Weak references: the owning handle
    /// (effect, computed, component instance) controls the lifetime, and
    /// dead registrations are pruned during trigger.
    registry: DashMap<u64, Weak<dyn Reactive>>,

    /// Deferred update work, coalesced per subscriber.
    queue: TickQueue,
}

impl Runtime {
    /// Create a new isolated runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The process-wide default runtime.
    pub fn global() -> Arc<Self> {
        DEFAULT_RUNTIME.get_or_init(Self::new).clone()
    }

    /// The ambient runtime: the innermost entered scope on this thread, or
    /// the process default.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK
            .with(|stack| stack.borrow().last().cloned())
            .unwrap_or_else(Self::global)
    }

    /// Make this runtime the ambient one until the guard is dropped.
    pub fn enter(self: &Arc<Self>) -> RuntimeGuard {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(self.clone());
        });
        RuntimeGuard { _private: () }
    }

    /// Register a subscriber so triggers can reach it.
    pub fn register(&self, id: SubscriberId, reactive: Weak<dyn Reactive>) {
        self.registry.insert(id.raw(), reactive);
    }

    /// Remove a subscriber from the registry.
    pub fn unregister(&self, id: SubscriberId) {
        self.registry.remove(&id.raw());
    }

    /// Record that the currently-running computation depends on
    /// `(target, key)`.
    ///
    /// A no-op outside any tracking context: untracked reads are the
    /// expected path for non-reactive code and must not fail.
    pub fn track(&self, target: TargetId, key: DepKey) {
        let Some(subscriber) = ReactiveContext::current_subscriber() else {
            return;
        };

        self.graph
            .write()
            .expect("graph lock poisoned")
            .track(target, key, subscriber);
    }

    /// Notify the subscribers of the given slots that their value changed.
    ///
    /// Structural mutations pass the specific slot plus [`DepKey::Iterate`];
    /// the collected run set is deduplicated across the keys. The
    /// currently-running subscriber is excluded so an effect that writes a
    /// slot it also reads does not recurse into itself.
    pub fn trigger(&self, target: TargetId, keys: &[DepKey]) {
        let subscribers = {
            let graph = self.graph.read().expect("graph lock poisoned");
            graph.collect(target, keys)
        };

        if subscribers.is_empty() {
            return;
        }

        let current = ReactiveContext::current_subscriber();
        let mut to_run: Vec<Arc<dyn Reactive>> = Vec::new();
        let mut dead: Vec<SubscriberId> = Vec::new();

        for id in subscribers {
            if current == Some(id) {
                continue;
            }
            match self.registry.get(&id.raw()) {
                Some(weak) => match weak.upgrade() {
                    Some(reactive) => to_run.push(reactive),
                    None => dead.push(id),
                },
                None => dead.push(id),
            }
        }

        // Subscribers whose owning handle is gone: drop their edges so the
        // graph does not accumulate corpses.
        if !dead.is_empty() {
            let mut graph = self.graph.write().expect("graph lock poisoned");
            for id in dead {
                graph.remove_subscriber(id);
                self.registry.remove(&id.raw());
            }
        }

        tracing::trace!(
            target_id = target.raw(),
            subscribers = to_run.len(),
            "trigger"
        );

        // No locks are held while subscribers run; a schedule may read or
        // write further reactive state.
        for reactive in to_run {
            reactive.schedule();
        }
    }

    /// Remove every dependency edge of the given subscriber.
    pub fn clear_subscriber(&self, id: SubscriberId) {
        self.graph
            .write()
            .expect("graph lock poisoned")
            .remove_subscriber(id);
    }

    /// Number of slots the given subscriber currently depends on.
    pub fn subscription_count(&self, id: SubscriberId) -> usize {
        self.graph
            .read()
            .expect("graph lock poisoned")
            .subscription_count(id)
    }

    /// Number of subscribers attached to one slot of a target.
    pub fn subscriber_count(&self, target: TargetId, key: &DepKey) -> usize {
        self.graph
            .read()
            .expect("graph lock poisoned")
            .subscriber_count(target, key)
    }

    /// Enqueue deferred work keyed by subscriber; duplicate keys coalesce.
    pub fn enqueue(&self, key: u64, run: impl FnOnce() + Send + 'static) -> bool {
        self.queue.enqueue(key, run)
    }

    /// Run a one-shot callback after the currently pending jobs.
    pub fn next_tick(&self, run: impl FnOnce() + Send + 'static) {
        self.queue.enqueue(SubscriberId::new().raw(), run);
    }

    /// Drain the tick queue: every pending update runs at most once.
    pub fn flush(&self) {
        self.queue.flush();
    }

    /// Whether deferred work is pending.
    pub fn has_pending_work(&self) -> bool {
        !self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    struct MockReactive {
        id: SubscriberId,
        scheduled: AtomicI32,
    }

    impl MockReactive {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: SubscriberId::new(),
                scheduled: AtomicI32::new(0),
            })
        }
    }

    impl Reactive for MockReactive {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn schedule(&self) {
            self.scheduled.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn register(runtime: &Runtime, mock: &Arc<MockReactive>) {
        let weak: Weak<dyn Reactive> = Arc::downgrade(&(mock.clone() as Arc<dyn Reactive>));
        runtime.register(mock.id, weak);
    }

    #[test]
    fn trigger_reaches_registered_subscribers() {
        let runtime = Runtime::new();
        let mock = MockReactive::new();
        register(&runtime, &mock);

        let target = TargetId::new();
        {
            let _ctx = ReactiveContext::enter(mock.id);
            runtime.track(target, DepKey::Value);
        }

        runtime.trigger(target, &[DepKey::Value]);
        assert_eq!(mock.scheduled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn trigger_excludes_the_running_subscriber() {
        let runtime = Runtime::new();
        let mock = MockReactive::new();
        register(&runtime, &mock);

        let target = TargetId::new();
        {
            let _ctx = ReactiveContext::enter(mock.id);
            runtime.track(target, DepKey::Value);
            // Trigger while the subscriber itself is the current context:
            // the self-edge must be skipped.
            runtime.trigger(target, &[DepKey::Value]);
        }

        assert_eq!(mock.scheduled.load(Ordering::SeqCst), 0);

        // Outside the context the subscriber is reachable again.
        runtime.trigger(target, &[DepKey::Value]);
        assert_eq!(mock.scheduled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dead_registrations_are_pruned_on_trigger() {
        let runtime = Runtime::new();
        let mock = MockReactive::new();
        let id = mock.id;
        register(&runtime, &mock);

        let target = TargetId::new();
        {
            let _ctx = ReactiveContext::enter(id);
            runtime.track(target, DepKey::Value);
        }

        drop(mock);
        runtime.trigger(target, &[DepKey::Value]);

        assert_eq!(runtime.subscription_count(id), 0);
        assert_eq!(runtime.subscriber_count(target, &DepKey::Value), 0);
    }

    #[test]
    fn entered_runtime_becomes_current() {
        let outer = Runtime::current();
        let isolated = Runtime::new();

        {
            let _scope = isolated.enter();
            assert!(Arc::ptr_eq(&Runtime::current(), &isolated));
        }

        assert!(Arc::ptr_eq(&Runtime::current(), &outer));
    }

    #[test]
    fn track_outside_context_is_a_noop() {
        let runtime = Runtime::new();
        let target = TargetId::new();

        runtime.track(target, DepKey::Value);
        assert_eq!(runtime.subscriber_count(target, &DepKey::Value), 0);
    }
}
