//! Computed Value Implementation
//!
//! A Computed is a cached derived value that re-evaluates only when one of
//! its dependencies has actually changed.
//!
//! # How Computed Values Work
//!
//! 1. On first read, the getter runs inside a tracking context and the
//!    result is cached.
//!
//! 2. Reading again with no intervening dependency change returns the
//!    cache; the getter is not re-invoked.
//!
//! 3. When a dependency changes, the computed does not recompute eagerly:
//!    it marks itself dirty and triggers its own value slot so downstream
//!    subscribers invalidate in turn. The recomputation happens on the
//!    next read.
//!
//! # Why This Matters
//!
//! The lazy pull keeps fan-out cheap: a signal feeding ten computed values
//! costs ten dirty flags, and only the computed values somebody actually
//! reads afterwards pay for a recomputation.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::graph::DepKey;

use super::context::ReactiveContext;
use super::runtime::{Reactive, Runtime};
use super::subscriber::{SubscriberId, TargetId};

struct ComputedInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Identity as a subscriber of the getter's dependencies.
    id: SubscriberId,

    /// Identity as a source for downstream computations.
    target: TargetId,

    runtime: Arc<Runtime>,

    /// The getter.
    compute: Box<dyn Fn() -> T + Send + Sync>,

    /// The cached value (None if never computed).
    value: RwLock<Option<T>>,

    /// Whether the cache is stale. Starts true so the first read computes.
    dirty: AtomicBool,

    /// Whether the computed has been stopped.
    stopped: AtomicBool,

    /// Number of times the getter has run.
    compute_count: AtomicUsize,
}

impl<T> Reactive for ComputedInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn schedule(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        // Invalidate, don't recompute. The cascade runs once per dirtying:
        // further upstream changes while already dirty are absorbed.
        if !self.dirty.swap(true, Ordering::SeqCst) {
            self.runtime.trigger(self.target, &[DepKey::Value]);
        }
    }
}

/// A cached derived value that recomputes lazily when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let a = Signal::new(1);
/// let b = Signal::new(2);
///
/// let sum = {
///     let (a, b) = (a.clone(), b.clone());
///     Computed::new(move || a.get() + b.get())
/// };
///
/// assert_eq!(sum.get(), 3);
/// a.set(10);
/// assert_eq!(sum.get(), 12);
/// ```
pub struct Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<ComputedInner<T>>,
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new computed value with the given getter, bound to the
    /// ambient runtime.
    ///
    /// The getter does not run until the first read.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let runtime = Runtime::current();
        let inner = Arc::new(ComputedInner {
            id: SubscriberId::new(),
            target: TargetId::new(),
            runtime: runtime.clone(),
            compute: Box::new(compute),
            value: RwLock::new(None),
            dirty: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            compute_count: AtomicUsize::new(0),
        });

        let reactive: Arc<dyn Reactive> = inner.clone();
        let weak: Weak<dyn Reactive> = Arc::downgrade(&reactive);
        runtime.register(inner.id, weak);

        Self { inner }
    }

    /// Get the current value, recomputing if a dependency changed since the
    /// last read.
    ///
    /// Reading inside a tracking context subscribes that computation to
    /// this computed's value slot.
    pub fn get(&self) -> T {
        self.inner
            .runtime
            .track(self.inner.target, DepKey::Value);

        if self.inner.dirty.load(Ordering::SeqCst) {
            self.recompute()
        } else {
            self.inner
                .value
                .read()
                .expect("value lock poisoned")
                .clone()
                .expect("clean computed should have a value")
        }
    }

    /// Get the cached value without tracking or recomputing.
    ///
    /// Returns `None` if the getter has never run.
    pub fn peek(&self) -> Option<T> {
        self.inner.value.read().expect("value lock poisoned").clone()
    }

    fn recompute(&self) -> T {
        // Re-track from scratch: stale edges from the previous run go away.
        self.inner.runtime.clear_subscriber(self.inner.id);

        let new_value = {
            let _ctx = ReactiveContext::enter(self.inner.id);
            (self.inner.compute)()
        };
        self.inner.compute_count.fetch_add(1, Ordering::SeqCst);

        *self.inner.value.write().expect("value lock poisoned") = Some(new_value.clone());
        self.inner.dirty.store(false, Ordering::SeqCst);

        new_value
    }

    /// Stop the computed: release its subscriptions and unregister it.
    ///
    /// The cache stays readable but no longer invalidates. Idempotent.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        self.inner.runtime.clear_subscriber(self.inner.id);
        self.inner.runtime.unregister(self.inner.id);
    }

    /// Whether the cache is currently stale.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    /// Number of times the getter has run.
    pub fn compute_count(&self) -> usize {
        self.inner.compute_count.load(Ordering::SeqCst)
    }

    /// This computed's identity as a reactive source.
    pub fn target_id(&self) -> TargetId {
        self.inner.target
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("target", &self.inner.target.raw())
            .field("dirty", &self.is_dirty())
            .field("value", &self.peek())
            .finish()
    }
}

/// Create a computed value bound to the ambient runtime.
pub fn computed<T, F>(compute: F) -> Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Computed::new(compute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::signal::Signal;

    #[test]
    fn computed_is_lazy_and_caches() {
        let a = Signal::new(1);

        let a_clone = a.clone();
        let double = Computed::new(move || a_clone.get() * 2);

        // Nothing computed yet.
        assert_eq!(double.compute_count(), 0);

        // First read computes, repeated reads hit the cache.
        assert_eq!(double.get(), 2);
        assert_eq!(double.get(), 2);
        assert_eq!(double.get(), 2);
        assert_eq!(double.compute_count(), 1);
    }

    #[test]
    fn computed_recomputes_after_dependency_change() {
        let a = Signal::new(1);
        let b = Signal::new(2);

        let (a_c, b_c) = (a.clone(), b.clone());
        let sum = Computed::new(move || a_c.get() + b_c.get());

        assert_eq!(sum.get(), 3);

        a.set(10);
        assert!(sum.is_dirty());
        assert_eq!(sum.get(), 12);

        // Exactly two getter runs: the initial read and the one after the
        // invalidation.
        assert_eq!(sum.compute_count(), 2);
    }

    #[test]
    fn equal_write_does_not_invalidate() {
        let a = Signal::new(5);

        let a_clone = a.clone();
        let double = Computed::new(move || a_clone.get() * 2);

        assert_eq!(double.get(), 10);

        a.set(5); // unchanged value, no trigger
        assert!(!double.is_dirty());
        assert_eq!(double.get(), 10);
        assert_eq!(double.compute_count(), 1);
    }

    #[test]
    fn computed_chains_invalidate_downstream() {
        let a = Signal::new(1);

        let a_clone = a.clone();
        let double = Computed::new(move || a_clone.get() * 2);

        let double_clone = double.clone();
        let quadruple = Computed::new(move || double_clone.get() * 2);

        assert_eq!(quadruple.get(), 4);

        // Invalidating the middle of the chain reaches the end lazily.
        a.set(3);
        assert!(quadruple.is_dirty());
        assert_eq!(quadruple.get(), 12);
    }

    #[test]
    fn effect_rereads_fresh_computed_value() {
        use std::sync::atomic::AtomicI32;
        use std::sync::Arc;

        let a = Signal::new(1);

        let a_clone = a.clone();
        let double = Computed::new(move || a_clone.get() * 2);

        let observed = Arc::new(AtomicI32::new(0));
        let observed_clone = observed.clone();
        let double_clone = double.clone();
        let _effect = crate::reactive::effect::Effect::new(move || {
            observed_clone.store(double_clone.get(), Ordering::SeqCst);
        });

        assert_eq!(observed.load(Ordering::SeqCst), 2);

        a.set(4);
        assert_eq!(observed.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn stopped_computed_keeps_cache_but_stops_invalidating() {
        let a = Signal::new(1);

        let a_clone = a.clone();
        let double = Computed::new(move || a_clone.get() * 2);

        assert_eq!(double.get(), 2);

        double.stop();
        double.stop(); // idempotent

        a.set(10);
        assert!(!double.is_dirty());
        assert_eq!(double.peek(), Some(2));
    }
}
