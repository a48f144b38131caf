//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. Before each run, the effect clears its old dependency edges; reads
//!    during the run establish the fresh edge set. Dependencies an effect
//!    stops reading therefore stop retriggering it.
//!
//! 3. When a dependency changes, the effect re-runs synchronously, unless
//!    it carries a scheduler override, in which case the override is called
//!    instead. The override is the seam the renderer uses to coalesce many
//!    synchronous mutations into a single deferred render+patch pass.
//!
//! # Stop Semantics
//!
//! `stop()` is idempotent graph-edge removal: every subscription the effect
//! holds is released and the effect never runs again, even if its former
//! sources keep mutating. Stopping is safe from within the effect's own run
//! (the final edge sweep happens after the run returns) and from unrelated
//! contexts such as a parent component unmounting a child.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use super::context::ReactiveContext;
use super::runtime::{Reactive, Runtime};
use super::subscriber::SubscriberId;

/// Shared state behind an [`Effect`] handle.
pub struct EffectInner {
    /// The subscriber ID used for dependency tracking.
    id: SubscriberId,

    /// The runtime this effect is registered with.
    runtime: Arc<Runtime>,

    /// The effect function.
    run: Box<dyn Fn() + Send + Sync>,

    /// Optional scheduler override: called on trigger instead of re-running
    /// the effect function directly.
    scheduler: Option<Box<dyn Fn(&Effect) + Send + Sync>>,

    /// Whether the effect has been stopped.
    stopped: AtomicBool,

    /// Number of times the effect has run.
    run_count: AtomicUsize,

    /// Back-reference so the scheduler override can receive a handle.
    self_weak: Weak<EffectInner>,
}

impl EffectInner {
    fn execute(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        // Drop the previous edge set; the run below re-tracks what it
        // actually reads this time.
        self.runtime.clear_subscriber(self.id);

        {
            let _ctx = ReactiveContext::enter(self.id);
            (self.run)();
        }

        self.run_count.fetch_add(1, Ordering::SeqCst);

        // A self-stop during the run raced with tracking: reads after the
        // stop still inserted edges. Sweep them so nothing dangles.
        if self.stopped.load(Ordering::SeqCst) {
            self.runtime.clear_subscriber(self.id);
        }
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn schedule(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        match &self.scheduler {
            Some(scheduler) => {
                if let Some(inner) = self.self_weak.upgrade() {
                    scheduler(&Effect { inner });
                }
            }
            None => self.execute(),
        }
    }
}

/// A side-effecting computation that re-runs when dependencies change.
///
/// The handle owns the computation: the runtime holds only a weak
/// registration, so dropping the last handle deactivates the effect.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let effect = Effect::new(move || {
///     println!("Count is: {}", count.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::build(run, None)
    }

    /// Create an effect whose triggers call `scheduler` instead of
    /// re-running the function directly.
    ///
    /// The function still runs once immediately to establish dependencies.
    /// The scheduler receives a handle to the effect; calling
    /// [`Effect::run`] on it performs the deferred re-run.
    pub fn with_scheduler<F, S>(run: F, scheduler: S) -> Self
    where
        F: Fn() + Send + Sync + 'static,
        S: Fn(&Effect) + Send + Sync + 'static,
    {
        Self::build(run, Some(Box::new(scheduler)))
    }

    fn build<F>(run: F, scheduler: Option<Box<dyn Fn(&Effect) + Send + Sync>>) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        let runtime = Runtime::current();

        let inner = Arc::new_cyclic(|self_weak| EffectInner {
            id,
            runtime: runtime.clone(),
            run: Box::new(run),
            scheduler,
            stopped: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
            self_weak: self_weak.clone(),
        });

        // Register before the first run so triggers fired while it runs
        // (by nested effects, for instance) can resolve it.
        let reactive: Arc<dyn Reactive> = inner.clone();
        let weak: Weak<dyn Reactive> = Arc::downgrade(&reactive);
        runtime.register(id, weak);

        inner.execute();

        Self { inner }
    }

    /// Get the effect's subscriber ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Re-run the effect now, re-tracking its dependencies.
    ///
    /// This is what a scheduler override calls once the deferred moment
    /// arrives. A no-op after [`Effect::stop`].
    pub fn run(&self) {
        self.inner.execute();
    }

    /// Stop the effect: remove every dependency edge and unregister it.
    ///
    /// Idempotent, and safe to call from within the effect's own run.
    /// After stopping, the effect never runs again.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        self.inner.runtime.clear_subscriber(self.inner.id);
        self.inner.runtime.unregister(self.inner.id);
    }

    /// Whether the effect has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Number of slots the effect is currently subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.inner.runtime.subscription_count(self.inner.id)
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id.raw())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Run `f` immediately and re-run it whenever its tracked dependencies
/// change. Returns the owning handle; call `.stop()` to end the
/// subscription.
pub fn watch_effect<F>(f: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(f)
}
