//! Watcher Implementation
//!
//! A watcher observes a reactive source and invokes a callback with the new
//! and previous values when the source changes. It is built on the same
//! effect + scheduler seam the renderer uses: the inner effect tracks the
//! source read, and its scheduler re-reads, compares, and fires the
//! callback.
//!
//! The previous value handed to the callback is the one captured at the
//! *previous invocation*, not at watcher creation, across any number of
//! trigger cycles. Sources that re-evaluate to an equal value do not fire
//! the callback.

use std::sync::{Arc, RwLock};

use super::computed::Computed;
use super::effect::Effect;
use super::signal::Signal;

/// Anything a watcher can observe: the read happens inside the watcher's
/// tracking context, so every reactive slot the source touches becomes a
/// dependency.
///
/// The `Marker` parameter only disambiguates the blanket closure impl from
/// the concrete source impls; callers never name it, since inference picks
/// the single impl that applies.
pub trait WatchSource<T, Marker = ()>: Send + Sync {
    fn read(&self) -> T;
}

/// Marker for closure sources.
pub struct GetterMarker;

impl<T> WatchSource<T> for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn read(&self) -> T {
        self.get()
    }
}

impl<T> WatchSource<T> for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn read(&self) -> T {
        self.get()
    }
}

impl<T, F> WatchSource<T, GetterMarker> for F
where
    F: Fn() -> T + Send + Sync,
{
    fn read(&self) -> T {
        self()
    }
}

/// Options for [`watch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Run the callback once immediately after creation, with no previous
    /// value.
    pub immediate: bool,
}

/// Handle to a running watcher. Dropping the handle deactivates the
/// watcher; [`WatchHandle::stop`] does so explicitly and idempotently.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    effect: Effect,
}

impl WatchHandle {
    /// Stop the watcher: its subscriptions are released and the callback
    /// never fires again. Idempotent.
    pub fn stop(&self) {
        self.effect.stop();
    }

    /// Whether the watcher has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.effect.is_stopped()
    }
}

/// Watch a reactive source and call `callback(new, old)` when its value
/// changes.
pub fn watch<T, M, S, C>(source: S, callback: C, options: WatchOptions) -> WatchHandle
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: 'static,
    S: WatchSource<T, M> + 'static,
    C: Fn(&T, Option<&T>) + Send + Sync + 'static,
{
    let source = Arc::new(source);
    let callback = Arc::new(callback);

    // Latest tracked read; previous value as of the last callback cycle.
    let latest: Arc<RwLock<Option<T>>> = Arc::new(RwLock::new(None));
    let previous: Arc<RwLock<Option<T>>> = Arc::new(RwLock::new(None));

    let run = {
        let source = Arc::clone(&source);
        let latest = Arc::clone(&latest);
        move || {
            let value = source.read();
            *latest.write().expect("latest lock poisoned") = Some(value);
        }
    };

    let scheduler = {
        let latest = Arc::clone(&latest);
        let previous = Arc::clone(&previous);
        let callback = Arc::clone(&callback);
        move |fx: &Effect| {
            // Re-read now (tracked), refreshing the dependency set.
            fx.run();

            let new_value = latest.read().expect("latest lock poisoned").clone();
            let Some(new_value) = new_value else {
                return;
            };

            let old_value = previous.read().expect("previous lock poisoned").clone();
            let changed = old_value.as_ref() != Some(&new_value);

            *previous.write().expect("previous lock poisoned") = Some(new_value.clone());

            if changed {
                callback(&new_value, old_value.as_ref());
            }
        }
    };

    let effect = Effect::with_scheduler(run, scheduler);

    // Seed the previous value from the initial tracked read.
    {
        let seed = latest.read().expect("latest lock poisoned").clone();
        *previous.write().expect("previous lock poisoned") = seed;
    }

    if options.immediate {
        let current = previous.read().expect("previous lock poisoned").clone();
        if let Some(current) = current {
            callback(&current, None);
        }
    }

    WatchHandle { effect }
}
