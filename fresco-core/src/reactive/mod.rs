//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, stores,
//! computed values, effects, and watchers. These primitives form the
//! foundation of fresco's fine-grained reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for one mutable value. When a signal is read
//! within a tracking context (an effect, a computed value, a component
//! render), it automatically registers that context as a dependent. When
//! the signal's value changes, all dependents are notified.
//!
//! ## Stores
//!
//! A Store is the deep reactive wrapper for map/list state: each key is an
//! independently tracked slot, structural changes have their own slot, and
//! nested containers become reactive lazily on first read with stable
//! handle identity.
//!
//! ## Computed Values
//!
//! A Computed is a derived value that caches its result. It re-evaluates
//! only when one of its dependencies changed and someone reads it again.
//!
//! ## Effects and Watchers
//!
//! An Effect is a side-effecting computation that re-runs whenever its
//! dependencies change; a watcher is an effect that compares values across
//! cycles and hands the callback the new and previous value.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies automatically, and an explicit [`Runtime`] object that owns
//! the dependency graph, so independent applications and tests can run
//! against isolated runtimes.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue 3, and Leptos.

mod computed;
mod context;
mod effect;
mod runtime;
mod signal;
mod store;
pub(crate) mod subscriber;
mod value;
mod watch;

pub use computed::{computed, Computed};
pub use context::ReactiveContext;
pub use effect::{watch_effect, Effect};
pub use runtime::{Reactive, Runtime, RuntimeGuard};
pub use signal::{signal, Signal};
pub use store::{reactive, Store};
pub use subscriber::{SubscriberId, TargetId};
pub use value::{list_value, map_value, Value};
pub use watch::{watch, GetterMarker, WatchHandle, WatchOptions, WatchSource};
