//! Fresco Core
//!
//! This crate provides the core runtime for the Fresco reactive UI
//! framework. It implements:
//!
//! - Reactive primitives (signals, stores, computed values, effects,
//!   watchers)
//! - The keyed dependency graph and the coalescing update scheduler
//! - Virtual DOM construction and the diff/patch renderer
//! - The component model and instance lifecycle
//! - Application bootstrap (`create_app` / `App::mount`)
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `graph`: Keyed dependency graph and tick scheduler
//! - `dom`: The in-process DOM tree the renderer mutates
//! - `render`: Virtual nodes, mount, and patch
//! - `component`: Component definitions, contexts, and instances
//! - `app`: Application bootstrap and plugins
//!
//! # Example
//!
//! ```rust,ignore
//! use fresco_core::prelude::*;
//!
//! let counter = Component::new("counter", |ctx| {
//!     h("div", Props::new(), ctx.get("n").to_string())
//! })
//! .data(|| map_value([("n", 0)]))
//! .build();
//!
//! let document = Document::new();
//! let app = create_app(counter);
//! let handle = app.mount(document.body()).unwrap();
//!
//! // Mutations coalesce; one flush applies one patch.
//! handle.root_instance().state().set("n", 5);
//! handle.flush();
//! assert_eq!(document.body().text_content(), "5");
//! ```

pub mod app;
pub mod component;
pub mod dom;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod render;

pub use app::{create_app, App, AppHandle, Plugin};
pub use component::{Component, ComponentCtx, ComponentInstance, LifecycleStage};
pub use dom::{Document, DomNode, Event, EventHandler};
pub use error::{ComponentError, FrescoError, MountError};
pub use reactive::{
    computed, list_value, map_value, reactive, signal, watch, watch_effect, Computed, Effect,
    Runtime, Signal, Store, Value, WatchHandle, WatchOptions,
};
pub use render::{h, props, text, PropValue, Props, VNode, VNodeKind};

/// The commonly-used surface in one import.
pub mod prelude {
    pub use crate::app::{create_app, App, AppHandle, Plugin};
    pub use crate::component::{Component, ComponentCtx, ComponentInstance, LifecycleStage};
    pub use crate::dom::{handler, Document, DomNode, Event, EventHandler};
    pub use crate::error::{ComponentError, FrescoError, MountError};
    pub use crate::reactive::{
        computed, list_value, map_value, reactive, signal, watch, watch_effect, Computed, Effect,
        Runtime, Signal, Store, Value, WatchHandle, WatchOptions,
    };
    pub use crate::render::{h, props, text, PropValue, Props, VNode, VNodeKind};
}
