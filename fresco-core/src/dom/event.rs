//! DOM Events
//!
//! A minimal synchronous event model: an event has a name and an optional
//! detail payload, and dispatching invokes the listeners registered on the
//! target node for that name. Capture/bubble phases belong to the host
//! shell that bridges this tree to a real browser.

use std::sync::Arc;

use crate::reactive::Value;

/// An event delivered to element listeners.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name, e.g. `"click"` or `"input"`.
    pub name: String,

    /// Optional payload.
    pub detail: Value,
}

impl Event {
    /// Create an event with no payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// A shared event listener. Listeners compare by pointer identity, which is
/// what prop diffing uses to decide whether a handler changed.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Wrap a closure into a shareable handler.
pub fn handler(f: impl Fn(&Event) + Send + Sync + 'static) -> EventHandler {
    Arc::new(f)
}
