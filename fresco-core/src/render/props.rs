//! Virtual Node Props
//!
//! An ordered map of property values carried by a virtual node. How a prop
//! lands on the DOM depends on its name and value:
//!
//! - `on*` keys with handler values attach event listeners,
//! - `style` applies property-by-property,
//! - `class` maps to the class attribute,
//! - boolean values set native boolean properties,
//! - everything else becomes a plain attribute.
//!
//! Handlers compare by pointer identity; that comparison is what prop
//! diffing uses to decide whether a listener changed between renders.

use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::dom::{Event, EventHandler};
use crate::reactive::Value;

/// A single prop value.
#[derive(Clone)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    /// Render the value as an attribute string. Handlers have no attribute
    /// form and render empty.
    pub fn to_attr_string(&self) -> String {
        match self {
            PropValue::Str(s) => s.clone(),
            PropValue::Int(i) => i.to_string(),
            PropValue::Float(x) => x.to_string(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Handler(_) => String::new(),
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Convert a data prop into a state [`Value`]. Handlers carry no data
    /// and convert to `None`.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            PropValue::Str(s) => Some(Value::Str(s.clone())),
            PropValue::Int(i) => Some(Value::Int(*i)),
            PropValue::Float(x) => Some(Value::Float(*x)),
            PropValue::Bool(b) => Some(Value::Bool(*b)),
            PropValue::Handler(_) => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Debug for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropValue::Str(s) => write!(f, "{s:?}"),
            PropValue::Int(i) => write!(f, "{i}"),
            PropValue::Float(x) => write!(f, "{x}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Handler(_) => write!(f, "<handler>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Str(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Int(v as i64)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Float(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<EventHandler> for PropValue {
    fn from(v: EventHandler) -> Self {
        PropValue::Handler(v)
    }
}

/// Ordered props of a virtual node, plus the optional diff key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    entries: IndexMap<String, PropValue>,
    key: Option<String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prop by name.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Attach an event listener: `on("click", …)` stores an `onclick` prop.
    pub fn on(mut self, event: &str, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.entries
            .insert(format!("on{event}"), PropValue::Handler(Arc::new(f)));
        self
    }

    /// Set the diff key used for keyed child reconciliation.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The diff key, if any.
    pub fn node_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shorthand for an empty prop map.
pub fn props() -> Props {
    Props::new()
}
