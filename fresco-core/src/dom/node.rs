//! DOM Tree
//!
//! The render target: an in-process tree of element and text nodes with the
//! operation surface the patcher needs (attributes, per-property styles,
//! boolean properties, event listeners, ordered children with insert/move/
//! remove). The host shell that embeds fresco mirrors this tree into a real
//! browser; inside the crate it is what makes the renderer observable and
//! testable.
//!
//! Node handles share storage: cloning a [`DomNode`] clones the handle, not
//! the node. Pointer identity ([`DomNode::ptr_eq`]) is the notion of "the
//! same element" that patch-minimality and keyed-reuse guarantees are
//! stated in.
//!
//! Locking discipline: every operation takes one node lock at a time, and
//! no user callback is ever invoked while a lock is held.

use std::fmt::Debug;
use std::sync::{Arc, RwLock, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::event::{Event, EventHandler};

/// The payload of a node.
enum NodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        styles: IndexMap<String, String>,
        bool_props: IndexMap<String, bool>,
        listeners: SmallVec<[(String, EventHandler); 2]>,
        children: Vec<DomNode>,
    },
    Text {
        data: String,
    },
}

struct NodeData {
    kind: NodeKind,
    parent: Weak<RwLock<NodeData>>,
}

/// A handle to a DOM node (element or text).
#[derive(Clone)]
pub struct DomNode {
    inner: Arc<RwLock<NodeData>>,
}

impl DomNode {
    /// Create a detached element node.
    pub fn create_element(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(NodeData {
                kind: NodeKind::Element {
                    tag: tag.into(),
                    attributes: IndexMap::new(),
                    styles: IndexMap::new(),
                    bool_props: IndexMap::new(),
                    listeners: SmallVec::new(),
                    children: Vec::new(),
                },
                parent: Weak::new(),
            })),
        }
    }

    /// Create a detached text node.
    pub fn create_text(data: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(NodeData {
                kind: NodeKind::Text { data: data.into() },
                parent: Weak::new(),
            })),
        }
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &DomNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_element(&self) -> bool {
        matches!(
            self.inner.read().expect("node lock poisoned").kind,
            NodeKind::Element { .. }
        )
    }

    pub fn is_text(&self) -> bool {
        !self.is_element()
    }

    /// Element tag, `None` for text nodes.
    pub fn tag(&self) -> Option<String> {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text { .. } => None,
        }
    }

    // ------------------------------------------------------------------
    // Attributes, styles, boolean properties
    // ------------------------------------------------------------------

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } =
            &mut self.inner.write().expect("node lock poisoned").kind
        {
            attributes.insert(name.into(), value.into());
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let NodeKind::Element { attributes, .. } =
            &mut self.inner.write().expect("node lock poisoned").kind
        {
            attributes.shift_remove(name);
        }
    }

    /// Set one style property, e.g. `set_style("color", "red")`.
    pub fn set_style(&self, name: impl Into<String>, value: impl Into<String>) {
        if let NodeKind::Element { styles, .. } =
            &mut self.inner.write().expect("node lock poisoned").kind
        {
            styles.insert(name.into(), value.into());
        }
    }

    pub fn get_style(&self, name: &str) -> Option<String> {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { styles, .. } => styles.get(name).cloned(),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn remove_style(&self, name: &str) {
        if let NodeKind::Element { styles, .. } =
            &mut self.inner.write().expect("node lock poisoned").kind
        {
            styles.shift_remove(name);
        }
    }

    /// Set a native boolean property (`disabled`, `checked`, …). Setting
    /// `false` removes it, matching how boolean attributes behave.
    pub fn set_bool_prop(&self, name: impl Into<String>, on: bool) {
        if let NodeKind::Element { bool_props, .. } =
            &mut self.inner.write().expect("node lock poisoned").kind
        {
            let name = name.into();
            if on {
                bool_props.insert(name, true);
            } else {
                bool_props.shift_remove(&name);
            }
        }
    }

    pub fn get_bool_prop(&self, name: &str) -> bool {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { bool_props, .. } => bool_props.get(name).copied().unwrap_or(false),
            NodeKind::Text { .. } => false,
        }
    }

    // ------------------------------------------------------------------
    // Event listeners
    // ------------------------------------------------------------------

    pub fn add_event_listener(&self, event: impl Into<String>, handler: EventHandler) {
        if let NodeKind::Element { listeners, .. } =
            &mut self.inner.write().expect("node lock poisoned").kind
        {
            listeners.push((event.into(), handler));
        }
    }

    /// Remove every listener registered for the given event name.
    pub fn remove_event_listeners(&self, event: &str) {
        if let NodeKind::Element { listeners, .. } =
            &mut self.inner.write().expect("node lock poisoned").kind
        {
            listeners.retain(|(name, _)| name != event);
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { listeners, .. } => {
                listeners.iter().filter(|(name, _)| name == event).count()
            }
            NodeKind::Text { .. } => 0,
        }
    }

    /// Invoke this node's listeners for the event, synchronously.
    ///
    /// Handlers run with no node lock held: they may freely mutate reactive
    /// state whose re-render patches this very node.
    pub fn dispatch(&self, event: &Event) {
        let handlers: Vec<EventHandler> = {
            match &self.inner.read().expect("node lock poisoned").kind {
                NodeKind::Element { listeners, .. } => listeners
                    .iter()
                    .filter(|(name, _)| *name == event.name)
                    .map(|(_, h)| h.clone())
                    .collect(),
                NodeKind::Text { .. } => Vec::new(),
            }
        };

        for handler in handlers {
            handler(event);
        }
    }

    // ------------------------------------------------------------------
    // Tree structure
    // ------------------------------------------------------------------

    /// Current children, in order.
    pub fn children(&self) -> Vec<DomNode> {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { children, .. } => children.clone(),
            NodeKind::Text { .. } => Vec::new(),
        }
    }

    pub fn child_count(&self) -> usize {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { children, .. } => children.len(),
            NodeKind::Text { .. } => 0,
        }
    }

    /// Position of a child among this node's children.
    pub fn index_of(&self, child: &DomNode) -> Option<usize> {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { children, .. } => {
                children.iter().position(|c| c.ptr_eq(child))
            }
            NodeKind::Text { .. } => None,
        }
    }

    /// The node containing this one, if attached.
    pub fn parent(&self) -> Option<DomNode> {
        let weak = self.inner.read().expect("node lock poisoned").parent.clone();
        weak.upgrade().map(|inner| DomNode { inner })
    }

    /// Append a child at the end. A child attached elsewhere is moved, as
    /// with the browser `appendChild`.
    pub fn append_child(&self, child: &DomNode) {
        self.insert_before(child, None);
    }

    /// Insert `child` before `anchor` (or append when `anchor` is `None` or
    /// not one of this node's children). A child attached elsewhere,
    /// including earlier in this same node, is detached first, which is
    /// what makes reorder-by-reinsertion work.
    pub fn insert_before(&self, child: &DomNode, anchor: Option<&DomNode>) {
        child.detach();

        {
            let mut guard = self.inner.write().expect("node lock poisoned");
            if let NodeKind::Element { children, .. } = &mut guard.kind {
                let index = anchor
                    .and_then(|a| children.iter().position(|c| c.ptr_eq(a)))
                    .unwrap_or(children.len());
                children.insert(index, child.clone());
            } else {
                tracing::warn!("insert_before() on a text node; ignoring");
                return;
            }
        }

        child.inner.write().expect("node lock poisoned").parent = Arc::downgrade(&self.inner);
    }

    /// Remove a child. A no-op if `child` is not attached here.
    pub fn remove_child(&self, child: &DomNode) {
        let removed = {
            let mut guard = self.inner.write().expect("node lock poisoned");
            if let NodeKind::Element { children, .. } = &mut guard.kind {
                let before = children.len();
                children.retain(|c| !c.ptr_eq(child));
                children.len() != before
            } else {
                false
            }
        };

        if removed {
            child.inner.write().expect("node lock poisoned").parent = Weak::new();
        }
    }

    /// Detach this node from its parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Replace a text node's data in place. The node identity is preserved.
    pub fn set_text(&self, data: impl Into<String>) {
        let mut guard = self.inner.write().expect("node lock poisoned");
        match &mut guard.kind {
            NodeKind::Text { data: current } => *current = data.into(),
            NodeKind::Element { .. } => {
                tracing::warn!("set_text() on an element node; ignoring");
            }
        }
    }

    /// A text node's data.
    pub fn text(&self) -> Option<String> {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Text { data } => Some(data.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    /// Concatenated text of this subtree, as a browser `textContent`.
    pub fn text_content(&self) -> String {
        enum Piece {
            Text(String),
            Children(Vec<DomNode>),
        }

        let piece = {
            match &self.inner.read().expect("node lock poisoned").kind {
                NodeKind::Text { data } => Piece::Text(data.clone()),
                NodeKind::Element { children, .. } => Piece::Children(children.clone()),
            }
        };

        match piece {
            Piece::Text(data) => data,
            Piece::Children(children) => children
                .iter()
                .map(DomNode::text_content)
                .collect::<Vec<_>>()
                .concat(),
        }
    }

    /// Debug/diagnostic HTML rendering of this subtree.
    pub fn outer_html(&self) -> String {
        enum Shape {
            Text(String),
            Element {
                tag: String,
                attributes: Vec<(String, String)>,
                styles: Vec<(String, String)>,
                bool_props: Vec<String>,
                children: Vec<DomNode>,
            },
        }

        let shape = {
            match &self.inner.read().expect("node lock poisoned").kind {
                NodeKind::Text { data } => Shape::Text(data.clone()),
                NodeKind::Element {
                    tag,
                    attributes,
                    styles,
                    bool_props,
                    children,
                    ..
                } => Shape::Element {
                    tag: tag.clone(),
                    attributes: attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    styles: styles.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    bool_props: bool_props.keys().cloned().collect(),
                    children: children.clone(),
                },
            }
        };

        match shape {
            Shape::Text(data) => escape_text(&data),
            Shape::Element {
                tag,
                attributes,
                styles,
                bool_props,
                children,
            } => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&tag);
                for (name, value) in &attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_text(value)));
                }
                if !styles.is_empty() {
                    let style = styles
                        .iter()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    out.push_str(&format!(" style=\"{style}\""));
                }
                for name in &bool_props {
                    out.push(' ');
                    out.push_str(name);
                }
                out.push('>');
                for child in &children {
                    out.push_str(&child.outer_html());
                }
                out.push_str(&format!("</{tag}>"));
                out
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Debug for DomNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner.read().expect("node lock poisoned").kind {
            NodeKind::Element { tag, children, .. } => f
                .debug_struct("DomNode")
                .field("tag", tag)
                .field("children", &children.len())
                .finish(),
            NodeKind::Text { data } => f.debug_struct("DomNode").field("text", data).finish(),
        }
    }
}

/// The document: owner of the root element the application mounts into.
pub struct Document {
    body: DomNode,
}

impl Document {
    /// Create a document with an empty `<body>`.
    pub fn new() -> Self {
        Self {
            body: DomNode::create_element("body"),
        }
    }

    /// The root element.
    pub fn body(&self) -> &DomNode {
        &self.body
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
