//! Virtual Node Model
//!
//! A virtual node is an immutable-per-render description of a DOM element,
//! a text run, or a component invocation. Render functions build a fresh
//! tree each run with [`h`]; the patcher compares the previous and next
//! trees and applies the difference to the real DOM.
//!
//! Handles are cheap to clone (shared inner). A mounted node carries a
//! back-reference to its DOM node (and, for component nodes, its instance)
//! in interior-mutable slots filled by the renderer.
//!
//! Two nodes are "the same logical node" across renders iff they sit at the
//! same position, carry the same key (when keys are present), and have the
//! same tag or component identity. That relation, not object identity,
//! governs diff matching.

use std::sync::{Arc, RwLock};

use crate::component::{Component, ComponentInstance};
use crate::dom::DomNode;

use super::props::Props;

/// What a virtual node describes.
pub enum VNodeKind {
    /// A native element.
    Element {
        tag: String,
        props: Props,
        children: Vec<VNode>,
    },
    /// A text run.
    Text(String),
    /// A component invocation.
    Component {
        component: Arc<Component>,
        props: Props,
    },
    /// Nothing: renders no DOM at all (the `false`/null child case).
    Empty,
}

struct VNodeInner {
    kind: VNodeKind,
    key: Option<String>,
    /// The DOM node this virtual node mounted to, once mounted.
    dom: RwLock<Option<DomNode>>,
    /// The live instance behind a component node, once mounted.
    instance: RwLock<Option<ComponentInstance>>,
}

/// A handle to a virtual node.
#[derive(Clone)]
pub struct VNode {
    inner: Arc<VNodeInner>,
}

impl VNode {
    fn from_kind(kind: VNodeKind, key: Option<String>) -> Self {
        Self {
            inner: Arc::new(VNodeInner {
                kind,
                key,
                dom: RwLock::new(None),
                instance: RwLock::new(None),
            }),
        }
    }

    /// An element node.
    pub fn element(tag: impl Into<String>, props: Props, children: Vec<VNode>) -> Self {
        let key = props.node_key().map(str::to_string);
        Self::from_kind(
            VNodeKind::Element {
                tag: tag.into(),
                props,
                children,
            },
            key,
        )
    }

    /// A text node.
    pub fn text(data: impl Into<String>) -> Self {
        Self::from_kind(VNodeKind::Text(data.into()), None)
    }

    /// A component node.
    pub fn component(component: Arc<Component>, props: Props) -> Self {
        let key = props.node_key().map(str::to_string);
        Self::from_kind(VNodeKind::Component { component, props }, key)
    }

    /// A node that renders nothing.
    pub fn empty() -> Self {
        Self::from_kind(VNodeKind::Empty, None)
    }

    pub fn kind(&self) -> &VNodeKind {
        &self.inner.kind
    }

    /// The diff key, if any.
    pub fn key(&self) -> Option<&str> {
        self.inner.key.as_deref()
    }

    pub fn is_empty_node(&self) -> bool {
        matches!(self.inner.kind, VNodeKind::Empty)
    }

    /// The DOM node this virtual node mounted to.
    pub fn dom(&self) -> Option<DomNode> {
        self.inner.dom.read().expect("vnode dom lock poisoned").clone()
    }

    pub(crate) fn set_dom(&self, dom: Option<DomNode>) {
        *self.inner.dom.write().expect("vnode dom lock poisoned") = dom;
    }

    /// The component instance behind this node, once mounted.
    pub fn instance(&self) -> Option<ComponentInstance> {
        self.inner
            .instance
            .read()
            .expect("vnode instance lock poisoned")
            .clone()
    }

    pub(crate) fn set_instance(&self, instance: Option<ComponentInstance>) {
        *self
            .inner
            .instance
            .write()
            .expect("vnode instance lock poisoned") = instance;
    }

    /// Whether this node and `other` describe the same logical node: same
    /// kind, same tag/component identity, same key.
    pub fn same_node(&self, other: &VNode) -> bool {
        if self.inner.key.as_deref() != other.inner.key.as_deref() {
            return false;
        }

        match (&self.inner.kind, &other.inner.kind) {
            (VNodeKind::Text(_), VNodeKind::Text(_)) => true,
            (VNodeKind::Empty, VNodeKind::Empty) => true,
            (
                VNodeKind::Element { tag: a, .. },
                VNodeKind::Element { tag: b, .. },
            ) => a == b,
            (
                VNodeKind::Component { component: a, .. },
                VNodeKind::Component { component: b, .. },
            ) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for VNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner.kind {
            VNodeKind::Element { tag, children, .. } => f
                .debug_struct("VNode")
                .field("tag", tag)
                .field("key", &self.inner.key)
                .field("children", &children.len())
                .finish(),
            VNodeKind::Text(data) => f.debug_struct("VNode").field("text", data).finish(),
            VNodeKind::Component { component, .. } => f
                .debug_struct("VNode")
                .field("component", &component.name())
                .field("key", &self.inner.key)
                .finish(),
            VNodeKind::Empty => f.debug_struct("VNode").field("empty", &true).finish(),
        }
    }
}

/// What [`h`] accepts as a tag: an element name or a component.
pub enum Tag {
    Element(String),
    Component(Arc<Component>),
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Tag::Element(v.to_string())
    }
}

impl From<String> for Tag {
    fn from(v: String) -> Self {
        Tag::Element(v)
    }
}

impl From<Arc<Component>> for Tag {
    fn from(v: Arc<Component>) -> Self {
        Tag::Component(v)
    }
}

impl From<&Arc<Component>> for Tag {
    fn from(v: &Arc<Component>) -> Self {
        Tag::Component(v.clone())
    }
}

/// What [`h`] accepts as children: a list, a single node, or a bare string
/// as shorthand for one text child.
pub struct Children(pub Vec<VNode>);

impl From<Vec<VNode>> for Children {
    fn from(v: Vec<VNode>) -> Self {
        Children(v)
    }
}

impl From<VNode> for Children {
    fn from(v: VNode) -> Self {
        Children(vec![v])
    }
}

impl From<&str> for Children {
    fn from(v: &str) -> Self {
        Children(vec![VNode::text(v)])
    }
}

impl From<String> for Children {
    fn from(v: String) -> Self {
        Children(vec![VNode::text(v)])
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children(Vec::new())
    }
}

/// Build a virtual node.
///
/// `tag` is an element name or a component handle; `children` accepts a
/// `Vec<VNode>`, a single node, a bare string (one text child), or `()`.
/// Components are matched across renders by handle identity, so build a
/// component once and clone its `Arc` into each render.
pub fn h(tag: impl Into<Tag>, props: Props, children: impl Into<Children>) -> VNode {
    let Children(children) = children.into();

    match tag.into() {
        Tag::Element(tag) => VNode::element(tag, props, children),
        Tag::Component(component) => {
            if !children.is_empty() {
                tracing::warn!(
                    component = component.name(),
                    "children passed to a component node are ignored (slots are not supported)"
                );
            }
            VNode::component(component, props)
        }
    }
}

/// Build a text node.
pub fn text(data: impl Into<String>) -> VNode {
    VNode::text(data)
}
