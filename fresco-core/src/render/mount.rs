//! Mount: Virtual Tree → DOM
//!
//! First-render construction: walk a virtual tree, build the corresponding
//! DOM nodes, apply props, and attach everything in document order. Mounted
//! virtual nodes are annotated with their DOM back-reference so the next
//! render can patch instead of rebuilding.

use crate::component::ComponentInstance;
use crate::dom::DomNode;

use super::props::{PropValue, Props};
use super::vnode::{VNode, VNodeKind};
use super::RenderEnv;

/// Mount a virtual tree into a container using the ambient runtime.
///
/// This is the standalone entry point for rendering without an application
/// shell (tests, headless rendering). [`crate::app::App::mount`] is the
/// component-world equivalent.
pub fn mount(vnode: &VNode, container: &DomNode) {
    let env = RenderEnv::ambient();
    mount_node(&env, vnode, container, None);
}

/// Recursively construct and attach the DOM for `vnode`, inserting before
/// `anchor` (append when `None`).
pub(crate) fn mount_node(
    env: &RenderEnv,
    vnode: &VNode,
    parent: &DomNode,
    anchor: Option<&DomNode>,
) {
    match vnode.kind() {
        VNodeKind::Empty => {
            // Renders nothing: no DOM node, not even an empty text node.
            vnode.set_dom(None);
        }

        VNodeKind::Text(data) => {
            let node = DomNode::create_text(data.clone());
            parent.insert_before(&node, anchor);
            vnode.set_dom(Some(node));
        }

        VNodeKind::Element {
            tag,
            props,
            children,
        } => {
            if tag.is_empty() {
                // Authoring mistake: keep it discoverable with a visible
                // placeholder instead of silently rendering nothing.
                tracing::warn!("element virtual node with an empty tag");
                let placeholder =
                    DomNode::create_text("[fresco: invalid virtual node: element without a tag]");
                parent.insert_before(&placeholder, anchor);
                vnode.set_dom(Some(placeholder));
                return;
            }

            let el = DomNode::create_element(tag.clone());
            apply_props(&el, props);

            for child in children {
                mount_node(env, child, &el, None);
            }

            parent.insert_before(&el, anchor);
            vnode.set_dom(Some(el));
            tracing::trace!(tag, "mounted element");
        }

        VNodeKind::Component { component, props } => {
            let instance = ComponentInstance::new(component.clone(), props, env.clone());
            instance.mount(parent, anchor);
            vnode.set_dom(instance.root_dom());
            vnode.set_instance(Some(instance));
        }
    }
}

/// Apply every prop of a freshly created element.
pub(crate) fn apply_props(el: &DomNode, props: &Props) {
    for (name, value) in props.iter() {
        apply_prop(el, name, value);
    }
}

/// Apply one prop according to its name and value class.
pub(crate) fn apply_prop(el: &DomNode, name: &str, value: &PropValue) {
    if let Some(handler) = value.as_handler() {
        if let Some(event) = name.strip_prefix("on") {
            el.add_event_listener(event, handler.clone());
        } else {
            tracing::warn!(name, "handler prop without an on* name; ignoring");
        }
        return;
    }

    match (name, value) {
        ("style", PropValue::Str(style)) => {
            for (prop, val) in parse_style(style) {
                el.set_style(prop, val);
            }
        }
        ("class", value) => {
            el.set_attribute("class", value.to_attr_string());
        }
        (_, PropValue::Bool(on)) => {
            el.set_bool_prop(name, *on);
        }
        (_, value) => {
            el.set_attribute(name, value.to_attr_string());
        }
    }
}

/// Undo one prop when it disappears between renders.
pub(crate) fn remove_prop(el: &DomNode, name: &str, old_value: &PropValue) {
    if old_value.as_handler().is_some() {
        if let Some(event) = name.strip_prefix("on") {
            el.remove_event_listeners(event);
        }
        return;
    }

    match (name, old_value) {
        ("style", PropValue::Str(style)) => {
            for (prop, _) in parse_style(style) {
                el.remove_style(&prop);
            }
        }
        (_, PropValue::Bool(_)) => {
            el.set_bool_prop(name, false);
        }
        _ => {
            el.remove_attribute(name);
        }
    }
}

/// Split an inline style string (`"color: red; font-size: 12px"`) into
/// property/value pairs.
pub(crate) fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((prop.to_string(), value.to_string()))
            }
        })
        .collect()
}
