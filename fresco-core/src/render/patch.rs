//! Patch: Diff Two Virtual Trees Onto the DOM
//!
//! Compares a previous virtual tree against a freshly rendered one and
//! applies the minimal set of DOM mutations:
//!
//! - same logical node → diff props in place and recurse into children,
//! - text vs text → update the text node's data in place (identity kept),
//! - different identity at a position → unmount the old subtree, mount the
//!   new one at the same spot,
//! - keyed child lists → match by key and *move* the surviving DOM nodes
//!   instead of destroying and recreating them,
//! - unkeyed child lists → positional matching (reorders are then patched
//!   as content changes, a documented limitation when keys are omitted).
//!
//! Removal of a subtree propagates unmount hooks to every component
//! instance nested in it.

use std::collections::HashMap;

use crate::dom::DomNode;

use super::mount::{apply_prop, mount_node, parse_style, remove_prop};
use super::props::{PropValue, Props};
use super::vnode::{VNode, VNodeKind};
use super::RenderEnv;

/// Patch `old` → `new` inside `container` using the ambient runtime.
///
/// The standalone counterpart of [`super::mount::mount`]: the renderer's
/// entry point for headless use and tests.
pub fn patch(old: &VNode, new: &VNode, container: &DomNode) {
    let env = RenderEnv::ambient();
    patch_node(&env, old, new, container, None);
}

/// The DOM node a mounted virtual node currently occupies. Component nodes
/// defer to their instance, whose root may have been replaced by the
/// component's own re-renders since the parent last looked.
fn current_dom(vnode: &VNode) -> Option<DomNode> {
    match vnode.instance() {
        Some(instance) => instance.root_dom(),
        None => vnode.dom(),
    }
}

/// Patch one position: reuse in place when the logical identity matches,
/// replace the subtree otherwise. `anchor` locates the position when the
/// old node has no DOM of its own (empty nodes, empty-rooted components).
pub(crate) fn patch_node(
    env: &RenderEnv,
    old: &VNode,
    new: &VNode,
    parent: &DomNode,
    anchor: Option<&DomNode>,
) {
    if old.same_node(new) {
        patch_same(env, old, new, parent);
        return;
    }

    // Identity changed: discard the old subtree and mount the new one at
    // the same child index.
    let index = current_dom(old).and_then(|dom| parent.index_of(&dom));
    unmount_node(old, parent);

    let replace_anchor = index
        .and_then(|i| parent.children().get(i).cloned())
        .or_else(|| anchor.cloned());
    mount_node(env, new, parent, replace_anchor.as_ref());
}

/// Patch two nodes already known to be the same logical node.
fn patch_same(env: &RenderEnv, old: &VNode, new: &VNode, parent: &DomNode) {
    match (old.kind(), new.kind()) {
        (VNodeKind::Text(old_data), VNodeKind::Text(new_data)) => match old.dom() {
            Some(dom) => {
                if old_data != new_data {
                    // In-place data swap: the DOM node identity survives.
                    dom.set_text(new_data.clone());
                }
                new.set_dom(Some(dom));
            }
            None => mount_node(env, new, parent, None),
        },

        (
            VNodeKind::Element {
                props: old_props,
                children: old_children,
                ..
            },
            VNodeKind::Element {
                props: new_props,
                children: new_children,
                ..
            },
        ) => match old.dom() {
            Some(el) => {
                new.set_dom(Some(el.clone()));
                diff_props(old_props, new_props, &el);
                patch_children(env, old_children, new_children, &el);
            }
            None => mount_node(env, new, parent, None),
        },

        (VNodeKind::Component { .. }, VNodeKind::Component { props: new_props, .. }) => {
            match old.instance() {
                Some(instance) => {
                    // Forward the next props; the instance's own reactivity
                    // schedules a re-render if anything it read changed.
                    instance.update_props(new_props);
                    new.set_dom(instance.root_dom());
                    new.set_instance(Some(instance));
                }
                None => mount_node(env, new, parent, None),
            }
        }

        (VNodeKind::Empty, VNodeKind::Empty) => {}

        // same_node() rules this out; fall back to a fresh mount.
        _ => mount_node(env, new, parent, None),
    }
}

/// Apply prop differences between renders to an element.
pub(crate) fn diff_props(old: &Props, new: &Props, el: &DomNode) {
    for (name, new_value) in new.iter() {
        let old_value = old.get(name);
        if old_value == Some(new_value) {
            continue;
        }

        match (name.as_str(), old_value, new_value) {
            // Style diffs property-by-property: drop declarations that
            // disappeared, then apply the new set.
            ("style", Some(PropValue::Str(old_style)), PropValue::Str(new_style)) => {
                let next = parse_style(new_style);
                for (prop, _) in parse_style(old_style) {
                    if !next.iter().any(|(p, _)| *p == prop) {
                        el.remove_style(&prop);
                    }
                }
                for (prop, value) in next {
                    el.set_style(prop, value);
                }
            }
            (_, Some(old_value), _) => {
                // Changed value or changed class of value (listener swap,
                // attribute becoming a boolean prop, …): undo, then apply.
                remove_prop(el, name, old_value);
                apply_prop(el, name, new_value);
            }
            (_, None, _) => {
                apply_prop(el, name, new_value);
            }
        }
    }

    for (name, old_value) in old.iter() {
        if new.get(name).is_none() {
            remove_prop(el, name, old_value);
        }
    }
}

/// Reconcile the child lists of one element.
fn patch_children(env: &RenderEnv, old: &[VNode], new: &[VNode], parent: &DomNode) {
    let fully_keyed = !(old.is_empty() && new.is_empty())
        && old.iter().chain(new.iter()).all(|n| n.key().is_some());

    if fully_keyed {
        patch_keyed_children(env, old, new, parent);
    } else {
        patch_positional_children(env, old, new, parent);
    }
}

/// Positional fallback: pair children by index. A reorder without keys is
/// patched as content changes, which may rebuild subtrees; callers opt
/// into identity-preserving reorders by keying their lists.
fn patch_positional_children(env: &RenderEnv, old: &[VNode], new: &[VNode], parent: &DomNode) {
    let common = old.len().min(new.len());

    for i in 0..common {
        let anchor = next_dom(&old[i + 1..]);
        patch_node(env, &old[i], &new[i], parent, anchor.as_ref());
    }

    // Extra new children append in document order.
    for extra in &new[common..] {
        mount_node(env, extra, parent, None);
    }

    // Children present in old but absent in new detach with their hooks.
    for removed in &old[common..] {
        unmount_node(removed, parent);
    }
}

/// First DOM node among the given virtual nodes; the insertion anchor for
/// replacing a node that rendered no DOM of its own.
fn next_dom(nodes: &[VNode]) -> Option<DomNode> {
    nodes.iter().find_map(current_dom)
}

/// Keyed reconciliation by index remap: patch matched nodes in place and
/// re-insert their existing DOM in the new order, mount unmatched new
/// children, unmount leftover old children. The observable guarantee is
/// reuse + reorder of the surviving DOM nodes; move-minimality is not
/// attempted.
fn patch_keyed_children(env: &RenderEnv, old: &[VNode], new: &[VNode], parent: &DomNode) {
    let mut old_by_key: HashMap<&str, usize> = HashMap::new();
    for (i, child) in old.iter().enumerate() {
        if let Some(key) = child.key() {
            if old_by_key.insert(key, i).is_some() {
                tracing::warn!(key, "duplicate key among keyed children");
            }
        }
    }

    let mut used = vec![false; old.len()];

    // Walk the new order, reusing matches. Sequentially re-appending every
    // child settles the final order: matched nodes move, fresh nodes mount
    // at the end, and leftovers (removed below) precede them harmlessly.
    for new_child in new {
        let matched = new_child
            .key()
            .and_then(|key| old_by_key.get(key).copied())
            .filter(|&i| !used[i] && old[i].same_node(new_child));

        match matched {
            Some(i) => {
                used[i] = true;
                patch_same(env, &old[i], new_child, parent);
                if let Some(dom) = current_dom(new_child) {
                    parent.append_child(&dom);
                }
            }
            None => {
                mount_node(env, new_child, parent, None);
            }
        }
    }

    for (i, old_child) in old.iter().enumerate() {
        if !used[i] {
            unmount_node(old_child, parent);
        }
    }
}

/// Remove a mounted subtree: run unmount teardown for every component
/// instance nested in it, then detach its DOM from the parent.
pub(crate) fn unmount_node(vnode: &VNode, parent: &DomNode) {
    match vnode.kind() {
        VNodeKind::Component { .. } => {
            if let Some(instance) = vnode.instance() {
                instance.unmount();
            }
            vnode.set_instance(None);
            vnode.set_dom(None);
        }
        VNodeKind::Element { children, .. } => {
            for child in children {
                teardown(child);
            }
            if let Some(dom) = vnode.dom() {
                parent.remove_child(&dom);
            }
            vnode.set_dom(None);
        }
        VNodeKind::Text(_) => {
            if let Some(dom) = vnode.dom() {
                parent.remove_child(&dom);
            }
            vnode.set_dom(None);
        }
        VNodeKind::Empty => {}
    }
}

/// Run unmount teardown for nested component instances without detaching
/// intermediate DOM, since the whole subtree's root is being removed anyway.
fn teardown(vnode: &VNode) {
    match vnode.kind() {
        VNodeKind::Component { .. } => {
            if let Some(instance) = vnode.instance() {
                instance.unmount();
            }
            vnode.set_instance(None);
        }
        VNodeKind::Element { children, .. } => {
            for child in children {
                teardown(child);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Event;
    use crate::render::mount::mount;
    use crate::render::props::Props;
    use crate::render::vnode::{h, VNode};
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn text_change_mutates_only_that_text_node() {
        let container = DomNode::create_element("div");
        let old = h(
            "div",
            Props::new(),
            vec![
                h("span", Props::new(), "left"),
                h("span", Props::new(), "mid"),
                h("span", Props::new(), "right"),
            ],
        );
        mount(&old, &container);

        let root_before = container.children()[0].clone();
        let spans_before = root_before.children();

        let new = h(
            "div",
            Props::new(),
            vec![
                h("span", Props::new(), "left"),
                h("span", Props::new(), "MID"),
                h("span", Props::new(), "right"),
            ],
        );
        patch(&old, &new, &container);

        // Sibling DOM nodes keep their identity; only the middle text
        // node's data changed.
        let root_after = container.children()[0].clone();
        assert!(root_before.ptr_eq(&root_after));
        let spans_after = root_after.children();
        for (before, after) in spans_before.iter().zip(spans_after.iter()) {
            assert!(before.ptr_eq(after));
        }
        assert_eq!(root_after.text_content(), "leftMIDright");
    }

    #[test]
    fn tag_change_replaces_the_subtree_in_place() {
        let container = DomNode::create_element("div");
        let old = h(
            "div",
            Props::new(),
            vec![
                h("span", Props::new(), "a"),
                h("em", Props::new(), "b"),
                h("span", Props::new(), "c"),
            ],
        );
        mount(&old, &container);

        let root = container.children()[0].clone();
        let em_before = root.children()[1].clone();

        let new = h(
            "div",
            Props::new(),
            vec![
                h("span", Props::new(), "a"),
                h("strong", Props::new(), "b"),
                h("span", Props::new(), "c"),
            ],
        );
        patch(&old, &new, &container);

        let children = root.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].tag(), Some("strong".to_string()));
        assert!(!children[1].ptr_eq(&em_before));
        // Replacement landed at the same position.
        assert_eq!(root.text_content(), "abc");
    }

    #[test]
    fn prop_diff_adds_updates_and_removes() {
        let container = DomNode::create_element("div");
        let old = h(
            "input",
            Props::new()
                .attr("id", "field")
                .attr("class", "old")
                .attr("disabled", true),
            (),
        );
        mount(&old, &container);
        let input = container.children()[0].clone();

        let new = h(
            "input",
            Props::new()
                .attr("class", "new")
                .attr("placeholder", "type here"),
            (),
        );
        patch(&old, &new, &container);

        // Same element, updated props.
        assert!(container.children()[0].ptr_eq(&input));
        assert_eq!(input.get_attribute("class"), Some("new".to_string()));
        assert_eq!(
            input.get_attribute("placeholder"),
            Some("type here".to_string())
        );
        assert_eq!(input.get_attribute("id"), None);
        assert!(!input.get_bool_prop("disabled"));
    }

    #[test]
    fn listener_swap_replaces_the_handler() {
        let container = DomNode::create_element("div");
        let first = Arc::new(AtomicI32::new(0));
        let second = Arc::new(AtomicI32::new(0));

        let first_clone = first.clone();
        let old = h(
            "button",
            Props::new().on("click", move |_e| {
                first_clone.fetch_add(1, Ordering::SeqCst);
            }),
            (),
        );
        mount(&old, &container);

        let second_clone = second.clone();
        let new = h(
            "button",
            Props::new().on("click", move |_e| {
                second_clone.fetch_add(1, Ordering::SeqCst);
            }),
            (),
        );
        patch(&old, &new, &container);

        container.children()[0].dispatch(&Event::new("click"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn keyed_reorder_reuses_the_same_dom_nodes() {
        let container = DomNode::create_element("div");
        let keyed_item = |key: &str| h("li", Props::new().key(key), key.to_string());

        let old = h(
            "ul",
            Props::new(),
            vec![keyed_item("A"), keyed_item("B"), keyed_item("C")],
        );
        mount(&old, &container);

        let ul = container.children()[0].clone();
        let before = ul.children();

        let new = h(
            "ul",
            Props::new(),
            vec![keyed_item("C"), keyed_item("A"), keyed_item("B")],
        );
        patch(&old, &new, &container);

        let after = ul.children();
        assert_eq!(after.len(), 3);
        assert_eq!(ul.text_content(), "CAB");

        // The same three DOM nodes, moved rather than destroyed and recreated.
        assert!(after[0].ptr_eq(&before[2]));
        assert!(after[1].ptr_eq(&before[0]));
        assert!(after[2].ptr_eq(&before[1]));
    }

    #[test]
    fn keyed_diff_mounts_new_and_unmounts_missing() {
        let container = DomNode::create_element("div");
        let keyed_item = |key: &str| h("li", Props::new().key(key), key.to_string());

        let old = h(
            "ul",
            Props::new(),
            vec![keyed_item("A"), keyed_item("B"), keyed_item("C")],
        );
        mount(&old, &container);
        let ul = container.children()[0].clone();
        let b_before = ul.children()[1].clone();

        let new = h(
            "ul",
            Props::new(),
            vec![keyed_item("B"), keyed_item("D")],
        );
        patch(&old, &new, &container);

        assert_eq!(ul.text_content(), "BD");
        assert!(ul.children()[0].ptr_eq(&b_before));
    }

    #[test]
    fn positional_lists_grow_and_shrink() {
        let container = DomNode::create_element("div");
        let item = |label: &str| h("li", Props::new(), label.to_string());

        let old = h("ul", Props::new(), vec![item("a")]);
        mount(&old, &container);
        let ul = container.children()[0].clone();

        let grown = h("ul", Props::new(), vec![item("a"), item("b"), item("c")]);
        patch(&old, &grown, &container);
        assert_eq!(ul.text_content(), "abc");

        let shrunk = h("ul", Props::new(), vec![item("a")]);
        patch(&grown, &shrunk, &container);
        assert_eq!(ul.text_content(), "a");
        assert_eq!(ul.child_count(), 1);
    }

    #[test]
    fn child_appearing_in_place_of_empty_lands_in_order() {
        let container = DomNode::create_element("div");

        let old = h(
            "div",
            Props::new(),
            vec![VNode::empty(), h("span", Props::new(), "tail")],
        );
        mount(&old, &container);
        let root = container.children()[0].clone();

        let new = h(
            "div",
            Props::new(),
            vec![h("span", Props::new(), "head"), h("span", Props::new(), "tail")],
        );
        patch(&old, &new, &container);

        assert_eq!(root.text_content(), "headtail");
    }
}
