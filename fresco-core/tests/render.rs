//! Integration Tests for the Renderer and Component Lifecycle
//!
//! End-to-end scenarios: mounting an application, reactive re-renders
//! through the coalescing scheduler, patch minimality against the DOM
//! tree, component teardown, and failure containment.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use fresco_core::prelude::*;

/// Build an app on an isolated runtime so parallel tests never share a
/// tick queue.
fn mounted_app(root: Arc<Component>) -> (Document, AppHandle) {
    let runtime = Runtime::new();
    let document = Document::new();
    let app = App::with_runtime(root, runtime);
    let handle = app.mount(document.body()).expect("mount failed");
    (document, handle)
}

/// Mount, mutate, flush: the text updates in place and the root element
/// keeps its identity.
#[test]
fn state_change_patches_text_without_replacing_the_root() {
    let counter = Component::new("counter", |ctx| {
        h("div", Props::new(), ctx.get("n").to_string())
    })
    .data(|| map_value([("n", 0)]))
    .build();

    let (document, handle) = mounted_app(counter);
    assert_eq!(document.body().text_content(), "0");

    let root_before = document.body().children()[0].clone();

    handle.root_instance().state().set("n", 5);
    handle.flush();

    assert_eq!(document.body().text_content(), "5");
    let root_after = document.body().children()[0].clone();
    assert!(root_before.ptr_eq(&root_after));
}

/// Several synchronous writes coalesce into exactly one render+patch pass
/// per flush, reflecting the final state.
#[test]
fn mutations_within_one_tick_produce_one_patch() {
    let view = Component::new("view", |ctx| {
        h(
            "p",
            Props::new(),
            format!("{}-{}", ctx.get("a"), ctx.get("b")),
        )
    })
    .data(|| map_value([("a", 0), ("b", 0)]))
    .build();

    let (document, handle) = mounted_app(view);
    let instance = handle.root_instance().clone();
    assert_eq!(instance.render_count(), 1);

    let state = instance.state();
    state.set("a", 1);
    state.set("a", 2);
    state.set("b", 9);

    // Nothing rendered yet; the writes are pending as one job.
    assert_eq!(instance.render_count(), 1);
    assert_eq!(document.body().text_content(), "0-0");

    handle.flush();
    assert_eq!(instance.render_count(), 2);
    assert_eq!(document.body().text_content(), "2-9");

    // An idle flush does not render.
    handle.flush();
    assert_eq!(instance.render_count(), 2);
}

/// A write equal to the current value schedules nothing at all.
#[test]
fn equal_state_write_schedules_no_render() {
    let view = Component::new("view", |ctx| {
        h("div", Props::new(), ctx.get("n").to_string())
    })
    .data(|| map_value([("n", 7)]))
    .build();

    let (_document, handle) = mounted_app(view);
    let instance = handle.root_instance().clone();

    instance.state().set("n", 7);
    handle.flush();

    assert_eq!(instance.render_count(), 1);
}

/// An event handler drives the full loop: dispatch → state write →
/// deferred render → patched DOM.
#[test]
fn click_handler_updates_the_dom_after_flush() {
    let counter = Component::new("counter", |ctx| {
        let state = ctx.state();
        h(
            "button",
            Props::new().on("click", move |_e| {
                let n = state.get_untracked("n").as_int().unwrap_or(0);
                state.set("n", n + 1);
            }),
            ctx.get("n").to_string(),
        )
    })
    .data(|| map_value([("n", 0)]))
    .build();

    let (document, handle) = mounted_app(counter);
    let button = document.body().children()[0].clone();

    button.dispatch(&Event::new("click"));
    button.dispatch(&Event::new("click"));
    handle.flush();

    assert_eq!(document.body().text_content(), "2");
    // Same button element after the patch.
    assert!(document.body().children()[0].ptr_eq(&button));
}

/// Named methods wired through ctx.handler() behave like inline closures.
#[test]
fn component_methods_serve_as_event_handlers() {
    let counter = Component::new("counter", |ctx| {
        let increment = ctx.handler("increment").expect("method exists");
        h(
            "button",
            Props::new().attr("onclick", increment),
            ctx.get("n").to_string(),
        )
    })
    .data(|| map_value([("n", 0)]))
    .method("increment", |ctx, _event| {
        let n = ctx.state().get_untracked("n").as_int().unwrap_or(0);
        ctx.set("n", n + 1);
    })
    .build();

    let (document, handle) = mounted_app(counter);

    document.body().children()[0].dispatch(&Event::new("click"));
    handle.flush();

    assert_eq!(document.body().text_content(), "1");
}

/// Named computed getters are cached per instance and recompute after
/// their state dependencies change.
#[test]
fn component_computed_values_cache_and_refresh() {
    let calls = Arc::new(AtomicI32::new(0));

    let calls_clone = calls.clone();
    let view = Component::new("view", |ctx| {
        // Read the computed twice in one render: one getter run.
        let a = ctx.computed("double");
        let _again = ctx.computed("double");
        h("div", Props::new(), a.to_string())
    })
    .data(|| map_value([("n", 3)]))
    .computed("double", move |state| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        Value::Int(state.get("n").as_int().unwrap_or(0) * 2)
    })
    .build();

    let (document, handle) = mounted_app(view);
    assert_eq!(document.body().text_content(), "6");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    handle.root_instance().state().set("n", 10);
    handle.flush();

    assert_eq!(document.body().text_content(), "20");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Declarative watches observe state keys with previous values threaded
/// across cycles.
#[test]
fn component_watch_reports_transitions() {
    let log: Arc<Mutex<Vec<(i64, Option<i64>)>>> = Arc::new(Mutex::new(Vec::new()));

    let log_clone = log.clone();
    let view = Component::new("view", |ctx| {
        h("div", Props::new(), ctx.get("n").to_string())
    })
    .data(|| map_value([("n", 0)]))
    .watch("n", move |_ctx, new, old| {
        log_clone.lock().unwrap().push((
            new.as_int().unwrap_or(-1),
            old.and_then(Value::as_int),
        ));
    })
    .build();

    let (_document, handle) = mounted_app(view);

    let state = handle.root_instance().state();
    state.set("n", 1);
    state.set("n", 2);

    assert_eq!(*log.lock().unwrap(), vec![(1, Some(0)), (2, Some(1))]);
}

/// Lifecycle hooks fire in the documented order through mount, update,
/// and unmount.
#[test]
fn lifecycle_hooks_fire_in_order() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let push = |log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str| {
        let log = log.clone();
        move |_ctx: &ComponentCtx| log.lock().unwrap().push(label)
    };

    let view = Component::new("view", |ctx| {
        h("div", Props::new(), ctx.get("n").to_string())
    })
    .data(|| map_value([("n", 0)]))
    .on_before_mount(push(&log, "before_mount"))
    .on_mounted(push(&log, "mounted"))
    .on_before_update(push(&log, "before_update"))
    .on_updated(push(&log, "updated"))
    .on_before_unmount(push(&log, "before_unmount"))
    .on_unmounted(push(&log, "unmounted"))
    .build();

    let (_document, handle) = mounted_app(view);
    assert_eq!(*log.lock().unwrap(), vec!["before_mount", "mounted"]);

    handle.root_instance().state().set("n", 1);
    handle.flush();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before_mount", "mounted", "before_update", "updated"]
    );

    handle.unmount();
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "before_mount",
            "mounted",
            "before_update",
            "updated",
            "before_unmount",
            "unmounted"
        ]
    );
    assert_eq!(handle.root_instance().stage(), LifecycleStage::Unmounted);
}

/// Unmounting releases every subscription the instance held: external
/// reactive sources end up with zero subscribers and later writes are
/// inert.
#[test]
fn unmount_releases_all_subscriptions() {
    let runtime = Runtime::new();
    let _scope = runtime.enter();

    let title = signal(String::from("hello"));

    let title_clone = title.clone();
    let view = Component::new("view", move |_ctx| {
        h("h1", Props::new(), title_clone.get())
    })
    .build();

    let document = Document::new();
    let app = App::with_runtime(view, runtime.clone());
    let handle = app.mount(document.body()).expect("mount failed");

    assert_eq!(title.subscriber_count(), 1);
    assert_eq!(document.body().text_content(), "hello");

    handle.unmount();

    assert_eq!(title.subscriber_count(), 0);
    assert_eq!(document.body().child_count(), 0);

    // Writes after teardown reach nobody and re-render nothing.
    title.set(String::from("gone"));
    runtime.flush();
    assert_eq!(document.body().child_count(), 0);
}

/// Parent → child: data props forward into the child's reactive props
/// store, and prop changes re-render the child.
#[test]
fn child_component_receives_and_tracks_props() {
    let badge = Component::new("badge", |ctx| {
        h("span", Props::new(), ctx.prop("label").to_string())
    })
    .build();

    let badge_for_parent = badge.clone();
    let parent = Component::new("parent", move |ctx| {
        h(
            "div",
            Props::new(),
            vec![h(
                &badge_for_parent,
                Props::new().attr("label", ctx.get("title").to_string()),
                (),
            )],
        )
    })
    .data(|| map_value([("title", "alpha")]))
    .build();

    let (document, handle) = mounted_app(parent);
    assert_eq!(document.body().text_content(), "alpha");

    let span_before = {
        let div = document.body().children()[0].clone();
        div.children()[0].clone()
    };

    handle.root_instance().state().set("title", "beta");
    handle.flush();

    assert_eq!(document.body().text_content(), "beta");
    // The child's element was patched, not rebuilt.
    let span_after = {
        let div = document.body().children()[0].clone();
        div.children()[0].clone()
    };
    assert!(span_before.ptr_eq(&span_after));
}

/// Removing a child subtree from the rendered output unmounts the nested
/// component instance (its hooks run and its subscriptions drop).
#[test]
fn removed_child_component_is_unmounted() {
    let unmounts = Arc::new(AtomicI32::new(0));

    let unmounts_clone = unmounts.clone();
    let child = Component::new("child", |_ctx| h("p", Props::new(), "child"))
        .on_unmounted(move |_ctx| {
            unmounts_clone.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let child_for_parent = child.clone();
    let parent = Component::new("parent", move |ctx| {
        let show = ctx.get("show") == Value::Bool(true);
        let inner = if show {
            h(&child_for_parent, Props::new(), ())
        } else {
            VNode::empty()
        };
        h("div", Props::new(), vec![inner])
    })
    .data(|| map_value([("show", true)]))
    .build();

    let (document, handle) = mounted_app(parent);
    assert_eq!(document.body().text_content(), "child");

    handle.root_instance().state().set("show", false);
    handle.flush();

    assert_eq!(unmounts.load(Ordering::SeqCst), 1);
    assert_eq!(document.body().text_content(), "");
}

/// A keyed list driven by component state reorders by moving the existing
/// DOM nodes.
#[test]
fn keyed_list_reorder_reuses_dom_nodes() {
    let list = Component::new("list", |ctx| {
        let order = ctx.get("order").to_string();
        let items: Vec<VNode> = order
            .chars()
            .map(|c| h("li", Props::new().key(c.to_string()), c.to_string()))
            .collect();
        h("ul", Props::new(), items)
    })
    .data(|| map_value([("order", "ABC")]))
    .build();

    let (document, handle) = mounted_app(list);
    let ul = document.body().children()[0].clone();
    let before = ul.children();
    assert_eq!(ul.text_content(), "ABC");

    handle.root_instance().state().set("order", "CAB");
    handle.flush();

    let after = ul.children();
    assert_eq!(ul.text_content(), "CAB");
    assert!(after[0].ptr_eq(&before[2]));
    assert!(after[1].ptr_eq(&before[0]));
    assert!(after[2].ptr_eq(&before[1]));
}

/// A panicking render is contained to its own component: the previous tree
/// stays up and sibling components keep updating.
#[test]
fn render_panic_is_contained_to_one_component() {
    let runtime = Runtime::new();
    let _scope = runtime.enter();

    let poison = signal(false);
    let counter = signal(0);

    let poison_clone = poison.clone();
    let fragile = Component::new("fragile", move |_ctx| {
        if poison_clone.get() {
            panic!("render failure");
        }
        h("em", Props::new(), "fragile-ok")
    })
    .build();

    let counter_clone = counter.clone();
    let steady = Component::new("steady", move |_ctx| {
        h("strong", Props::new(), counter_clone.get().to_string())
    })
    .build();

    let (fragile_c, steady_c) = (fragile.clone(), steady.clone());
    let parent = Component::new("parent", move |_ctx| {
        h(
            "div",
            Props::new(),
            vec![
                h(&fragile_c, Props::new(), ()),
                h(&steady_c, Props::new(), ()),
            ],
        )
    })
    .build();

    let document = Document::new();
    let app = App::with_runtime(parent, runtime.clone());
    let _handle = app.mount(document.body()).expect("mount failed");
    assert_eq!(document.body().text_content(), "fragile-ok0");

    // Poison the fragile component; its render panics during the flush but
    // the previous subtree is retained.
    poison.set(true);
    runtime.flush();
    assert!(document.body().text_content().contains("fragile-ok"));

    // The sibling keeps rendering normally afterwards.
    counter.set(5);
    runtime.flush();
    assert_eq!(document.body().text_content(), "fragile-ok5");
}

/// Provided values resolve through ctx.inject, including values provided
/// by plugins.
#[test]
fn provide_and_plugins_reach_components() {
    struct ThemePlugin;

    impl Plugin for ThemePlugin {
        fn install(&self, app: &App) {
            app.provide("theme", "dark");
        }
    }

    let view = Component::new("view", |ctx| {
        let theme = ctx.inject("theme").unwrap_or(Value::Null);
        let greeting = ctx.inject("greeting").unwrap_or(Value::Null);
        h("div", Props::new(), format!("{theme}:{greeting}"))
    })
    .build();

    let runtime = Runtime::new();
    let document = Document::new();
    let app = App::with_runtime(view, runtime);
    app.provide("greeting", "hi");
    app.use_plugin(&ThemePlugin);

    let _handle = app.mount(document.body()).expect("mount failed");
    assert_eq!(document.body().text_content(), "dark:hi");
}

/// Mounting into a text node is rejected with a mount error.
#[test]
fn mounting_into_a_text_node_fails() {
    let view = Component::new("view", |_ctx| h("div", Props::new(), ())).build();

    let app = App::new(view);
    let text_node = DomNode::create_text("not a container");

    let err = app.mount(&text_node).err();
    assert_eq!(err, Some(FrescoError::Mount(MountError::NotAnElement)));
}

/// Conditional children toggle between empty and real nodes without
/// disturbing their siblings.
#[test]
fn conditional_children_toggle_cleanly() {
    let view = Component::new("view", |ctx| {
        let show = ctx.get("show") == Value::Bool(true);
        let banner = if show {
            h("span", Props::new(), "banner")
        } else {
            VNode::empty()
        };
        h("div", Props::new(), vec![banner, h("p", Props::new(), "body")])
    })
    .data(|| map_value([("show", false)]))
    .build();

    let (document, handle) = mounted_app(view);
    let div = document.body().children()[0].clone();
    assert_eq!(div.text_content(), "body");
    let p_before = div.children()[0].clone();

    handle.root_instance().state().set("show", true);
    handle.flush();
    assert_eq!(div.text_content(), "bannerbody");
    // The paragraph kept its identity and the banner landed before it.
    assert!(div.children()[1].ptr_eq(&p_before));

    handle.root_instance().state().set("show", false);
    handle.flush();
    assert_eq!(div.text_content(), "body");
    assert!(div.children()[0].ptr_eq(&p_before));
}
