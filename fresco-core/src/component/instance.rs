//! Component Instance Lifecycle
//!
//! An instance binds a component definition to live state: its reactive
//! stores, its computed values and watchers, its current virtual tree and
//! DOM position, and the render effect that re-renders it when state it
//! read changes.
//!
//! Stage machine:
//!
//! ```text
//! Unmounted → Mounting → Mounted → Updating (⟲ Mounted) → Unmounting → Unmounted
//! ```
//!
//! The render effect's scheduler enqueues the instance's update into the
//! runtime tick queue keyed by the effect's subscriber ID, so any number of
//! synchronous mutations coalesce into at most one render+patch per flush.
//!
//! A panicking render is caught at this boundary: the failure is logged,
//! the previous tree is retained, and sibling components are untouched.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::dom::{DomNode, EventHandler};
use crate::reactive::{watch, Computed, Effect, Store, Value, WatchHandle, WatchOptions};
use crate::render::{mount_node, patch_node, unmount_node, Props, RenderEnv, VNode};

use super::{Component, ComponentCtx, HookFn};

/// Where an instance is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Unmounted,
    Mounting,
    Mounted,
    Updating,
    Unmounting,
}

struct InstanceInner {
    component: Arc<Component>,
    ctx: ComponentCtx,
    env: RenderEnv,
    stage: RwLock<LifecycleStage>,
    tree: RwLock<Option<VNode>>,
    container: RwLock<Option<DomNode>>,
    anchor: RwLock<Option<DomNode>>,
    render_effect: RwLock<Option<Effect>>,
    watch_handles: RwLock<Vec<WatchHandle>>,
}

/// A live component instance. Clones share the instance.
#[derive(Clone)]
pub struct ComponentInstance {
    inner: Arc<InstanceInner>,
}

impl ComponentInstance {
    /// Create an instance from a definition and the props its parent
    /// passed. Nothing renders until [`ComponentInstance::mount`].
    pub(crate) fn new(component: Arc<Component>, props: &Props, env: RenderEnv) -> Self {
        // State, stores, and computed values all bind to the instance's
        // runtime, not whatever is ambient at the call site.
        let _scope = env.runtime.enter();

        if let Err(err) = component.validate() {
            tracing::error!(component = component.name(), %err, "invalid component options");
        }

        let data_value = component
            .data
            .as_ref()
            .map(|f| f())
            .unwrap_or_else(|| Value::Map(IndexMap::new()));
        let state_entries = match data_value {
            Value::Map(entries) => entries,
            other => {
                tracing::warn!(
                    component = component.name(),
                    kind = other.type_name(),
                    "data() must return a map value; starting with empty state"
                );
                IndexMap::new()
            }
        };
        let state = Store::from_map(state_entries);

        let (data_props, listeners) = split_props(props);
        let props_store = Store::from_map(data_props);

        let ctx = ComponentCtx::new(
            component.name().to_string(),
            state.clone(),
            props_store,
            listeners,
            component.methods.clone(),
            env.app.clone(),
        );

        for (name, getter) in component.computed.iter() {
            let state = state.clone();
            let getter = getter.clone();
            let computed = Computed::new(move || getter(&state));
            ctx.install_computed(name.clone(), computed);
        }

        Self {
            inner: Arc::new(InstanceInner {
                component,
                ctx,
                env,
                stage: RwLock::new(LifecycleStage::Unmounted),
                tree: RwLock::new(None),
                container: RwLock::new(None),
                anchor: RwLock::new(None),
                render_effect: RwLock::new(None),
                watch_handles: RwLock::new(Vec::new()),
            }),
        }
    }

    /// First render: run the render effect once, attach the produced tree
    /// into `container` (before `anchor` when given), and fire the mount
    /// hooks. A no-op (with a warning) unless the instance is unmounted.
    pub(crate) fn mount(&self, container: &DomNode, anchor: Option<&DomNode>) {
        {
            let stage = *self.inner.stage.read().expect("stage lock poisoned");
            if stage != LifecycleStage::Unmounted {
                tracing::warn!(
                    component = self.inner.component.name(),
                    ?stage,
                    "mount() on an instance that is not unmounted; ignoring"
                );
                return;
            }
        }

        let _scope = self.inner.env.runtime.enter();

        *self.inner.container.write().expect("container lock poisoned") = Some(container.clone());
        *self.inner.anchor.write().expect("anchor lock poisoned") = anchor.cloned();
        self.set_stage(LifecycleStage::Mounting);

        self.run_hook(&self.inner.component.hooks.before_mount);

        // Declarative watches live for exactly the mounted lifetime.
        for (key, callback) in &self.inner.component.watches {
            let state = self.inner.ctx.state();
            let key = key.clone();
            let source = move || state.get(&key);

            let ctx = self.inner.ctx.clone();
            let callback = callback.clone();
            let handle = watch(
                source,
                move |new: &Value, old: Option<&Value>| callback(&ctx, new, old),
                WatchOptions::default(),
            );
            self.inner
                .watch_handles
                .write()
                .expect("watch handles lock poisoned")
                .push(handle);
        }

        // The render effect: its first run mounts the tree; later runs are
        // deferred through the tick queue, at most one per flush.
        let this = self.clone();
        let run = move || this.render_and_sync();

        let runtime = self.inner.env.runtime.clone();
        let scheduler = move |fx: &Effect| {
            let fx = fx.clone();
            runtime.enqueue(fx.id().raw(), move || fx.run());
        };

        let effect = Effect::with_scheduler(run, scheduler);
        *self
            .inner
            .render_effect
            .write()
            .expect("render effect lock poisoned") = Some(effect);

        self.set_stage(LifecycleStage::Mounted);
        self.run_hook(&self.inner.component.hooks.mounted);
    }

    /// One render pass: produce a fresh tree and mount or patch it.
    ///
    /// Runs inside the render effect, so every reactive read the render
    /// makes subscribes the effect.
    fn render_and_sync(&self) {
        {
            let stage = *self.inner.stage.read().expect("stage lock poisoned");
            if matches!(
                stage,
                LifecycleStage::Unmounting | LifecycleStage::Unmounted
            ) {
                return;
            }
        }

        let _scope = self.inner.env.runtime.enter();

        let Some(container) = self
            .inner
            .container
            .read()
            .expect("container lock poisoned")
            .clone()
        else {
            return;
        };
        let anchor = self.inner.anchor.read().expect("anchor lock poisoned").clone();

        let is_update = self.inner.tree.read().expect("tree lock poisoned").is_some();
        if is_update {
            self.set_stage(LifecycleStage::Updating);
            self.run_hook(&self.inner.component.hooks.before_update);
        }

        let component = self.inner.component.clone();
        let ctx = self.inner.ctx.clone();
        let rendered = catch_unwind(AssertUnwindSafe(|| (component.render)(&ctx)));

        let vnode = match rendered {
            Ok(vnode) => vnode,
            Err(_) => {
                // Contained failure: this subtree keeps its previous DOM;
                // siblings and ancestors are unaffected.
                tracing::error!(
                    component = component.name(),
                    "render panicked; previous tree retained"
                );
                if is_update {
                    self.set_stage(LifecycleStage::Mounted);
                }
                return;
            }
        };

        if is_update {
            let old = self
                .inner
                .tree
                .read()
                .expect("tree lock poisoned")
                .clone()
                .expect("updating instance must have a previous tree");
            patch_node(&self.inner.env, &old, &vnode, &container, anchor.as_ref());
            *self.inner.tree.write().expect("tree lock poisoned") = Some(vnode);
            self.set_stage(LifecycleStage::Mounted);
            self.run_hook(&self.inner.component.hooks.updated);
        } else {
            mount_node(&self.inner.env, &vnode, &container, anchor.as_ref());
            *self.inner.tree.write().expect("tree lock poisoned") = Some(vnode);
        }
    }

    /// Forward the props of a new render from the parent. Data props land
    /// in the reactive props store (so the instance re-renders if it read
    /// them); handler props replace the listener table.
    pub(crate) fn update_props(&self, new_props: &Props) {
        let _scope = self.inner.env.runtime.enter();

        let (data, listeners) = split_props(new_props);
        let props_store = self.inner.ctx.props();

        for key in props_store.keys_untracked() {
            if !data.contains_key(&key) {
                props_store.remove(&key);
            }
        }
        for (key, value) in data {
            props_store.set(&key, value);
        }

        self.inner.ctx.replace_listeners(listeners);
    }

    /// Tear the instance down: run the unmount hooks, stop the render
    /// effect, watchers, and computed values (releasing every dependency
    /// edge), and detach the DOM. Idempotent; nested instances in the tree
    /// unmount recursively.
    pub fn unmount(&self) {
        {
            let stage = *self.inner.stage.read().expect("stage lock poisoned");
            if matches!(
                stage,
                LifecycleStage::Unmounting | LifecycleStage::Unmounted
            ) {
                return;
            }
        }

        let _scope = self.inner.env.runtime.enter();

        self.set_stage(LifecycleStage::Unmounting);
        self.run_hook(&self.inner.component.hooks.before_unmount);

        // Stopping is graph-edge removal: after this, no former dependency
        // can reach the instance again. Taking the effect also breaks the
        // instance ↔ effect reference cycle.
        if let Some(effect) = self
            .inner
            .render_effect
            .write()
            .expect("render effect lock poisoned")
            .take()
        {
            effect.stop();
        }
        for handle in self
            .inner
            .watch_handles
            .write()
            .expect("watch handles lock poisoned")
            .drain(..)
        {
            handle.stop();
        }
        self.inner.ctx.stop_computed();

        let tree = self.inner.tree.write().expect("tree lock poisoned").take();
        let container = self
            .inner
            .container
            .write()
            .expect("container lock poisoned")
            .take();
        if let (Some(tree), Some(container)) = (tree, container) {
            unmount_node(&tree, &container);
        }
        *self.inner.anchor.write().expect("anchor lock poisoned") = None;

        self.set_stage(LifecycleStage::Unmounted);
        self.run_hook(&self.inner.component.hooks.unmounted);
    }

    fn set_stage(&self, stage: LifecycleStage) {
        *self.inner.stage.write().expect("stage lock poisoned") = stage;
    }

    fn run_hook(&self, hook: &Option<HookFn>) {
        if let Some(hook) = hook {
            hook(&self.inner.ctx);
        }
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> LifecycleStage {
        *self.inner.stage.read().expect("stage lock poisoned")
    }

    pub fn is_mounted(&self) -> bool {
        matches!(
            self.stage(),
            LifecycleStage::Mounted | LifecycleStage::Updating
        )
    }

    /// The instance context (state, props, computed, methods).
    pub fn ctx(&self) -> &ComponentCtx {
        &self.inner.ctx
    }

    /// The instance's reactive state store.
    pub fn state(&self) -> Store {
        self.inner.ctx.state()
    }

    /// The DOM node at the root of the instance's current tree, if any.
    pub fn root_dom(&self) -> Option<DomNode> {
        self.inner
            .tree
            .read()
            .expect("tree lock poisoned")
            .as_ref()
            .and_then(VNode::dom)
    }

    /// How many times the instance has rendered.
    pub fn render_count(&self) -> usize {
        self.inner
            .render_effect
            .read()
            .expect("render effect lock poisoned")
            .as_ref()
            .map_or(0, Effect::run_count)
    }

    /// Whether two handles refer to the same instance.
    pub fn ptr_eq(&self, other: &ComponentInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ComponentInstance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("component", &self.inner.component.name())
            .field("stage", &self.stage())
            .finish()
    }
}

/// Split raw props into data values (for the props store) and event
/// handlers (for the listener table), keyed by event name.
fn split_props(props: &Props) -> (IndexMap<String, Value>, IndexMap<String, EventHandler>) {
    let mut data = IndexMap::new();
    let mut listeners = IndexMap::new();

    for (name, value) in props.iter() {
        if let Some(handler) = value.as_handler() {
            match name.strip_prefix("on") {
                Some(event) => {
                    listeners.insert(event.to_string(), handler.clone());
                }
                None => {
                    tracing::warn!(name = %name, "handler prop without an on* name; ignoring");
                }
            }
            continue;
        }
        if let Some(v) = value.to_value() {
            data.insert(name.clone(), v);
        }
    }

    (data, listeners)
}
