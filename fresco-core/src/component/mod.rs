//! Component Model
//!
//! A component is an options object: a required render function plus
//! optional reactive state (`data`), named computed getters, named methods
//! (event handlers), declarative watches on state keys, and lifecycle
//! hooks. The options shape is what template compilers and hand-written
//! setup code both produce; this crate only requires that `render` take the
//! component context and return a virtual tree.
//!
//! Components are matched across renders by handle identity: build one with
//! [`Component::build`] and clone the `Arc` into every place it is used.

mod instance;

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::app::AppShared;
use crate::dom::{Event, EventHandler};
use crate::error::ComponentError;
use crate::reactive::{Computed, Store, Value};
use crate::render::VNode;

pub use instance::{ComponentInstance, LifecycleStage};

/// A lifecycle hook.
pub type HookFn = Arc<dyn Fn(&ComponentCtx) + Send + Sync>;

/// A named method: an event handler with access to the component context.
pub type MethodFn = Arc<dyn Fn(&ComponentCtx, &Event) + Send + Sync>;

type RenderFn = Arc<dyn Fn(&ComponentCtx) -> VNode + Send + Sync>;
type DataFn = Arc<dyn Fn() -> Value + Send + Sync>;
type ComputedGetter = Arc<dyn Fn(&Store) -> Value + Send + Sync>;
type WatchFn = Arc<dyn Fn(&ComponentCtx, &Value, Option<&Value>) + Send + Sync>;

/// The lifecycle hook slots of a component.
#[derive(Default, Clone)]
pub(crate) struct LifecycleHooks {
    pub(crate) before_mount: Option<HookFn>,
    pub(crate) mounted: Option<HookFn>,
    pub(crate) before_update: Option<HookFn>,
    pub(crate) updated: Option<HookFn>,
    pub(crate) before_unmount: Option<HookFn>,
    pub(crate) unmounted: Option<HookFn>,
}

/// A component definition (options object).
pub struct Component {
    name: String,
    pub(crate) render: RenderFn,
    pub(crate) data: Option<DataFn>,
    pub(crate) computed: IndexMap<String, ComputedGetter>,
    pub(crate) methods: IndexMap<String, MethodFn>,
    pub(crate) watches: Vec<(String, WatchFn)>,
    pub(crate) hooks: LifecycleHooks,
}

impl Component {
    /// Start a component definition. The render function is the one
    /// required capability; everything else is optional.
    pub fn new(
        name: impl Into<String>,
        render: impl Fn(&ComponentCtx) -> VNode + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            render: Arc::new(render),
            data: None,
            computed: IndexMap::new(),
            methods: IndexMap::new(),
            watches: Vec::new(),
            hooks: LifecycleHooks::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reactive local state initializer. Must return a map value; each key
    /// becomes an independently tracked slot of the instance's state store.
    pub fn data(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.data = Some(Arc::new(f));
        self
    }

    /// Register a named computed getter over the state store.
    pub fn computed(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&Store) -> Value + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        if self.computed.insert(name.clone(), Arc::new(getter)).is_some() {
            tracing::warn!(component = %self.name, name = %name, "computed getter redefined");
        }
        self
    }

    /// Register a named method usable as an event handler via
    /// [`ComponentCtx::handler`].
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&ComponentCtx, &Event) + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        if self.methods.insert(name.clone(), Arc::new(f)).is_some() {
            tracing::warn!(component = %self.name, name = %name, "method redefined");
        }
        self
    }

    /// Watch one state key; the callback receives the new and previous
    /// value whenever it changes after mount.
    pub fn watch(
        mut self,
        key: impl Into<String>,
        f: impl Fn(&ComponentCtx, &Value, Option<&Value>) + Send + Sync + 'static,
    ) -> Self {
        self.watches.push((key.into(), Arc::new(f)));
        self
    }

    pub fn on_before_mount(mut self, f: impl Fn(&ComponentCtx) + Send + Sync + 'static) -> Self {
        self.hooks.before_mount = Some(Arc::new(f));
        self
    }

    pub fn on_mounted(mut self, f: impl Fn(&ComponentCtx) + Send + Sync + 'static) -> Self {
        self.hooks.mounted = Some(Arc::new(f));
        self
    }

    pub fn on_before_update(mut self, f: impl Fn(&ComponentCtx) + Send + Sync + 'static) -> Self {
        self.hooks.before_update = Some(Arc::new(f));
        self
    }

    pub fn on_updated(mut self, f: impl Fn(&ComponentCtx) + Send + Sync + 'static) -> Self {
        self.hooks.updated = Some(Arc::new(f));
        self
    }

    pub fn on_before_unmount(mut self, f: impl Fn(&ComponentCtx) + Send + Sync + 'static) -> Self {
        self.hooks.before_unmount = Some(Arc::new(f));
        self
    }

    pub fn on_unmounted(mut self, f: impl Fn(&ComponentCtx) + Send + Sync + 'static) -> Self {
        self.hooks.unmounted = Some(Arc::new(f));
        self
    }

    /// Check the options for authoring mistakes. Runs at registration time
    /// (application mount), not at arbitrary call sites.
    pub fn validate(&self) -> Result<(), ComponentError> {
        for (name, _) in self.computed.iter() {
            if name.is_empty() {
                return Err(ComponentError::InvalidOptions {
                    component: self.name.clone(),
                    reason: "computed getter with an empty name".into(),
                });
            }
        }
        for (name, _) in self.methods.iter() {
            if name.is_empty() {
                return Err(ComponentError::InvalidOptions {
                    component: self.name.clone(),
                    reason: "method with an empty name".into(),
                });
            }
        }
        for (key, _) in &self.watches {
            if key.is_empty() {
                return Err(ComponentError::InvalidOptions {
                    component: self.name.clone(),
                    reason: "watch on an empty state key".into(),
                });
            }
        }
        Ok(())
    }

    /// Finish the definition as a shareable handle.
    pub fn build(self) -> Arc<Component> {
        Arc::new(self)
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("computed", &self.computed.len())
            .field("methods", &self.methods.len())
            .field("watches", &self.watches.len())
            .finish()
    }
}

struct CtxInner {
    name: String,
    state: Store,
    props: Store,
    /// Event handlers passed down by the parent, keyed by event name.
    listeners: RwLock<IndexMap<String, EventHandler>>,
    computed: RwLock<IndexMap<String, Computed<Value>>>,
    methods: IndexMap<String, MethodFn>,
    app: Option<Arc<AppShared>>,
}

/// The per-instance context handed to render functions, methods, watches,
/// and lifecycle hooks.
#[derive(Clone)]
pub struct ComponentCtx {
    inner: Arc<CtxInner>,
}

impl ComponentCtx {
    pub(crate) fn new(
        name: String,
        state: Store,
        props: Store,
        listeners: IndexMap<String, EventHandler>,
        methods: IndexMap<String, MethodFn>,
        app: Option<Arc<AppShared>>,
    ) -> Self {
        Self {
            inner: Arc::new(CtxInner {
                name,
                state,
                props,
                listeners: RwLock::new(listeners),
                computed: RwLock::new(IndexMap::new()),
                methods,
                app,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The reactive state store.
    pub fn state(&self) -> Store {
        self.inner.state.clone()
    }

    /// The reactive props store (data props forwarded by the parent).
    pub fn props(&self) -> Store {
        self.inner.props.clone()
    }

    /// Read one state key (tracked).
    pub fn get(&self, key: &str) -> Value {
        self.inner.state.get(key)
    }

    /// Write one state key.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.inner.state.set(key, value);
    }

    /// Read one data prop (tracked).
    pub fn prop(&self, key: &str) -> Value {
        self.inner.props.get(key)
    }

    /// An event handler passed down by the parent, by event name.
    pub fn prop_handler(&self, event: &str) -> Option<EventHandler> {
        self.inner
            .listeners
            .read()
            .expect("listeners lock poisoned")
            .get(event)
            .cloned()
    }

    /// Read a named computed value (tracked, cached).
    pub fn computed(&self, name: &str) -> Value {
        let computed = {
            self.inner
                .computed
                .read()
                .expect("computed lock poisoned")
                .get(name)
                .cloned()
        };

        match computed {
            Some(computed) => computed.get(),
            None => {
                tracing::warn!(component = %self.inner.name, name = %name, "unknown computed");
                Value::Null
            }
        }
    }

    /// A named method wrapped as an event handler for use in props.
    pub fn handler(&self, name: &str) -> Option<EventHandler> {
        let method = self.inner.methods.get(name).cloned()?;
        let ctx = self.clone();
        Some(Arc::new(move |event: &Event| method(&ctx, event)))
    }

    /// Invoke a named method directly.
    pub fn call(&self, name: &str, event: &Event) {
        match self.inner.methods.get(name) {
            Some(method) => method(self, event),
            None => tracing::warn!(component = %self.inner.name, name = %name, "unknown method"),
        }
    }

    /// Resolve an application-provided value.
    pub fn inject(&self, key: &str) -> Option<Value> {
        self.inner.app.as_ref().and_then(|app| app.provided(key))
    }

    pub(crate) fn install_computed(&self, name: String, computed: Computed<Value>) {
        self.inner
            .computed
            .write()
            .expect("computed lock poisoned")
            .insert(name, computed);
    }

    pub(crate) fn replace_listeners(&self, listeners: IndexMap<String, EventHandler>) {
        *self
            .inner
            .listeners
            .write()
            .expect("listeners lock poisoned") = listeners;
    }

    pub(crate) fn stop_computed(&self) {
        let computed = self.inner.computed.read().expect("computed lock poisoned");
        for (_, c) in computed.iter() {
            c.stop();
        }
    }
}

impl std::fmt::Debug for ComponentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCtx")
            .field("name", &self.inner.name)
            .finish()
    }
}
