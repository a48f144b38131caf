//! Application Bootstrap
//!
//! An [`App`] ties a root component to a runtime, carries app-scoped
//! provided values, and installs plugins. Mounting produces an
//! [`AppHandle`] that owns the root instance and exposes the tick-queue
//! flush, the "next tick" boundary deferred re-renders run at.
//!
//! Each `App` uses the runtime that was ambient when it was created, so
//! independent applications (and tests) get isolated dependency graphs by
//! constructing their apps inside [`Runtime::enter`] scopes.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::component::{Component, ComponentInstance};
use crate::dom::DomNode;
use crate::error::{FrescoError, MountError};
use crate::reactive::{Runtime, Value};
use crate::render::{Props, RenderEnv};

/// App-level state shared with every component instance mounted under the
/// app: the runtime and the provided-value table.
pub struct AppShared {
    pub(crate) runtime: Arc<Runtime>,
    provides: RwLock<IndexMap<String, Value>>,
}

impl AppShared {
    /// Look up a provided value.
    pub fn provided(&self, key: &str) -> Option<Value> {
        self.provides
            .read()
            .expect("provides lock poisoned")
            .get(key)
            .cloned()
    }
}

/// An installable extension. Plugins receive the app once, at
/// [`App::use_plugin`] time, and typically provide values or register
/// components of their own.
pub trait Plugin {
    fn install(&self, app: &App);
}

/// An application: a root component bound to a runtime.
pub struct App {
    shared: Arc<AppShared>,
    root: Arc<Component>,
}

impl App {
    /// Create an application for the given root component on the ambient
    /// runtime.
    pub fn new(root: Arc<Component>) -> Self {
        Self::with_runtime(root, Runtime::current())
    }

    /// Create an application on an explicit runtime.
    pub fn with_runtime(root: Arc<Component>, runtime: Arc<Runtime>) -> Self {
        Self {
            shared: Arc::new(AppShared {
                runtime,
                provides: RwLock::new(IndexMap::new()),
            }),
            root,
        }
    }

    /// The runtime this application schedules on.
    pub fn runtime(&self) -> Arc<Runtime> {
        self.shared.runtime.clone()
    }

    /// Provide an app-scoped value, resolvable from any component under
    /// this app via `ctx.inject(key)`.
    pub fn provide(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.shared
            .provides
            .write()
            .expect("provides lock poisoned")
            .insert(key.into(), value.into());
        self
    }

    /// Install a plugin.
    pub fn use_plugin(&self, plugin: &dyn Plugin) -> &Self {
        plugin.install(self);
        self
    }

    /// Mount the root component into `container`.
    ///
    /// Validates the container and the root component options, runs the
    /// first render synchronously, and returns the handle owning the root
    /// instance.
    pub fn mount(&self, container: &DomNode) -> Result<AppHandle, FrescoError> {
        if !container.is_element() {
            return Err(MountError::NotAnElement.into());
        }
        self.root.validate()?;

        let env = RenderEnv {
            runtime: self.shared.runtime.clone(),
            app: Some(self.shared.clone()),
        };

        let instance = ComponentInstance::new(self.root.clone(), &Props::new(), env);
        instance.mount(container, None);

        tracing::debug!(component = self.root.name(), "application mounted");

        Ok(AppHandle {
            shared: self.shared.clone(),
            instance,
        })
    }
}

/// A mounted application.
pub struct AppHandle {
    shared: Arc<AppShared>,
    instance: ComponentInstance,
}

impl AppHandle {
    /// Drain the tick queue: every component whose dependencies changed
    /// since the last flush re-renders at most once.
    pub fn flush(&self) {
        self.shared.runtime.flush();
    }

    /// The runtime this application schedules on.
    pub fn runtime(&self) -> Arc<Runtime> {
        self.shared.runtime.clone()
    }

    /// The root component instance.
    pub fn root_instance(&self) -> &ComponentInstance {
        &self.instance
    }

    /// Unmount the application: the root instance (and, recursively, every
    /// nested instance) tears down and detaches.
    pub fn unmount(&self) {
        self.instance.unmount();
    }
}

/// Create an application for the given root component. This is the
/// conventional bootstrap entry point.
pub fn create_app(root: Arc<Component>) -> App {
    App::new(root)
}
