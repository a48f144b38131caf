//! Renderer
//!
//! Virtual node model plus the mount and diff/patch passes that turn a
//! render function's output into DOM mutations. A component's render
//! produces a fresh virtual tree on every run; the first run mounts it,
//! every later run patches against the previous tree.

mod mount;
mod patch;
mod props;
mod vnode;

use std::sync::Arc;

use crate::app::AppShared;
use crate::reactive::Runtime;

pub use mount::mount;
pub use patch::patch;
pub use props::{props, PropValue, Props};
pub use vnode::{h, text, Children, Tag, VNode, VNodeKind};

pub(crate) use mount::mount_node;
pub(crate) use patch::{patch_node, unmount_node};

/// Everything the renderer threads through a mount/patch pass: the runtime
/// that scheduling and state creation bind to, and the application shell
/// (when mounting under one) that provides injected values.
#[derive(Clone)]
pub(crate) struct RenderEnv {
    pub(crate) runtime: Arc<Runtime>,
    pub(crate) app: Option<Arc<AppShared>>,
}

impl RenderEnv {
    /// An environment on the ambient runtime with no application shell.
    pub(crate) fn ambient() -> Self {
        Self {
            runtime: Runtime::current(),
            app: None,
        }
    }
}
