//! DOM Backend
//!
//! The in-process DOM tree the renderer mutates, plus the synchronous event
//! model element listeners are invoked through. The host shell embedding
//! fresco bridges this tree to a real display surface; within the crate it
//! is the concrete render target.

mod event;
mod node;

pub use event::{handler, Event, EventHandler};
pub use node::{Document, DomNode};
