//! Error Taxonomy
//!
//! The fallible public surface is small by design: tracking misuse degrades
//! to untracked reads, invalid reactive targets warn and pass through, and
//! render failures are contained per component instance. What remains
//! (mounting into an unusable container, structurally invalid component
//! options) surfaces here.

use thiserror::Error;

/// Errors from mounting an application.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    /// The mount container must be an element node, not a text node.
    #[error("mount container must be an element node")]
    NotAnElement,
}

/// Errors from validating a component definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComponentError {
    /// The options object is structurally invalid.
    #[error("component `{component}` has invalid options: {reason}")]
    InvalidOptions { component: String, reason: String },
}

/// Top-level error type of the framework core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrescoError {
    #[error(transparent)]
    Mount(#[from] MountError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}
