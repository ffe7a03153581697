//! Error types for resource-tree management and configuration.
//!
//! The per-element reservation protocol never returns these: it reports
//! "not alive" and "does not fit" as plain `bool`/`Option` outcomes. These
//! errors cover tree topology changes, multi-level admission and config.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// An element with this id is already registered.
    #[error("duplicate element: {0}")]
    DuplicateElement(String),
    /// No element with this id is registered.
    #[error("unknown element: {0}")]
    UnknownElement(String),
    /// The requested parent cannot own the child.
    #[error("invalid parent for `{child}`: {reason}")]
    InvalidParent {
        /// Child element id.
        child: String,
        /// Why the link was refused.
        reason: String,
    },
    /// The element still has attached children.
    #[error("element `{0}` still has children")]
    ElementHasChildren(String),
    /// A level of the pool chain has no headroom for the delta.
    #[error("insufficient resources at `{element}`")]
    InsufficientResources {
        /// Id of the rejecting element.
        element: String,
    },
    /// A level of the pool chain has already been torn down.
    #[error("element `{element}` is not alive")]
    ElementNotAlive {
        /// Id of the dead element.
        element: String,
    },
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
