//! Scene graph error types

use std::fmt;

use thiserror::Error;

use super::node::NodeId;

/// Misuse and configuration errors raised by [`SceneTree`](super::SceneTree)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// `tick` or `draw` before a root node exists
    #[error("scene has no root node")]
    NoRoot,

    /// A second root was installed
    #[error("scene already has a root node")]
    RootAlreadySet,

    /// The id does not name a live node
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),

    /// `add_child` on a node that already has a parent
    #[error("node {child:?} is already a child of {parent:?}")]
    AlreadyParented {
        /// Node being attached
        child: NodeId,
        /// Its current parent
        parent: NodeId,
    },

    /// `add_child` would make a node its own ancestor (or re-parent the root)
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Requested parent
        parent: NodeId,
        /// Requested child
        child: NodeId,
    },

    /// The root can only be torn down with the tree itself
    #[error("the root node cannot be removed")]
    CannotRemoveRoot,

    /// No component of the requested kind is attached
    #[error("node {node:?} has no component of kind {kind}")]
    ComponentNotFound {
        /// Node that was queried
        node: NodeId,
        /// Requested kind
        kind: &'static str,
    },

    /// Frame phases were driven in the wrong order
    #[error("out of phase: expected {expected}, got {actual}")]
    OutOfPhase {
        /// Call the tree was waiting for
        expected: &'static str,
        /// Call that was made
        actual: &'static str,
    },

    /// Negative or non-finite frame delta
    #[error("invalid delta time: {0}")]
    InvalidDeltaTime(f32),
}

/// Error returned by a component hook
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// Generic hook failure
    #[error("{0}")]
    Failed(String),

    /// A required resource handle was never supplied
    #[error("missing resource: {0}")]
    MissingResource(&'static str),
}

impl ComponentError {
    /// Convenience constructor for [`ComponentError::Failed`]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Hook that a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `on_start`
    Start,
    /// `on_update`
    Update,
    /// `on_exit`
    Exit,
    /// `prepare_rendering`
    PrepareRendering,
    /// `render`
    Render,
    /// `exit_rendering`
    ExitRendering,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "on_start",
            Self::Update => "on_update",
            Self::Exit => "on_exit",
            Self::PrepareRendering => "prepare_rendering",
            Self::Render => "render",
            Self::ExitRendering => "exit_rendering",
        };
        f.write_str(name)
    }
}

/// Record of a component hook that returned an error
///
/// The failing component has already been force-removed when this is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct HookFailure {
    /// Owning node
    pub node: NodeId,
    /// Owning node's name at the time of failure
    pub node_name: String,
    /// Component type name
    pub component: &'static str,
    /// Hook that failed
    pub hook: Hook,
    /// Frame index the failure happened in
    pub frame: u64,
    /// The error itself
    pub error: ComponentError,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{} on node '{}' failed in frame {}: {}",
            self.component, self.hook, self.node_name, self.frame, self.error
        )
    }
}
