//! Scene graph and component lifecycle
//!
//! A [`SceneTree`] owns a single root [`Node`]; every node owns an ordered list
//! of children and a set of [`Component`]s keyed by their concrete type. Each
//! frame the tree runs two depth-first traversals:
//!
//! ```text
//! tick(dt)   logic:  on_start → on_update* → on_exit
//! draw(..)   render: prepare_rendering → render* → exit_rendering
//! ```
//!
//! Each traversal advances its own [`LifecycleState`] machine per component.
//! Components are purged once both machines have reached `Removed`.

mod commands;
mod component;
mod error;
mod lifecycle;
mod node;
mod scene_tree;

#[cfg(test)]
mod tests;

pub use commands::SceneCommands;
pub use component::{AsAny, Component, HookResult, LogicContext, RenderContext};
pub use error::{ComponentError, Hook, HookFailure, SceneError};
pub use lifecycle::{Lifecycle, LifecycleState, LifecycleStep};
pub use node::{Node, NodeBuilder, NodeId};
pub use scene_tree::{SceneConfig, SceneTree};
