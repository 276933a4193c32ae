//! Deferred structural changes
//!
//! Hooks cannot touch the tree's structure while a traversal is iterating it.
//! Instead they queue commands here; the tree applies the queue in order at
//! the next traversal boundary (end of `tick`, end of `draw`).

use std::any::TypeId;

use super::component::{Component, ComponentSlot};
use super::node::{NodeBuilder, NodeId};

pub(crate) enum SceneCommand {
    AddChild { parent: NodeId, node: NodeBuilder },
    RemoveNode(NodeId),
    AttachComponent { node: NodeId, slot: ComponentSlot },
    RemoveComponent { node: NodeId, kind: TypeId, name: &'static str },
}

/// Queue of structural changes applied at the next traversal boundary
#[derive(Default)]
pub struct SceneCommands {
    queue: Vec<SceneCommand>,
}

impl SceneCommands {
    /// Append a new subtree under `parent`
    pub fn add_child(&mut self, parent: NodeId, node: NodeBuilder) {
        self.queue.push(SceneCommand::AddChild { parent, node });
    }

    /// Lazily remove `node` and its subtree
    pub fn remove_node(&mut self, node: NodeId) {
        self.queue.push(SceneCommand::RemoveNode(node));
    }

    /// Attach `component` to `node`, replacing one of the same kind
    ///
    /// A replaced component is dropped without running its exit hooks.
    pub fn attach_component<C: Component>(&mut self, node: NodeId, component: C) {
        self.queue.push(SceneCommand::AttachComponent {
            node,
            slot: ComponentSlot::new(component),
        });
    }

    /// Lazily remove the component of kind `C` from `node`
    pub fn remove_component<C: Component>(&mut self, node: NodeId) {
        self.queue.push(SceneCommand::RemoveComponent {
            node,
            kind: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        });
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Move the queue out for application
    pub(crate) fn take(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.queue)
    }

    /// Hand back the (drained) queue so its allocation is reused
    pub(crate) fn restore(&mut self, mut queue: Vec<SceneCommand>) {
        queue.clear();
        queue.append(&mut self.queue);
        self.queue = queue;
    }
}

impl std::fmt::Debug for SceneCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneCommands").field("queued", &self.queue.len()).finish()
    }
}
