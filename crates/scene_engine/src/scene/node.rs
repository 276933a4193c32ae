//! Scene nodes
//!
//! Nodes live in a generational arena owned by [`SceneTree`](super::SceneTree)
//! and refer to each other by [`NodeId`]. A node owns its components and the
//! ordered list of its children; the parent link is a plain id.

use std::any::TypeId;
use std::fmt;

use slotmap::SlotMap;

use super::component::{Component, ComponentSlot};
use super::lifecycle::Lifecycle;
use crate::foundation::math::{compose, Mat4, Transform, Vec3};

slotmap::new_key_type! {
    /// Stable identifier of a node. Stale ids resolve to "not found".
    pub struct NodeId;
}

/// A positioned element of the scene tree
pub struct Node {
    name: String,
    local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) components: Vec<ComponentSlot>,
    removal_requested: bool,
}

impl Node {
    pub(crate) fn new(name: String, local: Transform) -> Self {
        Self {
            name,
            local,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            removal_requested: false,
        }
    }

    /// Node name (not required to be unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Transform relative to the parent
    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// Replace the transform relative to the parent
    pub fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
    }

    /// Mutable access to the transform relative to the parent
    pub fn local_transform_mut(&mut self) -> &mut Transform {
        &mut self.local
    }

    /// Parent node, `None` for the root and for detached nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion (= traversal) order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attached component of kind `C`, if any
    pub fn component<C: Component>(&self) -> Option<&C> {
        self.live_slot(TypeId::of::<C>())?.downcast_ref::<C>()
    }

    /// Mutable access to the attached component of kind `C`, if any
    pub fn component_mut<C: Component>(&mut self) -> Option<&mut C> {
        let kind = TypeId::of::<C>();
        self.components
            .iter_mut()
            .find(|slot| slot.kind == kind && !slot.lifecycle.is_finalized())?
            .downcast_mut::<C>()
    }

    /// Whether a component of kind `C` is attached
    pub fn has_component<C: Component>(&self) -> bool {
        self.live_slot(TypeId::of::<C>()).is_some()
    }

    /// Lifecycle of the attached component of kind `C`
    pub fn lifecycle<C: Component>(&self) -> Option<Lifecycle> {
        self.live_slot(TypeId::of::<C>()).map(|slot| slot.lifecycle)
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.iter().filter(|slot| !slot.lifecycle.is_finalized()).count()
    }

    /// Names of attached components in container order
    pub fn component_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components
            .iter()
            .filter(|slot| !slot.lifecycle.is_finalized())
            .map(|slot| slot.name)
    }

    /// Whether this node is waiting to be reaped
    pub fn is_removal_requested(&self) -> bool {
        self.removal_requested
    }

    fn live_slot(&self, kind: TypeId) -> Option<&ComponentSlot> {
        self.components
            .iter()
            .find(|slot| slot.kind == kind && !slot.lifecycle.is_finalized())
    }

    /// Insert a component, replacing one of the same kind in place
    ///
    /// The replaced component is dropped without running its exit hooks.
    pub(crate) fn insert_slot(&mut self, mut slot: ComponentSlot, frame: u64) -> usize {
        if self.removal_requested {
            slot.lifecycle.request_removal(frame);
        }
        insert_or_replace(&mut self.components, slot)
    }

    /// Request lazy removal of the component of the given kind
    pub(crate) fn request_component_removal(&mut self, kind: TypeId, frame: u64) -> bool {
        match self
            .components
            .iter_mut()
            .find(|slot| slot.kind == kind && !slot.lifecycle.is_finalized())
        {
            Some(slot) => {
                slot.lifecycle.request_removal(frame);
                true
            }
            None => false,
        }
    }

    /// Drop components whose logic and render machines are both terminal
    pub(crate) fn purge_finalized(&mut self) {
        let name = &self.name;
        self.components.retain(|slot| {
            let keep = !slot.lifecycle.is_finalized();
            if !keep {
                log::debug!("Purged component {} from node '{}'", slot.name, name);
            }
            keep
        });
    }

    pub(crate) fn mark_for_removal(&mut self, frame: u64) {
        self.removal_requested = true;
        for slot in &mut self.components {
            slot.lifecycle.request_removal(frame);
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&id| id != child);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("local", &self.local)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("components", &self.component_names().collect::<Vec<_>>())
            .field("removal_requested", &self.removal_requested)
            .finish()
    }
}

fn insert_or_replace(slots: &mut Vec<ComponentSlot>, slot: ComponentSlot) -> usize {
    match slots.iter().position(|existing| existing.kind == slot.kind) {
        Some(index) => {
            log::debug!("Replacing component {} in place", slot.name);
            slots[index] = slot;
            index
        }
        None => {
            slots.push(slot);
            slots.len() - 1
        }
    }
}

/// World matrix of `id`: its local transform composed under every ancestor
///
/// Walks the parent chain on every call; nothing is cached. Returns `None` if
/// `id` (or a link in its chain) is not live.
pub(crate) fn global_transform_of(nodes: &SlotMap<NodeId, Node>, id: NodeId) -> Option<Mat4> {
    let node = nodes.get(id)?;
    match node.parent {
        Some(parent) => Some(compose(&global_transform_of(nodes, parent)?, &node.local.to_matrix())),
        None => Some(node.local.to_matrix()),
    }
}

/// Description of a node (and optionally its subtree) to be inserted
///
/// Builders are how nodes enter the tree, both directly and through deferred
/// [`SceneCommands`](super::SceneCommands).
pub struct NodeBuilder {
    pub(crate) name: String,
    pub(crate) transform: Transform,
    pub(crate) components: Vec<ComponentSlot>,
    pub(crate) children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    /// Start a node with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set only the local position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Attach a component; a second component of the same kind replaces the first
    ///
    /// The replaced component never ran and is simply dropped.
    pub fn with_component<C: Component>(mut self, component: C) -> Self {
        insert_or_replace(&mut self.components, ComponentSlot::new(component));
        self
    }

    /// Append a child subtree
    pub fn with_child(mut self, child: NodeBuilder) -> Self {
        self.children.push(child);
        self
    }
}

impl fmt::Debug for NodeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBuilder")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("components", &self.components.iter().map(|s| s.name).collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;

    #[derive(Debug, PartialEq)]
    struct Tag(u32);
    impl Component for Tag {}

    struct Other;
    impl Component for Other {}

    #[test]
    fn test_duplicate_kind_replaces_in_place() {
        let mut node = Node::new("n".into(), Transform::identity());
        node.insert_slot(ComponentSlot::new(Tag(1)), 0);
        node.insert_slot(ComponentSlot::new(Other), 0);
        let index = node.insert_slot(ComponentSlot::new(Tag(2)), 0);

        assert_eq!(index, 0);
        assert_eq!(node.component_count(), 2);
        assert_eq!(node.component::<Tag>(), Some(&Tag(2)));
        assert_eq!(node.component_names().collect::<Vec<_>>(), vec!["Tag", "Other"]);
    }

    #[test]
    fn test_missing_component_is_none() {
        let node = Node::new("n".into(), Transform::identity());
        assert!(node.component::<Tag>().is_none());
        assert!(!node.has_component::<Tag>());
        assert!(node.lifecycle::<Tag>().is_none());
    }

    #[test]
    fn test_finalized_components_are_hidden_then_purged() {
        let mut node = Node::new("n".into(), Transform::identity());
        node.insert_slot(ComponentSlot::new(Tag(7)), 0);
        node.components[0].lifecycle.force_remove();

        assert!(node.component::<Tag>().is_none());
        assert_eq!(node.components.len(), 1);

        node.purge_finalized();
        assert!(node.components.is_empty());
    }

    #[test]
    fn test_builder_replaces_duplicate_kind() {
        let builder = NodeBuilder::new("b").with_component(Tag(1)).with_component(Tag(3));
        assert_eq!(builder.components.len(), 1);
        assert_eq!(builder.components[0].downcast_ref::<Tag>(), Some(&Tag(3)));
    }

    #[test]
    fn test_global_transform_walks_parents() {
        let mut nodes: SlotMap<NodeId, Node> = SlotMap::with_key();
        let parent = nodes.insert(Node::new(
            "parent".into(),
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_uniform_scale(2.0),
        ));
        let mut child_node = Node::new("child".into(), Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        child_node.set_parent(Some(parent));
        let child = nodes.insert(child_node);

        let world = global_transform_of(&nodes, child).unwrap();
        approx::assert_relative_eq!(world.transform_point(&Point3::origin()).coords, Vec3::new(1.0, 2.0, 0.0));
        assert!(global_transform_of(&nodes, NodeId::default()).is_none());
    }
}
