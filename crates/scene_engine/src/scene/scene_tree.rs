//! Scene tree driver
//!
//! Owns the node arena and the single root, and runs the two per-frame
//! traversals:
//!
//! 1. `tick(dt)`: logic phase, top-down, depth-first, children in insertion order
//! 2. `draw(backend)`: render phase, same order, with each node's world
//!    matrix resolved once before its components render
//!
//! Structural changes requested during either traversal are queued and
//! applied at the traversal boundary. Removed nodes are reaped there too,
//! once every component in their subtree has run both exit hooks.

use std::any::TypeId;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use super::commands::{SceneCommand, SceneCommands};
use super::component::{Component, ComponentSlot, LogicContext, RenderContext};
use super::error::{ComponentError, Hook, HookFailure, SceneError};
use super::lifecycle::Lifecycle;
use super::node::{global_transform_of, Node, NodeBuilder, NodeId};
use crate::config::Config;
use crate::foundation::math::{compose, Mat4, Transform};
use crate::render::RenderBackend;

/// Scene tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Name given to the root created by [`SceneTree::with_root`]
    pub root_name: String,

    /// Hook failures kept for inspection; older ones are dropped first
    pub max_failures_retained: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            root_name: "root".to_string(),
            max_failures_retained: 64,
        }
    }
}

impl Config for SceneConfig {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePhase {
    AwaitingTick,
    AwaitingDraw,
}

/// The scene graph and its frame driver
pub struct SceneTree {
    config: SceneConfig,
    nodes: SlotMap<NodeId, Node>,
    root: Option<NodeId>,
    commands: SceneCommands,
    doomed: Vec<NodeId>,
    failures: Vec<HookFailure>,
    failure_total: u64,
    phase: FramePhase,
    frame: u64,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl SceneTree {
    /// Create an empty tree; a root must be installed before the first frame
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            nodes: SlotMap::with_key(),
            root: None,
            commands: SceneCommands::default(),
            doomed: Vec::new(),
            failures: Vec::new(),
            failure_total: 0,
            phase: FramePhase::AwaitingTick,
            frame: 0,
        }
    }

    /// Create a tree with an empty root named after `config.root_name`
    pub fn with_root(config: SceneConfig) -> Self {
        let mut tree = Self::new(config);
        let root = tree.create_node(NodeBuilder::new(tree.config.root_name.clone()));
        tree.root = Some(root);
        tree
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Install the root subtree
    pub fn set_root(&mut self, builder: NodeBuilder) -> Result<NodeId, SceneError> {
        if self.root.is_some() {
            return Err(SceneError::RootAlreadySet);
        }
        let root = self.create_node(builder);
        self.root = Some(root);
        log::debug!("Installed scene root {:?}", root);
        Ok(root)
    }

    /// Root node, if installed
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Root node, or [`SceneError::NoRoot`]
    pub fn root_id(&self) -> Result<NodeId, SceneError> {
        self.root.ok_or(SceneError::NoRoot)
    }

    /// Index of the current frame (incremented after each `draw`)
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of live nodes, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` names a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// First direct child of `parent` called `name`
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes
            .get(parent)?
            .children()
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|node| node.name() == name))
    }

    /// Resolve a `/`-separated path of child names starting below the root
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root?, |current, segment| self.find_child(current, segment))
    }

    /// Insert a subtree without attaching it anywhere
    ///
    /// Detached nodes are not traversed until passed to [`add_child`](Self::add_child).
    pub fn create_node(&mut self, builder: NodeBuilder) -> NodeId {
        self.build(builder, None)
    }

    fn build(&mut self, builder: NodeBuilder, parent: Option<NodeId>) -> NodeId {
        let NodeBuilder {
            name,
            transform,
            components,
            children,
        } = builder;

        let mut node = Node::new(name, transform);
        node.set_parent(parent);
        for slot in components {
            node.insert_slot(slot, self.frame);
        }
        let id = self.nodes.insert(node);

        for child in children {
            let child_id = self.build(child, Some(id));
            self.nodes[id].push_child(child_id);
        }
        id
    }

    /// Insert a subtree as the last child of `parent`
    pub fn spawn(&mut self, parent: NodeId, builder: NodeBuilder) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let child = self.build(builder, Some(parent));
        self.nodes[parent].push_child(child);
        if self.nodes[parent].is_removal_requested() {
            self.mark_subtree(child);
        }
        log::debug!("Spawned {:?} under {:?}", child, parent);
        Ok(child)
    }

    /// Attach a detached node as the last child of `parent`
    ///
    /// Rejects nodes that already have a parent, the root, and any attachment
    /// that would make a node its own ancestor.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let Some(child_node) = self.nodes.get(child) else {
            return Err(SceneError::NodeNotFound(child));
        };
        if let Some(current) = child_node.parent() {
            return Err(SceneError::AlreadyParented { child, parent: current });
        }
        if self.root == Some(child) || self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::WouldCreateCycle { parent, child });
        }

        self.nodes[child].set_parent(Some(parent));
        self.nodes[parent].push_child(child);
        if self.nodes[parent].is_removal_requested() {
            self.mark_subtree(child);
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node).and_then(Node::parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.root.is_some_and(|root| self.is_ancestor_or_self(root, node))
    }

    /// Lazily remove `id` and its subtree
    ///
    /// Every component below `id` runs its remaining logic and render hooks
    /// (exit hooks included); the subtree is detached and freed at the first
    /// traversal boundary after the last of them finishes. Detached subtrees
    /// were never traversed and are freed immediately.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        if self.root == Some(id) {
            return Err(SceneError::CannotRemoveRoot);
        }
        if !self.is_attached(id) {
            self.detach(id);
            self.free_subtree(id);
            return Ok(());
        }
        if self.nodes[id].is_removal_requested() {
            return Ok(());
        }

        self.mark_subtree(id);
        self.doomed.push(id);
        log::debug!("Node {:?} marked for removal", id);
        Ok(())
    }

    fn mark_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.mark_for_removal(self.frame);
                stack.extend_from_slice(node.children());
            }
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes.get(id).and_then(Node::parent) {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.remove_child(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_parent(None);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for &child in node.children() {
                self.free_subtree(child);
            }
        }
    }

    fn subtree_has_components(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| {
            !node.components.is_empty()
                || node.children().iter().any(|&child| self.subtree_has_components(child))
        })
    }

    fn reap_removed_nodes(&mut self) {
        let mut index = 0;
        while index < self.doomed.len() {
            let id = self.doomed[index];
            if !self.nodes.contains_key(id) {
                self.doomed.swap_remove(index);
            } else if self.subtree_has_components(id) {
                index += 1;
            } else {
                self.detach(id);
                self.free_subtree(id);
                self.doomed.swap_remove(index);
                log::debug!("Reaped node {:?}", id);
            }
        }
    }

    /// Build a component with `factory` and attach it to `node`
    ///
    /// The factory receives the owning node's id. A component of the same kind
    /// already on the node is replaced in place: the old one is dropped at once
    /// and none of its exit hooks run. To retire it with `on_exit` and
    /// `exit_rendering`, call [`remove_component`](Self::remove_component) and
    /// attach the new one after it is gone.
    pub fn attach_component<C, F>(&mut self, node: NodeId, factory: F) -> Result<&mut C, SceneError>
    where
        C: Component,
        F: FnOnce(NodeId) -> C,
    {
        let frame = self.frame;
        let target = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        let index = target.insert_slot(ComponentSlot::new(factory(node)), frame);
        target.components[index]
            .downcast_mut::<C>()
            .ok_or(SceneError::ComponentNotFound {
                node,
                kind: std::any::type_name::<C>(),
            })
    }

    /// Component of kind `C` on `node`; `None` when absent
    pub fn component<C: Component>(&self, node: NodeId) -> Option<&C> {
        self.nodes.get(node)?.component::<C>()
    }

    /// Mutable component of kind `C` on `node`; `None` when absent
    pub fn component_mut<C: Component>(&mut self, node: NodeId) -> Option<&mut C> {
        self.nodes.get_mut(node)?.component_mut::<C>()
    }

    /// Lifecycle of the component of kind `C` on `node`
    pub fn lifecycle<C: Component>(&self, node: NodeId) -> Option<Lifecycle> {
        self.nodes.get(node)?.lifecycle::<C>()
    }

    /// Lazily remove the component of kind `C` from `node`
    ///
    /// The component runs its remaining hooks and is gone by the start of the
    /// frame after next, whether the request comes before or after this
    /// frame's traversals.
    pub fn remove_component<C: Component>(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.request_component_removal(node, TypeId::of::<C>(), std::any::type_name::<C>())
    }

    fn request_component_removal(
        &mut self,
        node: NodeId,
        kind: TypeId,
        name: &'static str,
    ) -> Result<(), SceneError> {
        let frame = self.frame;
        let target = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        if target.request_component_removal(kind, frame) {
            Ok(())
        } else {
            Err(SceneError::ComponentNotFound { node, kind: name })
        }
    }

    /// Local transform of `node`
    pub fn local_transform(&self, node: NodeId) -> Result<Transform, SceneError> {
        self.nodes
            .get(node)
            .map(|n| *n.local_transform())
            .ok_or(SceneError::NodeNotFound(node))
    }

    /// Replace the local transform of `node`
    pub fn set_local_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError> {
        let target = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        target.set_local_transform(transform);
        Ok(())
    }

    /// World matrix of `node`, composed from its ancestor chain on every call
    pub fn global_transform(&self, node: NodeId) -> Result<Mat4, SceneError> {
        global_transform_of(&self.nodes, node).ok_or(SceneError::NodeNotFound(node))
    }

    /// Hook failures recorded so far (oldest first)
    pub fn failures(&self) -> &[HookFailure] {
        &self.failures
    }

    /// Hook failures since the tree was created, including ones no longer retained
    pub fn total_failures(&self) -> u64 {
        self.failure_total
    }

    /// Take and clear the recorded hook failures
    pub fn take_failures(&mut self) -> Vec<HookFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Structural commands waiting for the next traversal boundary
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Logic phase of the frame
    pub fn tick(&mut self, delta_time: f32) -> Result<(), SceneError> {
        let root = self.root_id()?;
        if self.phase != FramePhase::AwaitingTick {
            return Err(SceneError::OutOfPhase {
                expected: "draw",
                actual: "tick",
            });
        }
        if !delta_time.is_finite() || delta_time < 0.0 {
            return Err(SceneError::InvalidDeltaTime(delta_time));
        }

        self.process_node(root, delta_time);
        self.finish_traversal();
        self.phase = FramePhase::AwaitingDraw;
        Ok(())
    }

    /// Render phase of the frame; returns the number of draws submitted
    pub fn draw(&mut self, backend: &mut dyn RenderBackend) -> Result<usize, SceneError> {
        let root = self.root_id()?;
        if self.phase != FramePhase::AwaitingDraw {
            return Err(SceneError::OutOfPhase {
                expected: "tick",
                actual: "draw",
            });
        }

        let draws = self.render_node(root, &Mat4::identity(), backend);
        self.finish_traversal();
        self.phase = FramePhase::AwaitingTick;
        self.frame += 1;
        Ok(draws)
    }

    fn process_node(&mut self, id: NodeId, delta_time: f32) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.purge_finalized();
        let mut slots = std::mem::take(&mut node.components);

        for slot in &mut slots {
            let mut ctx = LogicContext::new(id, &mut self.nodes, &mut self.commands, self.frame);
            if let Err((hook, error)) = slot.step_logic(&mut ctx, delta_time) {
                slot.lifecycle.force_remove();
                self.record_failure(id, slot.name, hook, error);
            }
        }

        let node = &mut self.nodes[id];
        node.components = slots;
        node.purge_finalized();

        let mut index = 0;
        while let Some(child) = self.nodes.get(id).and_then(|n| n.children().get(index).copied()) {
            self.process_node(child, delta_time);
            index += 1;
        }
    }

    fn render_node(&mut self, id: NodeId, parent_world: &Mat4, backend: &mut dyn RenderBackend) -> usize {
        let Some(node) = self.nodes.get_mut(id) else {
            return 0;
        };
        node.purge_finalized();
        let world = compose(parent_world, &node.local_transform().to_matrix());
        let mut slots = std::mem::take(&mut node.components);
        let mut draws = 0;

        for slot in &mut slots {
            let mut ctx = RenderContext::new(
                id,
                &self.nodes,
                world,
                &mut *backend,
                &mut self.commands,
                self.frame,
            );
            let result = slot.step_render(&mut ctx);
            draws += ctx.draw_count();
            if let Err((hook, error)) = result {
                slot.lifecycle.force_remove();
                self.record_failure(id, slot.name, hook, error);
            }
        }

        let node = &mut self.nodes[id];
        node.components = slots;
        node.purge_finalized();

        let mut index = 0;
        while let Some(child) = self.nodes.get(id).and_then(|n| n.children().get(index).copied()) {
            draws += self.render_node(child, &world, backend);
            index += 1;
        }
        draws
    }

    fn record_failure(&mut self, node: NodeId, component: &'static str, hook: Hook, error: ComponentError) {
        let failure = HookFailure {
            node,
            node_name: self.nodes.get(node).map(|n| n.name().to_string()).unwrap_or_default(),
            component,
            hook,
            frame: self.frame,
            error,
        };
        log::error!("{}; component removed", failure);

        self.failures.push(failure);
        self.failure_total += 1;
        let retained = self.config.max_failures_retained;
        if self.failures.len() > retained {
            let excess = self.failures.len() - retained;
            self.failures.drain(..excess);
        }
    }

    fn finish_traversal(&mut self) {
        self.apply_commands();
        self.reap_removed_nodes();
    }

    fn apply_commands(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        let mut queue = self.commands.take();
        for command in queue.drain(..) {
            let result = match command {
                SceneCommand::AddChild { parent, node } => self.spawn(parent, node).map(|_| ()),
                SceneCommand::RemoveNode(id) => self.remove_node(id),
                SceneCommand::AttachComponent { node, slot } => match self.nodes.get_mut(node) {
                    Some(target) => {
                        target.insert_slot(slot, self.frame);
                        Ok(())
                    }
                    None => Err(SceneError::NodeNotFound(node)),
                },
                SceneCommand::RemoveComponent { node, kind, name } => {
                    self.request_component_removal(node, kind, name)
                }
            };
            if let Err(error) = result {
                log::warn!("Dropping deferred scene command: {}", error);
            }
        }
        self.commands.restore(queue);
    }
}

impl std::fmt::Debug for SceneTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("frame", &self.frame)
            .field("phase", &self.phase)
            .field("pending_commands", &self.commands.len())
            .field("failures", &self.failures.len())
            .finish()
    }
}
