//! Component trait and hook contexts
//!
//! A component is a unit of behavior attached to exactly one node. It exposes
//! a fixed set of hooks, all optional:
//!
//! | traversal | start               | steady       | exit             |
//! |-----------|---------------------|--------------|------------------|
//! | logic     | `on_start`          | `on_update`  | `on_exit`        |
//! | render    | `prepare_rendering` | `render`     | `exit_rendering` |
//!
//! Which hook runs is decided by the component's [`Lifecycle`]; hooks never
//! call each other. Structural changes requested from a hook go through
//! [`SceneCommands`] and land at the next traversal boundary.

use std::any::{Any, TypeId};

use slotmap::SlotMap;

use super::commands::SceneCommands;
use super::error::{ComponentError, Hook};
use super::lifecycle::{Lifecycle, LifecycleStep};
use super::node::{global_transform_of, Node, NodeId};
use crate::foundation::math::{Mat4, Transform};
use crate::render::{MaterialHandle, MeshHandle, RenderBackend};

/// Result type returned by every component hook
pub type HookResult = Result<(), ComponentError>;

/// Upcast helper so boxed components can be downcast to their concrete kind
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior attached to a node
///
/// Returning `Err` from any hook force-removes the component (no further
/// hooks, exit hooks included) and records a [`HookFailure`](super::HookFailure);
/// the rest of the frame carries on.
pub trait Component: AsAny {
    /// Name used in logs and failure reports
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// First logic tick after attachment
    fn on_start(&mut self, _ctx: &mut LogicContext<'_>) -> HookResult {
        Ok(())
    }

    /// Every later logic tick while the component is ready
    fn on_update(&mut self, _ctx: &mut LogicContext<'_>, _delta_time: f32) -> HookResult {
        Ok(())
    }

    /// Final logic tick after removal was requested
    fn on_exit(&mut self, _ctx: &mut LogicContext<'_>) -> HookResult {
        Ok(())
    }

    /// First render tick after attachment
    fn prepare_rendering(&mut self, _ctx: &mut RenderContext<'_>) -> HookResult {
        Ok(())
    }

    /// Every later render tick while the component is ready
    fn render(&mut self, _ctx: &mut RenderContext<'_>) -> HookResult {
        Ok(())
    }

    /// Final render tick after removal was requested
    fn exit_rendering(&mut self, _ctx: &mut RenderContext<'_>) -> HookResult {
        Ok(())
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    // Keep generic arguments intact, strip only the leading module path.
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}

/// A component together with its kind and lifecycle bookkeeping
pub(crate) struct ComponentSlot {
    pub(crate) kind: TypeId,
    pub(crate) name: &'static str,
    pub(crate) lifecycle: Lifecycle,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub(crate) fn new<C: Component>(component: C) -> Self {
        Self {
            kind: TypeId::of::<C>(),
            name: component.name(),
            lifecycle: Lifecycle::new(),
            component: Box::new(component),
        }
    }

    pub(crate) fn downcast_ref<C: Component>(&self) -> Option<&C> {
        // Go through `&dyn Component`; calling `as_any` on the Box would pick the Box itself.
        AsAny::as_any(&*self.component).downcast_ref::<C>()
    }

    pub(crate) fn downcast_mut<C: Component>(&mut self) -> Option<&mut C> {
        AsAny::as_any_mut(&mut *self.component).downcast_mut::<C>()
    }

    /// Run one step of the logic machine
    pub(crate) fn step_logic(
        &mut self,
        ctx: &mut LogicContext<'_>,
        delta_time: f32,
    ) -> Result<(), (Hook, ComponentError)> {
        let step = self.lifecycle.logic.step();
        let result = match step {
            LifecycleStep::Start => self.component.on_start(ctx).map_err(|e| (Hook::Start, e)),
            LifecycleStep::Steady => self
                .component
                .on_update(ctx, delta_time)
                .map_err(|e| (Hook::Update, e)),
            LifecycleStep::Exit => self.component.on_exit(ctx).map_err(|e| (Hook::Exit, e)),
            LifecycleStep::Skip => return Ok(()),
        };
        if ctx.take_removal_request() {
            self.lifecycle.request_removal(ctx.frame());
        }
        result?;
        self.lifecycle.finish_logic_step(step, ctx.frame());
        Ok(())
    }

    /// Run one step of the render machine
    pub(crate) fn step_render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), (Hook, ComponentError)> {
        let step = self.lifecycle.render.step();
        let result = match step {
            LifecycleStep::Start => self
                .component
                .prepare_rendering(ctx)
                .map_err(|e| (Hook::PrepareRendering, e)),
            LifecycleStep::Steady => self.component.render(ctx).map_err(|e| (Hook::Render, e)),
            LifecycleStep::Exit => self
                .component
                .exit_rendering(ctx)
                .map_err(|e| (Hook::ExitRendering, e)),
            LifecycleStep::Skip => return Ok(()),
        };
        // The logic machine already ran this frame, so a request made here
        // moves it straight to its exit step.
        if ctx.take_removal_request() {
            self.lifecycle.request_removal(ctx.frame());
        }
        result?;
        self.lifecycle.finish_render_step(step, ctx.frame());
        Ok(())
    }
}

/// Access handed to logic hooks
///
/// The owning node's local transform may be read and written directly; it is
/// not structural. Everything structural goes through [`commands`](Self::commands).
pub struct LogicContext<'a> {
    node: NodeId,
    nodes: &'a mut SlotMap<NodeId, Node>,
    commands: &'a mut SceneCommands,
    frame: u64,
    removal_requested: bool,
}

impl<'a> LogicContext<'a> {
    pub(crate) fn new(
        node: NodeId,
        nodes: &'a mut SlotMap<NodeId, Node>,
        commands: &'a mut SceneCommands,
        frame: u64,
    ) -> Self {
        Self {
            node,
            nodes,
            commands,
            frame,
            removal_requested: false,
        }
    }

    /// Owning node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Owning node's name
    pub fn node_name(&self) -> &str {
        self.nodes[self.node].name()
    }

    /// Index of the frame being processed
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Owning node's local transform
    pub fn local_transform(&self) -> Transform {
        *self.nodes[self.node].local_transform()
    }

    /// Replace the owning node's local transform
    pub fn set_local_transform(&mut self, transform: Transform) {
        self.nodes[self.node].set_local_transform(transform);
    }

    /// Mutable access to the owning node's local transform
    pub fn local_transform_mut(&mut self) -> &mut Transform {
        self.nodes[self.node].local_transform_mut()
    }

    /// Owning node's world matrix, composed fresh from its ancestors
    pub fn global_transform(&self) -> Mat4 {
        global_transform_of(&*self.nodes, self.node).unwrap_or_else(Mat4::identity)
    }

    /// World matrix of any live node
    pub fn global_transform_of(&self, node: NodeId) -> Option<Mat4> {
        global_transform_of(&*self.nodes, node)
    }

    /// Owning node's parent
    pub fn parent(&self) -> Option<NodeId> {
        self.nodes[self.node].parent()
    }

    /// Owning node's children in traversal order
    pub fn children(&self) -> &[NodeId] {
        self.nodes[self.node].children()
    }

    /// Request removal of the component whose hook is running
    pub fn remove_self(&mut self) {
        self.removal_requested = true;
    }

    /// Deferred structural changes
    pub fn commands(&mut self) -> &mut SceneCommands {
        &mut *self.commands
    }

    fn take_removal_request(&mut self) -> bool {
        std::mem::take(&mut self.removal_requested)
    }
}

/// Access handed to render hooks
///
/// The node's world matrix is resolved once per node per render traversal
/// before any of its components render. Transforms are read-only here.
pub struct RenderContext<'a> {
    node: NodeId,
    nodes: &'a SlotMap<NodeId, Node>,
    world: Mat4,
    backend: &'a mut dyn RenderBackend,
    commands: &'a mut SceneCommands,
    frame: u64,
    draw_count: usize,
    removal_requested: bool,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        node: NodeId,
        nodes: &'a SlotMap<NodeId, Node>,
        world: Mat4,
        backend: &'a mut dyn RenderBackend,
        commands: &'a mut SceneCommands,
        frame: u64,
    ) -> Self {
        Self {
            node,
            nodes,
            world,
            backend,
            commands,
            frame,
            draw_count: 0,
            removal_requested: false,
        }
    }

    /// Owning node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Owning node's name
    pub fn node_name(&self) -> &str {
        self.nodes[self.node].name()
    }

    /// Index of the frame being rendered
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Owning node's world matrix for this render traversal
    pub fn global_transform(&self) -> &Mat4 {
        &self.world
    }

    /// Submit a draw at the owning node's world transform
    pub fn draw(&mut self, mesh: MeshHandle, material: MaterialHandle) {
        self.backend.draw(&self.world, mesh, material);
        self.draw_count += 1;
    }

    /// Draws submitted through this context
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    /// Request removal of the component whose hook is running
    pub fn remove_self(&mut self) {
        self.removal_requested = true;
    }

    /// Deferred structural changes
    pub fn commands(&mut self) -> &mut SceneCommands {
        &mut *self.commands
    }

    fn take_removal_request(&mut self) -> bool {
        std::mem::take(&mut self.removal_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl Component for Plain {}

    struct Named;
    impl Component for Named {
        fn name(&self) -> &'static str {
            "custom"
        }
    }

    #[test]
    fn test_default_name_strips_module_path() {
        assert_eq!(Plain.name(), "Plain");
        assert_eq!(short_type_name("a::b::Wrapper<c::D>"), "Wrapper<c::D>");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_slot_downcasts_by_kind() {
        let mut slot = ComponentSlot::new(Plain);
        assert_eq!(slot.kind, TypeId::of::<Plain>());
        assert_eq!(slot.name, "Plain");
        assert!(slot.downcast_ref::<Plain>().is_some());
        assert!(slot.downcast_mut::<Named>().is_none());

        let named = ComponentSlot::new(Named);
        assert_eq!(named.name, "custom");
    }
}
