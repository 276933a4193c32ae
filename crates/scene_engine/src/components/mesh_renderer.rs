//! Mesh renderer component
//!
//! Submits one draw of its mesh and material per render traversal at the
//! owning node's world transform.

use crate::render::{MaterialHandle, MeshHandle};
use crate::scene::{Component, ComponentError, HookResult, RenderContext};

/// Component for nodes that draw a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    /// Mesh to draw
    pub mesh: Option<MeshHandle>,

    /// Material to draw with
    pub material: Option<MaterialHandle>,

    /// Whether this renderer submits draws
    pub visible: bool,
}

impl MeshRenderer {
    /// Create a visible renderer with both resources supplied
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            mesh: Some(mesh),
            material: Some(material),
            visible: true,
        }
    }

    /// Create a renderer whose resources are supplied later through the setters
    pub fn unbound() -> Self {
        Self {
            mesh: None,
            material: None,
            visible: true,
        }
    }

    /// Set the mesh
    pub fn set_mesh(&mut self, mesh: MeshHandle) {
        self.mesh = Some(mesh);
    }

    /// Set the material
    pub fn set_material(&mut self, material: MaterialHandle) {
        self.material = Some(material);
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Check if this component should be rendered
    pub fn should_render(&self) -> bool {
        self.visible
    }

    fn submit(&self, ctx: &mut RenderContext<'_>) -> HookResult {
        if !self.should_render() {
            return Ok(());
        }
        let mesh = self.mesh.ok_or(ComponentError::MissingResource("mesh"))?;
        let material = self.material.ok_or(ComponentError::MissingResource("material"))?;
        ctx.draw(mesh, material);
        Ok(())
    }
}

impl Component for MeshRenderer {
    // The first render traversal after attachment already draws.
    fn prepare_rendering(&mut self, ctx: &mut RenderContext<'_>) -> HookResult {
        self.submit(ctx)
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> HookResult {
        self.submit(ctx)
    }
}
