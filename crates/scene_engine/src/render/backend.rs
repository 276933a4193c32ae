//! Rendering backend boundary
//!
//! The scene graph never talks to a graphics API directly. During the render
//! phase it resolves each renderable's world transform and hands the backend
//! an opaque draw call; everything past that point (pipelines, buffers,
//! presentation) belongs to the backend.

use crate::foundation::collections::TypedHandle;
use crate::foundation::math::Mat4;

/// Marker type naming mesh resources owned by the resource collaborator
#[derive(Debug)]
pub enum Mesh {}

/// Marker type naming material resources owned by the resource collaborator
#[derive(Debug)]
pub enum Material {}

/// Handle to a mesh resource
pub type MeshHandle = TypedHandle<Mesh>;

/// Handle to a material resource
pub type MaterialHandle = TypedHandle<Material>;

/// Sink for draw submissions produced by the render traversal
///
/// Submission is fire-and-forget. The backend is only reachable from render
/// hooks, so draws cannot be issued during the logic phase.
pub trait RenderBackend {
    /// Submit one draw of `mesh` with `material` at the given world transform
    fn draw(&mut self, transform: &Mat4, mesh: MeshHandle, material: MaterialHandle);
}
