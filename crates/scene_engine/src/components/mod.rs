//! Built-in components
//!
//! General-purpose behaviors that most scenes need: drawing a mesh, simple
//! kinematic motion, and timed self-removal.

pub mod lifetime;
pub mod mesh_renderer;
pub mod rotator;

pub use lifetime::Lifetime;
pub use mesh_renderer::MeshRenderer;
pub use rotator::Rotator;
