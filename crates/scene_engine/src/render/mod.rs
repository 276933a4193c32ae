//! Render-phase boundary types
//!
//! Handles for shared resources, the backend trait, and the per-frame draw list.

pub mod backend;
pub mod commands;

pub use backend::{Material, MaterialHandle, Mesh, MeshHandle, RenderBackend};
pub use commands::{DrawList, DrawRequest};
