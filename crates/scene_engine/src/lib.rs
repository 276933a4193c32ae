//! # Scene Engine
//!
//! A scene-graph and component-lifecycle core for real-time applications.
//!
//! ## Features
//!
//! - **Scene Tree**: nodes with local transforms, ordered children and typed components
//! - **Two-Phase Frames**: a logic traversal (`tick`) followed by a render traversal (`draw`)
//! - **Component Lifecycle**: start, steady and exit hooks per traversal, with lazy removal
//! - **Deferred Structure**: hooks queue structural changes, applied between traversals
//! - **Backend Agnostic**: render hooks submit draws through the [`render::RenderBackend`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!     let scene = engine.create_scene()?;
//!     let root = scene.root_id()?;
//!     scene.spawn(
//!         root,
//!         NodeBuilder::new("spinner").with_component(Rotator::new(Vec3::y(), 1.0)),
//!     )?;
//!
//!     let mut draws = DrawList::new();
//!     let stats = engine.step_frame(0.016, &mut draws)?;
//!     assert_eq!(stats.frame, 0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod components;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineConfig, EngineError, FrameStats};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        components::{Lifetime, MeshRenderer, Rotator},
        config::{Config, ConfigError, ConfigFormat},
        foundation::{
            math::{Quat, Transform, Vec2, Vec3},
            time::Timer,
        },
        render::{DrawList, MaterialHandle, MeshHandle, RenderBackend},
        scene::{
            Component, ComponentError, HookResult, LogicContext, NodeBuilder, NodeId, RenderContext,
            SceneCommands, SceneConfig, SceneError, SceneTree,
        },
        Engine, EngineConfig, EngineError, FrameStats,
    };
}
