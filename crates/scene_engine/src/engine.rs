//! Engine context
//!
//! The engine owns the single active scene and drives it once per frame. It
//! is passed explicitly to whoever needs the scene; there is no global
//! registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::foundation::time::Timer;
use crate::render::{DrawList, RenderBackend};
use crate::scene::{SceneConfig, SceneError, SceneTree};

/// Main engine struct
///
/// Holds at most one registered [`SceneTree`], the frame timer, and a
/// reusable [`DrawList`] for callers that want the frame's draws recorded.
pub struct Engine {
    config: EngineConfig,
    scene: Option<SceneTree>,
    timer: Timer,
    draw_list: DrawList,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Self {
        log::info!("Initializing engine...");
        let draw_list = DrawList::with_capacity(config.draw_list_capacity);
        Self {
            config,
            scene: None,
            timer: Timer::new(),
            draw_list,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Make `scene` the active scene
    pub fn register_scene(&mut self, scene: SceneTree) -> Result<&mut SceneTree, EngineError> {
        if self.scene.is_some() {
            return Err(EngineError::SceneAlreadyRegistered);
        }
        log::info!("Registered scene {:?}", scene);
        self.timer.reset();
        Ok(self.scene.insert(scene))
    }

    /// Build and register an empty scene from the configured [`SceneConfig`]
    pub fn create_scene(&mut self) -> Result<&mut SceneTree, EngineError> {
        let scene = SceneTree::with_root(self.config.scene.clone());
        self.register_scene(scene)
    }

    /// Whether a scene is registered
    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    /// Get the active scene
    pub fn scene(&self) -> Result<&SceneTree, EngineError> {
        self.scene.as_ref().ok_or(EngineError::SceneNotRegistered)
    }

    /// Get mutable access to the active scene
    pub fn scene_mut(&mut self) -> Result<&mut SceneTree, EngineError> {
        self.scene.as_mut().ok_or(EngineError::SceneNotRegistered)
    }

    /// Unregister the active scene and hand it back
    ///
    /// Dropping the returned tree releases every node and component at once;
    /// no exit hooks run.
    pub fn shutdown_scene(&mut self) -> Result<SceneTree, EngineError> {
        let scene = self.scene.take().ok_or(EngineError::SceneNotRegistered)?;
        log::info!(
            "Scene shut down after {} frames ({} hook failures)",
            scene.frame(),
            scene.total_failures()
        );
        Ok(scene)
    }

    /// Run one tick/draw pair with an explicit frame delta
    pub fn step_frame(
        &mut self,
        delta_time: f32,
        backend: &mut dyn RenderBackend,
    ) -> Result<FrameStats, EngineError> {
        let scene = self.scene.as_mut().ok_or(EngineError::SceneNotRegistered)?;
        let frame = scene.frame();
        let failures_before = scene.total_failures();

        scene.tick(delta_time)?;
        let draws = scene.draw(backend)?;

        let stats = FrameStats {
            frame,
            delta_time,
            draws,
            failures: scene.total_failures() - failures_before,
        };
        log::trace!("{:?}", stats);
        Ok(stats)
    }

    /// Run one frame into the engine's own [`DrawList`]
    pub fn record_frame(&mut self, delta_time: f32) -> Result<FrameStats, EngineError> {
        let mut draw_list = std::mem::take(&mut self.draw_list);
        draw_list.clear();
        let stats = self.step_frame(delta_time, &mut draw_list);
        self.draw_list = draw_list;
        stats
    }

    /// Draws recorded by the last [`record_frame`](Self::record_frame)
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Run one frame timed by the engine clock
    ///
    /// The measured delta is clamped to `max_delta_time` so a stall (debugger,
    /// window drag) does not turn into one huge simulation step.
    pub fn run_frame(&mut self, backend: &mut dyn RenderBackend) -> Result<FrameStats, EngineError> {
        self.timer.update();
        let delta_time = self.config.clamp_delta(self.timer.delta_time());
        self.step_frame(delta_time, backend)
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }

    /// Get the frame timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Summary of one driven frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Index of the frame that was run
    pub frame: u64,
    /// Delta handed to `tick`
    pub delta_time: f32,
    /// Draws submitted during `draw`
    pub draws: usize,
    /// Components force-removed by failing hooks this frame
    pub failures: u64,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scene tree settings
    pub scene: SceneConfig,

    /// Initial capacity of the engine's draw list
    pub draw_list_capacity: usize,

    /// Upper bound for measured frame deltas, in seconds
    pub max_delta_time: f32,

    /// Frames a headless driver should run before stopping (0 = until stopped)
    pub target_frames: u64,
}

impl EngineConfig {
    /// Clamp a measured delta into `[0, max_delta_time]`
    pub fn clamp_delta(&self, delta_time: f32) -> f32 {
        if delta_time.is_finite() {
            delta_time.clamp(0.0, self.max_delta_time.max(0.0))
        } else {
            0.0
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            draw_list_capacity: 256,
            max_delta_time: 0.25,
            target_frames: 0,
        }
    }
}

impl Config for EngineConfig {}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A scene is already active
    #[error("a scene is already registered")]
    SceneAlreadyRegistered,

    /// No scene is active
    #[error("no scene is registered")]
    SceneNotRegistered,

    /// Scene tree misuse
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use crate::scene::{Component, ComponentError, HookResult, LogicContext, NodeBuilder};

    struct Faulty;

    impl Component for Faulty {
        fn on_start(&mut self, _ctx: &mut LogicContext<'_>) -> HookResult {
            Err(ComponentError::failed("boom"))
        }
    }

    #[test]
    fn test_scene_registration() {
        let mut engine = Engine::default();
        assert!(matches!(engine.scene(), Err(EngineError::SceneNotRegistered)));

        engine.create_scene().unwrap();
        assert!(engine.has_scene());
        assert!(matches!(
            engine.register_scene(SceneTree::default()),
            Err(EngineError::SceneAlreadyRegistered)
        ));

        let scene = engine.shutdown_scene().unwrap();
        assert!(scene.root().is_some());
        assert!(matches!(engine.scene_mut(), Err(EngineError::SceneNotRegistered)));
        assert!(matches!(engine.shutdown_scene(), Err(EngineError::SceneNotRegistered)));
    }

    #[test]
    fn test_step_frame_reports_stats() {
        let mut engine = Engine::default();
        let scene = engine.create_scene().unwrap();
        let root = scene.root().unwrap();
        scene.spawn(root, NodeBuilder::new("faulty").with_component(Faulty)).unwrap();

        let first = engine.record_frame(0.016).unwrap();
        assert_eq!(first.frame, 0);
        assert_eq!(first.draws, 0);
        assert_eq!(first.failures, 1);

        let second = engine.record_frame(0.016).unwrap();
        assert_eq!(second.frame, 1);
        assert_eq!(second.failures, 0);
        assert!(engine.draw_list().is_empty());
    }

    #[test]
    fn test_scene_errors_propagate() {
        let mut engine = Engine::default();
        engine.register_scene(SceneTree::default()).unwrap();

        let result = engine.record_frame(0.016);
        assert!(matches!(result, Err(EngineError::Scene(SceneError::NoRoot))));

        engine.shutdown_scene().unwrap();
        engine.create_scene().unwrap();
        assert!(matches!(
            engine.record_frame(-0.5),
            Err(EngineError::Scene(SceneError::InvalidDeltaTime(_)))
        ));
    }

    #[test]
    fn test_run_frame_uses_clamped_timer_delta() {
        let mut engine = Engine::new(EngineConfig {
            max_delta_time: 0.0,
            ..EngineConfig::default()
        });
        engine.create_scene().unwrap();

        let stats = engine.run_frame(&mut DrawList::new()).unwrap();
        assert_eq!(stats.delta_time, 0.0);
        assert_eq!(engine.timer().frame_count(), 1);
    }

    #[test]
    fn test_clamp_delta() {
        let config = EngineConfig::default();
        assert_eq!(config.clamp_delta(0.01), 0.01);
        assert_eq!(config.clamp_delta(3.0), 0.25);
        assert_eq!(config.clamp_delta(-1.0), 0.0);
        assert_eq!(config.clamp_delta(f32::NAN), 0.0);
    }

    #[test]
    fn test_config_from_toml() {
        let contents = r#"
            max_delta_time = 0.1
            target_frames = 600

            [scene]
            root_name = "world"
        "#;
        let config = EngineConfig::parse(contents, ConfigFormat::Toml).unwrap();
        assert_eq!(config.max_delta_time, 0.1);
        assert_eq!(config.target_frames, 600);
        assert_eq!(config.scene.root_name, "world");
        assert_eq!(config.draw_list_capacity, 256);

        let mut engine = Engine::new(config);
        let scene = engine.create_scene().unwrap();
        let root = scene.root().unwrap();
        assert_eq!(scene.node(root).unwrap().name(), "world");
    }
}
