//! Orbit demo application
//!
//! Builds a small solar system (sun, planet, moon) out of nested pivots and
//! lets comets with random trajectories fly through it, each removing itself
//! after a random lifetime. Runs headless: draws go to a backend that only
//! tallies and logs them.

use std::thread;
use std::time::Duration;

use rand::prelude::*;
use scene_engine::foundation::collections::{HandleMap, TypedHandle};
use scene_engine::foundation::math::{translation_of, Mat4};
use scene_engine::prelude::*;

// Configuration constants
const CONFIG_PATH: &str = "orbit_demo.toml";
const DEFAULT_FRAMES: u64 = 600;
const FRAME_TIME: Duration = Duration::from_millis(16);
const MAX_COMETS: usize = 8;
const FIXED_BODIES: usize = 2; // sun and planet pivot
const COMET_INTERVAL: f32 = 0.75;

/// Headless backend that counts submissions and logs them at trace level
#[derive(Default)]
struct TallyBackend {
    frame_draws: usize,
    total_draws: u64,
}

impl TallyBackend {
    fn begin_frame(&mut self) {
        self.frame_draws = 0;
    }
}

impl RenderBackend for TallyBackend {
    fn draw(&mut self, transform: &Mat4, mesh: MeshHandle, material: MaterialHandle) {
        self.frame_draws += 1;
        self.total_draws += 1;
        log::trace!(
            "draw {:?}/{:?} at ({:.2}, {:.2}, {:.2})",
            mesh,
            material,
            transform[(0, 3)],
            transform[(1, 3)],
            transform[(2, 3)]
        );
    }
}

/// Resource handles shared by every renderer in the scene
#[derive(Clone, Copy)]
struct Palette {
    sphere: MeshHandle,
    shard: MeshHandle,
    sun: MaterialHandle,
    rock: MaterialHandle,
    ice: MaterialHandle,
}

impl Palette {
    fn load(meshes: &mut HandleMap<&'static str>, materials: &mut HandleMap<&'static str>) -> Self {
        Self {
            sphere: TypedHandle::new(meshes.insert("sphere")),
            shard: TypedHandle::new(meshes.insert("shard")),
            sun: TypedHandle::new(materials.insert("sun")),
            rock: TypedHandle::new(materials.insert("rock")),
            ice: TypedHandle::new(materials.insert("ice")),
        }
    }
}

/// Launches comets from the edge of the system at a fixed interval
struct CometLauncher {
    palette: Palette,
    since_last: f32,
    launched: u64,
    rng: ThreadRng,
}

impl CometLauncher {
    fn new(palette: Palette) -> Self {
        Self {
            palette,
            since_last: 0.0,
            launched: 0,
            rng: thread_rng(),
        }
    }

    fn comet(&mut self) -> NodeBuilder {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let start = Vec3::new(angle.cos() * 30.0, self.rng.gen_range(-2.0..2.0), angle.sin() * 30.0);
        let target = Vec3::new(self.rng.gen_range(-5.0..5.0), 0.0, self.rng.gen_range(-5.0..5.0));
        let speed = self.rng.gen_range(6.0..14.0);
        let spin_axis = Vec3::new(self.rng.gen(), self.rng.gen(), self.rng.gen());

        self.launched += 1;
        NodeBuilder::new(format!("comet-{}", self.launched))
            .with_transform(Transform::from_position(start).with_uniform_scale(0.3))
            .with_component(
                Rotator::new(spin_axis, self.rng.gen_range(1.0..4.0))
                    .with_linear_velocity((target - start).normalize() * speed),
            )
            .with_component(MeshRenderer::new(self.palette.shard, self.palette.ice))
            .with_component(Lifetime::new(self.rng.gen_range(3.0..6.0)))
    }
}

impl Component for CometLauncher {
    fn on_update(&mut self, ctx: &mut LogicContext<'_>, delta_time: f32) -> HookResult {
        self.since_last += delta_time;
        if self.since_last < COMET_INTERVAL {
            return Ok(());
        }
        self.since_last = 0.0;

        if ctx.children().len() >= MAX_COMETS + FIXED_BODIES {
            log::debug!("Comet limit reached, skipping launch");
            return Ok(());
        }
        let comet = self.comet();
        let node = ctx.node_id();
        ctx.commands().add_child(node, comet);
        Ok(())
    }
}

fn build_system(scene: &mut SceneTree, palette: Palette) -> Result<NodeId, SceneError> {
    let root = scene.root_id()?;
    scene.attach_component(root, |_| CometLauncher::new(palette))?;

    let moon = NodeBuilder::new("moon-pivot")
        .with_component(Rotator::new(Vec3::y(), 2.5))
        .with_child(
            NodeBuilder::new("moon")
                .with_transform(Transform::from_position(Vec3::new(2.0, 0.0, 0.0)).with_uniform_scale(0.25))
                .with_component(MeshRenderer::new(palette.sphere, palette.rock)),
        );
    let planet = NodeBuilder::new("planet-pivot")
        .with_component(Rotator::new(Vec3::y(), 0.6))
        .with_child(
            NodeBuilder::new("planet")
                .with_position(Vec3::new(10.0, 0.0, 0.0))
                .with_component(Rotator::new(Vec3::new(0.1, 1.0, 0.0), 1.5))
                .with_component(MeshRenderer::new(palette.sphere, palette.rock))
                .with_child(moon),
        );
    let sun = NodeBuilder::new("sun")
        .with_transform(Transform::identity().with_uniform_scale(3.0))
        .with_component(Rotator::new(Vec3::y(), 0.2))
        .with_component(MeshRenderer::new(palette.sphere, palette.sun));

    scene.spawn(root, sun)?;
    scene.spawn(root, planet)
}

fn run(config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let frames = match config.target_frames {
        0 => DEFAULT_FRAMES,
        n => n,
    };

    let mut meshes = HandleMap::new();
    let mut materials = HandleMap::new();
    let palette = Palette::load(&mut meshes, &mut materials);
    log::info!("Loaded {} meshes and {} materials", meshes.len(), materials.len());

    let mut engine = Engine::new(config);
    build_system(engine.create_scene()?, palette)?;

    let mut backend = TallyBackend::default();
    for _ in 0..frames {
        backend.begin_frame();
        let stats = engine.run_frame(&mut backend)?;

        if stats.failures > 0 {
            for failure in engine.scene_mut()?.take_failures() {
                log::warn!("{}", failure);
            }
        }
        if stats.frame % 60 == 0 {
            let scene = engine.scene()?;
            let moon = scene.find_path("planet-pivot/planet/moon-pivot/moon");
            let moon_position = moon
                .map(|id| scene.global_transform(id))
                .transpose()?
                .map(|world| translation_of(&world));
            log::info!(
                "frame {:>4}: {} nodes, {} draws, moon at {:?}",
                stats.frame,
                scene.node_count(),
                backend.frame_draws,
                moon_position.map(|p| (p.x, p.y, p.z))
            );
        }
        thread::sleep(FRAME_TIME);
    }

    let scene = engine.shutdown_scene()?;
    log::info!(
        "Ran {} frames, {} draws submitted, {} nodes at shutdown, {:.1} fps",
        scene.frame(),
        backend.total_draws,
        scene.node_count(),
        engine.timer().average_fps()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting orbit demo");

    let config = EngineConfig::load_or_default(CONFIG_PATH)?;
    match run(config) {
        Ok(()) => {
            log::info!("Orbit demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Orbit demo failed: {:?}", e);
            Err(e)
        }
    }
}
