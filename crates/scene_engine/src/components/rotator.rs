//! Kinematic motion component
//!
//! Integrates a constant linear and angular velocity into the owning node's
//! local transform on every logic tick.

use crate::foundation::math::{Quat, Vec3};
use crate::scene::{Component, HookResult, LogicContext};

/// Component for nodes that spin and drift at a constant rate
#[derive(Debug, Clone, PartialEq)]
pub struct Rotator {
    /// Angular velocity as a scaled axis, in radians per second
    pub angular_velocity: Vec3,

    /// Linear velocity in parent space, in units per second
    pub linear_velocity: Vec3,

    /// Whether movement is enabled
    pub enabled: bool,
}

impl Rotator {
    /// Spin about `axis` at `radians_per_second`
    pub fn new(axis: Vec3, radians_per_second: f32) -> Self {
        let angular_velocity = axis
            .try_normalize(f32::EPSILON)
            .map_or_else(Vec3::zeros, |axis| axis * radians_per_second);
        Self {
            angular_velocity,
            linear_velocity: Vec3::zeros(),
            enabled: true,
        }
    }

    /// Add a constant drift
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Enable or disable movement
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Get rotation delta for this frame
    pub fn rotation_delta(&self, delta_time: f32) -> Quat {
        Quat::from_scaled_axis(self.angular_velocity * delta_time)
    }
}

impl Default for Rotator {
    fn default() -> Self {
        Self::new(Vec3::y(), 0.0)
    }
}

impl Component for Rotator {
    fn on_update(&mut self, ctx: &mut LogicContext<'_>, delta_time: f32) -> HookResult {
        if !self.enabled {
            return Ok(());
        }
        let delta = self.rotation_delta(delta_time);
        let transform = ctx.local_transform_mut();
        transform.position += self.linear_velocity * delta_time;
        transform.rotation = delta * transform.rotation;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use crate::scene::{NodeBuilder, SceneConfig, SceneTree};
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_axis_does_not_spin() {
        let rotator = Rotator::new(Vec3::zeros(), 3.0);
        assert_eq!(rotator.angular_velocity, Vec3::zeros());
        assert_relative_eq!(rotator.rotation_delta(1.0).angle(), 0.0);
    }

    #[test]
    fn test_motion_starts_on_second_tick() {
        let mut tree = SceneTree::with_root(SceneConfig::default());
        let root = tree.root().unwrap();
        let node = tree
            .spawn(
                root,
                NodeBuilder::new("spinner")
                    .with_component(Rotator::new(Vec3::z(), HALF_PI).with_linear_velocity(Vec3::x())),
            )
            .unwrap();
        let mut draws = crate::render::DrawList::new();

        // First tick runs on_start only.
        tree.tick(1.0).unwrap();
        tree.draw(&mut draws).unwrap();
        assert_relative_eq!(tree.local_transform(node).unwrap().position, Vec3::zeros());

        tree.tick(1.0).unwrap();
        tree.draw(&mut draws).unwrap();
        let local = tree.local_transform(node).unwrap();
        assert_relative_eq!(local.position, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(local.rotation.angle(), HALF_PI, epsilon = 1e-5);

        let world_x = tree.global_transform(node).unwrap().transform_vector(&Vec3::x());
        assert_relative_eq!(world_x, Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_disabled_rotator_holds_still() {
        let mut tree = SceneTree::with_root(SceneConfig::default());
        let root = tree.root().unwrap();
        let mut rotator = Rotator::new(Vec3::y(), 1.0).with_linear_velocity(Vec3::z());
        rotator.set_enabled(false);
        let node = tree.spawn(root, NodeBuilder::new("idle").with_component(rotator)).unwrap();
        let mut draws = crate::render::DrawList::new();

        for _ in 0..3 {
            tree.tick(0.5).unwrap();
            tree.draw(&mut draws).unwrap();
        }
        assert_eq!(tree.local_transform(node).unwrap(), crate::foundation::math::Transform::identity());
    }
}
