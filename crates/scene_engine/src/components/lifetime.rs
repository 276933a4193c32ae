//! Lifetime component
//!
//! Tracks how long its node has been ticking and removes the node once the
//! duration has elapsed.

use crate::scene::{Component, HookResult, LogicContext};

/// Removes its node after `duration` seconds of logic ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    /// How long the node should live (in seconds); `<= 0` lives forever
    pub duration: f32,
    /// Time accumulated from `on_update` deltas
    pub elapsed: f32,
    expired: bool,
}

impl Lifetime {
    /// Create a new lifetime component
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            expired: false,
        }
    }

    /// A lifetime that never expires
    pub fn permanent() -> Self {
        Self::new(0.0)
    }

    /// Check if this node's lifetime has expired
    pub fn is_expired(&self) -> bool {
        self.duration > 0.0 && self.elapsed >= self.duration
    }

    /// Get remaining lifetime in seconds
    pub fn remaining(&self) -> f32 {
        if self.duration <= 0.0 {
            f32::INFINITY
        } else {
            (self.duration - self.elapsed).max(0.0)
        }
    }
}

impl Component for Lifetime {
    fn on_update(&mut self, ctx: &mut LogicContext<'_>, delta_time: f32) -> HookResult {
        self.elapsed += delta_time;
        if self.is_expired() && !self.expired {
            self.expired = true;
            log::debug!("Node '{}' expired after {:.2}s", ctx.node_name(), self.elapsed);
            let node = ctx.node_id();
            ctx.commands().remove_node(node);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawList;
    use crate::scene::{LifecycleState, NodeBuilder, SceneConfig, SceneTree};

    #[test]
    fn test_lifetime_not_expired() {
        let mut lifetime = Lifetime::new(5.0);
        lifetime.elapsed = 2.0;
        assert!(!lifetime.is_expired());
        assert_eq!(lifetime.remaining(), 3.0);
    }

    #[test]
    fn test_infinite_lifetime() {
        let mut lifetime = Lifetime::permanent();
        lifetime.elapsed = 1000.0;
        assert!(!lifetime.is_expired());
        assert_eq!(lifetime.remaining(), f32::INFINITY);
    }

    #[test]
    fn test_expired_node_is_reaped() {
        let mut tree = SceneTree::with_root(SceneConfig::default());
        let root = tree.root().unwrap();
        let comet = tree
            .spawn(
                root,
                NodeBuilder::new("comet")
                    .with_component(Lifetime::new(1.0))
                    .with_child(NodeBuilder::new("tail").with_component(Lifetime::permanent())),
            )
            .unwrap();
        let mut draws = DrawList::new();

        // Frame 0 starts, frame 1 accumulates one second and queues the removal.
        for _ in 0..2 {
            tree.tick(1.0).unwrap();
            tree.draw(&mut draws).unwrap();
        }
        assert!(tree.node(comet).unwrap().is_removal_requested());
        let lifecycle = tree.lifecycle::<Lifetime>(comet).unwrap();
        assert_eq!(lifecycle.logic, LifecycleState::ToBeRemoved);
        assert_eq!(lifecycle.render, LifecycleState::ToBeRemoved);

        // Frame 2 runs both exit hooks; the subtree is reaped at the boundary
        // after the last of them.
        tree.tick(1.0).unwrap();
        assert!(tree.contains(comet));
        tree.draw(&mut draws).unwrap();
        assert!(!tree.contains(comet));
        assert_eq!(tree.node_count(), 1);
        assert!(tree.node(root).unwrap().children().is_empty());
    }
}
