//! Draw requests recorded per frame
//!
//! [`DrawList`] is the in-crate [`RenderBackend`]: it records every draw the
//! render traversal submits so a graphics backend (or a test) can consume the
//! frame's stream afterwards. The list keeps its allocation between frames.

use crate::foundation::math::Mat4;
use crate::render::backend::{MaterialHandle, MeshHandle, RenderBackend};

/// A single draw submission with its resolved world transform
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRequest {
    /// Model-to-world matrix computed by the scene graph
    pub transform: Mat4,

    /// Mesh to draw
    pub mesh: MeshHandle,

    /// Material to draw with
    pub material: MaterialHandle,
}

/// Per-frame stream of draw requests
#[derive(Debug, Default)]
pub struct DrawList {
    requests: Vec<DrawRequest>,
}

impl DrawList {
    /// Create a new empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            requests: Vec::with_capacity(capacity),
        }
    }

    /// Requests recorded since the last [`clear`](Self::clear)
    pub fn requests(&self) -> &[DrawRequest] {
        &self.requests
    }

    /// Iterate over recorded requests in submission order
    pub fn iter(&self) -> impl Iterator<Item = &DrawRequest> {
        self.requests.iter()
    }

    /// Number of recorded requests
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Drop all recorded requests, keeping capacity for the next frame
    pub fn clear(&mut self) {
        self.requests.clear();
    }

    /// Replay the recorded stream into another backend
    pub fn flush_into(&mut self, backend: &mut dyn RenderBackend) {
        for request in self.requests.drain(..) {
            backend.draw(&request.transform, request.mesh, request.material);
        }
    }
}

impl RenderBackend for DrawList {
    fn draw(&mut self, transform: &Mat4, mesh: MeshHandle, material: MaterialHandle) {
        log::trace!("draw {:?} with {:?}", mesh, material);
        self.requests.push(DrawRequest {
            transform: *transform,
            mesh,
            material,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::HandleMap;

    #[test]
    fn test_clear_keeps_capacity() {
        let mut resources: HandleMap<()> = HandleMap::new();
        let mesh = MeshHandle::new(resources.insert(()));
        let material = MaterialHandle::new(resources.insert(()));

        let mut list = DrawList::with_capacity(8);
        list.draw(&Mat4::identity(), mesh, material);
        list.draw(&Mat4::identity(), mesh, material);
        assert_eq!(list.len(), 2);

        list.clear();
        assert!(list.is_empty());
        assert!(list.requests.capacity() >= 8);
    }

    #[test]
    fn test_flush_into_preserves_order() {
        let mut resources: HandleMap<()> = HandleMap::new();
        let first = MeshHandle::new(resources.insert(()));
        let second = MeshHandle::new(resources.insert(()));
        let material = MaterialHandle::new(resources.insert(()));

        let mut list = DrawList::new();
        list.draw(&Mat4::identity(), first, material);
        list.draw(&Mat4::new_scaling(2.0), second, material);

        let mut sink = DrawList::new();
        list.flush_into(&mut sink);

        assert!(list.is_empty());
        let meshes: Vec<_> = sink.iter().map(|r| r.mesh).collect();
        assert_eq!(meshes, vec![first, second]);
    }
}
