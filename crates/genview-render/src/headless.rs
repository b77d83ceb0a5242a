//! Headless rendering backend
//!
//! Walks the draw list exactly as a GPU backend would, packing vertex data and
//! push constants, but records what it would have submitted instead of drawing.
//! Used by the CLI and by tests that need to observe renderer lifetimes.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::camera::PerspectiveCamera;
use crate::error::RenderError;
use crate::graph::{Geometry, SceneGraph};
use crate::handle::Handle;
use crate::renderer::{DrawConstants, Renderer, Surface};
use crate::vertex::vertex_bytes;

/// What headless renderers on one surface have done so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessStats {
    pub renderers_created: usize,
    pub renderers_disposed: usize,
    pub frames: u64,
    /// Draw calls in the most recent frame
    pub draw_calls: usize,
    /// Geometry uploads over the surface's lifetime
    pub geometry_uploads: usize,
    pub uploaded_bytes: usize,
    /// Geometries currently held by the live renderer
    pub resident_geometries: usize,
    pub resident_bytes: usize,
    pub push_constant_bytes: usize,
    /// Size of the most recently created or resized renderer
    pub renderer_size: (u32, u32),
}

impl HeadlessStats {
    pub fn live_renderers(&self) -> usize {
        self.renderers_created - self.renderers_disposed
    }
}

/// In-memory surface. Clones share size and statistics.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    size: Rc<Cell<(u32, u32)>>,
    stats: Rc<RefCell<HeadlessStats>>,
    fail_next_create: Rc<Cell<bool>>,
    fail_dispose: Rc<Cell<bool>>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Rc::new(Cell::new((width, height))),
            stats: Rc::new(RefCell::new(HeadlessStats::default())),
            fail_next_create: Rc::new(Cell::new(false)),
            fail_dispose: Rc::new(Cell::new(false)),
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    pub fn stats(&self) -> HeadlessStats {
        self.stats.borrow().clone()
    }

    /// Make the next `create_renderer` call fail
    pub fn fail_next_renderer(&self) {
        self.fail_next_create.set(true);
    }

    /// Make renderer disposal report an error (the renderer is still released)
    pub fn fail_dispose(&self, fail: bool) {
        self.fail_dispose.set(fail);
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn create_renderer(&self) -> Result<Box<dyn Renderer>, RenderError> {
        let mut stats = self.stats.borrow_mut();
        if stats.live_renderers() > 0 {
            return Err(RenderError::SurfaceBusy);
        }
        if self.fail_next_create.replace(false) {
            return Err(RenderError::Backend("no adapter available".into()));
        }

        stats.renderers_created += 1;
        stats.renderer_size = self.size.get();
        debug!("Created headless renderer #{}", stats.renderers_created);

        Ok(Box::new(HeadlessRenderer {
            stats: Rc::clone(&self.stats),
            fail_dispose: Rc::clone(&self.fail_dispose),
            uploaded: HashMap::new(),
            disposed: false,
        }))
    }
}

struct HeadlessRenderer {
    stats: Rc<RefCell<HeadlessStats>>,
    fail_dispose: Rc<Cell<bool>>,
    /// Uploaded geometries and their buffer sizes
    uploaded: HashMap<Handle<Geometry>, usize>,
    disposed: bool,
}

impl Renderer for HeadlessRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.stats.borrow_mut().renderer_size = (width, height);
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::ContextLost);
        }

        let view_projection = camera.projection_matrix() * camera.view_matrix();
        let mut stats = self.stats.borrow_mut();
        let mut draw_calls = 0;

        // Buffers of geometries the scene has released
        self.uploaded.retain(|handle, _| scene.geometry(*handle).is_some());

        for item in scene.draw_list() {
            let (Some(geometry), Some(material)) =
                (scene.geometry(item.geometry), scene.material(item.material))
            else {
                continue;
            };

            if !self.uploaded.contains_key(&item.geometry) {
                let bytes = vertex_bytes(&geometry.mesh.vertices).len()
                    + bytemuck::cast_slice::<u32, u8>(&geometry.mesh.indices).len();
                self.uploaded.insert(item.geometry, bytes);
                stats.geometry_uploads += 1;
                stats.uploaded_bytes += bytes;
            }

            let constants = DrawConstants::new(item.world, view_projection, material, item.receive_shadow);
            stats.push_constant_bytes += bytemuck::bytes_of(&constants).len();
            draw_calls += 1;
        }

        stats.frames += 1;
        stats.draw_calls = draw_calls;
        stats.resident_geometries = self.uploaded.len();
        stats.resident_bytes = self.uploaded.values().sum();
        trace!("Headless frame {}: {} draw calls", stats.frames, draw_calls);
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), RenderError> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.uploaded.clear();
        let mut stats = self.stats.borrow_mut();
        stats.renderers_disposed += 1;
        stats.resident_geometries = 0;
        stats.resident_bytes = 0;
        drop(stats);

        if self.fail_dispose.get() {
            return Err(RenderError::Backend("context was already lost".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Material, Node, NodeKind};
    use crate::mesh::Mesh;
    use genview_core::Color;

    fn scene() -> SceneGraph {
        let mut graph = SceneGraph::new();
        let geometry = graph.add_geometry(Geometry::new(Mesh::sphere(1.0, 4, 4, [1.0; 4])));
        let material = graph.add_material(Material::standard(Color::WHITE, 0.0, 1.0));
        graph.add_node(None, Node::new(NodeKind::Mesh { geometry, material }));
        graph.add_node(None, Node::new(NodeKind::Mesh { geometry, material }));
        graph
    }

    #[test]
    fn test_one_live_renderer_per_surface() {
        let surface = HeadlessSurface::new(800, 500);
        let mut first = surface.create_renderer().unwrap();
        assert!(matches!(surface.create_renderer(), Err(RenderError::SurfaceBusy)));

        first.dispose().unwrap();
        first.dispose().unwrap();
        assert!(surface.create_renderer().is_ok());
        assert_eq!(surface.stats().renderers_disposed, 1);
    }

    #[test]
    fn test_shared_geometry_uploaded_once() {
        let surface = HeadlessSurface::new(800, 500);
        let mut renderer = surface.create_renderer().unwrap();
        let graph = scene();
        let camera = PerspectiveCamera::new(45.0, 1.6, 0.1, 1000.0);

        renderer.render(&graph, &camera).unwrap();
        renderer.render(&graph, &camera).unwrap();

        let stats = surface.stats();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.geometry_uploads, 1);
        assert_eq!(stats.push_constant_bytes, 4 * 160);
    }

    #[test]
    fn test_released_geometry_leaves_renderer() {
        let surface = HeadlessSurface::new(800, 500);
        let mut renderer = surface.create_renderer().unwrap();
        let camera = PerspectiveCamera::new(45.0, 1.6, 0.1, 1000.0);

        let mut graph = scene();
        let group = graph.add_node(None, Node::new(NodeKind::Group));
        let geometry = graph.add_geometry(Geometry::new(Mesh::sphere(0.5, 4, 4, [1.0; 4])));
        let material = graph.add_material(Material::standard(Color::WHITE, 0.0, 1.0));
        graph.add_node(Some(group), Node::new(NodeKind::Mesh { geometry, material }));

        renderer.render(&graph, &camera).unwrap();
        let before = surface.stats();
        assert_eq!(before.resident_geometries, 2);

        graph.remove_subtree(group);
        renderer.render(&graph, &camera).unwrap();
        let after = surface.stats();
        assert_eq!(after.resident_geometries, 1);
        assert!(after.resident_bytes < before.resident_bytes);
        assert_eq!(after.geometry_uploads, 2);

        renderer.dispose().unwrap();
        assert_eq!(surface.stats().resident_geometries, 0);
    }

    #[test]
    fn test_render_after_dispose_fails() {
        let surface = HeadlessSurface::new(800, 500);
        let mut renderer = surface.create_renderer().unwrap();
        renderer.dispose().unwrap();

        let camera = PerspectiveCamera::new(45.0, 1.6, 0.1, 1000.0);
        assert!(matches!(
            renderer.render(&SceneGraph::new(), &camera),
            Err(RenderError::ContextLost)
        ));
    }

    #[test]
    fn test_failed_dispose_still_releases() {
        let surface = HeadlessSurface::new(800, 500);
        surface.fail_dispose(true);
        let mut renderer = surface.create_renderer().unwrap();
        assert!(renderer.dispose().is_err());
        assert_eq!(surface.stats().live_renderers(), 0);
    }
}
