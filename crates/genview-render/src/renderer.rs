//! Rendering backend seams

use bytemuck::{Pod, Zeroable};
use genview_core::Mat4;

use crate::camera::PerspectiveCamera;
use crate::error::RenderError;
use crate::graph::{Material, SceneGraph};

/// Draws a scene graph into a surface
pub trait Renderer {
    /// Resize the drawing buffer; zero sizes are never passed
    fn resize(&mut self, width: u32, height: u32);

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Release the GPU context. Calling it again is a no-op.
    fn dispose(&mut self) -> Result<(), RenderError>;
}

/// Something a viewer can be mounted on
pub trait Surface {
    /// Current size in pixels; either dimension may be zero while hidden
    fn size(&self) -> (u32, u32);

    /// Create the surface's renderer. Surfaces support one live renderer at a time.
    fn create_renderer(&self) -> Result<Box<dyn Renderer>, RenderError>;
}

/// Per-draw push constants for the standard mesh pipeline
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DrawConstants {
    pub model: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    /// x = metalness, y = roughness, z = env map intensity, w = receives shadows
    pub surface: [f32; 4],
}

impl DrawConstants {
    pub fn new(model: Mat4, view_projection: Mat4, material: &Material, receive_shadow: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view_projection: view_projection.to_cols_array_2d(),
            base_color: material.color.to_array(),
            surface: [
                material.metalness,
                material.roughness,
                material.env_map_intensity,
                if receive_shadow { 1.0 } else { 0.0 },
            ],
        }
    }
}
