//! Viewer session
//!
//! A session owns everything needed to show one source on one surface: the
//! scene graph, camera, orbit controls, renderer, and the per-frame render
//! loop. Sessions are never reused; changing the source tears the session down
//! and builds a new one.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use genview_assets::SceneAsset;
use genview_core::{millis, Color, Debounce, Transform, Vec2, Vec3};
use tracing::{debug, info, warn};

use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::error::RenderError;
use crate::graph::{Geometry, Material, Node, NodeKind, SceneGraph};
use crate::handle::Handle;
use crate::lights::studio_lights;
use crate::mesh::Mesh;
use crate::renderer::{Renderer, Surface};

const GRID_SIZE: f32 = 10.0;
const GRID_DIVISIONS: u32 = 20;
const GRID_HEIGHT: f32 = -0.5;
const GRID_CENTER_COLOR: u32 = 0xd4d4d4;
const GRID_COLOR: u32 = 0xe5e5e5;

const PLACEHOLDER_COLOR: u32 = 0x3b82f6;
const PLACEHOLDER_SEGMENTS: u32 = 32;

/// Environment reflection strength applied to loaded materials
const ASSET_ENV_MAP_INTENSITY: f32 = 0.8;

/// Per-frame task of a session. Dropping it stops the loop.
#[derive(Debug, Default)]
struct RenderLoop {
    ticks: u64,
}

pub struct ViewerSession {
    config: ViewerConfig,
    graph: SceneGraph,
    camera: Option<PerspectiveCamera>,
    controls: Option<OrbitControls>,
    renderer: Option<Box<dyn Renderer>>,
    render_loop: Option<RenderLoop>,
    content: Option<Handle<Node>>,
    base_distance: f32,
    /// Latest camera distance reported by the controls' change listener
    camera_moved: Rc<Cell<Option<f32>>>,
    zoom_debounce: Debounce<u32>,
    torn_down: bool,
}

impl ViewerSession {
    /// Build the stage, camera, controls, and renderer for `surface` and start the render loop.
    ///
    /// If the renderer cannot be created, everything built so far is torn down
    /// before the error is returned.
    pub fn new(surface: &dyn Surface, config: ViewerConfig) -> Result<Self, RenderError> {
        let (width, height) = surface.size();
        let base_distance = config.placeholder_base_distance;

        let mut session = Self {
            zoom_debounce: Debounce::new(millis(config.zoom_debounce_ms)),
            config,
            graph: SceneGraph::new(),
            camera: None,
            controls: None,
            renderer: None,
            render_loop: None,
            content: None,
            base_distance,
            camera_moved: Rc::new(Cell::new(None)),
            torn_down: false,
        };
        session.build_stage();

        let mut camera = PerspectiveCamera::for_surface(&session.config, width, height);
        camera.place(Vec3::ONE, base_distance);
        let mut controls = OrbitControls::new(&session.config, &camera);
        let moved = Rc::clone(&session.camera_moved);
        controls.add_listener(move |distance| moved.set(Some(distance)));
        session.camera = Some(camera);
        session.controls = Some(controls);

        match surface.create_renderer() {
            Ok(mut renderer) => {
                if width > 0 && height > 0 {
                    renderer.resize(width, height);
                }
                session.renderer = Some(renderer);
            }
            Err(e) => {
                warn!("Failed to create renderer: {}", e);
                session.teardown();
                return Err(e);
            }
        }

        session.render_loop = Some(RenderLoop::default());
        info!("Viewer session started ({}x{})", width, height);
        Ok(session)
    }

    fn build_stage(&mut self) {
        for placed in studio_lights() {
            self.graph.add_node(
                None,
                Node::named(placed.name, NodeKind::Light(placed.light))
                    .with_transform(Transform::from_position(placed.position)),
            );
        }

        let geometry = self.graph.add_geometry(Geometry::new(Mesh::grid(
            GRID_SIZE,
            GRID_DIVISIONS,
            Color::from_hex(GRID_CENTER_COLOR).to_array(),
            Color::from_hex(GRID_COLOR).to_array(),
        )));
        let material = self
            .graph
            .add_material(Material::standard(Color::WHITE, 0.0, 1.0));
        self.graph.add_node(
            None,
            Node::named("grid", NodeKind::Mesh { geometry, material })
                .with_transform(Transform::from_position(Vec3::new(0.0, GRID_HEIGHT, 0.0))),
        );
    }

    /// Show the built-in sphere at the configured nominal distance
    pub fn show_placeholder(&mut self, zoom_percent: u32) {
        self.remove_content();

        let geometry = self.graph.add_geometry(Geometry::new(Mesh::sphere(
            1.0,
            PLACEHOLDER_SEGMENTS,
            PLACEHOLDER_SEGMENTS,
            Color::WHITE.to_array(),
        )));
        let material = self.graph.add_material(Material::standard(
            Color::from_hex(PLACEHOLDER_COLOR),
            0.7,
            0.2,
        ));
        let mut sphere = Node::named("placeholder", NodeKind::Mesh { geometry, material });
        sphere.cast_shadow = true;
        sphere.receive_shadow = true;

        self.content = Some(self.graph.add_node(None, sphere));
        self.base_distance = self.config.placeholder_base_distance;
        self.frame_camera(zoom_percent);
    }

    /// Add a loaded asset, normalized to the configured size and centered on the origin
    pub fn show_asset(&mut self, asset: &SceneAsset, zoom_percent: u32) {
        self.remove_content();

        let root = self.graph.instantiate(asset, None);
        for handle in self.graph.descendants(root) {
            let Some(node) = self.graph.node_mut(handle) else {
                continue;
            };
            let NodeKind::Mesh { material, .. } = node.kind else {
                continue;
            };
            node.cast_shadow = true;
            node.receive_shadow = true;
            if let Some(material) = self.graph.material_mut(material) {
                material.env_map_intensity = ASSET_ENV_MAP_INTENSITY;
            }
        }

        self.base_distance = self.normalize(root);
        self.content = Some(root);
        self.frame_camera(zoom_percent);
        debug!("Asset placed with base distance {:.3}", self.base_distance);
    }

    /// Scale `root` so its largest extent matches the normalization target and
    /// center it on the origin. Returns the base camera distance.
    fn normalize(&mut self, root: Handle<Node>) -> f32 {
        let extent = self.graph.bounding_box(root).max_extent();
        let scale = if extent > 0.0 {
            self.config.normalize_target / extent
        } else {
            1.0
        };
        if let Some(node) = self.graph.node_mut(root) {
            node.transform.scale_by(scale);
        }

        let center = self.graph.bounding_box(root).center();
        if let Some(node) = self.graph.node_mut(root) {
            node.transform.position -= center;
        }

        let base = self.graph.bounding_box(root).max_extent() * 2.0;
        if base > 0.0 {
            base
        } else {
            self.config.placeholder_base_distance
        }
    }

    /// Point the camera at the origin along the viewing diagonal at the zoomed distance
    fn frame_camera(&mut self, zoom_percent: u32) {
        let zoom_percent = self.config.clamp_zoom(zoom_percent);
        let distance = self.distance_for(zoom_percent);
        let min = self.distance_for(self.config.max_zoom);
        let max = self.distance_for(self.config.min_zoom);

        if let (Some(camera), Some(controls)) = (&mut self.camera, &mut self.controls) {
            controls.set_distance_limits(min, max);
            controls.target = Vec3::ZERO;
            camera.target = Vec3::ZERO;
            camera.place(Vec3::ONE, distance);
            controls.sync(camera);
        }
        self.camera_moved.set(None);
        self.zoom_debounce.cancel();
    }

    fn remove_content(&mut self) {
        if let Some(content) = self.content.take() {
            let released = self.graph.remove_subtree(content);
            debug!("Removed content, released {} resources", released.total());
        }
    }

    fn distance_for(&self, zoom_percent: u32) -> f32 {
        self.base_distance / (zoom_percent as f32 / 100.0)
    }

    fn percent_for(&self, distance: f32) -> u32 {
        if distance <= 0.0 {
            return self.config.max_zoom;
        }
        let percent = (self.base_distance / distance * 100.0).round();
        let percent = percent.clamp(self.config.min_zoom as f32, self.config.max_zoom as f32);
        percent as u32
    }

    /// Move the camera along its current direction to the distance for
    /// `percent`. Does nothing once the camera is gone. Returns whether the
    /// camera moved.
    pub fn set_zoom(&mut self, percent: u32) -> bool {
        let distance = self.distance_for(self.config.clamp_zoom(percent));
        match (&mut self.camera, &mut self.controls) {
            (Some(camera), Some(controls)) => {
                controls.set_distance(camera, distance);
                true
            }
            _ => false,
        }
    }

    /// Zoom percentage for the camera's current distance
    pub fn zoom_percent(&self) -> Option<u32> {
        self.camera.as_ref().map(|c| self.percent_for(c.distance()))
    }

    pub fn base_distance(&self) -> f32 {
        self.base_distance
    }

    /// Follow a surface resize. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(camera) = &mut self.camera {
            camera.set_aspect(width as f32 / height as f32);
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(width, height);
        }
    }

    /// Drag input for the orbit controls
    pub fn orbit(&mut self, delta: Vec2) {
        if let Some(controls) = &mut self.controls {
            controls.rotate(delta);
        }
    }

    /// Scroll input for the orbit controls
    pub fn scroll(&mut self, steps: f32) {
        if let Some(controls) = &mut self.controls {
            controls.dolly(steps);
        }
    }

    /// Run one iteration of the render loop.
    ///
    /// Returns a zoom percentage once camera movement from user input has
    /// settled for the debounce period.
    pub fn frame(&mut self, now: Duration) -> Option<u32> {
        if self.torn_down {
            return None;
        }
        let render_loop = self.render_loop.as_mut()?;
        render_loop.ticks += 1;

        if let (Some(camera), Some(controls)) = (&mut self.camera, &mut self.controls) {
            controls.update(camera);
        }
        if let Some(distance) = self.camera_moved.take() {
            let percent = self.percent_for(distance);
            self.zoom_debounce.push(percent, now);
        }
        let settled = self.zoom_debounce.poll(now);

        if let (Some(renderer), Some(camera)) = (&mut self.renderer, &self.camera) {
            if let Err(e) = renderer.render(&self.graph, camera) {
                warn!("Render failed: {}", e);
            }
        }
        settled
    }

    /// Enter the error state: drop the content, camera, and controls but keep the loop running
    pub fn fail(&mut self) {
        self.remove_content();
        if let Some(mut controls) = self.controls.take() {
            controls.dispose();
        }
        self.camera = None;
        self.camera_moved.set(None);
        self.zoom_debounce.cancel();
    }

    /// Release everything the session owns. Safe to call more than once and on
    /// a session whose construction did not finish.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.render_loop = None;

        if let Some(mut controls) = self.controls.take() {
            controls.remove_all_listeners();
            controls.dispose();
        }

        if let Some(mut renderer) = self.renderer.take() {
            if let Err(e) = renderer.dispose() {
                warn!("Error disposing renderer: {}", e);
            }
        }

        let released = self.graph.dispose_resources();
        self.graph.clear();
        self.camera = None;
        self.content = None;
        self.zoom_debounce.cancel();

        debug!("Viewer session torn down, released {} resources", released.total());
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn content(&self) -> Option<Handle<Node>> {
        self.content
    }

    /// Whether the render loop is still scheduled
    pub fn is_running(&self) -> bool {
        self.render_loop.is_some()
    }

    /// Render loop iterations so far
    pub fn ticks(&self) -> u64 {
        self.render_loop.as_ref().map_or(0, |l| l.ticks)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
