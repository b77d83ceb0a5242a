//! Genview Render - scene graph, orbit camera, and viewer sessions
//!
//! A `Viewer` owns at most one `ViewerSession` per mounted surface. The session
//! holds an arena scene graph, a perspective camera with damped orbit controls,
//! and a renderer created through the `Surface` trait. The headless backend
//! records what a GPU backend would submit.

pub mod bounds;
pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod graph;
pub mod handle;
pub mod headless;
pub mod lights;
pub mod mesh;
pub mod renderer;
pub mod session;
pub mod vertex;
pub mod viewer;

pub use bounds::Aabb;
pub use camera::PerspectiveCamera;
pub use config::ViewerConfig;
pub use controls::{ListenerId, OrbitControls};
pub use error::{RenderError, ViewerError};
pub use graph::{Geometry, Material, Node, NodeKind, ResourceCounts, SceneGraph, Texture};
pub use handle::Handle;
pub use headless::{HeadlessStats, HeadlessSurface};
pub use lights::{Light, LightKind};
pub use mesh::{Mesh, Topology};
pub use renderer::{DrawConstants, Renderer, Surface};
pub use session::ViewerSession;
pub use vertex::Vertex3D;
pub use viewer::{Viewer, ViewerSource, ViewerStatus};
