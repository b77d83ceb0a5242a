//! genview - generation job tracking with a 3D model viewer
//!
//! The `ViewerController` is the surface front-ends drive: it polls a job,
//! estimates its progress, and shows the finished model in a `Viewer`.

pub mod controller;
pub mod settings;
pub mod state;

pub use controller::ViewerController;
pub use settings::Settings;
pub use state::{Display, DisplayState, ModelStage};
