//! Viewer configuration

use serde::{Deserialize, Serialize};

/// Viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Largest extent of a loaded model after normalization
    pub normalize_target: f32,
    /// Base camera distance for the built-in placeholder
    pub placeholder_base_distance: f32,
    /// Lowest zoom percentage reported or accepted
    pub min_zoom: u32,
    /// Highest zoom percentage reported or accepted
    pub max_zoom: u32,
    /// Zoom applied when a session is first built
    pub default_zoom: u32,
    /// Quiet period before a camera-driven zoom change is reported
    pub zoom_debounce_ms: u64,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Orbit damping factor (0 disables inertia)
    pub damping: f32,
    /// Radians of orbit per unit of drag input
    pub rotate_speed: f32,
    /// Dolly sensitivity per scroll step
    pub zoom_speed: f32,
    /// Surface size used when the surface reports zero
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            normalize_target: 2.0,
            placeholder_base_distance: 3.0,
            min_zoom: 25,
            max_zoom: 200,
            default_zoom: 100,
            zoom_debounce_ms: 50,
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            fallback_width: 800,
            fallback_height: 500,
        }
    }
}

impl ViewerConfig {
    /// Clamp a zoom percentage into the configured range
    pub fn clamp_zoom(&self, percent: u32) -> u32 {
        percent.clamp(self.min_zoom, self.max_zoom)
    }

    /// Aspect ratio for a surface, substituting the fallback size for zero dimensions
    pub fn aspect_for(&self, width: u32, height: u32) -> f32 {
        let width = if width == 0 { self.fallback_width } else { width };
        let height = if height == 0 { self.fallback_height } else { height };
        width as f32 / height.max(1) as f32
    }
}
