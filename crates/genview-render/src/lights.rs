//! Light types and the viewer's studio lighting rig

use genview_core::{Color, Vec3};

/// Shadow map settings for a shadow-casting light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    /// Uniform light from every direction
    Ambient,
    /// Parallel light shining from the node position toward the origin
    Directional { shadow: Option<ShadowSettings> },
    /// Sky color from above blended with ground color from below
    Hemisphere { ground: Color },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { shadow: None },
            color,
            intensity,
        }
    }

    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Hemisphere { ground },
            color: sky,
            intensity,
        }
    }

    /// Enable shadow casting with a square map of `map_size` texels
    pub fn with_shadow(mut self, map_size: u32) -> Self {
        if let LightKind::Directional { shadow } = &mut self.kind {
            *shadow = Some(ShadowSettings { map_size });
        }
        self
    }

    pub fn casts_shadow(&self) -> bool {
        matches!(self.kind, LightKind::Directional { shadow: Some(_) })
    }
}

/// A light together with its name and placement in the scene
#[derive(Debug, Clone)]
pub struct PlacedLight {
    pub name: &'static str,
    pub light: Light,
    pub position: Vec3,
}

const HEMISPHERE_GROUND: Color = Color::rgb(0.0, 0.0, 0.0);

/// Ambient, key, fill, rim, and hemisphere lights used for every viewer session
pub fn studio_lights() -> Vec<PlacedLight> {
    vec![
        PlacedLight {
            name: "ambient",
            light: Light::ambient(Color::WHITE, 0.4),
            position: Vec3::ZERO,
        },
        PlacedLight {
            name: "key",
            light: Light::directional(Color::WHITE, 1.0).with_shadow(2048),
            position: Vec3::new(5.0, 10.0, 5.0),
        },
        PlacedLight {
            name: "fill",
            light: Light::directional(Color::WHITE, 0.3),
            position: Vec3::new(-5.0, 5.0, -5.0),
        },
        PlacedLight {
            name: "rim",
            light: Light::directional(Color::WHITE, 0.2),
            position: Vec3::new(0.0, 3.0, -8.0),
        },
        PlacedLight {
            name: "hemisphere",
            light: Light::hemisphere(Color::WHITE, HEMISPHERE_GROUND, 0.5),
            position: Vec3::new(0.0, 20.0, 0.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_key_light_casts_shadows() {
        let lights = studio_lights();
        assert_eq!(lights.len(), 5);

        let casters: Vec<_> = lights.iter().filter(|l| l.light.casts_shadow()).collect();
        assert_eq!(casters.len(), 1);
        assert_eq!(casters[0].name, "key");
        assert_eq!(
            casters[0].light.kind,
            LightKind::Directional {
                shadow: Some(ShadowSettings { map_size: 2048 })
            }
        );
    }

    #[test]
    fn test_shadow_is_ignored_for_ambient() {
        let light = Light::ambient(Color::WHITE, 1.0).with_shadow(1024);
        assert!(!light.casts_shadow());
    }
}
