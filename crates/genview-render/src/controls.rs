//! Orbit camera controls with damping
//!
//! Input accumulates into pending rotation and dolly amounts that `update`
//! applies to the camera once per frame. With damping enabled only a fraction
//! of the pending rotation is applied each frame, giving the camera inertia.

use std::f32::consts::PI;

use genview_core::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;

/// Smallest squared camera movement reported as a change
const CHANGE_EPSILON: f32 = 1e-6;
/// Keeps the polar angle off the poles, where the view basis degenerates
const POLE_EPSILON: f32 = 1e-3;

/// Identifies a registered change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

type ChangeListener = Box<dyn FnMut(f32)>;

pub struct OrbitControls {
    /// Point the camera orbits around
    pub target: Vec3,
    damping: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_scale: f32,
    last_position: Vec3,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
    disposed: bool,
}

impl OrbitControls {
    /// Controls orbiting the origin, starting from the camera's current position
    pub fn new(config: &ViewerConfig, camera: &PerspectiveCamera) -> Self {
        Self {
            target: Vec3::ZERO,
            damping: config.damping.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            last_position: camera.position,
            listeners: Vec::new(),
            next_listener: 0,
            disposed: false,
        }
    }

    pub fn set_distance_limits(&mut self, min: f32, max: f32) {
        self.min_distance = min.max(0.0);
        self.max_distance = max.max(self.min_distance);
    }

    pub fn distance_limits(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    /// Queue an orbit by a drag delta (x turns around the target, y tilts)
    pub fn rotate(&mut self, delta: Vec2) {
        if self.disposed {
            return;
        }
        self.pending_theta -= delta.x * self.rotate_speed;
        self.pending_phi -= delta.y * self.rotate_speed;
    }

    /// Queue a dolly by scroll steps; positive steps move toward the target
    pub fn dolly(&mut self, steps: f32) {
        if self.disposed {
            return;
        }
        self.pending_scale *= 0.95_f32.powf(self.zoom_speed * steps);
    }

    /// Register a listener called with the new camera distance whenever `update` moves the camera
    pub fn add_listener(&mut self, listener: impl FnMut(f32) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn remove_all_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Move the camera to `distance` from the target without notifying listeners
    pub fn set_distance(&mut self, camera: &mut PerspectiveCamera, distance: f32) {
        let distance = distance.clamp(self.min_distance, self.max_distance);
        let direction = camera.direction().unwrap_or(Vec3::ONE.normalize());
        camera.target = self.target;
        camera.place(direction, distance);
        self.last_position = camera.position;
    }

    /// Forget camera movement made outside the controls
    pub fn sync(&mut self, camera: &PerspectiveCamera) {
        self.last_position = camera.position;
    }

    /// Apply pending input to the camera. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.disposed {
            return false;
        }

        let offset = camera.position - self.target;
        let radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };

        let factor = if self.damping > 0.0 { self.damping } else { 1.0 };
        theta += self.pending_theta * factor;
        phi = (phi + self.pending_phi * factor).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        let radius = (radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.target = self.target;
        camera.position = self.target + offset;

        if self.damping > 0.0 {
            self.pending_theta *= 1.0 - self.damping;
            self.pending_phi *= 1.0 - self.damping;
            if self.pending_theta.abs() < CHANGE_EPSILON {
                self.pending_theta = 0.0;
            }
            if self.pending_phi.abs() < CHANGE_EPSILON {
                self.pending_phi = 0.0;
            }
        } else {
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        self.pending_scale = 1.0;

        if camera.position.distance_squared(self.last_position) <= CHANGE_EPSILON {
            return false;
        }
        self.last_position = camera.position;
        for (_, listener) in &mut self.listeners {
            listener(radius);
        }
        true
    }

    /// Stop responding to input and drop all listeners
    pub fn dispose(&mut self) {
        self.remove_all_listeners();
        self.pending_theta = 0.0;
        self.pending_phi = 0.0;
        self.pending_scale = 1.0;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn setup(damping: f32) -> (OrbitControls, PerspectiveCamera) {
        let config = ViewerConfig {
            damping,
            ..Default::default()
        };
        let mut camera = PerspectiveCamera::for_surface(&config, 800, 500);
        camera.place(Vec3::ONE, 4.0);
        let mut controls = OrbitControls::new(&config, &camera);
        controls.set_distance_limits(2.0, 16.0);
        (controls, camera)
    }

    #[test]
    fn test_update_without_input_is_quiet() {
        let (mut controls, mut camera) = setup(0.05);
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        controls.add_listener(move |d| sink.borrow_mut().push(d));

        assert!(!controls.update(&mut camera));
        assert!(calls.borrow().is_empty());
        assert!((camera.distance() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_dolly_is_clamped_and_notifies() {
        let (mut controls, mut camera) = setup(0.0);
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        controls.add_listener(move |d| sink.borrow_mut().push(d));

        controls.dolly(100.0);
        assert!(controls.update(&mut camera));
        assert!((camera.distance() - 2.0).abs() < 1e-4);

        controls.dolly(-200.0);
        controls.update(&mut camera);
        assert!((camera.distance() - 16.0).abs() < 1e-3);
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_damped_rotation_keeps_moving() {
        let (mut controls, mut camera) = setup(0.05);
        controls.rotate(Vec2::new(1.0, 0.0));

        let start = camera.position;
        assert!(controls.update(&mut camera));
        let after_one = camera.position;
        assert!(controls.update(&mut camera));
        assert_ne!(camera.position, after_one);
        assert_ne!(after_one, start);
        assert!((camera.distance() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_stops_short_of_pole() {
        let (mut controls, mut camera) = setup(0.0);
        controls.rotate(Vec2::new(0.0, 10.0));
        controls.update(&mut camera);
        assert!(camera.direction().unwrap().y < 1.0);
        assert!(camera.position.is_finite());
    }

    #[test]
    fn test_set_distance_is_silent() {
        let (mut controls, mut camera) = setup(0.05);
        let calls = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&calls);
        controls.add_listener(move |_| *sink.borrow_mut() += 1);

        controls.set_distance(&mut camera, 8.0);
        assert!((camera.distance() - 8.0).abs() < 1e-5);
        assert!(!controls.update(&mut camera));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_dispose_removes_listeners() {
        let (mut controls, mut camera) = setup(0.0);
        let id = controls.add_listener(|_| {});
        controls.add_listener(|_| {});
        assert!(controls.remove_listener(id));
        assert!(!controls.remove_listener(id));

        controls.dispose();
        assert_eq!(controls.listener_count(), 0);
        controls.dolly(5.0);
        assert!(!controls.update(&mut camera));
    }
}
