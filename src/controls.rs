//! Interactive camera controls.
//!
//! [`OrbitControls`] orbits the camera around its target: dragging with the
//! left button rotates, the middle button dollies and the right button pans.
//! Pointer input is only accumulated while events arrive; it is applied to the
//! camera once per frame in [`CameraControls::update`]. The mouse wheel is left
//! alone, it scrolls the page.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Rad, Vector2, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, WindowEvent},
};

use crate::camera::Camera;

/// Anything that moves the camera once per frame.
pub trait CameraControls {
    fn update(&mut self, camera: &mut Camera);
}

/// Keeps the orbit away from the poles where the view would flip.
const POLE_EPSILON: f32 = 1e-6;
const MIN_RADIUS: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Dolly,
    Pan,
}

impl DragMode {
    fn from_button(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(Self::Rotate),
            MouseButton::Middle => Some(Self::Dolly),
            MouseButton::Right => Some(Self::Pan),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrbitControls {
    viewport_height: f32,
    fovy: Rad<f32>,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    cursor: Option<PhysicalPosition<f64>>,
    drag: Option<DragMode>,
    // Pending input, consumed by `update`
    rotate: Vector2<f32>,
    scale: f32,
    pan: Vector2<f32>,
}

impl OrbitControls {
    pub fn new<F: Into<Rad<f32>>>(viewport_height: u32, fovy: F) -> Self {
        Self {
            viewport_height: viewport_height.max(1) as f32,
            fovy: fovy.into(),
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            cursor: None,
            drag: None,
            rotate: Vector2::new(0.0, 0.0),
            scale: 1.0,
            pan: Vector2::new(0.0, 0.0),
        }
    }

    pub fn resize(&mut self, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    /// Feeds a window event. Returns whether the controls used it.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.pointer_moved(*position),
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(mode) = DragMode::from_button(*button) else {
                    return false;
                };
                match state {
                    ElementState::Pressed => self.pointer_down(mode),
                    ElementState::Released => self.pointer_up(mode),
                }
                true
            }
            WindowEvent::Resized(size) => {
                self.resize(size.height);
                false
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = None;
                false
            }
            _ => false,
        }
    }

    pub fn pointer_down(&mut self, mode: DragMode) {
        self.drag = Some(mode);
    }

    pub fn pointer_up(&mut self, mode: DragMode) {
        if self.drag == Some(mode) {
            self.drag = None;
        }
    }

    /// Tracks the cursor; while dragging, the movement becomes pending input.
    pub fn pointer_moved(&mut self, position: PhysicalPosition<f64>) -> bool {
        let previous = self.cursor.replace(position);
        let (Some(mode), Some(previous)) = (self.drag, previous) else {
            return false;
        };
        let dx = (position.x - previous.x) as f32;
        let dy = (position.y - previous.y) as f32;
        match mode {
            DragMode::Rotate => self.rotate_by(dx, dy),
            DragMode::Dolly => self.dolly_by(dy),
            DragMode::Pan => self.pan_by(dx, dy),
        }
        true
    }

    /// Pixel movement to orbit angles; a full viewport height is one turn.
    pub fn rotate_by(&mut self, dx: f32, dy: f32) {
        self.rotate.x += TAU * dx / self.viewport_height * self.rotate_speed;
        self.rotate.y += TAU * dy / self.viewport_height * self.rotate_speed;
    }

    /// Positive movement dollies out, negative in.
    pub fn dolly_by(&mut self, dy: f32) {
        let step = 0.95f32.powf(self.zoom_speed);
        if dy > 0.0 {
            self.scale /= step;
        } else if dy < 0.0 {
            self.scale *= step;
        }
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.x += dx * self.pan_speed;
        self.pan.y += dy * self.pan_speed;
    }

    pub fn is_idle(&self) -> bool {
        self.rotate == Vector2::new(0.0, 0.0) && self.scale == 1.0 && self.pan == Vector2::new(0.0, 0.0)
    }

    fn reset(&mut self) {
        self.rotate = Vector2::new(0.0, 0.0);
        self.scale = 1.0;
        self.pan = Vector2::new(0.0, 0.0);
    }
}

impl CameraControls for OrbitControls {
    fn update(&mut self, camera: &mut Camera) {
        if self.is_idle() {
            return;
        }
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        if radius <= MIN_RADIUS {
            // No orbit is defined around the camera's own position
            self.reset();
            return;
        }

        let forward = -offset / radius;
        let right = forward.cross(camera.up);
        if right.magnitude2() > f32::EPSILON {
            let right = right.normalize();
            let up = right.cross(forward);
            let visible_height = 2.0 * radius * (self.fovy.0 / 2.0).tan();
            let per_pixel = visible_height / self.viewport_height;
            camera.target += right * (-self.pan.x * per_pixel) + up * (self.pan.y * per_pixel);
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        theta -= self.rotate.x;
        phi -= self.rotate.y;
        phi = phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        let radius = (radius * self.scale).max(MIN_RADIUS);

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = camera.target + offset;
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, MetricSpace, Point3};

    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::new(600, Deg(75.0))
    }

    #[test]
    fn idle_controls_leave_the_camera_alone() {
        let mut camera = Camera::new((0.3, -0.2, -12.0));
        let before = camera.clone();
        controls().update(&mut camera);
        assert_eq!(camera, before);
    }

    #[test]
    fn rotating_keeps_the_distance_to_the_target() {
        let mut camera = Camera::new((0.0, 0.0, 30.0));
        let mut controls = controls();
        controls.pointer_down(DragMode::Rotate);
        controls.pointer_moved(PhysicalPosition::new(100.0, 100.0));
        controls.pointer_moved(PhysicalPosition::new(250.0, 40.0));
        controls.update(&mut camera);

        assert!((camera.position.distance(camera.target) - 30.0).abs() < 1e-3);
        assert!(camera.position.x.abs() > 1.0, "{:?}", camera.position);
        assert!(controls.is_idle());
    }

    #[test]
    fn input_without_a_drag_is_ignored() {
        let mut controls = controls();
        controls.pointer_moved(PhysicalPosition::new(0.0, 0.0));
        controls.pointer_moved(PhysicalPosition::new(300.0, 300.0));
        assert!(controls.is_idle());

        controls.pointer_down(DragMode::Pan);
        controls.pointer_up(DragMode::Pan);
        controls.pointer_moved(PhysicalPosition::new(10.0, 10.0));
        assert!(controls.is_idle());
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut camera = Camera::new((0.0, 0.0, 10.0));
        let mut controls = controls();
        controls.rotate_by(0.0, 10_000.0);
        controls.update(&mut camera);
        assert!(camera.position.y > 9.99, "{:?}", camera.position);
        assert!(camera.position.x.is_finite() && camera.position.z.is_finite());
    }

    #[test]
    fn dollying_out_moves_away() {
        let mut camera = Camera::new((0.0, 0.0, 10.0));
        let mut controls = controls();
        controls.dolly_by(5.0);
        controls.update(&mut camera);
        assert!(camera.position.distance(Point3::new(0.0, 0.0, 0.0)) > 10.0);
    }

    #[test]
    fn panning_moves_camera_and_target_together() {
        let mut camera = Camera::new((0.0, 0.0, 10.0));
        let mut controls = controls();
        controls.pan_by(60.0, 0.0);
        controls.update(&mut camera);
        assert!(camera.target.x < 0.0);
        assert!((camera.position.x - camera.target.x).abs() < 1e-4);
        assert!((camera.position.z - 10.0).abs() < 1e-4);
    }

    #[test]
    fn camera_on_its_target_is_not_moved() {
        let mut camera = Camera::new((0.0, 0.0, 0.0));
        let mut controls = controls();
        controls.rotate_by(40.0, 10.0);
        controls.update(&mut camera);
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 0.0));
        assert!(controls.is_idle());
    }
}
