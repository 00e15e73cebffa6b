use cgmath::{InnerSpace, Point3, Vector3};
use folio_base::ControlsConfig;
use std::f32::consts::PI;

use super::camera::PerspectiveCamera;

const EPS: f32 = 1.0e-6;
/// Scroll distance, in points, treated as one wheel notch.
const WHEEL_STEP_POINTS: f32 = 40.0;
const ZOOM_BASE: f32 = 0.95;

/// Pointer state for one frame over the viewer panel.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewerInput {
    pub pointer_delta: [f32; 2],
    pub primary_down: bool,
    pub secondary_down: bool,
    pub middle_down: bool,
    pub scroll_delta: f32,
    pub hovered: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    /// Y-up: `phi` is measured from +Y, `theta` around Y starting at +Z.
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius <= EPS {
            return Self::default();
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

/// Orbit camera controller around a target point with optional inertia.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    target: Point3<f32>,
    enable_damping: bool,
    damping_factor: f32,
    screen_space_panning: bool,
    min_distance: f32,
    max_distance: f32,
    min_polar_angle: f32,
    max_polar_angle: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    pan_speed: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            target: Point3::from(config.target),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            screen_space_panning: config.screen_space_panning,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn distance_bounds(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    pub fn set_enable_damping(&mut self, enable: bool) {
        self.enable_damping = enable;
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// `scale` is a zoom factor below one; the orbit radius is multiplied by it.
    pub fn dolly_in(&mut self, scale: f32) {
        if scale > 0.0 {
            self.scale *= scale;
        }
    }

    pub fn dolly_out(&mut self, scale: f32) {
        if scale > 0.0 {
            self.scale /= scale;
        }
    }

    /// Pans by a pointer delta in points, scaled so the target plane tracks the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &PerspectiveCamera) {
        if viewport_height <= 0.0 {
            return;
        }
        let offset = camera.position() - self.target;
        let target_distance = offset.magnitude() * (camera.fov_deg().to_radians() * 0.5).tan();
        self.pan_left(2.0 * dx * target_distance / viewport_height, camera);
        self.pan_up(2.0 * dy * target_distance / viewport_height, camera);
    }

    fn pan_left(&mut self, distance: f32, camera: &PerspectiveCamera) {
        self.pan_offset += camera.right() * -distance;
    }

    fn pan_up(&mut self, distance: f32, camera: &PerspectiveCamera) {
        let direction = if self.screen_space_panning {
            camera.right().cross(camera.forward())
        } else {
            // Horizontal plane: move along the view direction projected onto XZ.
            camera.up().cross(camera.right())
        };
        self.pan_offset += direction * distance;
    }

    /// Primary drag rotates, secondary or middle drag pans, the wheel dollies.
    pub fn handle_input(
        &mut self,
        input: &ViewerInput,
        camera: &PerspectiveCamera,
        viewport_height: f32,
    ) {
        let [dx, dy] = input.pointer_delta;
        let dragging = dx != 0.0 || dy != 0.0;
        if dragging && viewport_height > 0.0 {
            if input.primary_down {
                self.rotate_left(2.0 * PI * dx / viewport_height * self.rotate_speed);
                self.rotate_up(2.0 * PI * dy / viewport_height * self.rotate_speed);
            } else if input.secondary_down || input.middle_down {
                self.pan(
                    dx * self.pan_speed,
                    dy * self.pan_speed,
                    viewport_height,
                    camera,
                );
            }
        }

        if input.hovered && input.scroll_delta != 0.0 {
            let steps = input.scroll_delta / WHEEL_STEP_POINTS;
            let scale = ZOOM_BASE.powf(self.zoom_speed * steps.abs());
            if steps > 0.0 {
                self.dolly_in(scale);
            } else {
                self.dolly_out(scale);
            }
        }
    }

    /// Applies pending motion to the camera. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position();
        let mut spherical = Spherical::from_offset(camera.position() - self.target);

        if self.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }
        spherical.phi = spherical.phi.clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.set_position(self.target + spherical.to_offset());
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;

        (camera.position() - before).magnitude2() > EPS
    }

    pub fn is_at_rest(&self) -> bool {
        self.spherical_delta.theta.abs() < EPS
            && self.spherical_delta.phi.abs() < EPS
            && self.pan_offset.magnitude() < EPS
            && (self.scale - 1.0).abs() < EPS
    }
}
