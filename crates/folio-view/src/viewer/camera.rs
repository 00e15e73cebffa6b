use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3, perspective};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    fov_deg: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Point3<f32>,
    look_target: Point3<f32>,
    up: Vector3<f32>,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_deg,
            aspect: sanitize_aspect(aspect, 1.0),
            near,
            far,
            position: Point3::new(0.0, 0.0, 0.0),
            look_target: Point3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            projection: Matrix4::from_scale(1.0),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn fov_deg(&self) -> f32 {
        self.fov_deg
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Takes effect for rendering after `update_projection_matrix`.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect, self.aspect);
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.fov_deg), self.aspect, self.near, self.far);
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.look_target = target;
    }

    pub fn look_target(&self) -> Point3<f32> {
        self.look_target
    }

    pub fn forward(&self) -> Vector3<f32> {
        let dir = self.look_target - self.position;
        if dir.magnitude2() <= f32::EPSILON {
            -Vector3::unit_z()
        } else {
            dir.normalize()
        }
    }

    /// Camera-space +X expressed in world space.
    pub fn right(&self) -> Vector3<f32> {
        let right = self.forward().cross(self.up);
        if right.magnitude2() <= f32::EPSILON {
            Vector3::unit_x()
        } else {
            right.normalize()
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.look_target, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }
}

fn sanitize_aspect(aspect: f32, fallback: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn target_projects_to_screen_centre() {
        let mut camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 1000.0);
        camera.set_position(Point3::new(0.0, 1.0, 3.0));
        camera.look_at(Point3::new(0.0, 0.5, 0.0));

        let clip = camera.view_projection() * Vector4::new(0.0, 0.5, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1.0e-5);
        assert!(ndc.y.abs() < 1.0e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn degenerate_aspect_is_ignored() {
        let mut camera = PerspectiveCamera::new(75.0, 2.0, 0.1, 1000.0);
        camera.set_aspect(f32::INFINITY);
        assert_eq!(camera.aspect(), 2.0);
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect(), 2.0);
    }
}
