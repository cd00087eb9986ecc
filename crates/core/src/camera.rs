use crate::{CoreError, CoreResult, Mat4, Quat, Vec3};

/// Radians of rotation per pixel of drag.
const ORBIT_SENSITIVITY: f32 = 0.005;
/// World units per pixel of drag, per unit of distance to the target.
const PAN_SENSITIVITY: f32 = 0.0015;
/// Fraction of the distance covered per pixel of drag.
const DOLLY_SENSITIVITY: f32 = 0.01;
const DEG: f32 = std::f32::consts::PI / 180.0;
const ZOOM_STEP_RAD: f32 = DEG;

pub const MIN_DISTANCE: f32 = 0.05;
pub const MIN_FOV_RAD: f32 = DEG;
pub const MAX_FOV_RAD: f32 = 90.0 * DEG;
/// Keep the orbit this far (radians) away from the poles.
const POLE_MARGIN: f32 = 0.01;

/// Perspective camera orbiting a target point (right-handed, Y up).
#[derive(Clone, Copy, Debug)]
pub struct OrbitalCamera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov_y_rad: f32,
}

impl OrbitalCamera {
    pub fn new(position: Vec3, target: Vec3, up: Vec3) -> CoreResult<Self> {
        let offset = position - target;
        if offset.length_squared() < MIN_DISTANCE * MIN_DISTANCE {
            return Err(CoreError::DegenerateCamera(
                "position coincides with target".into(),
            ));
        }
        let up = up.try_normalize().ok_or_else(|| {
            CoreError::DegenerateCamera("up vector has zero length".into())
        })?;
        if offset.normalize().cross(up).length_squared() < 1e-8 {
            return Err(CoreError::DegenerateCamera(
                "view direction is parallel to up".into(),
            ));
        }
        Ok(Self {
            position,
            target,
            up,
            fov_y_rad: 45.0 * DEG,
        })
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov_y_rad
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Depth in [0, 1] (wgpu convention).
    #[inline]
    pub fn projection(&self, aspect: f32, z_near: f32, z_far: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, aspect.max(1e-6), z_near, z_far)
    }

    fn right(&self) -> Vec3 {
        (self.target - self.position).cross(self.up).normalize_or_zero()
    }

    fn camera_up(&self) -> Vec3 {
        self.right().cross(self.target - self.position).normalize_or_zero()
    }

    /// Rotate around the target: `dx` yaws around `up`, `dy` pitches.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let yaw = Quat::from_axis_angle(self.up, -dx * ORBIT_SENSITIVITY);
        let mut offset = yaw * (self.position - self.target);

        let right = self.up.cross(offset).normalize_or_zero();
        if right != Vec3::ZERO {
            let pitch = Quat::from_axis_angle(right, -dy * ORBIT_SENSITIVITY);
            let pitched = pitch * offset;
            let polar = pitched.angle_between(self.up);
            if polar > POLE_MARGIN && polar < std::f32::consts::PI - POLE_MARGIN {
                offset = pitched;
            }
        }
        self.position = self.target + offset;
    }

    /// Slide camera and target sideways.
    pub fn track(&mut self, dx: f32) {
        let delta = self.right() * (-dx * PAN_SENSITIVITY * self.distance());
        self.position += delta;
        self.target += delta;
    }

    /// Slide camera and target along the camera's up axis.
    pub fn pedestal(&mut self, dy: f32) {
        let delta = self.camera_up() * (-dy * PAN_SENSITIVITY * self.distance());
        self.position += delta;
        self.target += delta;
    }

    /// Move toward (positive `dy`) or away from the target.
    pub fn dolly(&mut self, dy: f32) {
        let offset = self.position - self.target;
        let distance = offset.length();
        let new_distance = (distance * (1.0 - dy * DOLLY_SENSITIVITY)).max(MIN_DISTANCE);
        self.position = self.target + offset / distance * new_distance;
    }

    /// Narrow (positive scroll) or widen the field of view.
    pub fn zoom(&mut self, scroll: f32) {
        self.fov_y_rad = (self.fov_y_rad - scroll * ZOOM_STEP_RAD).clamp(MIN_FOV_RAD, MAX_FOV_RAD);
    }
}
