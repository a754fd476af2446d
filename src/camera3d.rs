use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Perspective camera used for both rendering and picking; the two must
/// resolve identical matrices so rays land where pixels were drawn.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: PhysicalSize<u32>) -> Mat4 {
        self.projection_matrix(aspect_of(viewport)) * self.view_matrix()
    }

    /// World-space ray from the camera through a screen position.
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let inv_view_proj = self.view_projection(viewport).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let toward = (world.truncate() / world.w) - self.position;
        Some((self.position, toward.normalize()))
    }

    pub fn project_point(&self, point: Vec3, viewport: PhysicalSize<u32>) -> Option<Vec2> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let clip = self.view_projection(viewport) * point.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * viewport.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * viewport.height as f32;
        Some(Vec2::new(x, y))
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

pub fn aspect_of(viewport: PhysicalSize<u32>) -> f32 {
    if viewport.height > 0 {
        viewport.width as f32 / viewport.height as f32
    } else {
        1.0
    }
}

/// Orbit controller around a target with velocity damping: pointer input
/// feeds angular velocity, `advance` integrates and decays it each frame.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub yaw_radians: f32,
    pub pitch_radians: f32,
    pub damping: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, radius: f32) -> Self {
        Self {
            target,
            radius: radius.max(0.01),
            yaw_radians: 0.0,
            pitch_radians: 0.0,
            damping: 0.05,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }

    /// Places the controller so it looks from `position` at `target`.
    pub fn from_look_at(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let radius = offset.length().max(0.01);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (-offset.y / radius).clamp(-1.0, 1.0).asin();
        let mut orbit = Self::new(target, radius);
        orbit.yaw_radians = yaw;
        orbit.pitch_radians = pitch;
        orbit
    }

    pub fn to_camera(&self, fov_y_radians: f32, near: f32, far: f32) -> Camera3D {
        let rotation =
            Quat::from_euler(glam::EulerRot::YXZ, self.yaw_radians, self.pitch_radians, 0.0);
        let offset = rotation * Vec3::new(0.0, 0.0, self.radius);
        Camera3D::new(self.target + offset, self.target, fov_y_radians, near, far)
    }

    /// Adds angular velocity from pointer motion.
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw_velocity += delta.x;
        self.pitch_velocity += delta.y;
    }

    pub fn zoom(&mut self, factor: f32) {
        self.radius = (self.radius * factor).clamp(0.1, 10_000.0);
    }

    /// Integrates pending velocity and decays it, frame-rate independently.
    pub fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.yaw_radians += self.yaw_velocity * dt;
        self.pitch_radians = (self.pitch_radians + self.pitch_velocity * dt).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );
        let decay = (1.0 - self.damping.clamp(0.0, 1.0)).powf(dt * 60.0);
        self.yaw_velocity *= decay;
        self.pitch_velocity *= decay;
        if self.yaw_velocity.abs() < 1e-5 {
            self.yaw_velocity = 0.0;
        }
        if self.pitch_velocity.abs() < 1e-5 {
            self.pitch_velocity = 0.0;
        }
    }

    pub fn is_coasting(&self) -> bool {
        self.yaw_velocity != 0.0 || self.pitch_velocity != 0.0
    }
}
