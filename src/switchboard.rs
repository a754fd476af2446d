use crate::camera3d::{aspect_of, Camera3D, OrbitCamera};
use crate::record::ObjectId;
use glam::{Mat4, Vec3};
use winit::dpi::PhysicalSize;

/// Which camera the viewport looks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraRef {
    #[default]
    Editor,
    Object(ObjectId),
}

/// Perspective parameters carried by a camera-kind drawable. Aspect follows
/// the viewport, the rest follows its record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projector {
    pub fn new(fov_y_radians: f32, aspect: f32) -> Self {
        Self { fov_y_radians, aspect, near: 0.1, far: 2000.0 }
    }
}

/// Builds a render/pick camera from a camera node's world pose. The node
/// looks down its local -Z.
pub fn camera_from_pose(world: &Mat4, projector: &Projector) -> Camera3D {
    let (_, rotation, translation) = world.to_scale_rotation_translation();
    let forward = rotation * Vec3::NEG_Z;
    let mut camera = Camera3D::new(
        translation,
        translation + forward,
        projector.fov_y_radians,
        projector.near,
        projector.far,
    );
    camera.up = rotation * Vec3::Y;
    camera
}

/// Holds the editor orbit camera and the active camera reference. Resolving
/// an object camera needs the scene graph, so the engine does that half; the
/// switchboard owns the state and the editor path.
pub struct CameraSwitchboard {
    pub orbit: OrbitCamera,
    editor_fov_y_radians: f32,
    editor_near: f32,
    editor_far: f32,
    viewport: PhysicalSize<u32>,
    active: CameraRef,
}

impl CameraSwitchboard {
    pub fn new(
        eye: Vec3,
        fov_y_radians: f32,
        near: f32,
        far: f32,
        viewport: PhysicalSize<u32>,
    ) -> Self {
        Self {
            orbit: OrbitCamera::from_look_at(eye, Vec3::ZERO),
            editor_fov_y_radians: fov_y_radians,
            editor_near: near,
            editor_far: far,
            viewport,
            active: CameraRef::Editor,
        }
    }

    pub fn active(&self) -> CameraRef {
        self.active
    }

    pub fn set_active(&mut self, camera: CameraRef) {
        self.active = camera;
    }

    pub fn revert_to_editor(&mut self) {
        self.active = CameraRef::Editor;
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.viewport
    }

    pub fn resize(&mut self, viewport: PhysicalSize<u32>) {
        self.viewport = viewport;
    }

    pub fn aspect(&self) -> f32 {
        aspect_of(self.viewport)
    }

    pub fn editor_camera(&self) -> Camera3D {
        self.orbit.to_camera(self.editor_fov_y_radians, self.editor_near, self.editor_far)
    }
}
