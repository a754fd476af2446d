use crate::record::{ActiveTool, ObjectId};
use glam::{Quat, Vec3};

pub const SCALE_MIN_RATIO: f32 = 0.05;
pub const SCALE_MAX_RATIO: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoMode {
    Translate,
    Rotate,
    Scale,
}

impl GizmoMode {
    pub fn from_tool(tool: ActiveTool) -> Self {
        match tool {
            ActiveTool::Move => GizmoMode::Translate,
            ActiveTool::Rotate => GizmoMode::Rotate,
            ActiveTool::Scale => GizmoMode::Scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoState {
    #[default]
    Detached,
    Attached {
        id: ObjectId,
        mode: GizmoMode,
    },
}

/// Where the gizmo should sit, derived every pass from selection, tool and
/// view state. Attachment requires a selected, existing, visible object that
/// is not itself the camera being looked through.
pub fn resolve_target(
    selection: Option<ObjectId>,
    tool: Option<ActiveTool>,
    target_exists_visible: bool,
    viewed_camera: Option<ObjectId>,
) -> GizmoState {
    let (Some(id), Some(tool)) = (selection, tool) else {
        return GizmoState::Detached;
    };
    if !target_exists_visible || viewed_camera == Some(id) {
        return GizmoState::Detached;
    }
    GizmoState::Attached { id, mode: GizmoMode::from_tool(tool) }
}

/// Uniform scale with the ratio clamped so a gesture can neither collapse
/// the object to zero nor blow it up unboundedly.
pub fn apply_scale_ratio(start: Vec3, ratio: f32) -> Vec3 {
    start * ratio.clamp(SCALE_MIN_RATIO, SCALE_MAX_RATIO)
}

pub fn intersect_ray_plane(
    origin: Vec3,
    dir: Vec3,
    plane_origin: Vec3,
    plane_normal: Vec3,
) -> Option<f32> {
    let denom = plane_normal.dot(dir);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = plane_normal.dot(plane_origin - origin) / denom;
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy)]
enum DragKind {
    Translate { grab_offset: Vec3 },
    Rotate { start_rotation: Quat, start_vector: Vec3 },
    Scale { start_scale: Vec3, start_distance: f32 },
}

/// What a drag tick resolved to; the engine writes it into the node and the
/// live record patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// One in-flight manipulation gesture on the camera-facing plane through
/// the object center.
#[derive(Debug, Clone, Copy)]
pub struct DragSession {
    pub id: ObjectId,
    kind: DragKind,
    plane_origin: Vec3,
    plane_normal: Vec3,
    /// True once any tick changed the transform; gates the committed update.
    pub dirty: bool,
    /// Seconds since the last tick, for closing abandoned gestures.
    pub idle: f32,
}

impl DragSession {
    fn new(id: ObjectId, kind: DragKind, plane_origin: Vec3, plane_normal: Vec3) -> Self {
        Self { id, kind, plane_origin, plane_normal, dirty: false, idle: 0.0 }
    }

    pub fn translate(
        id: ObjectId,
        plane_origin: Vec3,
        plane_normal: Vec3,
        grab_offset: Vec3,
    ) -> Self {
        Self::new(id, DragKind::Translate { grab_offset }, plane_origin, plane_normal)
    }

    pub fn rotate(
        id: ObjectId,
        plane_origin: Vec3,
        plane_normal: Vec3,
        start_rotation: Quat,
        start_vector: Vec3,
    ) -> Self {
        Self::new(id, DragKind::Rotate { start_rotation, start_vector }, plane_origin, plane_normal)
    }

    pub fn scale(
        id: ObjectId,
        plane_origin: Vec3,
        plane_normal: Vec3,
        start_scale: Vec3,
        start_distance: f32,
    ) -> Self {
        Self::new(
            id,
            DragKind::Scale { start_scale, start_distance: start_distance.max(1e-4) },
            plane_origin,
            plane_normal,
        )
    }

    /// Resolves one pointer ray against the drag plane.
    pub fn solve(&self, origin: Vec3, dir: Vec3) -> Option<DragUpdate> {
        let t = intersect_ray_plane(origin, dir, self.plane_origin, self.plane_normal)?;
        let hit = origin + dir * t;
        match self.kind {
            DragKind::Translate { grab_offset } => Some(DragUpdate::Translation(hit + grab_offset)),
            DragKind::Rotate { start_rotation, start_vector } => {
                let current = hit - self.plane_origin;
                if current.length_squared() < 1e-8 {
                    return None;
                }
                let start = start_vector.normalize_or_zero();
                let now = current.normalize();
                let angle = start.cross(now).dot(self.plane_normal).atan2(start.dot(now));
                Some(DragUpdate::Rotation(
                    Quat::from_axis_angle(self.plane_normal, angle) * start_rotation,
                ))
            }
            DragKind::Scale { start_scale, start_distance } => {
                let distance = (hit - self.plane_origin).length();
                Some(DragUpdate::Scale(apply_scale_ratio(start_scale, distance / start_distance)))
            }
        }
    }
}

/// Attach/detach state machine plus the in-flight drag, if any.
#[derive(Default)]
pub struct GizmoController {
    state: GizmoState,
    drag: Option<DragSession>,
}

impl GizmoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GizmoState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn drag_mut(&mut self) -> Option<&mut DragSession> {
        self.drag.as_mut()
    }

    pub fn detach(&mut self) {
        self.state = GizmoState::Detached;
        self.drag = None;
    }

    /// Applies the pass-resolved target. A detach cancels any drag in flight.
    pub fn apply_target(&mut self, target: GizmoState) {
        if self.state == target {
            return;
        }
        self.state = target;
        if !matches!(self.state, GizmoState::Attached { .. }) {
            self.drag = None;
        } else if let (Some(drag), GizmoState::Attached { id, .. }) = (&self.drag, self.state) {
            if drag.id != id {
                self.drag = None;
            }
        }
    }

    /// Starts a gesture on the currently attached target.
    pub fn begin(&mut self, session: DragSession) -> bool {
        match self.state {
            GizmoState::Attached { id, .. } if id == session.id => {
                self.drag = Some(session);
                true
            }
            _ => false,
        }
    }

    pub fn take_drag(&mut self) -> Option<DragSession> {
        self.drag.take()
    }
}
