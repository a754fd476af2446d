use crate::camera3d::Camera3D;
use crate::graph::{NodeFlags, NodeKey, SceneGraph};
use crate::mesh::MeshBounds;
use crate::record::ObjectId;
use glam::{Mat4, Vec2, Vec3};
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub id: ObjectId,
    pub node: NodeKey,
    pub distance: f32,
}

/// Slab test against an axis-aligned box. Returns the entry distance.
pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let (lo, hi) = (min[axis], max[axis]);
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (lo - o) * inv;
        let mut t1 = (hi - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

fn matrix_is_finite(matrix: &Mat4) -> bool {
    matrix.to_cols_array().iter().all(|v| v.is_finite())
}

/// Intersects a world-space ray with an oriented box by casting into the
/// node's local space. Returns the world-space distance along the ray.
pub fn ray_obb(origin: Vec3, dir: Vec3, world: &Mat4, bounds: &MeshBounds) -> Option<f32> {
    if !matrix_is_finite(world) {
        return None;
    }
    let inverse = world.inverse();
    if !matrix_is_finite(&inverse) {
        return None;
    }
    let local_origin = inverse.transform_point3(origin);
    let local_dir = inverse.transform_vector3(dir);
    if local_dir.length_squared() < f32::EPSILON {
        return None;
    }
    let local_dir_norm = local_dir.normalize();
    let local_t = ray_aabb_intersection(local_origin, local_dir_norm, bounds.min, bounds.max)?;
    let local_hit = local_origin + local_dir_norm * local_t;
    let world_hit = world.transform_point3(local_hit);
    Some((world_hit - origin).length())
}

/// Casts the pointer through `camera` and returns the nearest owned hit.
pub fn pick_scene(
    graph: &SceneGraph,
    camera: &Camera3D,
    pointer: Vec2,
    viewport: PhysicalSize<u32>,
) -> Option<PickHit> {
    let (origin, dir) = camera.screen_ray(pointer, viewport)?;
    pick_ray(graph, origin, dir)
}

/// Nearest hit among pickable, effectively visible nodes that resolve to an
/// owning object id. Helper geometry never participates.
pub fn pick_ray(graph: &SceneGraph, origin: Vec3, dir: Vec3) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;
    for key in graph.keys() {
        let Some(node) = graph.node(key) else { continue };
        if !node.flags.contains(NodeFlags::PICKABLE) || node.flags.contains(NodeFlags::HELPER) {
            continue;
        }
        let Some(geometry) = &node.geometry else { continue };
        if !graph.effectively_visible(key) {
            continue;
        }
        let world = graph.world_transform(key);
        let Some(distance) = ray_obb(origin, dir, &world, &geometry.mesh().bounds) else {
            continue;
        };
        let Some(id) = graph.owner_of(key) else { continue };
        if best.as_ref().map_or(true, |hit| distance < hit.distance) {
            best = Some(PickHit { id, node: key, distance });
        }
    }
    best
}
