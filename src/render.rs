use crate::camera3d::Camera3D;
use crate::graph::{NodeFlags, SceneGraph};
use crate::record::ObjectId;
use crate::resources::{GeometryHandle, TextureHandle};
use glam::{Mat4, Vec4};

/// One draw for the external immediate-mode renderer.
#[derive(Clone)]
pub struct DrawCommand {
    pub owner: Option<ObjectId>,
    pub geometry: GeometryHandle,
    pub world: Mat4,
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub texture: Option<TextureHandle>,
    /// Editor-only line geometry (frustum helpers).
    pub helper: bool,
}

pub struct FrameSubmission {
    pub view: Mat4,
    pub projection: Mat4,
    pub commands: Vec<DrawCommand>,
}

/// Flattens every effectively visible node with geometry into a draw list.
pub fn compose(graph: &SceneGraph, camera: &Camera3D, aspect: f32) -> FrameSubmission {
    let mut commands = Vec::new();
    for key in graph.keys() {
        let Some(node) = graph.node(key) else { continue };
        let Some(geometry) = &node.geometry else { continue };
        if !graph.effectively_visible(key) {
            continue;
        }
        commands.push(DrawCommand {
            owner: graph.owner_of(key),
            geometry: geometry.clone(),
            world: graph.world_transform(key),
            base_color: node.material.base_color,
            metallic: node.material.metallic,
            roughness: node.material.roughness,
            texture: node.material.texture.clone(),
            helper: node.flags.contains(NodeFlags::HELPER),
        });
    }
    FrameSubmission { view: camera.view_matrix(), projection: camera.projection_matrix(aspect), commands }
}
