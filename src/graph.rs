use crate::record::ObjectId;
use crate::resources::{GeometryHandle, TextureHandle};
use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3, Vec4};
use std::collections::HashMap;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        /// Participates in ray picking.
        const PICKABLE = 1 << 0;
        /// Editor-only visualization (frustum lines); never pickable.
        const HELPER = 1 << 1;
        /// Stand-in drawable for content that failed to materialize.
        const PLACEHOLDER = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform3D {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Surface parameters handed through to the leaf renderer.
#[derive(Debug, Clone)]
pub struct Material {
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub texture: Option<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self { base_color: Vec4::ONE, metallic: 0.3, roughness: 0.6, texture: None }
    }
}

impl Material {
    pub fn colored(base_color: Vec4) -> Self {
        Self { base_color, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(u64);

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,
    /// Set on drawable roots; picking walks up to the nearest owner.
    pub owner: Option<ObjectId>,
    pub local: Transform3D,
    pub geometry: Option<GeometryHandle>,
    pub material: Material,
    pub flags: NodeFlags,
    pub visible: bool,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            owner: None,
            local: Transform3D::default(),
            geometry: None,
            material: Material::default(),
            flags: NodeFlags::empty(),
            visible: true,
        }
    }
}

/// Retained scene graph. Nodes live in an id-keyed arena; parent/child links
/// are keys so subtree removal never fights the borrow checker.
#[derive(Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeKey, SceneNode>,
    next: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut node: SceneNode, parent: Option<NodeKey>) -> NodeKey {
        let key = NodeKey(self.next);
        self.next += 1;
        node.parent = parent;
        if let Some(parent_key) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent_key) {
                parent_node.children.push(key);
            }
        }
        self.nodes.insert(key, node);
        key
    }

    /// Removes `key` and every descendant. Returns the removed keys.
    pub fn remove_subtree(&mut self, key: NodeKey) -> Vec<NodeKey> {
        let mut removed = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().copied());
                removed.push(current);
            }
        }
        if let Some(parent) = self.nodes.get(&key).and_then(|n| n.parent) {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|child| *child != key);
            }
        }
        for key in &removed {
            self.nodes.remove(key);
        }
        removed
    }

    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(&key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&key)
    }

    pub fn world_transform(&self, key: NodeKey) -> Mat4 {
        let mut chain = Vec::new();
        let mut cursor = Some(key);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else { break };
            chain.push(node.local.matrix());
            cursor = node.parent;
        }
        chain.into_iter().rev().fold(Mat4::IDENTITY, |acc, local| acc * local)
    }

    /// Visible only when every ancestor is visible too.
    pub fn effectively_visible(&self, key: NodeKey) -> bool {
        let mut cursor = Some(key);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else { return false };
            if !node.visible {
                return false;
            }
            cursor = node.parent;
        }
        true
    }

    /// Walks parent links until a node with an owner id is found.
    pub fn owner_of(&self, key: NodeKey) -> Option<ObjectId> {
        let mut cursor = Some(key);
        while let Some(current) = cursor {
            let node = self.nodes.get(&current)?;
            if let Some(owner) = node.owner {
                return Some(owner);
            }
            cursor = node.parent;
        }
        None
    }

    pub fn keys(&self) -> Vec<NodeKey> {
        self.nodes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
