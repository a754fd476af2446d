use anyhow::{Context, Result};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use uuid::Uuid;

/// Stable identifier for one scene object. Assigned at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Manipulation tool selected in the toolbar. `None` (no tool) is expressed
/// as `Option<ActiveTool>` at the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveTool {
    Move,
    Rotate,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleEffect {
    Fountain,
    Burst,
    Drift,
}

/// Closed set of object types. One variant per drawable family so the
/// factory match is exhaustive and adding a type is a single-site change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectKind {
    Box,
    Sphere,
    Plane,
    Pyramid,
    Cylinder,
    Text { content: String },
    Image { source: PathBuf },
    Video { source: PathBuf },
    ParticleSystem { effect: ParticleEffect },
    ImportedModel { source: PathBuf },
    Camera { fov_y_degrees: f32 },
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Box => "Box",
            ObjectKind::Sphere => "Sphere",
            ObjectKind::Plane => "Plane",
            ObjectKind::Pyramid => "Pyramid",
            ObjectKind::Cylinder => "Cylinder",
            ObjectKind::Text { .. } => "Text",
            ObjectKind::Image { .. } => "Image",
            ObjectKind::Video { .. } => "Video",
            ObjectKind::ParticleSystem { .. } => "ParticleSystem",
            ObjectKind::ImportedModel { .. } => "ImportedModel",
            ObjectKind::Camera { .. } => "Camera",
        }
    }

    /// True for kinds whose surface comes from a decoded texture; their
    /// record color is ignored.
    pub fn is_textured(&self) -> bool {
        matches!(self, ObjectKind::Image { .. } | ObjectKind::Video { .. })
    }

    /// Source path of the asynchronously decoded payload, if any.
    pub fn media_source(&self) -> Option<&PathBuf> {
        match self {
            ObjectKind::Image { source }
            | ObjectKind::Video { source }
            | ObjectKind::ImportedModel { source } => Some(source),
            _ => None,
        }
    }

    /// Hash over the fields a live drawable cannot represent incrementally.
    /// When this changes between passes the drawable is destroyed and
    /// recreated within the same pass.
    pub fn structural_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            ObjectKind::Text { content } => {
                1u8.hash(&mut hasher);
                content.hash(&mut hasher);
            }
            ObjectKind::Image { source } => {
                2u8.hash(&mut hasher);
                source.hash(&mut hasher);
            }
            ObjectKind::Video { source } => {
                3u8.hash(&mut hasher);
                source.hash(&mut hasher);
            }
            ObjectKind::ParticleSystem { effect } => {
                4u8.hash(&mut hasher);
                effect.hash(&mut hasher);
            }
            ObjectKind::ImportedModel { source } => {
                5u8.hash(&mut hasher);
                source.hash(&mut hasher);
            }
            // Field-of-view updates in place through the projector.
            ObjectKind::Camera { .. } => 6u8.hash(&mut hasher),
            _ => 0u8.hash(&mut hasher),
        }
        hasher.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3Data {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(value: f32) -> Self {
        Self { x: value, y: value, z: value }
    }
}

impl From<Vec3> for Vec3Data {
    fn from(value: Vec3) -> Self {
        Self { x: value.x, y: value.y, z: value.z }
    }
}

impl From<Vec3Data> for Vec3 {
    fn from(value: Vec3Data) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

fn default_scale() -> Vec3Data {
    Vec3Data::splat(1.0)
}

fn default_color() -> String {
    "#9e9e9e".to_string()
}

const fn default_visible() -> bool {
    true
}

/// Declarative, externally owned description of one scene object. The
/// engine treats the record collection as read-mostly input and requests
/// mutations through [`RecordUpdate`] events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: ObjectKind,
    #[serde(default)]
    pub position: Vec3Data,
    /// Euler radians, XYZ order.
    #[serde(default)]
    pub rotation: Vec3Data,
    #[serde(default = "default_scale")]
    pub scale: Vec3Data,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl SceneObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::generate(),
            name: None,
            kind,
            position: Vec3Data::default(),
            rotation: Vec3Data::default(),
            scale: default_scale(),
            color: default_color(),
            visible: true,
        }
    }

    pub fn transform_components(&self) -> (Vec3, Quat, Vec3) {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        (self.position.into(), rotation, self.scale.into())
    }

    pub fn structural_key(&self) -> u64 {
        self.kind.structural_key()
    }
}

/// Parses `#rgb` / `#rrggbb` color strings into linear-ish RGBA.
pub fn parse_color(value: &str) -> Option<glam::Vec4> {
    let hex = value.trim().strip_prefix('#')?;
    let (r, g, b) = match hex.len() {
        6 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ),
        3 => {
            let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v * 17);
            (channel(&hex[0..1])?, channel(&hex[1..2])?, channel(&hex[2..3])?)
        }
        _ => return None,
    };
    Some(glam::Vec4::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0))
}

/// Partial transform fields requested back into a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3Data>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3Data>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3Data>,
}

impl TransformPatch {
    pub fn full(position: Vec3Data, rotation: Vec3Data, scale: Vec3Data) -> Self {
        Self { position: Some(position), rotation: Some(rotation), scale: Some(scale) }
    }

    pub fn apply_to(&self, record: &mut SceneObject) {
        if let Some(position) = self.position {
            record.position = position;
        }
        if let Some(rotation) = self.rotation {
            record.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            record.scale = scale;
        }
    }
}

/// One write-back request. Live updates track a manipulation in progress;
/// committed updates are the history-worthy result of a finished gesture
/// (or a one-shot correction such as a decoded media aspect).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub id: ObjectId,
    pub patch: TransformPatch,
    pub committed: bool,
}

pub fn records_from_json(json: &str) -> Result<Vec<SceneObject>> {
    serde_json::from_str(json).context("Parsing scene object records")
}

pub fn records_to_json(records: &[SceneObject]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Serializing scene object records")
}
