use crate::record::Vec3Data;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_fov_y_degrees() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    2000.0
}

fn default_eye() -> Vec3Data {
    Vec3Data::new(5.0, 5.0, 5.0)
}

fn default_damping() -> f32 {
    0.05
}

fn default_quiescence() -> f32 {
    0.35
}

fn default_particle_count() -> usize {
    64
}

/// Viewport tuning. Everything defaults to the stock editor setup so hosts
/// can deserialize a partial config or just use `EngineConfig::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// TTF/OTF file used by text drawables. `None` means text records fall
    /// back to placeholders immediately.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default = "default_fov_y_degrees")]
    pub editor_fov_y_degrees: f32,
    #[serde(default = "default_near")]
    pub editor_near: f32,
    #[serde(default = "default_far")]
    pub editor_far: f32,
    #[serde(default = "default_eye")]
    pub editor_eye: Vec3Data,
    #[serde(default = "default_damping")]
    pub orbit_damping: f32,
    /// Seconds of drag inactivity after which an abandoned gesture commits.
    #[serde(default = "default_quiescence")]
    pub commit_quiescence_seconds: f32,
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            editor_fov_y_degrees: default_fov_y_degrees(),
            editor_near: default_near(),
            editor_far: default_far(),
            editor_eye: default_eye(),
            orbit_damping: default_damping(),
            commit_quiescence_seconds: default_quiescence(),
            particle_count: default_particle_count(),
        }
    }
}
