pub mod assets;
pub mod camera3d;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod factory;
pub mod gizmo;
pub mod graph;
pub mod mesh;
pub mod picking;
pub mod reconcile;
pub mod record;
pub mod render;
pub mod resources;
pub mod switchboard;

pub use config::EngineConfig;
pub use engine::ViewportEngine;
pub use events::EngineEvent;
pub use record::{ActiveTool, ObjectId, ObjectKind, SceneObject};
pub use switchboard::CameraRef;
