use crate::assets::FontAsset;
use crate::config::EngineConfig;
use crate::graph::{Material, NodeFlags, NodeKey, SceneGraph, SceneNode, Transform3D};
use crate::mesh::Mesh;
use crate::record::{parse_color, ObjectId, ObjectKind, ParticleEffect, SceneObject};
use crate::resources::{GeometryHandle, ResourceStore};
use crate::switchboard::Projector;
use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const CAMERA_PROXY_SIZE: f32 = 0.35;
const PARTICLE_HALF_SIZE: f32 = 0.04;

/// The scene-graph footprint of one record: a root tagged with the owning
/// id, the node carrying the body geometry (same node for simple kinds) and
/// the camera extras.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub root: NodeKey,
    pub body: NodeKey,
    pub helper: Option<NodeKey>,
    pub projector: Option<Projector>,
}

/// Shared font lifecycle for text drawables.
#[derive(Clone, Default)]
pub enum FontState {
    #[default]
    Unloaded,
    Loading,
    Ready(FontAsset),
    Failed,
}

pub enum BuildOutcome {
    Built(Drawable),
    /// The record cannot materialize yet (font still loading).
    Deferred,
}

fn material_for(record: &SceneObject) -> Material {
    let base_color = parse_color(&record.color).unwrap_or_else(|| {
        log::warn!("unparseable color {:?} on {}, using default", record.color, record.id);
        Vec4::new(0.62, 0.62, 0.62, 1.0)
    });
    Material::colored(base_color)
}

fn particle_seeds(id: ObjectId, effect: ParticleEffect, count: usize) -> Vec<Vec3> {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    (0..count)
        .map(|_| match effect {
            // Cone opening upward from the emitter.
            ParticleEffect::Fountain => {
                let height: f32 = rng.gen_range(0.0..1.5);
                let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
                let radius = height * rng.gen_range(0.0..0.35);
                Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
            }
            // Shell expanding outward in every direction.
            ParticleEffect::Burst => {
                let dir = Vec3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                )
                .normalize_or_zero();
                dir * rng.gen_range(0.25..0.75)
            }
            // Loose cloud around the emitter.
            ParticleEffect::Drift => Vec3::new(
                rng.gen_range(-0.75..0.75),
                rng.gen_range(-0.75..0.75),
                rng.gen_range(-0.75..0.75),
            ),
        })
        .collect()
}

fn primitive_mesh(kind: &ObjectKind) -> Mesh {
    match kind {
        ObjectKind::Sphere => Mesh::sphere(0.5, 32, 16),
        ObjectKind::Plane => Mesh::plane(1.0, 1.0),
        ObjectKind::Pyramid => Mesh::cone(0.5, 1.0, 4),
        ObjectKind::Cylinder => Mesh::cylinder(0.5, 1.0, 32),
        ObjectKind::Box => Mesh::cube(1.0),
        other => {
            // Anything the factory cannot realize renders as the unit cube.
            log::warn!("no dedicated mesh for {}, falling back to cube", other.label());
            Mesh::cube(1.0)
        }
    }
}

fn insert_body(
    graph: &mut SceneGraph,
    resources: &mut ResourceStore,
    record: &SceneObject,
    mesh: Mesh,
    extra_flags: NodeFlags,
) -> NodeKey {
    let geometry = GeometryHandle::new(mesh);
    resources.register_geometry(record.id, geometry.clone());
    let (translation, rotation, scale) = record.transform_components();
    graph.insert(
        SceneNode {
            owner: Some(record.id),
            local: Transform3D::new(translation, rotation, scale),
            geometry: Some(geometry),
            material: material_for(record),
            flags: NodeFlags::PICKABLE | extra_flags,
            visible: record.visible,
            ..Default::default()
        },
        None,
    )
}

/// Realizes one record into the scene graph. Every geometry handle created
/// here is registered under the record's id so removal releases it.
pub fn build_drawable(
    graph: &mut SceneGraph,
    resources: &mut ResourceStore,
    record: &SceneObject,
    font: &FontState,
    viewport_aspect: f32,
    config: &EngineConfig,
) -> BuildOutcome {
    let drawable = match &record.kind {
        ObjectKind::Text { content } => match font {
            FontState::Ready(asset) => {
                let body =
                    insert_body(graph, resources, record, Mesh::text(asset.font(), content), NodeFlags::empty());
                Drawable { root: body, body, helper: None, projector: None }
            }
            FontState::Failed => {
                let body = insert_body(
                    graph,
                    resources,
                    record,
                    Mesh::plane(1.0, 1.0),
                    NodeFlags::PLACEHOLDER,
                );
                Drawable { root: body, body, helper: None, projector: None }
            }
            FontState::Unloaded | FontState::Loading => return BuildOutcome::Deferred,
        },
        // Textured quads start blank; the decoded texture attaches later.
        ObjectKind::Image { .. } | ObjectKind::Video { .. } => {
            let body = insert_body(graph, resources, record, Mesh::plane(1.0, 1.0), NodeFlags::empty());
            Drawable { root: body, body, helper: None, projector: None }
        }
        ObjectKind::ParticleSystem { effect } => {
            let seeds = particle_seeds(record.id, *effect, config.particle_count);
            let body = insert_body(
                graph,
                resources,
                record,
                Mesh::point_sprites(&seeds, PARTICLE_HALF_SIZE),
                NodeFlags::empty(),
            );
            Drawable { root: body, body, helper: None, projector: None }
        }
        // The node exists immediately; geometry arrives with the decoded mesh.
        ObjectKind::ImportedModel { .. } => {
            let (translation, rotation, scale) = record.transform_components();
            let root = graph.insert(
                SceneNode {
                    owner: Some(record.id),
                    local: Transform3D::new(translation, rotation, scale),
                    flags: NodeFlags::PICKABLE,
                    visible: record.visible,
                    ..Default::default()
                },
                None,
            );
            Drawable { root, body: root, helper: None, projector: None }
        }
        ObjectKind::Camera { fov_y_degrees } => {
            let projector = Projector::new(fov_y_degrees.to_radians(), viewport_aspect);
            let (translation, rotation, scale) = record.transform_components();
            let root = graph.insert(
                SceneNode {
                    owner: Some(record.id),
                    local: Transform3D::new(translation, rotation, scale),
                    visible: record.visible,
                    ..Default::default()
                },
                None,
            );
            let proxy_geometry = GeometryHandle::new(Mesh::cube(CAMERA_PROXY_SIZE));
            resources.register_geometry(record.id, proxy_geometry.clone());
            let body = graph.insert(
                SceneNode {
                    geometry: Some(proxy_geometry),
                    material: material_for(record),
                    flags: NodeFlags::PICKABLE,
                    ..Default::default()
                },
                Some(root),
            );
            let helper_geometry = GeometryHandle::new(Mesh::frustum_lines(
                projector.fov_y_radians,
                projector.aspect,
                projector.near,
                projector.far,
            ));
            resources.register_geometry(record.id, helper_geometry.clone());
            let helper = graph.insert(
                SceneNode {
                    geometry: Some(helper_geometry),
                    flags: NodeFlags::HELPER,
                    ..Default::default()
                },
                Some(root),
            );
            Drawable { root, body, helper: Some(helper), projector: Some(projector) }
        }
        primitive => {
            let body =
                insert_body(graph, resources, record, primitive_mesh(primitive), NodeFlags::empty());
            Drawable { root: body, body, helper: None, projector: None }
        }
    };
    BuildOutcome::Built(drawable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshTopology;

    fn build(record: &SceneObject) -> (SceneGraph, ResourceStore, Drawable) {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceStore::new();
        let outcome = build_drawable(
            &mut graph,
            &mut resources,
            record,
            &FontState::Failed,
            16.0 / 9.0,
            &EngineConfig::default(),
        );
        match outcome {
            BuildOutcome::Built(drawable) => (graph, resources, drawable),
            BuildOutcome::Deferred => panic!("unexpected deferral"),
        }
    }

    #[test]
    fn sphere_record_builds_one_pickable_node() {
        let record = SceneObject::new(ObjectKind::Sphere);
        let (graph, resources, drawable) = build(&record);
        assert_eq!(graph.len(), 1);
        assert_eq!(resources.len(), 1);
        let node = graph.node(drawable.body).expect("body node");
        assert!(node.flags.contains(NodeFlags::PICKABLE));
        assert_eq!(node.owner, Some(record.id));
    }

    #[test]
    fn camera_record_builds_proxy_and_helper() {
        let record = SceneObject::new(ObjectKind::Camera { fov_y_degrees: 50.0 });
        let (graph, _resources, drawable) = build(&record);
        assert_eq!(graph.len(), 3);
        let helper = drawable.helper.expect("helper node");
        let helper_node = graph.node(helper).expect("helper");
        assert!(helper_node.flags.contains(NodeFlags::HELPER));
        assert_eq!(
            helper_node.geometry.as_ref().expect("helper geometry").mesh().topology,
            MeshTopology::Lines
        );
        let projector = drawable.projector.expect("projector");
        assert!((projector.fov_y_radians - 50f32.to_radians()).abs() < 1e-6);
        assert_eq!(graph.owner_of(drawable.body), Some(record.id));
    }

    #[test]
    fn text_defers_while_the_font_loads() {
        let record = SceneObject::new(ObjectKind::Text { content: "hi".to_string() });
        let mut graph = SceneGraph::new();
        let mut resources = ResourceStore::new();
        let outcome = build_drawable(
            &mut graph,
            &mut resources,
            &record,
            &FontState::Loading,
            1.0,
            &EngineConfig::default(),
        );
        assert!(matches!(outcome, BuildOutcome::Deferred));
        assert!(graph.is_empty());
    }

    #[test]
    fn text_placeholder_when_the_font_failed() {
        let record = SceneObject::new(ObjectKind::Text { content: "hi".to_string() });
        let (graph, _resources, drawable) = build(&record);
        let node = graph.node(drawable.body).expect("body");
        assert!(node.flags.contains(NodeFlags::PLACEHOLDER));
        assert!(node.flags.contains(NodeFlags::PICKABLE));
    }

    #[test]
    fn particle_seeds_are_deterministic_per_id() {
        let id = ObjectId::generate();
        let a = particle_seeds(id, ParticleEffect::Burst, 16);
        let b = particle_seeds(id, ParticleEffect::Burst, 16);
        assert_eq!(a, b);
        let other = particle_seeds(ObjectId::generate(), ParticleEffect::Burst, 16);
        assert_ne!(a, other);
    }
}
