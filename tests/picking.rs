use glam::Vec3;
use maquette::assets::AssetLoader;
use maquette::gizmo::GizmoState;
use maquette::record::Vec3Data;
use maquette::{ActiveTool, EngineConfig, ObjectKind, SceneObject, ViewportEngine};
use winit::dpi::PhysicalSize;

fn engine() -> ViewportEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    ViewportEngine::with_loader(
        EngineConfig::default(),
        PhysicalSize::new(800, 600),
        AssetLoader::synchronous(),
    )
}

fn pointer_at(engine: &ViewportEngine, world: Vec3) -> glam::Vec2 {
    engine.render_camera().project_point(world, engine.viewport()).expect("point on screen")
}

#[test]
fn invisible_records_are_not_pickable() {
    let mut engine = engine();
    let mut record = SceneObject::new(ObjectKind::Box);
    record.visible = false;
    engine.sync(std::slice::from_ref(&record));

    let pointer = pointer_at(&engine, Vec3::ZERO);
    assert_eq!(engine.pointer_down(pointer), None);

    // Even a forced selection cannot attach the gizmo to a hidden object.
    engine.set_selection(Some(record.id));
    engine.set_active_tool(Some(ActiveTool::Move));
    assert_eq!(engine.gizmo_state(), GizmoState::Detached);
}

#[test]
fn camera_proxy_resolves_to_its_owner() {
    let mut engine = engine();
    let camera = SceneObject::new(ObjectKind::Camera { fov_y_degrees: 50.0 });
    engine.sync(std::slice::from_ref(&camera));

    // The hit lands on the proxy child; ownership walks up to the record id.
    let pointer = pointer_at(&engine, Vec3::ZERO);
    assert_eq!(engine.pointer_down(pointer), Some(camera.id));
}

#[test]
fn clicking_empty_space_deselects() {
    let mut engine = engine();
    let record = SceneObject::new(ObjectKind::Box);
    engine.sync(std::slice::from_ref(&record));

    assert_eq!(engine.pointer_down(pointer_at(&engine, Vec3::ZERO)), Some(record.id));
    let empty = pointer_at(&engine, Vec3::new(0.0, 3.0, 0.0));
    assert_eq!(engine.pointer_down(empty), None);
    assert_eq!(engine.selection(), None);
}

#[test]
fn picking_is_suppressed_during_a_drag() {
    let mut engine = engine();
    let near = SceneObject::new(ObjectKind::Box);
    let mut far = SceneObject::new(ObjectKind::Sphere);
    far.position = Vec3Data::new(2.0, 0.0, 0.0);
    engine.sync(&[near.clone(), far.clone()]);

    engine.set_selection(Some(near.id));
    engine.set_active_tool(Some(ActiveTool::Move));
    assert!(engine.begin_drag(pointer_at(&engine, Vec3::ZERO)));

    let over_sphere = pointer_at(&engine, Vec3::new(2.0, 0.0, 0.0));
    assert!(engine.pick(over_sphere).is_none());
    assert_eq!(engine.pointer_down(over_sphere), Some(near.id));
    engine.end_drag();
    assert_eq!(engine.pointer_down(over_sphere), Some(far.id));
}
