use glam::Vec3;
use maquette::assets::AssetLoader;
use maquette::gizmo::{GizmoMode, GizmoState};
use maquette::record::{RecordUpdate, Vec3Data};
use maquette::{
    ActiveTool, CameraRef, EngineConfig, EngineEvent, ObjectKind, SceneObject, ViewportEngine,
};
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

fn record_updates(events: &[EngineEvent]) -> Vec<RecordUpdate> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::RecordUpdated(update) => Some(*update),
            _ => None,
        })
        .collect()
}

#[test]
fn attachment_needs_selection_and_tool() {
    let mut engine = engine();
    let record = SceneObject::new(ObjectKind::Box);
    engine.sync(std::slice::from_ref(&record));

    engine.set_selection(Some(record.id));
    assert_eq!(engine.gizmo_state(), GizmoState::Detached);
    engine.set_active_tool(Some(ActiveTool::Rotate));
    assert_eq!(
        engine.gizmo_state(),
        GizmoState::Attached { id: record.id, mode: GizmoMode::Rotate }
    );
    engine.set_active_tool(None);
    assert_eq!(engine.gizmo_state(), GizmoState::Detached);
}

#[test]
fn viewed_camera_cannot_host_the_gizmo() {
    let mut engine = engine();
    let camera = SceneObject::new(ObjectKind::Camera { fov_y_degrees: 60.0 });
    engine.sync(std::slice::from_ref(&camera));
    engine.set_selection(Some(camera.id));
    engine.set_active_tool(Some(ActiveTool::Move));
    assert!(matches!(engine.gizmo_state(), GizmoState::Attached { .. }));

    engine.set_active_camera(CameraRef::Object(camera.id));
    assert_eq!(engine.gizmo_state(), GizmoState::Detached);
    engine.set_active_camera(CameraRef::Editor);
    assert!(matches!(engine.gizmo_state(), GizmoState::Attached { .. }));
}

#[test]
fn one_gesture_emits_live_updates_and_a_single_commit() {
    let mut engine = engine();
    let record = SceneObject::new(ObjectKind::Box);
    engine.sync(std::slice::from_ref(&record));
    engine.set_selection(Some(record.id));
    engine.set_active_tool(Some(ActiveTool::Move));
    engine.drain_events();

    assert!(engine.begin_drag(pointer_at(&engine, Vec3::ZERO)));
    assert!(!engine.is_orbit_enabled());
    let q = Vec3::new(1.0, -1.0, 0.0) / 2f32.sqrt();
    assert!(engine.drag_update(pointer_at(&engine, q)));
    assert!(engine.drag_update(pointer_at(&engine, q * 2.0)));
    engine.end_drag();
    assert!(engine.is_orbit_enabled());

    let updates = record_updates(&engine.drain_events());
    assert_eq!(updates.iter().filter(|u| !u.committed).count(), 2);
    assert_eq!(updates.iter().filter(|u| u.committed).count(), 1);
    assert!(updates.iter().all(|u| u.id == record.id));

    // A second end without a gesture commits nothing.
    engine.end_drag();
    assert!(record_updates(&engine.drain_events()).is_empty());
}

#[test]
fn translate_follows_the_camera_facing_plane() {
    // Editor camera sits at (5,5,5) looking at the origin, so the drag plane
    // through a box at the origin has normal (1,1,1)/sqrt(3). The direction
    // (1,-1,0)/sqrt(2) lies in that plane.
    let mut engine = engine();
    let record = SceneObject::new(ObjectKind::Box);
    engine.sync(std::slice::from_ref(&record));
    engine.set_selection(Some(record.id));
    engine.set_active_tool(Some(ActiveTool::Move));

    assert!(engine.begin_drag(pointer_at(&engine, Vec3::ZERO)));
    let q = Vec3::new(1.0, -1.0, 0.0) / 2f32.sqrt();
    assert!(engine.drag_update(pointer_at(&engine, q)));
    engine.end_drag();

    let (translation, _, _) = engine.drawable_transform(record.id).expect("transform");
    assert!((translation - q).length() < 1e-2, "landed at {translation}");
}

#[test]
fn drag_touches_only_its_target() {
    let mut engine = engine();
    let dragged = SceneObject::new(ObjectKind::Box);
    let mut bystander = SceneObject::new(ObjectKind::Sphere);
    bystander.position = Vec3Data::new(2.0, 0.0, 0.0);
    engine.sync(&[dragged.clone(), bystander.clone()]);
    engine.set_selection(Some(dragged.id));
    engine.set_active_tool(Some(ActiveTool::Move));

    assert!(engine.begin_drag(pointer_at(&engine, Vec3::ZERO)));
    let q = Vec3::new(1.0, -1.0, 0.0) / 2f32.sqrt();
    engine.drag_update(pointer_at(&engine, q));
    engine.end_drag();

    let (other, _, _) = engine.drawable_transform(bystander.id).expect("transform");
    assert!((other - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    let updates = record_updates(&engine.drain_events());
    assert!(updates.iter().all(|u| u.id == dragged.id));
}

#[test]
fn abandoned_gesture_commits_after_the_quiescence_window() {
    let mut engine = engine();
    let record = SceneObject::new(ObjectKind::Box);
    engine.sync(std::slice::from_ref(&record));
    engine.set_selection(Some(record.id));
    engine.set_active_tool(Some(ActiveTool::Scale));
    engine.drain_events();

    assert!(engine.begin_drag(pointer_at(&engine, Vec3::new(0.4, 0.0, -0.4))));
    let q = Vec3::new(1.0, -1.0, 0.0) / 2f32.sqrt();
    assert!(engine.drag_update(pointer_at(&engine, q)));

    // No end event arrives; the trailing window closes the gesture.
    engine.advance(0.2);
    assert_eq!(record_updates(&engine.drain_events()).iter().filter(|u| u.committed).count(), 0);
    engine.advance(0.2);
    let committed =
        record_updates(&engine.drain_events()).iter().filter(|u| u.committed).count();
    assert_eq!(committed, 1);
    assert!(engine.is_orbit_enabled());
}
