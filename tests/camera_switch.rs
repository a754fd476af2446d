use glam::Vec3;
use maquette::assets::AssetLoader;
use maquette::record::Vec3Data;
use maquette::{
    CameraRef, EngineConfig, EngineEvent, ObjectKind, SceneObject, ViewportEngine,
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

fn scene_with_camera() -> (SceneObject, SceneObject, Vec<SceneObject>) {
    let cube = SceneObject::new(ObjectKind::Box);
    let mut camera = SceneObject::new(ObjectKind::Camera { fov_y_degrees: 50.0 });
    camera.position = Vec3Data::new(0.0, 2.0, 8.0);
    let records = vec![cube.clone(), camera.clone()];
    (cube, camera, records)
}

#[test]
fn switching_cameras_touches_no_drawables() {
    let mut engine = engine();
    let (cube, camera, records) = scene_with_camera();
    engine.sync(&records);
    let before = engine.drawable_geometry(cube.id).expect("cube geometry");

    engine.set_active_camera(CameraRef::Object(camera.id));
    let report = engine.sync(&records);
    assert!(report.is_noop());
    let after = engine.drawable_geometry(cube.id).expect("cube geometry");
    assert!(before.ptr_eq(&after));
    assert!(!before.is_disposed());

    // The render pose is the camera record's pose.
    let rendered = engine.render_camera();
    assert!((rendered.position - Vec3::new(0.0, 2.0, 8.0)).length() < 1e-5);
    assert!((rendered.fov_y_radians - 50f32.to_radians()).abs() < 1e-6);
}

#[test]
fn render_and_pick_cameras_are_identical() {
    let mut engine = engine();
    let (_, camera, records) = scene_with_camera();
    engine.sync(&records);
    engine.set_active_camera(CameraRef::Object(camera.id));
    let viewport = engine.viewport();
    let render = engine.render_camera().view_projection(viewport);
    let pick = engine.pick_camera().view_projection(viewport);
    assert_eq!(render.to_cols_array(), pick.to_cols_array());
}

#[test]
fn resize_syncs_every_projector_aspect() {
    let mut engine = engine();
    let (_, camera, records) = scene_with_camera();
    engine.sync(&records);
    let helper_before = engine.helper_geometry(camera.id).expect("helper");

    engine.resize(PhysicalSize::new(1600, 400));
    let aspect = engine.projector_aspect(camera.id).expect("projector");
    assert!((aspect - 4.0).abs() < 1e-6);

    // The frustum helper regenerates on the next frame.
    engine.advance(1.0 / 60.0);
    let helper_after = engine.helper_geometry(camera.id).expect("helper");
    assert!(!helper_before.ptr_eq(&helper_after));
    assert!(helper_before.is_disposed());
    assert!(!helper_after.is_disposed());
}

#[test]
fn deleting_the_active_camera_reverts_to_editor() {
    let mut engine = engine();
    let (cube, camera, records) = scene_with_camera();
    engine.sync(&records);
    engine.set_active_camera(CameraRef::Object(camera.id));

    let remaining = vec![cube.clone()];
    engine.sync(&remaining);
    assert_eq!(engine.active_camera(), CameraRef::Editor);
    let events = engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ActiveCameraReverted { id } if *id == camera.id)));

    // The editor camera is immediately usable.
    let eye = engine.render_camera().position;
    assert!((eye - Vec3::new(5.0, 5.0, 5.0)).length() < 1e-3);
}

#[test]
fn hiding_the_active_camera_reverts_to_editor() {
    let mut engine = engine();
    let (cube, mut camera, _) = scene_with_camera();
    let mut records = vec![cube, camera.clone()];
    engine.sync(&records);
    engine.set_active_camera(CameraRef::Object(camera.id));

    camera.visible = false;
    records[1] = camera.clone();
    engine.sync(&records);
    assert_eq!(engine.active_camera(), CameraRef::Editor);
    assert!(engine.has_drawable(camera.id));
}

#[test]
fn fov_update_reshapes_the_frustum_helper() {
    let mut engine = engine();
    let (cube, mut camera, _) = scene_with_camera();
    let mut records = vec![cube, camera.clone()];
    engine.sync(&records);
    let before = engine.helper_geometry(camera.id).expect("helper");

    camera.kind = ObjectKind::Camera { fov_y_degrees: 90.0 };
    records[1] = camera.clone();
    let report = engine.sync(&records);
    // Field-of-view changes update in place, no rebuild.
    assert_eq!(report.rebuilt, 0);
    assert_eq!(report.updated, 2);

    engine.advance(1.0 / 60.0);
    let after = engine.helper_geometry(camera.id).expect("helper");
    assert!(!before.ptr_eq(&after));
}
