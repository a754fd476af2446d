use maquette::assets::AssetLoader;
use maquette::gizmo::GizmoState;
use maquette::record::{records_from_json, records_to_json, Vec3Data};
use maquette::{EngineConfig, EngineEvent, ObjectKind, SceneObject, ViewportEngine};
use std::path::PathBuf;
use winit::dpi::PhysicalSize;

fn engine() -> ViewportEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    ViewportEngine::with_loader(
        EngineConfig::default(),
        PhysicalSize::new(800, 600),
        AssetLoader::synchronous(),
    )
}

fn fixture_font() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}

#[test]
fn second_pass_with_unchanged_records_is_a_noop() {
    let mut engine = engine();
    let mut sphere = SceneObject::new(ObjectKind::Sphere);
    sphere.position = Vec3Data::new(2.0, 0.0, 0.0);
    let records = vec![SceneObject::new(ObjectKind::Box), sphere];

    let first = engine.sync(&records);
    assert_eq!(first.added, 2);
    let second = engine.sync(&records);
    assert!(second.is_noop(), "unexpected churn: {second:?}");
    assert_eq!(engine.drawable_count(), 2);
}

#[test]
fn text_content_change_rebuilds_within_one_pass() {
    // No font configured, so text materializes as a placeholder right away.
    let mut engine = engine();
    let mut record = SceneObject::new(ObjectKind::Text { content: "one".to_string() });
    assert_eq!(engine.sync(std::slice::from_ref(&record)).added, 1);

    record.kind = ObjectKind::Text { content: "two".to_string() };
    let report = engine.sync(std::slice::from_ref(&record));
    assert_eq!(report.rebuilt, 1);
    assert_eq!(report.added, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(engine.drawable_count(), 1);
}

#[test]
fn deferred_text_builds_once_the_font_resolves() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = EngineConfig { font_path: Some(fixture_font()), ..EngineConfig::default() };
    let mut engine = ViewportEngine::new(config, PhysicalSize::new(800, 600));
    let record = SceneObject::new(ObjectKind::Text { content: "Maquette".to_string() });

    // The font is still decoding on the worker, so the record defers.
    let first = engine.sync(std::slice::from_ref(&record));
    assert_eq!(first.deferred, 1);
    assert_eq!(first.added, 0);
    assert!(engine.is_loading());
    assert!(!engine.has_drawable(record.id));

    let mut built = false;
    for _ in 0..300 {
        std::thread::sleep(std::time::Duration::from_millis(10));
        if engine.sync(std::slice::from_ref(&record)).added == 1 {
            built = true;
            break;
        }
    }
    assert!(built, "font never resolved");
    assert!(!engine.is_loading());
    let geometry = engine.drawable_geometry(record.id).expect("glyph geometry");
    assert!(!geometry.mesh().vertices.is_empty());
    assert!(!geometry.mesh().indices.is_empty());
}

#[test]
fn host_record_lists_cross_the_json_seam() {
    let mut engine = engine();
    let payload = r##"[
        {"id": "7c7a1c6e-3d7b-4c58-9f4e-2a6f0d9b1c11", "type": "Box",
         "position": {"x": 1.0, "y": 0.0, "z": 0.0}},
        {"id": "b54d2c2a-90ff-4a3e-8a21-57d7e6f0a9d2", "type": "Sphere",
         "color": "#ff8800", "visible": false}
    ]"##;
    let records = records_from_json(payload).expect("parse");
    assert_eq!(records[1].scale, Vec3Data::splat(1.0));
    assert_eq!(engine.sync(&records).added, 2);

    // What the host persists parses back to the same scene.
    let saved = records_to_json(&records).expect("serialize");
    let reloaded = records_from_json(&saved).expect("reparse");
    assert!(engine.sync(&reloaded).is_noop());
}

#[test]
fn removal_disposes_the_objects_resources() {
    let mut engine = engine();
    let record = SceneObject::new(ObjectKind::Cylinder);
    engine.sync(std::slice::from_ref(&record));
    let geometry = engine.drawable_geometry(record.id).expect("geometry");
    assert!(!geometry.is_disposed());

    let report = engine.sync(&[]);
    assert_eq!(report.removed, 1);
    assert!(geometry.is_disposed());
    assert_eq!(engine.node_count(), 0);
    assert_eq!(engine.drawable_count(), 0);
}

#[test]
fn one_failing_record_does_not_abort_the_pass() {
    let mut engine = engine();
    let healthy = SceneObject::new(ObjectKind::Box);
    let broken =
        SceneObject::new(ObjectKind::Image { source: "/definitely/missing.png".into() });
    let records = vec![healthy.clone(), broken.clone()];

    assert_eq!(engine.sync(&records).added, 2);
    // The decode failure surfaces on the next pass.
    let report = engine.sync(&records);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, broken.id);
    assert!(engine.has_drawable(healthy.id));
    let events = engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ObjectLoadFailed { id, .. } if *id == broken.id)));

    // Latched: the same payload is not retried.
    let again = engine.sync(&records);
    assert!(again.failures.is_empty());
}

#[test]
fn picking_then_deleting_the_selection() {
    let mut engine = engine();
    let cube = SceneObject::new(ObjectKind::Box);
    let mut sphere = SceneObject::new(ObjectKind::Sphere);
    sphere.position = Vec3Data::new(2.0, 0.0, 0.0);
    let mut records = vec![cube.clone(), sphere.clone()];
    engine.sync(&records);

    let pointer = engine
        .render_camera()
        .project_point(glam::Vec3::new(2.0, 0.0, 0.0), engine.viewport())
        .expect("sphere center on screen");
    assert_eq!(engine.pointer_down(pointer), Some(sphere.id));

    records.retain(|r| r.id != sphere.id);
    engine.sync(&records);
    assert_eq!(engine.selection(), None);
    assert_eq!(engine.drawable_count(), 1);
    assert_eq!(engine.gizmo_state(), GizmoState::Detached);
    let events = engine.drain_events();
    assert!(events.contains(&EngineEvent::SelectionChanged { id: None }));
}
