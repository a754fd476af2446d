use crate::assets::{AssetLoader, LoadOutcome, LoadRequest};
use crate::camera3d::Camera3D;
use crate::config::EngineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::factory::{build_drawable, BuildOutcome, Drawable, FontState};
use crate::gizmo::{resolve_target, DragSession, DragUpdate, GizmoController, GizmoMode, GizmoState};
use crate::graph::SceneGraph;
use crate::picking::{pick_scene, PickHit};
use crate::record::{
    parse_color, ActiveTool, ObjectId, ObjectKind, RecordUpdate, SceneObject, TransformPatch,
    Vec3Data,
};
use crate::reconcile::{plan_pass, PassPlan, ReconcileReport};
use crate::render::{compose, FrameSubmission};
use crate::resources::{GeometryHandle, ResourceStore, TextureHandle, VideoHandle};
use crate::switchboard::{camera_from_pose, CameraRef, CameraSwitchboard, Projector};
use glam::{EulerRot, Vec2, Vec3};
use std::collections::HashMap;
use std::path::PathBuf;
use winit::dpi::PhysicalSize;

struct LiveEntry {
    drawable: Drawable,
    structural: u64,
    /// Projector parameters the helper lines were last generated from.
    helper_built: Option<Projector>,
}

/// Owned viewport context: retained scene graph, reconciler, picking, gizmo,
/// camera switchboard and async asset plumbing behind one API. The host owns
/// the record list; the engine owns everything derived from it.
pub struct ViewportEngine {
    config: EngineConfig,
    graph: SceneGraph,
    resources: ResourceStore,
    entries: HashMap<ObjectId, LiveEntry>,
    loader: AssetLoader,
    font: FontState,
    /// Latched per-object failures, keyed by the structural key that failed.
    failed: HashMap<ObjectId, (u64, String)>,
    /// Media sources currently being decoded, for cancellation checks.
    pending_sources: HashMap<ObjectId, PathBuf>,
    selection: Option<ObjectId>,
    tool: Option<ActiveTool>,
    gizmo: GizmoController,
    switchboard: CameraSwitchboard,
    events: EventBus,
    orbit_enabled: bool,
    staged: Vec<LoadOutcome>,
}

impl ViewportEngine {
    pub fn new(config: EngineConfig, viewport: PhysicalSize<u32>) -> Self {
        let loader = AssetLoader::spawn();
        Self::with_loader(config, viewport, loader)
    }

    /// Same engine with a caller-provided loader backend; tests use
    /// [`AssetLoader::synchronous`] for deterministic completions.
    pub fn with_loader(
        config: EngineConfig,
        viewport: PhysicalSize<u32>,
        loader: AssetLoader,
    ) -> Self {
        let mut switchboard = CameraSwitchboard::new(
            config.editor_eye.into(),
            config.editor_fov_y_degrees.to_radians(),
            config.editor_near,
            config.editor_far,
            viewport,
        );
        switchboard.orbit.damping = config.orbit_damping;
        Self {
            config,
            graph: SceneGraph::new(),
            resources: ResourceStore::new(),
            entries: HashMap::new(),
            loader,
            font: FontState::Unloaded,
            failed: HashMap::new(),
            pending_sources: HashMap::new(),
            selection: None,
            tool: None,
            gizmo: GizmoController::new(),
            switchboard,
            events: EventBus::new(),
            orbit_enabled: true,
            staged: Vec::new(),
        }
    }

    // ---- reconciliation -------------------------------------------------

    /// Reconciles the declarative record list onto the retained scene.
    /// Removals always precede additions; a structural change is a removal
    /// plus an addition within this same pass.
    pub fn sync(&mut self, records: &[SceneObject]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let by_id = index_records(records);

        self.ensure_font_kicked(records);
        let outcomes: Vec<LoadOutcome> =
            self.staged.drain(..).chain(self.loader.drain()).collect();
        for outcome in outcomes {
            self.apply_load_outcome(outcome, &by_id, &mut report);
        }

        let existing: HashMap<ObjectId, u64> =
            self.entries.iter().map(|(id, entry)| (*id, entry.structural)).collect();
        let plan: PassPlan = plan_pass(&existing, records);

        for id in plan.remove.iter().chain(plan.rebuild.iter()) {
            self.remove_entry(*id);
        }
        report.removed = plan.remove.len();
        for id in &plan.remove {
            self.failed.remove(id);
        }

        for id in &plan.update {
            if let Some(record) = by_id.get(id).copied() {
                self.update_entry(record);
                report.updated += 1;
            }
        }

        for (id, rebuild) in plan
            .add
            .iter()
            .map(|id| (*id, false))
            .chain(plan.rebuild.iter().map(|id| (*id, true)))
        {
            let Some(record) = by_id.get(&id).copied() else { continue };
            // A payload change clears the latch; the same payload stays skipped.
            if let Some(key) = self.failed.get(&id).map(|(key, _)| *key) {
                if key == record.structural_key() {
                    continue;
                }
                self.failed.remove(&id);
            }
            match self.build_entry(record) {
                BuildResult::Built => {
                    if rebuild {
                        report.rebuilt += 1;
                    } else {
                        report.added += 1;
                    }
                }
                BuildResult::Deferred => report.deferred += 1,
            }
        }

        self.normalize_selection(&by_id);
        self.normalize_active_camera(&by_id);
        self.refresh_gizmo();
        if !report.is_noop() {
            log::debug!(
                "pass: +{} -{} ~{} rebuilt {} deferred {} failed {}",
                report.added,
                report.removed,
                report.updated,
                report.rebuilt,
                report.deferred,
                report.failures.len()
            );
        }
        report
    }

    fn ensure_font_kicked(&mut self, records: &[SceneObject]) {
        if !matches!(self.font, FontState::Unloaded) {
            return;
        }
        if !records.iter().any(|r| matches!(r.kind, ObjectKind::Text { .. })) {
            return;
        }
        match &self.config.font_path {
            Some(path) => {
                self.loader.request(LoadRequest::Font { path: path.clone() });
                self.font = FontState::Loading;
            }
            None => {
                log::warn!("text records present but no font configured");
                self.font = FontState::Failed;
            }
        }
    }

    fn apply_load_outcome(
        &mut self,
        outcome: LoadOutcome,
        by_id: &HashMap<ObjectId, &SceneObject>,
        report: &mut ReconcileReport,
    ) {
        match outcome {
            LoadOutcome::Font(Ok(asset)) => {
                self.font = FontState::Ready(asset);
            }
            LoadOutcome::Font(Err(err)) => {
                log::warn!("font load failed: {err}");
                self.font = FontState::Failed;
            }
            LoadOutcome::Texture { id, result } => match result {
                Ok(decoded) => {
                    let matches_record = by_id.get(&id).map_or(false, |record| {
                        matches!(&record.kind, ObjectKind::Image { source } if *source == decoded.source)
                    });
                    if !matches_record || !self.entries.contains_key(&id) {
                        log::debug!("dropping stale texture for {id}");
                        return;
                    }
                    let handle = TextureHandle::new(
                        decoded.width,
                        decoded.height,
                        decoded.rgba,
                        decoded.source,
                    );
                    let aspect = handle.aspect();
                    self.resources.register_texture(id, handle.clone());
                    if let Some(entry) = self.entries.get(&id) {
                        let body = entry.drawable.body;
                        if let Some(node) = self.graph.node_mut(body) {
                            node.material.texture = Some(handle);
                        }
                    }
                    self.pending_sources.remove(&id);
                    if let Some(record) = by_id.get(&id).copied() {
                        self.apply_aspect(record, aspect);
                    }
                }
                Err(err) => self.fail_object(id, by_id, err.to_string(), false, report),
            },
            LoadOutcome::VideoProbe { id, path, result } => match result {
                Ok((width, height)) => {
                    let matches_record = by_id.get(&id).map_or(false, |record| {
                        matches!(&record.kind, ObjectKind::Video { source } if *source == path)
                    });
                    if !matches_record || !self.entries.contains_key(&id) {
                        return;
                    }
                    let handle = VideoHandle::new(path, width, height);
                    let aspect = handle.aspect();
                    self.resources.register_video(id, handle);
                    self.pending_sources.remove(&id);
                    if let Some(record) = by_id.get(&id).copied() {
                        self.apply_aspect(record, aspect);
                    }
                }
                Err(err) => self.fail_object(id, by_id, err.to_string(), false, report),
            },
            LoadOutcome::Model { id, path, result } => match result {
                Ok(mesh) => {
                    let matches_record = by_id.get(&id).map_or(false, |record| {
                        matches!(&record.kind, ObjectKind::ImportedModel { source } if *source == path)
                    });
                    if !matches_record || !self.entries.contains_key(&id) {
                        log::debug!("dropping stale model for {id}");
                        return;
                    }
                    let geometry = GeometryHandle::new(mesh);
                    self.resources.register_geometry(id, geometry.clone());
                    if let Some(entry) = self.entries.get(&id) {
                        let body = entry.drawable.body;
                        if let Some(node) = self.graph.node_mut(body) {
                            node.geometry = Some(geometry);
                        }
                    }
                    self.pending_sources.remove(&id);
                }
                Err(err) => self.fail_object(id, by_id, err.to_string(), true, report),
            },
        }
    }

    /// Latches a per-object failure so the payload is skipped until it
    /// changes. Never aborts the pass.
    fn fail_object(
        &mut self,
        id: ObjectId,
        by_id: &HashMap<ObjectId, &SceneObject>,
        reason: String,
        remove_drawable: bool,
        report: &mut ReconcileReport,
    ) {
        let Some(record) = by_id.get(&id) else {
            // Object already gone; nothing to latch.
            return;
        };
        log::warn!("object {id} failed to load: {reason}");
        self.failed.insert(id, (record.structural_key(), reason.clone()));
        if remove_drawable {
            self.remove_entry(id);
        } else {
            self.pending_sources.remove(&id);
        }
        self.events.push(EngineEvent::ObjectLoadFailed { id, reason: reason.clone() });
        report.failures.push((id, reason));
    }

    /// Decoded media dimensions correct the record's width: the height the
    /// author set is preserved and `scale.x` follows the aspect ratio.
    fn apply_aspect(&mut self, record: &SceneObject, aspect: f32) {
        let scale = Vec3Data::new(record.scale.y * aspect, record.scale.y, record.scale.z);
        if let Some(entry) = self.entries.get(&record.id) {
            let root = entry.drawable.root;
            if let Some(node) = self.graph.node_mut(root) {
                node.local.scale = scale.into();
            }
        }
        self.events.push(EngineEvent::RecordUpdated(RecordUpdate {
            id: record.id,
            patch: TransformPatch { scale: Some(scale), ..Default::default() },
            committed: true,
        }));
    }

    fn update_entry(&mut self, record: &SceneObject) {
        let Some(entry) = self.entries.get_mut(&record.id) else { return };
        let root = entry.drawable.root;
        let body = entry.drawable.body;
        if let ObjectKind::Camera { fov_y_degrees } = record.kind {
            if let Some(projector) = entry.drawable.projector.as_mut() {
                projector.fov_y_radians = fov_y_degrees.to_radians();
            }
        }
        let dragging_this = self.gizmo.drag().map_or(false, |drag| drag.id == record.id);
        if let Some(node) = self.graph.node_mut(root) {
            if !dragging_this {
                let (translation, rotation, scale) = record.transform_components();
                node.local.translation = translation;
                node.local.rotation = rotation;
                node.local.scale = scale;
            }
            node.visible = record.visible;
        }
        if !record.kind.is_textured() {
            if let Some(color) = parse_color(&record.color) {
                if let Some(node) = self.graph.node_mut(body) {
                    node.material.base_color = color;
                }
            }
        }
    }

    fn build_entry(&mut self, record: &SceneObject) -> BuildResult {
        let aspect = self.switchboard.aspect();
        let outcome = build_drawable(
            &mut self.graph,
            &mut self.resources,
            record,
            &self.font,
            aspect,
            &self.config,
        );
        let drawable = match outcome {
            BuildOutcome::Built(drawable) => drawable,
            BuildOutcome::Deferred => return BuildResult::Deferred,
        };
        if let Some(path) = record.kind.media_source().cloned() {
            let request = match &record.kind {
                ObjectKind::Image { .. } => {
                    LoadRequest::Texture { id: record.id, path: path.clone() }
                }
                ObjectKind::Video { .. } => {
                    LoadRequest::VideoProbe { id: record.id, path: path.clone() }
                }
                _ => LoadRequest::Model { id: record.id, path: path.clone() },
            };
            self.loader.request(request);
            self.pending_sources.insert(record.id, path);
        }
        let helper_built = drawable.projector;
        self.entries.insert(
            record.id,
            LiveEntry { drawable, structural: record.structural_key(), helper_built },
        );
        BuildResult::Built
    }

    fn remove_entry(&mut self, id: ObjectId) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        if let GizmoState::Attached { id: attached, .. } = self.gizmo.state() {
            if attached == id {
                self.gizmo.detach();
            }
        }
        self.graph.remove_subtree(entry.drawable.root);
        self.resources.release(id);
        self.pending_sources.remove(&id);
    }

    fn normalize_selection(&mut self, by_id: &HashMap<ObjectId, &SceneObject>) {
        if let Some(id) = self.selection {
            if !by_id.contains_key(&id) {
                self.selection = None;
                self.events.push(EngineEvent::SelectionChanged { id: None });
            }
        }
    }

    fn normalize_active_camera(&mut self, by_id: &HashMap<ObjectId, &SceneObject>) {
        let CameraRef::Object(id) = self.switchboard.active() else { return };
        let usable = by_id
            .get(&id)
            .map_or(false, |record| matches!(record.kind, ObjectKind::Camera { .. }) && record.visible);
        if !usable {
            self.switchboard.revert_to_editor();
            self.events.push(EngineEvent::ActiveCameraReverted { id });
        }
    }

    // ---- selection, tools, gizmo ----------------------------------------

    pub fn set_selection(&mut self, id: Option<ObjectId>) {
        if self.selection != id {
            self.selection = id;
            self.events.push(EngineEvent::SelectionChanged { id });
        }
        self.refresh_gizmo();
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn set_active_tool(&mut self, tool: Option<ActiveTool>) {
        self.tool = tool;
        self.refresh_gizmo();
    }

    pub fn gizmo_state(&self) -> GizmoState {
        self.gizmo.state()
    }

    fn target_exists_visible(&self, id: ObjectId) -> bool {
        self.entries
            .get(&id)
            .map_or(false, |entry| self.graph.effectively_visible(entry.drawable.root))
    }

    fn viewed_camera(&self) -> Option<ObjectId> {
        match self.switchboard.active() {
            CameraRef::Object(id) => Some(id),
            CameraRef::Editor => None,
        }
    }

    fn refresh_gizmo(&mut self) {
        let exists_visible =
            self.selection.map_or(false, |id| self.target_exists_visible(id));
        let target =
            resolve_target(self.selection, self.tool, exists_visible, self.viewed_camera());
        let was_dragging = self.gizmo.is_dragging();
        self.gizmo.apply_target(target);
        if was_dragging && !self.gizmo.is_dragging() {
            self.orbit_enabled = true;
        }
    }

    // ---- pointer input ---------------------------------------------------

    /// Picks at the pointer and updates the selection. While a drag is in
    /// flight picking is suppressed and the selection is left alone.
    pub fn pointer_down(&mut self, screen: Vec2) -> Option<ObjectId> {
        if self.gizmo.is_dragging() {
            return self.selection;
        }
        let hit = self.pick(screen);
        self.set_selection(hit.map(|h| h.id));
        self.selection
    }

    pub fn pick(&self, screen: Vec2) -> Option<PickHit> {
        if self.gizmo.is_dragging() {
            return None;
        }
        let camera = self.pick_camera();
        pick_scene(&self.graph, &camera, screen, self.switchboard.viewport())
    }

    /// Starts a manipulation gesture at the pointer. The drag plane faces
    /// the camera and passes through the object center.
    pub fn begin_drag(&mut self, screen: Vec2) -> bool {
        let GizmoState::Attached { id, mode } = self.gizmo.state() else {
            return false;
        };
        let Some(entry) = self.entries.get(&id) else { return false };
        let root = entry.drawable.root;
        let camera = self.pick_camera();
        let Some((origin, dir)) = camera.screen_ray(screen, self.switchboard.viewport()) else {
            return false;
        };
        let world = self.graph.world_transform(root);
        let (_, _, center) = world.to_scale_rotation_translation();
        let normal = -camera.forward();
        let Some(t) = crate::gizmo::intersect_ray_plane(origin, dir, center, normal) else {
            return false;
        };
        let hit = origin + dir * t;
        let Some(node) = self.graph.node(root) else { return false };
        let session = match mode {
            GizmoMode::Translate => {
                DragSession::translate(id, center, normal, node.local.translation - hit)
            }
            GizmoMode::Rotate => {
                let start_vector = hit - center;
                if start_vector.length_squared() < 1e-8 {
                    return false;
                }
                DragSession::rotate(id, center, normal, node.local.rotation, start_vector)
            }
            GizmoMode::Scale => {
                let start_distance = (hit - center).length();
                if start_distance < 1e-4 {
                    return false;
                }
                DragSession::scale(id, center, normal, node.local.scale, start_distance)
            }
        };
        if self.gizmo.begin(session) {
            self.orbit_enabled = false;
            true
        } else {
            false
        }
    }

    /// One drag tick: writes the node transform and emits a live update.
    pub fn drag_update(&mut self, screen: Vec2) -> bool {
        let camera = self.pick_camera();
        let viewport = self.switchboard.viewport();
        let Some(drag) = self.gizmo.drag_mut() else { return false };
        let id = drag.id;
        let Some((origin, dir)) = camera.screen_ray(screen, viewport) else { return false };
        let Some(update) = drag.solve(origin, dir) else { return false };
        drag.dirty = true;
        drag.idle = 0.0;
        let Some(entry) = self.entries.get(&id) else { return false };
        let root = entry.drawable.root;
        let Some(node) = self.graph.node_mut(root) else { return false };
        let patch = match update {
            DragUpdate::Translation(translation) => {
                node.local.translation = translation;
                TransformPatch { position: Some(translation.into()), ..Default::default() }
            }
            DragUpdate::Rotation(rotation) => {
                node.local.rotation = rotation;
                let (rx, ry, rz) = rotation.to_euler(EulerRot::XYZ);
                TransformPatch {
                    rotation: Some(Vec3Data::new(rx, ry, rz)),
                    ..Default::default()
                }
            }
            DragUpdate::Scale(scale) => {
                node.local.scale = scale;
                TransformPatch { scale: Some(scale.into()), ..Default::default() }
            }
        };
        self.events.push(EngineEvent::RecordUpdated(RecordUpdate { id, patch, committed: false }));
        true
    }

    /// Finishes the gesture: exactly one committed update when anything
    /// actually moved. Re-enables orbit input.
    pub fn end_drag(&mut self) {
        let drag = self.gizmo.take_drag();
        self.orbit_enabled = true;
        let Some(drag) = drag else { return };
        if !drag.dirty {
            return;
        }
        let Some(entry) = self.entries.get(&drag.id) else { return };
        let Some(node) = self.graph.node(entry.drawable.root) else { return };
        let (rx, ry, rz) = node.local.rotation.to_euler(EulerRot::XYZ);
        self.events.push(EngineEvent::RecordUpdated(RecordUpdate {
            id: drag.id,
            patch: TransformPatch::full(
                node.local.translation.into(),
                Vec3Data::new(rx, ry, rz),
                node.local.scale.into(),
            ),
            committed: true,
        }));
    }

    // ---- cameras ----------------------------------------------------------

    /// Camera resolved from the active camera record, when that is usable.
    fn scene_camera(&self) -> Option<Camera3D> {
        let CameraRef::Object(id) = self.switchboard.active() else { return None };
        let entry = self.entries.get(&id)?;
        let projector = entry.drawable.projector.as_ref()?;
        if !self.graph.effectively_visible(entry.drawable.root) {
            return None;
        }
        let world = self.graph.world_transform(entry.drawable.root);
        Some(camera_from_pose(&world, projector))
    }

    pub fn render_camera(&self) -> Camera3D {
        self.scene_camera().unwrap_or_else(|| self.switchboard.editor_camera())
    }

    /// Picking always casts through the same camera the frame was rendered
    /// with.
    pub fn pick_camera(&self) -> Camera3D {
        self.render_camera()
    }

    pub fn active_camera(&self) -> CameraRef {
        self.switchboard.active()
    }

    pub fn set_active_camera(&mut self, camera: CameraRef) {
        self.switchboard.set_active(camera);
        self.refresh_gizmo();
    }

    pub fn resize(&mut self, viewport: PhysicalSize<u32>) {
        self.switchboard.resize(viewport);
        let aspect = self.switchboard.aspect();
        for entry in self.entries.values_mut() {
            if let Some(projector) = entry.drawable.projector.as_mut() {
                projector.aspect = aspect;
            }
        }
    }

    pub fn orbit_input(&mut self, delta: Vec2) {
        if self.orbit_enabled && matches!(self.switchboard.active(), CameraRef::Editor) {
            self.switchboard.orbit.orbit(delta);
        }
    }

    pub fn zoom_input(&mut self, factor: f32) {
        if self.orbit_enabled && matches!(self.switchboard.active(), CameraRef::Editor) {
            self.switchboard.orbit.zoom(factor);
        }
    }

    // ---- frame loop --------------------------------------------------------

    /// Per-frame bookkeeping: orbit damping, frustum helper refresh, drag
    /// quiescence and staging of finished loads for the next pass.
    pub fn advance(&mut self, dt: f32) {
        if matches!(self.switchboard.active(), CameraRef::Editor) {
            self.switchboard.orbit.advance(dt);
        }

        self.refresh_helpers();

        let commit_after = self.config.commit_quiescence_seconds;
        let timed_out = match self.gizmo.drag_mut() {
            Some(drag) => {
                drag.idle += dt;
                drag.dirty && drag.idle >= commit_after
            }
            None => false,
        };
        if timed_out {
            log::debug!("drag gesture quiesced, committing");
            self.end_drag();
        }

        self.staged.extend(self.loader.drain());
    }

    /// Completions are staged between passes; true means the host should
    /// run another `sync`.
    pub fn needs_pass(&self) -> bool {
        !self.staged.is_empty()
    }

    fn refresh_helpers(&mut self) {
        let mut swaps = Vec::new();
        for (id, entry) in &self.entries {
            let (Some(projector), Some(helper)) =
                (entry.drawable.projector, entry.drawable.helper)
            else {
                continue;
            };
            if entry.helper_built == Some(projector) {
                continue;
            }
            let Some(old) = self.graph.node(helper).and_then(|node| node.geometry.clone()) else {
                continue;
            };
            swaps.push((*id, helper, projector, old));
        }
        for (id, helper, projector, old) in swaps {
            let new = GeometryHandle::new(crate::mesh::Mesh::frustum_lines(
                projector.fov_y_radians,
                projector.aspect,
                projector.near,
                projector.far,
            ));
            self.resources.swap_geometry(id, &old, new.clone());
            if let Some(node) = self.graph.node_mut(helper) {
                node.geometry = Some(new);
            }
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.helper_built = Some(projector);
            }
        }
    }

    pub fn compose_frame(&self) -> FrameSubmission {
        compose(&self.graph, &self.render_camera(), self.switchboard.aspect())
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    /// Tears the whole scene down. Safe to call more than once.
    pub fn unmount(&mut self) {
        self.gizmo.detach();
        self.graph.clear();
        self.entries.clear();
        self.pending_sources.clear();
        self.resources.release_all();
        self.selection = None;
        self.switchboard.revert_to_editor();
        self.orbit_enabled = true;
    }

    // ---- introspection (used by hosts and tests) ---------------------------

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.switchboard.viewport()
    }

    pub fn has_drawable(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn drawable_ids(&self) -> Vec<ObjectId> {
        self.entries.keys().copied().collect()
    }

    pub fn drawable_count(&self) -> usize {
        self.entries.len()
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    pub fn drawable_geometry(&self, id: ObjectId) -> Option<GeometryHandle> {
        let entry = self.entries.get(&id)?;
        self.graph.node(entry.drawable.body)?.geometry.clone()
    }

    pub fn drawable_texture(&self, id: ObjectId) -> Option<TextureHandle> {
        let entry = self.entries.get(&id)?;
        self.graph.node(entry.drawable.body)?.material.texture.clone()
    }

    pub fn drawable_transform(&self, id: ObjectId) -> Option<(Vec3, glam::Quat, Vec3)> {
        let entry = self.entries.get(&id)?;
        let node = self.graph.node(entry.drawable.root)?;
        Some((node.local.translation, node.local.rotation, node.local.scale))
    }

    pub fn helper_geometry(&self, id: ObjectId) -> Option<GeometryHandle> {
        let entry = self.entries.get(&id)?;
        self.graph.node(entry.drawable.helper?)?.geometry.clone()
    }

    pub fn projector_aspect(&self, id: ObjectId) -> Option<f32> {
        Some(self.entries.get(&id)?.drawable.projector.as_ref()?.aspect)
    }

    pub fn video_handle(&self, id: ObjectId) -> Option<VideoHandle> {
        self.resources.video(id).cloned()
    }

    pub fn is_orbit_enabled(&self) -> bool {
        self.orbit_enabled
    }

    /// True while the shared font or any per-object media decode is in
    /// flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.font, FontState::Loading) || !self.pending_sources.is_empty()
    }
}

enum BuildResult {
    Built,
    Deferred,
}

fn index_records(records: &[SceneObject]) -> HashMap<ObjectId, &SceneObject> {
    let mut by_id = HashMap::with_capacity(records.len());
    for record in records {
        by_id.entry(record.id).or_insert(record);
    }
    by_id
}
