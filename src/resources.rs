use crate::mesh::Mesh;
use crate::record::ObjectId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared geometry buffer. Disposal is observable so tests can prove the
/// lifecycle invariant without a GPU.
#[derive(Clone, Debug)]
pub struct GeometryHandle {
    inner: Arc<GeometryInner>,
}

#[derive(Debug)]
struct GeometryInner {
    mesh: Mesh,
    disposed: AtomicBool,
}

impl GeometryHandle {
    pub fn new(mesh: Mesh) -> Self {
        Self { inner: Arc::new(GeometryInner { mesh, disposed: AtomicBool::new(false) }) }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.inner.mesh
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub fn ptr_eq(&self, other: &GeometryHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
    }
}

/// Decoded RGBA texture plus the source it came from, for cancellation checks.
#[derive(Clone, Debug)]
pub struct TextureHandle {
    inner: Arc<TextureInner>,
}

#[derive(Debug)]
struct TextureInner {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    source: PathBuf,
    disposed: AtomicBool,
}

impl TextureHandle {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, source: PathBuf) -> Self {
        Self {
            inner: Arc::new(TextureInner {
                width,
                height,
                pixels,
                source,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.inner.pixels
    }

    pub fn source(&self) -> &PathBuf {
        &self.inner.source
    }

    pub fn aspect(&self) -> f32 {
        if self.inner.height == 0 {
            1.0
        } else {
            self.inner.width as f32 / self.inner.height as f32
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
    }
}

/// Playback handle for a video-backed surface. Playback must be stopped and
/// the surface detached explicitly; dropping the handle is not enough.
#[derive(Clone, Debug)]
pub struct VideoHandle {
    inner: Arc<VideoInner>,
}

#[derive(Debug)]
struct VideoInner {
    source: PathBuf,
    width: u32,
    height: u32,
    playing: AtomicBool,
    detached: AtomicBool,
}

impl VideoHandle {
    pub fn new(source: PathBuf, width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(VideoInner {
                source,
                width,
                height,
                playing: AtomicBool::new(true),
                detached: AtomicBool::new(false),
            }),
        }
    }

    pub fn source(&self) -> &PathBuf {
        &self.inner.source
    }

    pub fn aspect(&self) -> f32 {
        if self.inner.height == 0 {
            1.0
        } else {
            self.inner.width as f32 / self.inner.height as f32
        }
    }

    pub fn is_playing(&self) -> bool {
        self.inner.playing.load(Ordering::SeqCst)
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.inner.playing.store(false, Ordering::SeqCst);
    }

    pub fn detach(&self) {
        self.inner.detached.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ResourceSet {
    geometries: Vec<GeometryHandle>,
    textures: Vec<TextureHandle>,
    video: Option<VideoHandle>,
}

/// Resource Lifecycle Manager. Every geometry, texture and video handle a
/// drawable owns is registered under its object id, so removal disposes
/// exactly that object's resources and nothing shared leaks or double-frees.
#[derive(Default)]
pub struct ResourceStore {
    entries: HashMap<ObjectId, ResourceSet>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, id: ObjectId) -> &mut ResourceSet {
        self.entries.entry(id).or_default()
    }

    pub fn register_geometry(&mut self, id: ObjectId, handle: GeometryHandle) {
        self.entry(id).geometries.push(handle);
    }

    pub fn register_texture(&mut self, id: ObjectId, handle: TextureHandle) {
        self.entry(id).textures.push(handle);
    }

    pub fn register_video(&mut self, id: ObjectId, handle: VideoHandle) {
        self.entry(id).video = Some(handle);
    }

    pub fn video(&self, id: ObjectId) -> Option<&VideoHandle> {
        self.entries.get(&id).and_then(|set| set.video.as_ref())
    }

    /// Swaps a registered geometry for a replacement without disposing the
    /// rest of the set. Used when a helper mesh is regenerated in place.
    pub fn swap_geometry(&mut self, id: ObjectId, old: &GeometryHandle, new: GeometryHandle) {
        if let Some(set) = self.entries.get_mut(&id) {
            if let Some(slot) = set.geometries.iter_mut().find(|g| g.ptr_eq(old)) {
                slot.dispose();
                *slot = new;
            }
        }
    }

    /// Disposes everything registered for `id`. Returns false (and does
    /// nothing) when the id holds no resources, so a second release is a no-op.
    pub fn release(&mut self, id: ObjectId) -> bool {
        let Some(set) = self.entries.remove(&id) else {
            return false;
        };
        for geometry in &set.geometries {
            geometry.dispose();
        }
        for texture in &set.textures {
            texture.dispose();
        }
        if let Some(video) = &set.video {
            video.stop();
            video.detach();
        }
        log::debug!(
            "released {} geometries, {} textures for {id}",
            set.geometries.len(),
            set.textures.len()
        );
        true
    }

    pub fn release_all(&mut self) {
        let ids: Vec<ObjectId> = self.entries.keys().copied().collect();
        for id in ids {
            self.release(id);
        }
    }

    pub fn tracked_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
