use crate::error::LoadError;
use crate::mesh::Mesh;
use crate::record::ObjectId;
use rusttype::Font;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Parsed font shared across every text drawable.
#[derive(Clone)]
pub struct FontAsset {
    font: Arc<Font<'static>>,
}

impl FontAsset {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LoadError> {
        let font = Font::try_from_vec(bytes).ok_or(LoadError::FontUnavailable)?;
        Ok(Self { font: Arc::new(font) })
    }

    pub fn font(&self) -> &Font<'static> {
        &self.font
    }
}

/// Raw decoded pixels before they become a registered texture handle.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub source: PathBuf,
}

#[derive(Debug, Clone)]
pub enum LoadRequest {
    Font { path: PathBuf },
    Texture { id: ObjectId, path: PathBuf },
    /// Probe a video file for its poster-frame dimensions; actual playback
    /// decode belongs to the embedder.
    VideoProbe { id: ObjectId, path: PathBuf },
    Model { id: ObjectId, path: PathBuf },
}

pub enum LoadOutcome {
    Font(Result<FontAsset, LoadError>),
    Texture { id: ObjectId, result: Result<DecodedImage, LoadError> },
    VideoProbe { id: ObjectId, path: PathBuf, result: Result<(u32, u32), LoadError> },
    Model { id: ObjectId, path: PathBuf, result: Result<Mesh, LoadError> },
}

enum Backend {
    /// Worker thread fed over a channel; completions drained once per pass.
    Worker {
        requests: Sender<LoadRequest>,
        outcomes: Receiver<LoadOutcome>,
        _worker: JoinHandle<()>,
    },
    /// Performs the load inline. Deterministic paths for tests.
    Synchronous { ready: VecDeque<LoadOutcome> },
}

/// One-shot asset loads. Every request eventually produces exactly one
/// outcome; outcomes carry the requesting id so stale completions for
/// removed or re-sourced objects can be discarded at the drain site.
pub struct AssetLoader {
    backend: Backend,
}

impl AssetLoader {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = channel::<LoadRequest>();
        let (outcome_tx, outcome_rx) = channel::<LoadOutcome>();
        let worker = std::thread::spawn(move || {
            // Exits when the engine drops its sender.
            while let Ok(request) = request_rx.recv() {
                if outcome_tx.send(perform(request)).is_err() {
                    break;
                }
            }
        });
        Self { backend: Backend::Worker { requests: request_tx, outcomes: outcome_rx, _worker: worker } }
    }

    pub fn synchronous() -> Self {
        Self { backend: Backend::Synchronous { ready: VecDeque::new() } }
    }

    pub fn request(&mut self, request: LoadRequest) {
        match &mut self.backend {
            Backend::Worker { requests, .. } => {
                if requests.send(request).is_err() {
                    log::warn!("asset worker is gone; load request dropped");
                }
            }
            Backend::Synchronous { ready } => ready.push_back(perform(request)),
        }
    }

    /// Every outcome that has completed since the previous drain.
    pub fn drain(&mut self) -> Vec<LoadOutcome> {
        match &mut self.backend {
            Backend::Worker { outcomes, .. } => outcomes.try_iter().collect(),
            Backend::Synchronous { ready } => ready.drain(..).collect(),
        }
    }
}

fn read_bytes(path: &PathBuf) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io { path: path.clone(), source })
}

fn perform(request: LoadRequest) -> LoadOutcome {
    match request {
        LoadRequest::Font { path } => {
            let result = read_bytes(&path).and_then(FontAsset::from_bytes);
            LoadOutcome::Font(result)
        }
        LoadRequest::Texture { id, path } => {
            let result = image::open(&path)
                .map(|decoded| {
                    let rgba = decoded.to_rgba8();
                    DecodedImage {
                        width: rgba.width(),
                        height: rgba.height(),
                        rgba: rgba.into_raw(),
                        source: path.clone(),
                    }
                })
                .map_err(|err| LoadError::Decode { path, reason: err.to_string() });
            LoadOutcome::Texture { id, result }
        }
        LoadRequest::VideoProbe { id, path } => {
            let result = image::image_dimensions(&path)
                .map_err(|err| LoadError::Decode { path: path.clone(), reason: err.to_string() });
            LoadOutcome::VideoProbe { id, path, result }
        }
        LoadRequest::Model { id, path } => {
            let result = Mesh::load_gltf(&path)
                .map_err(|err| LoadError::Decode { path: path.clone(), reason: format!("{err:#}") });
            LoadOutcome::Model { id, path, result }
        }
    }
}
