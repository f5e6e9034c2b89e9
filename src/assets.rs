//! Overlay images, decoded off the render thread.
//!
//! Each concrete overlay kind loads independently on its own thread and is
//! published back over a channel that the render loop polls between ticks.

use crate::config::OverlayConfig;
use crate::placement::OverlayKind;
use crate::utils::image_conversion::rgba_to_bgra_mat;
use crate::{Error, Result};
use log::{info, warn};
use opencv::core::Mat;
use opencv::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

/// Load state of one overlay image
#[derive(Debug)]
pub enum AssetState {
    Unloaded,
    Loading,
    /// Decoded 4-channel BGRA image
    Loaded(Mat),
    Failed(String),
}

impl AssetState {
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

type LoadResult = (OverlayKind, std::result::Result<Mat, String>);

/// The three overlay images and their load states
pub struct OverlayAssets {
    states: HashMap<OverlayKind, AssetState>,
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
}

impl Default for OverlayAssets {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayAssets {
    /// All kinds unloaded, nothing in flight
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        let states = OverlayKind::DRAWABLE
            .iter()
            .map(|&kind| (kind, AssetState::Unloaded))
            .collect();
        Self {
            states,
            sender,
            receiver,
        }
    }

    /// Start decoding every configured image in the background
    pub fn load_all(&mut self, config: &OverlayConfig) {
        for kind in OverlayKind::DRAWABLE {
            if let Some(path) = config.path_for(kind) {
                self.load(kind, path.to_path_buf());
            }
        }
    }

    /// Start decoding one image in the background
    pub fn load(&mut self, kind: OverlayKind, path: PathBuf) {
        if !kind.is_concrete() {
            return;
        }
        self.states.insert(kind, AssetState::Loading);

        let sender = self.sender.clone();
        let spawned = thread::Builder::new()
            .name(format!("asset-{kind}"))
            .spawn(move || {
                let result = decode_overlay(&path).map_err(|e| e.to_string());
                // The receiver is gone only when the app is shutting down
                let _ = sender.send((kind, result));
            });

        if let Err(e) = spawned {
            warn!("Could not start loader for {} overlay: {}", kind, e);
            self.states.insert(kind, AssetState::Failed(e.to_string()));
        }
    }

    /// Apply finished loads; returns the kinds whose state changed
    pub fn poll(&mut self) -> Vec<OverlayKind> {
        let mut changed = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok((kind, Ok(image))) => {
                    info!("Loaded {} overlay ({}x{})", kind, image.cols(), image.rows());
                    self.states.insert(kind, AssetState::Loaded(image));
                    changed.push(kind);
                }
                Ok((kind, Err(message))) => {
                    warn!("Failed to load {} overlay: {}", kind, message);
                    self.states.insert(kind, AssetState::Failed(message));
                    changed.push(kind);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    /// Install an already decoded BGRA image
    pub fn insert_loaded(&mut self, kind: OverlayKind, image: Mat) {
        if kind.is_concrete() {
            self.states.insert(kind, AssetState::Loaded(image));
        }
    }

    /// Load state of a concrete kind
    #[must_use]
    pub fn state(&self, kind: OverlayKind) -> Option<&AssetState> {
        self.states.get(&kind)
    }

    /// The decoded image of a kind, if loaded
    #[must_use]
    pub fn image(&self, kind: OverlayKind) -> Option<&Mat> {
        match self.states.get(&kind) {
            Some(AssetState::Loaded(image)) => Some(image),
            _ => None,
        }
    }

    /// Whether at least one image finished loading
    #[must_use]
    pub fn any_loaded(&self) -> bool {
        self.states.values().any(AssetState::is_loaded)
    }

    /// Whether any image of the selection is still being decoded
    #[must_use]
    pub fn any_loading(&self, selection: OverlayKind) -> bool {
        selection
            .drawn_kinds()
            .iter()
            .any(|kind| self.states.get(kind).is_some_and(AssetState::is_loading))
    }
}

/// Decode an image file into a BGRA `Mat`
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be decoded.
pub fn decode_overlay(path: &Path) -> Result<Mat> {
    if !path.exists() {
        return Err(Error::AssetError(format!("Overlay image not found: {}", path.display())));
    }
    let decoded = image::open(path)?.to_rgba8();
    rgba_to_bgra_mat(&decoded)
}
