//! Camera registry: the camera list and the active selection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use sentinel_core::{
    Camera, CameraId, CameraStatus, Result, DEFAULT_THUMBNAIL_URL, FOOTAGE_LOCATION,
};

use crate::video_source::{VideoEntry, VideoSource};

#[derive(Debug, Default)]
struct RegistryState {
    cameras: Vec<Camera>,
    /// Weak reference; may point at a camera that no longer exists
    active: Option<CameraId>,
    /// Per-camera media playback failures
    playback_errors: HashMap<CameraId, String>,
}

/// Owner of the camera list
#[derive(Debug)]
pub struct CameraRegistry {
    state: RwLock<RegistryState>,
    loading: AtomicBool,
    placeholder_thumbnail: String,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            loading: AtomicBool::new(false),
            placeholder_thumbnail: DEFAULT_THUMBNAIL_URL.to_string(),
        }
    }

    pub fn with_cameras(cameras: Vec<Camera>) -> Self {
        let registry = Self::new();
        {
            let mut state = registry.state.write();
            state.active = cameras.first().map(|c| c.id.clone());
            state.cameras = cameras;
        }
        registry
    }

    pub fn with_placeholder_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.placeholder_thumbnail = url.into();
        self
    }

    /// Snapshot of all cameras in insertion order
    pub fn cameras(&self) -> Vec<Camera> {
        self.state.read().cameras.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().cameras.is_empty()
    }

    pub fn camera(&self, id: &CameraId) -> Option<Camera> {
        self.state.read().cameras.iter().find(|c| &c.id == id).cloned()
    }

    pub fn camera_name(&self, id: &CameraId) -> Option<String> {
        self.state
            .read()
            .cameras
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.name.clone())
    }

    /// Whether `id` resolves to the crowd-only camera
    pub fn is_crowd_only(&self, id: &CameraId) -> bool {
        self.state
            .read()
            .cameras
            .iter()
            .any(|c| &c.id == id && c.is_crowd_only())
    }

    /// Cameras eligible for simulated AI processing
    pub fn eligible_cameras(&self) -> Vec<Camera> {
        self.state
            .read()
            .cameras
            .iter()
            .filter(|c| c.is_eligible())
            .cloned()
            .collect()
    }

    pub fn active_camera_id(&self) -> Option<CameraId> {
        self.state.read().active.clone()
    }

    /// Unconditional; the id is not validated against the list
    pub fn set_active_camera_id(&self, id: Option<CameraId>) {
        self.state.write().active = id;
    }

    /// The active camera, falling back to the first camera when the
    /// active id is unset or dangling
    pub fn active_camera(&self) -> Option<Camera> {
        let state = self.state.read();
        state
            .active
            .as_ref()
            .and_then(|id| state.cameras.iter().find(|c| &c.id == id))
            .or_else(|| state.cameras.first())
            .cloned()
    }

    /// Append a camera; ids are not de-duplicated
    pub fn add_camera(&self, camera: Camera) {
        tracing::info!(camera_id = %camera.id, name = %camera.name, "camera added");
        self.state.write().cameras.push(camera);
    }

    /// Remove a camera by id, reassigning the selection if it was active
    pub fn remove_camera(&self, id: &CameraId) -> bool {
        let mut state = self.state.write();
        let before = state.cameras.len();
        state.cameras.retain(|c| &c.id != id);
        let removed = state.cameras.len() != before;

        if state.active.as_ref() == Some(id) {
            state.active = state.cameras.first().map(|c| c.id.clone());
        }
        state.playback_errors.remove(id);

        if removed {
            tracing::info!(camera_id = %id, "camera removed");
        }
        removed
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Replace the camera list from `source`.
    ///
    /// On failure or an empty listing the list and selection are cleared;
    /// nothing is retried.
    pub async fn refresh(&self, source: &dyn VideoSource) -> Result<usize> {
        self.loading.store(true, Ordering::SeqCst);
        tracing::info!(source = source.name(), "refreshing cameras");

        let result = source.list_videos().await;
        let outcome = match result {
            Ok(videos) if !videos.is_empty() => {
                let cameras = self.cameras_from_videos(&videos);
                let count = cameras.len();
                let mut state = self.state.write();
                let keep_active = state
                    .active
                    .as_ref()
                    .is_some_and(|id| cameras.iter().any(|c| &c.id == id));
                if !keep_active {
                    state.active = cameras.first().map(|c| c.id.clone());
                }
                state.cameras = cameras;
                state.playback_errors.clear();
                tracing::info!(count, "cameras loaded");
                Ok(count)
            }
            Ok(_) => {
                self.clear();
                tracing::info!("no videos available, camera list cleared");
                Ok(0)
            }
            Err(e) => {
                self.clear();
                tracing::error!("error loading cameras: {e}");
                Err(e)
            }
        };

        self.loading.store(false, Ordering::SeqCst);
        outcome
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.cameras.clear();
        state.active = None;
        state.playback_errors.clear();
    }

    fn cameras_from_videos(&self, videos: &[VideoEntry]) -> Vec<Camera> {
        videos
            .iter()
            .enumerate()
            .map(|(index, video)| Camera {
                id: CameraId::for_video(index),
                name: display_name(&video.name),
                location: FOOTAGE_LOCATION.to_string(),
                stream_url: video.url.clone(),
                thumbnail_url: video
                    .thumbnail_url
                    .clone()
                    .unwrap_or_else(|| self.placeholder_thumbnail.clone()),
                status: CameraStatus::Online,
            })
            .collect()
    }

    /// Record a media playback failure for a camera
    pub fn report_playback_error(&self, id: &CameraId, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(camera_id = %id, "playback error: {message}");
        self.state.write().playback_errors.insert(id.clone(), message);
    }

    /// Clear a playback failure, e.g. on manual retry
    pub fn clear_playback_error(&self, id: &CameraId) -> bool {
        self.state.write().playback_errors.remove(id).is_some()
    }

    pub fn playback_error(&self, id: &CameraId) -> Option<String> {
        self.state.read().playback_errors.get(id).cloned()
    }
}

impl Default for CameraRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// File name without its extension, underscores shown as spaces
pub fn display_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(i) if i + 1 < file_name.len() && !file_name[i + 1..].contains('/') => {
            &file_name[..i]
        }
        _ => file_name,
    };
    stem.replace('_', " ")
}
