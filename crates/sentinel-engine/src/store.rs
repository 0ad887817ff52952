//! Bounded, time-windowed detection store.

use std::collections::VecDeque;

use parking_lot::RwLock;

use sentinel_core::{CameraId, Detection, DetectionKind, Timestamp};

/// Most-recent-first detection collection with a size cap and retention window
#[derive(Debug)]
pub struct DetectionStore {
    detections: RwLock<VecDeque<Detection>>,
    capacity: usize,
    retention_ms: i64,
}

impl DetectionStore {
    pub fn new(capacity: usize, retention_ms: u64) -> Self {
        Self {
            detections: RwLock::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
            retention_ms: retention_ms as i64,
        }
    }

    /// Insert at the head, dropping the oldest entries beyond capacity
    pub fn insert(&self, detection: Detection) {
        let mut detections = self.detections.write();
        detections.push_front(detection);
        detections.truncate(self.capacity);
    }

    /// Drop detections at least `retention` old; returns how many were evicted
    pub fn evict_expired(&self, now: Timestamp) -> usize {
        let mut detections = self.detections.write();
        let before = detections.len();
        detections.retain(|d| d.age_millis(now) < self.retention_ms);
        before - detections.len()
    }

    /// Snapshot, newest first
    pub fn snapshot(&self) -> Vec<Detection> {
        self.detections.read().iter().cloned().collect()
    }

    pub fn for_camera(&self, camera_id: &CameraId) -> Vec<Detection> {
        self.detections
            .read()
            .iter()
            .filter(|d| &d.camera_id == camera_id)
            .cloned()
            .collect()
    }

    pub fn count_kind(&self, kind: &DetectionKind) -> usize {
        self.detections
            .read()
            .iter()
            .filter(|d| &d.kind == kind)
            .count()
    }

    pub fn len(&self) -> usize {
        self.detections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.read().is_empty()
    }

    pub fn clear(&self) {
        self.detections.write().clear();
    }
}

impl Default for DetectionStore {
    fn default() -> Self {
        Self::new(50, 10_000)
    }
}
