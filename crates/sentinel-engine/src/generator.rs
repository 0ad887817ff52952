//! Detection generator: one batch per tick across the eligible cameras.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::rngs::StdRng;

use sentinel_core::{CameraId, Detection, DetectionKind, Timestamp};

use crate::alerts::{alert_for_detection, AlertStore};
use crate::config::AiSettings;
use crate::demographics::DemographicEstimator;
use crate::detection_source::DetectionSource;
use crate::registry::CameraRegistry;
use crate::store::DetectionStore;

/// Outcome of one generation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub cameras: usize,
    pub detections: usize,
    pub alerts: usize,
}

pub struct DetectionGenerator {
    source: Box<dyn DetectionSource>,
    registry: Arc<CameraRegistry>,
    store: Arc<DetectionStore>,
    alerts: Arc<AlertStore>,
    demographics: Arc<DemographicEstimator>,
    settings: Arc<RwLock<AiSettings>>,
    rng: StdRng,
}

impl DetectionGenerator {
    pub fn new(
        source: Box<dyn DetectionSource>,
        registry: Arc<CameraRegistry>,
        store: Arc<DetectionStore>,
        alerts: Arc<AlertStore>,
        demographics: Arc<DemographicEstimator>,
        settings: Arc<RwLock<AiSettings>>,
        rng: StdRng,
    ) -> Self {
        Self {
            source,
            registry,
            store,
            alerts,
            demographics,
            settings,
            rng,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn source_errors(&self) -> HashMap<CameraId, String> {
        self.source.errors()
    }

    pub fn reset_camera(&mut self, camera_id: &CameraId) {
        self.source.reset(camera_id);
    }

    /// Wait before the next batch, re-read from the current settings
    pub fn next_delay(&self, default: Duration) -> Duration {
        let settings = *self.settings.read();
        self.source.batch_interval(&settings).unwrap_or(default)
    }

    /// Generate one batch.
    ///
    /// Sensitivity and the eligible cameras are read fresh. Every detection
    /// is stored before any alert for the anomalous ones is raised.
    pub fn run_batch(&mut self, now: Timestamp) -> BatchSummary {
        let sensitivity = self.settings.read().sensitivity;
        let cameras = self.registry.eligible_cameras();

        let mut batch = Vec::new();
        for camera in &cameras {
            batch.extend(self.source.detect(camera, sensitivity, now));
        }

        let mut summary = BatchSummary {
            cameras: cameras.len(),
            ..Default::default()
        };

        let mut anomalies = Vec::new();
        for detection in batch {
            let pending = detection.is_anomaly.then(|| detection.clone());
            if self.ingest(detection) {
                summary.detections += 1;
                anomalies.extend(pending);
            }
        }

        for detection in &anomalies {
            let camera_name = cameras
                .iter()
                .find(|c| c.id == detection.camera_id)
                .map(|c| c.name.as_str());
            self.alerts
                .add_alert(alert_for_detection(detection, camera_name));
            summary.alerts += 1;
        }

        tracing::debug!(
            source = self.source.name(),
            cameras = summary.cameras,
            detections = summary.detections,
            alerts = summary.alerts,
            "detection batch generated"
        );
        summary
    }

    /// Store a detection unless its camera is the crowd-only one.
    ///
    /// Face detections may nudge the demographic estimate.
    pub fn ingest(&mut self, detection: Detection) -> bool {
        if self.registry.is_crowd_only(&detection.camera_id) {
            tracing::debug!(
                camera_id = %detection.camera_id,
                "dropping detection for crowd-only camera"
            );
            return false;
        }

        let is_face = detection.kind == DetectionKind::Face;
        self.store.insert(detection);
        if is_face {
            self.demographics.maybe_update(&mut self.rng);
        }
        true
    }
}
