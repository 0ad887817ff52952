//! Detection sources used by the generator.
//!
//! [`SimulatedSource`] draws random observations; [`ModelBackedSource`]
//! asks a [`FaceDetector`] and falls back to simulated faces on empty frames.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use sentinel_core::{
    BoundingBox, Camera, CameraId, Detection, DetectionId, DetectionKind, Timestamp,
};

use crate::config::AiSettings;
use crate::face::{faces_to_detections, should_simulate_face, simulated_face, FaceDetector};

/// Which detection source the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSourceKind {
    #[default]
    Simulated,
    FaceModel,
}

/// Produces detections for one camera per generation tick
pub trait DetectionSource: Send {
    fn name(&self) -> &str;

    fn detect(&mut self, camera: &Camera, sensitivity: u8, now: Timestamp) -> Vec<Detection>;

    /// Per-camera processing errors, e.g. a model that failed to load
    fn errors(&self) -> HashMap<CameraId, String> {
        HashMap::new()
    }

    /// Forget per-camera state so the next tick starts fresh
    fn reset(&mut self, _camera_id: &CameraId) {}

    /// Wait before the next batch when the source paces itself;
    /// `None` keeps the engine's generation delay
    fn batch_interval(&self, _settings: &AiSettings) -> Option<Duration> {
        None
    }
}

/// Random observations shaped by sensitivity
pub struct SimulatedSource {
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Number of detections for one camera: `floor(r * sensitivity / 30) + 1`
    pub fn batch_size(&mut self, sensitivity: u8) -> usize {
        let r: f64 = self.rng.gen();
        (r * f64::from(sensitivity.min(100)) / 30.0).floor() as usize + 1
    }

    fn observation(&mut self, camera_id: &CameraId, now: Timestamp) -> Detection {
        let roll: f64 = self.rng.gen();
        let (kind, label, is_anomaly) = if roll < 0.05 {
            (DetectionKind::Smoke, "Smoke Detected", true)
        } else if roll < 0.08 {
            (DetectionKind::Fire, "Fire Detected", true)
        } else if roll < 0.15 {
            (DetectionKind::CrowdDispersal, "Crowd Dispersal", true)
        } else if self.rng.gen_bool(0.1) {
            (DetectionKind::Person, "Suspicious Person", true)
        } else {
            (DetectionKind::Person, "Person", false)
        };

        Detection {
            id: DetectionId::new(),
            camera_id: camera_id.clone(),
            kind,
            label: label.to_string(),
            confidence: self.rng.gen_range(0.7..1.0),
            bounding_box: BoundingBox::new(
                self.rng.gen_range(0.0..0.7),
                self.rng.gen_range(0.0..0.7),
                self.rng.gen_range(0.1..0.3),
                self.rng.gen_range(0.2..0.5),
            ),
            is_anomaly,
            timestamp: now,
            landmarks: None,
        }
    }
}

impl DetectionSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    fn detect(&mut self, camera: &Camera, sensitivity: u8, now: Timestamp) -> Vec<Detection> {
        let count = self.batch_size(sensitivity);
        (0..count)
            .map(|_| self.observation(&camera.id, now))
            .collect()
    }
}

/// Face detections from a model, with a simulated face on empty frames
pub struct ModelBackedSource {
    detector: Arc<dyn FaceDetector>,
    rng: StdRng,
    loaded: HashSet<CameraId>,
    failed: HashMap<CameraId, String>,
}

impl ModelBackedSource {
    pub fn new(detector: Arc<dyn FaceDetector>, rng: StdRng) -> Self {
        Self {
            detector,
            rng,
            loaded: HashSet::new(),
            failed: HashMap::new(),
        }
    }

    /// Load the model for `camera` once; failures disable only that camera
    fn ensure_loaded(&mut self, camera: &Camera) -> bool {
        if self.loaded.contains(&camera.id) {
            return true;
        }
        if self.failed.contains_key(&camera.id) {
            return false;
        }

        match self.detector.load(camera) {
            Ok(()) => {
                tracing::info!(
                    camera_id = %camera.id,
                    detector = self.detector.name(),
                    "face model loaded"
                );
                self.loaded.insert(camera.id.clone());
                true
            }
            Err(e) => {
                tracing::error!(camera_id = %camera.id, "failed to load face model: {e}");
                self.failed.insert(camera.id.clone(), e.to_string());
                false
            }
        }
    }
}

impl DetectionSource for ModelBackedSource {
    fn name(&self) -> &str {
        "face_model"
    }

    fn detect(&mut self, camera: &Camera, sensitivity: u8, now: Timestamp) -> Vec<Detection> {
        if camera.is_crowd_only() || !self.ensure_loaded(camera) {
            return Vec::new();
        }

        let frame = match self.detector.detect(camera) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(camera_id = %camera.id, "error processing video frame: {e}");
                return Vec::new();
            }
        };

        if frame.faces.is_empty() {
            if should_simulate_face(sensitivity, &mut self.rng) {
                return vec![simulated_face(&camera.id, now, &mut self.rng)];
            }
            return Vec::new();
        }

        faces_to_detections(&frame, &camera.id, now, &mut self.rng)
    }

    fn errors(&self) -> HashMap<CameraId, String> {
        self.failed.clone()
    }

    /// Forget a camera's load failure so the next tick retries
    fn reset(&mut self, camera_id: &CameraId) {
        self.failed.remove(camera_id);
        self.loaded.remove(camera_id);
    }

    /// Frames are sampled faster as sensitivity rises
    fn batch_interval(&self, settings: &AiSettings) -> Option<Duration> {
        Some(settings.face_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::{BlankFaceDetector, FaceBox, FaceFrame};
    use rand::SeedableRng;
    use sentinel_core::{CameraStatus, Error, Result, DEFAULT_THUMBNAIL_URL};

    fn camera(id: &str, name: &str) -> Camera {
        Camera {
            id: CameraId::from(id),
            name: name.to_string(),
            location: "Security Footage".to_string(),
            stream_url: format!("https://cdn.test/{id}.mp4"),
            thumbnail_url: DEFAULT_THUMBNAIL_URL.to_string(),
            status: CameraStatus::Online,
        }
    }

    #[test]
    fn test_simulated_ranges() {
        let mut source = SimulatedSource::new(StdRng::seed_from_u64(21));
        let cam = camera("supabase-cam-2", "Entrance Video 1");
        for _ in 0..300 {
            for d in source.detect(&cam, 75, Timestamp::now()) {
                let b = d.bounding_box;
                assert!((0.0..0.7).contains(&b.x) && (0.0..0.7).contains(&b.y));
                assert!((0.1..0.3).contains(&b.width));
                assert!((0.2..0.5).contains(&b.height));
                assert!((0.7..1.0).contains(&d.confidence));
                if d.kind.is_special() {
                    assert!(d.is_anomaly);
                }
                assert_eq!(d.camera_id, cam.id);
            }
        }
    }

    #[test]
    fn test_batch_size_at_default_sensitivity() {
        let mut source = SimulatedSource::new(StdRng::seed_from_u64(9));
        let sizes: Vec<usize> = (0..500).map(|_| source.batch_size(75)).collect();
        assert!(sizes.iter().all(|n| (1..=3).contains(n)));
        assert!(sizes.contains(&1) && sizes.contains(&3));
        assert!((0..100).all(|_| source.batch_size(0) == 1));
    }

    struct BrokenDetector;

    impl FaceDetector for BrokenDetector {
        fn name(&self) -> &str {
            "broken"
        }

        fn load(&self, camera: &Camera) -> Result<()> {
            if camera.id.as_str() == "supabase-cam-3" {
                Err(Error::ModelLoad("weights missing".into()))
            } else {
                Ok(())
            }
        }

        fn detect(&self, _camera: &Camera) -> Result<FaceFrame> {
            Ok(FaceFrame {
                width: 100.0,
                height: 100.0,
                faces: vec![FaceBox {
                    top_left: [10.0, 10.0],
                    bottom_right: [30.0, 40.0],
                    probability: 0.95,
                    landmarks: vec![[20.0, 20.0]],
                }],
            })
        }
    }

    #[test]
    fn test_model_load_failure_is_per_camera() {
        let mut source = ModelBackedSource::new(Arc::new(BrokenDetector), StdRng::seed_from_u64(1));
        let good = camera("supabase-cam-2", "Entrance");
        let bad = camera("supabase-cam-3", "Exit");

        assert!(source.detect(&bad, 75, Timestamp::now()).is_empty());
        let detections = source.detect(&good, 75, Timestamp::now());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].kind, DetectionKind::Face);

        let errors = source.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[&bad.id].contains("weights missing"));

        source.reset(&bad.id);
        assert!(source.errors().is_empty());
    }

    #[test]
    fn test_model_backed_skips_crowd_camera_and_simulates_empty_frames() {
        let mut source =
            ModelBackedSource::new(Arc::new(BlankFaceDetector), StdRng::seed_from_u64(6));
        let crowd = camera("supabase-cam-1", "Hall Crowd");
        let cam = camera("supabase-cam-2", "Entrance");

        assert!((0..100).all(|_| source.detect(&crowd, 100, Timestamp::now()).is_empty()));

        let simulated: usize = (0..1000)
            .map(|_| source.detect(&cam, 100, Timestamp::now()).len())
            .sum();
        assert!((400..600).contains(&simulated), "simulated {simulated}");
        assert!((0..100).all(|_| source.detect(&cam, 0, Timestamp::now()).is_empty()));
    }
}
