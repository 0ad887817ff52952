//! Face-detection collaborator and conversion of its output into detections.

use rand::Rng;

use sentinel_core::{
    BoundingBox, Camera, CameraId, Detection, DetectionId, DetectionKind, Result, Timestamp,
};

/// Frame size assumed when a detector does not report one
pub const DEFAULT_FRAME_SIZE: (f64, f64) = (640.0, 480.0);

/// Confidence a face must exceed before it can be flagged
const ANOMALY_CONFIDENCE: f64 = 0.8;

/// Face box in pixel coordinates of its frame
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBox {
    pub top_left: [f64; 2],
    pub bottom_right: [f64; 2],
    pub probability: f64,
    /// Landmark points in pixels
    pub landmarks: Vec<[f64; 2]>,
}

/// Faces found in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FaceFrame {
    pub width: f64,
    pub height: f64,
    pub faces: Vec<FaceBox>,
}

impl FaceFrame {
    pub fn empty() -> Self {
        Self {
            width: DEFAULT_FRAME_SIZE.0,
            height: DEFAULT_FRAME_SIZE.1,
            faces: Vec::new(),
        }
    }
}

/// Face detection backend
pub trait FaceDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Prepare the model for `camera`; called once before the first frame
    fn load(&self, camera: &Camera) -> Result<()>;

    /// Detect faces in the current frame of `camera`
    fn detect(&self, camera: &Camera) -> Result<FaceFrame>;
}

/// Detector that never finds a face, leaving every frame to the simulated path
#[derive(Debug, Default, Clone, Copy)]
pub struct BlankFaceDetector;

impl FaceDetector for BlankFaceDetector {
    fn name(&self) -> &str {
        "blank"
    }

    fn load(&self, _camera: &Camera) -> Result<()> {
        Ok(())
    }

    fn detect(&self, _camera: &Camera) -> Result<FaceFrame> {
        Ok(FaceFrame::empty())
    }
}

fn face_label(is_anomaly: bool) -> &'static str {
    if is_anomaly {
        "Suspicious Person"
    } else {
        "Person"
    }
}

/// Convert detector output to normalized `face` detections
pub fn faces_to_detections<R: Rng>(
    frame: &FaceFrame,
    camera_id: &CameraId,
    now: Timestamp,
    rng: &mut R,
) -> Vec<Detection> {
    if frame.width <= 0.0 || frame.height <= 0.0 {
        return Vec::new();
    }

    frame
        .faces
        .iter()
        .map(|face| {
            let confidence = face.probability.clamp(0.0, 1.0);
            let is_anomaly = confidence > ANOMALY_CONFIDENCE && rng.gen_bool(0.3);
            let landmarks = face
                .landmarks
                .iter()
                .map(|[x, y]| [x / frame.width * 100.0, y / frame.height * 100.0])
                .collect();

            Detection {
                id: DetectionId::new(),
                camera_id: camera_id.clone(),
                kind: DetectionKind::Face,
                label: face_label(is_anomaly).to_string(),
                confidence,
                bounding_box: BoundingBox::new(
                    face.top_left[0] / frame.width,
                    face.top_left[1] / frame.height,
                    (face.bottom_right[0] - face.top_left[0]) / frame.width,
                    (face.bottom_right[1] - face.top_left[1]) / frame.height,
                ),
                is_anomaly,
                timestamp: now,
                landmarks: Some(landmarks),
            }
        })
        .collect()
}

/// Whether a faceless frame should still yield a simulated face
pub fn should_simulate_face<R: Rng>(sensitivity: u8, rng: &mut R) -> bool {
    rng.gen::<f64>() < f64::from(sensitivity.min(100)) / 200.0
}

/// Synthetic face detection with five random landmarks
pub fn simulated_face<R: Rng>(camera_id: &CameraId, now: Timestamp, rng: &mut R) -> Detection {
    // Label and anomaly flag are rolled independently.
    let label = face_label(rng.gen_bool(0.2));
    let confidence = rng.gen_range(0.7..1.0);
    let bounding_box = BoundingBox::new(
        rng.gen_range(0.0..0.7),
        rng.gen_range(0.0..0.7),
        rng.gen_range(0.1..0.3),
        rng.gen_range(0.2..0.5),
    );
    let is_anomaly = rng.gen_bool(0.2);
    let landmarks = (0..5)
        .map(|_| [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)])
        .collect();

    Detection {
        id: DetectionId::new(),
        camera_id: camera_id.clone(),
        kind: DetectionKind::Face,
        label: label.to_string(),
        confidence,
        bounding_box,
        is_anomaly,
        timestamp: now,
        landmarks: Some(landmarks),
    }
}
