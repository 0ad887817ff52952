//! # Sentinel-Engine
//!
//! State containers and simulated AI backend for the Sentinel dashboard.
//!
//! ## Components
//!
//! 1. **Camera Registry**: camera list and active selection, refreshed from a video source
//! 2. **Detection Generator**: periodic synthetic detections for eligible cameras
//! 3. **Alert Generator**: periodic synthetic alerts plus alerts mapped from anomalies
//! 4. **Demographic Estimator**: bounded random walk driven by face detections
//! 5. **Crowd Analytics**: synthesized hourly density and heatmap points
//!
//! ## Data Flow
//!
//! ```text
//! VideoSource → CameraRegistry
//!                   ↓ (eligible cameras, re-read every tick)
//!           [DetectionGenerator] ← DetectionSource (simulated | model-backed)
//!              ↓             ↓ (face detections, 30% gate)
//!     DetectionStore   DemographicEstimator
//!              ↓ (anomalies)
//!          AlertStore ← [AlertGenerator]
//! ```

pub mod alerts;
pub mod analytics;
pub mod config;
pub mod demographics;
pub mod detection_source;
pub mod engine;
pub mod face;
pub mod generator;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod video_source;

pub use alerts::*;
pub use analytics::*;
pub use config::*;
pub use demographics::*;
pub use detection_source::*;
pub use engine::*;
pub use face::*;
pub use generator::*;
pub use registry::*;
pub use scheduler::*;
pub use store::*;
pub use video_source::*;
