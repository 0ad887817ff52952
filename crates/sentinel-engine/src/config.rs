//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use sentinel_core::DEFAULT_THUMBNAIL_URL;

use crate::detection_source::DetectionSourceKind;

/// Timing, capacity and AI settings for the monitoring engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between detection batches, measured after each batch completes (ms)
    pub generation_delay_ms: u64,

    /// Period of the detection cleanup timer (ms)
    pub cleanup_period_ms: u64,

    /// Age after which a detection is evicted (ms)
    pub detection_retention_ms: u64,

    /// Maximum number of detections kept
    pub detection_capacity: usize,

    /// Delay between alert generator ticks (ms)
    pub alert_delay_ms: u64,

    /// Initial AI settings
    pub ai: AiSettings,

    /// Where detections come from
    pub detection_source: DetectionSourceKind,

    /// Thumbnail for cameras whose video has none
    pub placeholder_thumbnail: String,

    /// Seed for the random generators; entropy when absent
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation_delay_ms: 5_000,
            cleanup_period_ms: 5_000,
            detection_retention_ms: 10_000,
            detection_capacity: 50,
            alert_delay_ms: 45_000,
            ai: AiSettings::default(),
            detection_source: DetectionSourceKind::Simulated,
            placeholder_thumbnail: DEFAULT_THUMBNAIL_URL.to_string(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }

    pub fn cleanup_period(&self) -> Duration {
        Duration::from_millis(self.cleanup_period_ms)
    }

    pub fn alert_delay(&self) -> Duration {
        Duration::from_millis(self.alert_delay_ms)
    }
}

/// User-adjustable AI processing settings.
///
/// camelCase on the HTTP wire; the snake_case aliases match config file keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(alias = "processing_enabled")]
    pub processing_enabled: bool,
    /// Detection volume control [0, 100]
    pub sensitivity: u8,
    /// Minimum confidence (percent) surfaced by views [0, 100]
    #[serde(alias = "detection_threshold")]
    pub detection_threshold: u8,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            processing_enabled: true,
            sensitivity: 75,
            detection_threshold: 60,
        }
    }
}

impl AiSettings {
    /// Clamp both sliders into [0, 100]
    pub fn normalized(mut self) -> Self {
        self.sensitivity = self.sensitivity.min(100);
        self.detection_threshold = self.detection_threshold.min(100);
        self
    }

    /// Face processing interval derived from sensitivity
    pub fn face_interval(&self) -> Duration {
        let ms = 1000i64 - self.sensitivity as i64 * 8;
        Duration::from_millis(ms.max(300) as u64)
    }
}
