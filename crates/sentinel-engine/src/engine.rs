//! Monitoring engine: owns the containers and drives the generator timers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;

use sentinel_core::{CameraId, Result, Timestamp};

use crate::alerts::{AlertGenerator, AlertStore};
use crate::analytics::{self, HeatPoint, HourlyDensity};
use crate::config::{AiSettings, EngineConfig};
use crate::demographics::DemographicEstimator;
use crate::detection_source::{
    DetectionSource, DetectionSourceKind, ModelBackedSource, SimulatedSource,
};
use crate::face::BlankFaceDetector;
use crate::generator::DetectionGenerator;
use crate::registry::CameraRegistry;
use crate::scheduler::{Schedule, Timer};
use crate::store::DetectionStore;
use crate::video_source::VideoSource;

#[derive(Default)]
struct EngineTimers {
    running: bool,
    cleanup: Option<Timer>,
    alerts: Option<Timer>,
    detections: Option<Timer>,
}

/// Source of "now" for generated records and eviction
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Seeded generators get distinct streams derived from one seed
fn rng_stream(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

pub struct MonitoringEngine {
    config: EngineConfig,
    registry: Arc<CameraRegistry>,
    detections: Arc<DetectionStore>,
    alerts: Arc<AlertStore>,
    demographics: Arc<DemographicEstimator>,
    settings: Arc<RwLock<AiSettings>>,
    generator: Arc<Mutex<DetectionGenerator>>,
    alert_generator: Arc<Mutex<AlertGenerator>>,
    analytics_rng: Mutex<StdRng>,
    video_source: Arc<dyn VideoSource>,
    clock: Clock,
    timers: Mutex<EngineTimers>,
}

impl MonitoringEngine {
    /// Engine with an empty registry and the configured detection source
    pub fn new(config: EngineConfig, video_source: Arc<dyn VideoSource>) -> Self {
        let rng = rng_stream(config.seed, 1);
        let source: Box<dyn DetectionSource> = match config.detection_source {
            DetectionSourceKind::Simulated => Box::new(SimulatedSource::new(rng)),
            DetectionSourceKind::FaceModel => {
                Box::new(ModelBackedSource::new(Arc::new(BlankFaceDetector), rng))
            }
        };
        let registry = Arc::new(
            CameraRegistry::new().with_placeholder_thumbnail(config.placeholder_thumbnail.clone()),
        );
        Self::with_parts(config, registry, video_source, source)
    }

    pub fn with_parts(
        config: EngineConfig,
        registry: Arc<CameraRegistry>,
        video_source: Arc<dyn VideoSource>,
        source: Box<dyn DetectionSource>,
    ) -> Self {
        let detections = Arc::new(DetectionStore::new(
            config.detection_capacity,
            config.detection_retention_ms,
        ));
        let alerts = Arc::new(AlertStore::new());
        let demographics = Arc::new(DemographicEstimator::new());
        let settings = Arc::new(RwLock::new(config.ai.normalized()));

        let generator = DetectionGenerator::new(
            source,
            registry.clone(),
            detections.clone(),
            alerts.clone(),
            demographics.clone(),
            settings.clone(),
            rng_stream(config.seed, 2),
        );
        let alert_generator = AlertGenerator::new(rng_stream(config.seed, 3));
        let analytics_rng = rng_stream(config.seed, 4);

        Self {
            config,
            registry,
            detections,
            alerts,
            demographics,
            settings,
            generator: Arc::new(Mutex::new(generator)),
            alert_generator: Arc::new(Mutex::new(alert_generator)),
            analytics_rng: Mutex::new(analytics_rng),
            video_source,
            clock: Arc::new(Timestamp::now),
            timers: Mutex::new(EngineTimers::default()),
        }
    }

    /// Replace the wall clock used by the timers
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CameraRegistry> {
        &self.registry
    }

    pub fn detections(&self) -> &Arc<DetectionStore> {
        &self.detections
    }

    pub fn alerts(&self) -> &Arc<AlertStore> {
        &self.alerts
    }

    pub fn demographics(&self) -> &Arc<DemographicEstimator> {
        &self.demographics
    }

    pub fn ai_settings(&self) -> AiSettings {
        *self.settings.read()
    }

    /// Start the cleanup and alert timers, plus detection generation when
    /// processing is enabled. Must be called inside a tokio runtime.
    pub fn start(&self) {
        let mut timers = self.timers.lock();
        if timers.running {
            return;
        }
        timers.running = true;

        let store = self.detections.clone();
        let clock = self.clock.clone();
        timers.cleanup = Some(Timer::start(
            "detection-cleanup",
            Schedule::Period(self.config.cleanup_period()),
            false,
            move || {
                let evicted = store.evict_expired(clock());
                if evicted > 0 {
                    tracing::debug!(evicted, "expired detections evicted");
                }
            },
        ));

        self.alerts.seed((self.clock)());
        let alerts = self.alerts.clone();
        let alert_generator = self.alert_generator.clone();
        let clock = self.clock.clone();
        timers.alerts = Some(Timer::start(
            "alert-generator",
            Schedule::Delay(self.config.alert_delay()),
            false,
            move || {
                let alert = alert_generator.lock().tick(clock());
                if let Some(alert) = alert {
                    alerts.add_alert(alert);
                }
            },
        ));

        if self.settings.read().processing_enabled {
            self.start_detections(&mut timers);
        }

        tracing::info!(
            source = self.generator.lock().source_name(),
            processing = timers.detections.is_some(),
            "monitoring engine started"
        );
    }

    fn start_detections(&self, timers: &mut EngineTimers) {
        if timers.detections.is_some() {
            return;
        }
        let generator = self.generator.clone();
        let pacing = self.generator.clone();
        let default_delay = self.config.generation_delay();
        let clock = self.clock.clone();
        timers.detections = Some(Timer::start_paced(
            "detection-generator",
            true,
            move || pacing.lock().next_delay(default_delay),
            move || {
                generator.lock().run_batch(clock());
            },
        ));
        tracing::info!("AI processing enabled");
    }

    fn stop_detections(timers: &mut EngineTimers) {
        if let Some(timer) = timers.detections.take() {
            timer.cancel();
            tracing::info!("AI processing disabled");
        }
    }

    /// Whether detection batches are currently being scheduled
    pub fn is_processing(&self) -> bool {
        self.timers
            .lock()
            .detections
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    pub fn is_running(&self) -> bool {
        self.timers.lock().running
    }

    /// Toggle detection generation. Disabling cancels the pending batch and
    /// keeps detections already stored.
    pub fn set_processing_enabled(&self, enabled: bool) {
        self.settings.write().processing_enabled = enabled;

        let mut timers = self.timers.lock();
        if !timers.running {
            return;
        }
        if enabled {
            self.start_detections(&mut timers);
        } else {
            Self::stop_detections(&mut timers);
        }
    }

    /// Replace the AI settings, clamping sliders to [0, 100]
    pub fn set_ai_settings(&self, settings: AiSettings) -> AiSettings {
        let settings = settings.normalized();
        self.set_sensitivity(settings.sensitivity);
        self.set_detection_threshold(settings.detection_threshold);
        self.set_processing_enabled(settings.processing_enabled);
        self.ai_settings()
    }

    /// Picked up by the next batch
    pub fn set_sensitivity(&self, sensitivity: u8) {
        self.settings.write().sensitivity = sensitivity.min(100);
    }

    pub fn set_detection_threshold(&self, threshold: u8) {
        self.settings.write().detection_threshold = threshold.min(100);
    }

    /// Reload cameras from the video source
    pub async fn refresh_cameras(&self) -> Result<usize> {
        self.registry.refresh(self.video_source.as_ref()).await
    }

    /// Per-camera face processing errors
    pub fn processing_errors(&self) -> HashMap<CameraId, String> {
        self.generator.lock().source_errors()
    }

    /// Clear playback and processing errors so the camera is retried
    pub fn retry_camera(&self, id: &CameraId) -> bool {
        let had_playback_error = self.registry.clear_playback_error(id);
        let mut generator = self.generator.lock();
        let had_processing_error = generator.source_errors().contains_key(id);
        generator.reset_camera(id);
        had_playback_error || had_processing_error
    }

    /// Hourly crowd counts for the density chart
    pub fn crowd_density(&self) -> Vec<HourlyDensity> {
        analytics::crowd_density_series(&mut *self.analytics_rng.lock())
    }

    /// Hotspots and scattered points for the crowd heatmap
    pub fn heatmap(&self) -> Vec<HeatPoint> {
        analytics::heatmap(&mut *self.analytics_rng.lock())
    }

    /// Cancel every timer and wait for the tasks to exit
    pub async fn shutdown(&self) {
        let stopped: Vec<Timer> = {
            let mut timers = self.timers.lock();
            timers.running = false;
            [
                timers.detections.take(),
                timers.alerts.take(),
                timers.cleanup.take(),
            ]
            .into_iter()
            .flatten()
            .collect()
        };

        for timer in stopped {
            let name = timer.name();
            timer.stop().await;
            tracing::debug!(timer = name, "timer stopped");
        }
        tracing::info!("monitoring engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video_source::{CatalogSource, VideoEntry};
    use sentinel_core::{Camera, CameraStatus, Detection, DEFAULT_THUMBNAIL_URL};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

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

    fn engine(processing_enabled: bool) -> MonitoringEngine {
        let config = EngineConfig {
            seed: Some(7),
            ai: AiSettings {
                processing_enabled,
                ..Default::default()
            },
            ..Default::default()
        };
        let registry = Arc::new(CameraRegistry::with_cameras(vec![
            camera("supabase-cam-1", "Hall Crowd"),
            camera("supabase-cam-2", "Entrance Video 1"),
        ]));
        MonitoringEngine::with_parts(
            config,
            registry,
            Arc::new(CatalogSource::default()),
            Box::new(SimulatedSource::new(StdRng::seed_from_u64(7))),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabled_runs_batch_immediately_then_every_delay() {
        let engine = engine(true);
        engine.start();
        sleep(Duration::from_millis(1)).await;

        let first = engine.detections().len();
        assert!((1..=3).contains(&first));
        assert!(engine.is_processing());

        sleep(Duration::from_millis(5_000)).await;
        assert!(engine.detections().len() > first);
        assert!(engine
            .detections()
            .snapshot()
            .iter()
            .all(|d| d.camera_id.as_str() == "supabase-cam-2"));

        engine.shutdown().await;
    }

    /// Wall-clock timestamps that advance with the paused tokio clock
    fn tokio_clock() -> Clock {
        let base = Timestamp::now();
        let start = Instant::now();
        Arc::new(move || {
            let elapsed = start.elapsed().as_millis() as i64;
            base.plus(chrono::Duration::milliseconds(elapsed))
        })
    }

    /// Counts detect calls and paces itself like a face model
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl DetectionSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn detect(&mut self, _: &Camera, _sensitivity: u8, _now: Timestamp) -> Vec<Detection> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }

        fn batch_interval(&self, settings: &AiSettings) -> Option<Duration> {
            Some(settings.face_interval())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_evicts_after_processing_stops() {
        let engine = engine(true).with_clock(tokio_clock());
        engine.start();
        sleep(Duration::from_millis(1)).await;
        assert!(!engine.detections().is_empty());

        engine.set_processing_enabled(false);
        sleep(Duration::from_secs(9)).await;
        assert!(!engine.detections().is_empty());

        sleep(Duration::from_secs(6)).await;
        assert!(engine.detections().is_empty());

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_source_follows_sensitivity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = EngineConfig {
            ai: AiSettings {
                processing_enabled: true,
                sensitivity: 100,
                detection_threshold: 60,
            },
            ..Default::default()
        };
        let registry = Arc::new(CameraRegistry::with_cameras(vec![camera(
            "supabase-cam-2",
            "Entrance Video 1",
        )]));
        let engine = MonitoringEngine::with_parts(
            config,
            registry,
            Arc::new(CatalogSource::default()),
            Box::new(CountingSource {
                calls: calls.clone(),
            }),
        );
        engine.start();

        // 300 ms at full sensitivity: batches at 0, 300, ..., 3000
        sleep(Duration::from_millis(3_001)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 11);

        // 1000 ms from the wait after the pending one
        engine.set_sensitivity(0);
        sleep(Duration::from_millis(2_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 13);

        engine.shutdown().await;
    }

    #[test]
    fn test_analytics_are_seeded() {
        let a = engine(true);
        let b = engine(true);
        assert_eq!(a.crowd_density(), b.crowd_density());
        assert_eq!(a.heatmap(), b.heatmap());
        assert_eq!(a.crowd_density().len(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_stops_further_batches() {
        let engine = engine(true);
        engine.start();
        sleep(Duration::from_millis(1)).await;

        engine.set_processing_enabled(false);
        let count = engine.detections().len();
        sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.detections().len(), count);
        assert!(!engine.is_processing());

        engine.set_processing_enabled(true);
        sleep(Duration::from_millis(1)).await;
        assert!(engine.detections().len() > count);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_start_seeds_alerts_only() {
        let engine = engine(false);
        engine.start();
        sleep(Duration::from_secs(10)).await;

        assert!(engine.detections().is_empty());
        assert!(!engine.is_processing());
        assert_eq!(engine.alerts().len(), 6);

        sleep(Duration::from_secs(45 * 20)).await;
        assert!(engine.alerts().len() > 6);
        assert!(engine
            .alerts()
            .snapshot()
            .iter()
            .all(|a| !a.camera_name.to_lowercase().contains("hall crowd")));

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_before_start_do_not_spawn() {
        let engine = engine(false);
        engine.set_processing_enabled(true);
        assert!(!engine.is_processing());
        assert!(engine.ai_settings().processing_enabled);

        engine.start();
        sleep(Duration::from_millis(1)).await;
        assert!(engine.is_processing());
        engine.shutdown().await;
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_ai_settings_normalizes_and_toggles() {
        let engine = engine(true);
        engine.start();

        let applied = engine.set_ai_settings(AiSettings {
            processing_enabled: false,
            sensitivity: 180,
            detection_threshold: 40,
        });
        assert_eq!(applied.sensitivity, 100);
        assert_eq!(applied.detection_threshold, 40);
        assert!(!engine.is_processing());

        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_refresh_cameras_from_source() {
        let config = EngineConfig::default();
        let source = CatalogSource::new(vec![
            VideoEntry::new("hall_crowd.mp4", "https://cdn.test/1.mp4"),
            VideoEntry::new("Entrance.mp4", "https://cdn.test/2.mp4"),
        ]);
        let engine = MonitoringEngine::new(config, Arc::new(source));

        assert_eq!(engine.refresh_cameras().await.unwrap(), 2);
        assert_eq!(engine.registry().eligible_cameras().len(), 1);
        assert_eq!(
            engine.registry().active_camera_id(),
            Some(CameraId::from("supabase-cam-1"))
        );
    }
}
