//! Alert store and the simulated alert generator.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Duration;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use sentinel_core::{
    Alert, AlertId, AlertKind, CameraId, Detection, DetectionKind, Severity, Timestamp,
};

/// Unbounded, most-recent-first alert collection
#[derive(Debug, Default)]
pub struct AlertStore {
    alerts: RwLock<Vec<Alert>>,
    seeded: AtomicBool,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend unconditionally; no de-duplication or validation
    pub fn add_alert(&self, alert: Alert) {
        tracing::info!(
            alert_id = %alert.id,
            kind = %alert.kind,
            severity = %alert.severity,
            camera_id = %alert.camera_id,
            "{}",
            alert.title
        );
        self.alerts.write().insert(0, alert);
    }

    /// Remove every alert with `id`
    pub fn remove_alert(&self, id: &AlertId) -> bool {
        let mut alerts = self.alerts.write();
        let before = alerts.len();
        alerts.retain(|a| &a.id != id);
        alerts.len() != before
    }

    /// Mark matching alerts acknowledged; idempotent
    pub fn acknowledge_alert(&self, id: &AlertId) -> bool {
        let mut found = false;
        for alert in self.alerts.write().iter_mut().filter(|a| &a.id == id) {
            alert.acknowledged = true;
            found = true;
        }
        found
    }

    pub fn get(&self, id: &AlertId) -> Option<Alert> {
        self.alerts.read().iter().find(|a| &a.id == id).cloned()
    }

    /// Snapshot, newest first
    pub fn snapshot(&self) -> Vec<Alert> {
        self.alerts.read().clone()
    }

    pub fn recent(&self, n: usize) -> Vec<Alert> {
        self.alerts.read().iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.alerts.read().iter().filter(|a| !a.acknowledged).count()
    }

    /// Populate the illustrative history once; later calls are no-ops
    pub fn seed(&self, now: Timestamp) -> bool {
        if self.seeded.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.alerts.write().extend(seed_alerts(now));
        true
    }
}

fn seed_alert(
    id: &str,
    title: &str,
    description: &str,
    kind: AlertKind,
    severity: Severity,
    camera: (&str, &str),
    at: Timestamp,
    acknowledged: bool,
) -> Alert {
    Alert {
        id: AlertId::from(id),
        title: title.to_string(),
        description: description.to_string(),
        kind,
        severity,
        camera_id: CameraId::from(camera.0),
        camera_name: camera.1.to_string(),
        timestamp: at,
        acknowledged,
    }
}

/// Illustrative historical alerts at fixed offsets before `now`, newest first
pub fn seed_alerts(now: Timestamp) -> Vec<Alert> {
    vec![
        seed_alert(
            "alert1",
            "Unusual Crowd Movement",
            "Sudden crowd dispersal detected at Main Entrance",
            AlertKind::Anomaly,
            Severity::High,
            ("cam1", "Main Entrance"),
            now.minus(Duration::minutes(15)),
            false,
        ),
        seed_alert(
            "alert2",
            "Restricted Area Access",
            "Unauthorized person detected in restricted zone",
            AlertKind::Intrusion,
            Severity::High,
            ("cam3", "Restricted Zone"),
            now.minus(Duration::minutes(45)),
            true,
        ),
        seed_alert(
            "alert3",
            "High Crowd Density",
            "Crowd density exceeding 75% at Ticket Counter",
            AlertKind::Crowd,
            Severity::Medium,
            ("cam5", "Ticket Counter"),
            now.minus(Duration::hours(2)),
            false,
        ),
        seed_alert(
            "alert4",
            "Camera Offline",
            "East Wing camera disconnected",
            AlertKind::System,
            Severity::Medium,
            ("cam4", "East Wing"),
            now.minus(Duration::hours(4)),
            true,
        ),
        seed_alert(
            "alert5",
            "Suspicious Behavior",
            "Person loitering at North Gate for extended period",
            AlertKind::Anomaly,
            Severity::Low,
            ("cam2", "North Gate"),
            now.minus(Duration::hours(5)),
            false,
        ),
        seed_alert(
            "alert6",
            "System Update Required",
            "Security system update available",
            AlertKind::System,
            Severity::Low,
            ("", "System"),
            now.minus(Duration::hours(12)),
            false,
        ),
    ]
}

/// Cameras the alert generator reports on
const ALERT_CAMERAS: [(&str, &str); 4] = [
    ("cam1", "Main Entrance"),
    ("cam2", "North Gate"),
    ("cam3", "Restricted Zone"),
    ("cam5", "Ticket Counter"),
];

const ALERT_KINDS: [AlertKind; 4] = [
    AlertKind::Anomaly,
    AlertKind::Intrusion,
    AlertKind::Crowd,
    AlertKind::System,
];

/// Synthesizes alerts independent of detections
pub struct AlertGenerator {
    rng: StdRng,
    /// Probability that a tick emits an alert
    emit_probability: f64,
}

impl AlertGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            emit_probability: 0.5,
        }
    }

    /// One generator tick: an alert half of the time
    pub fn tick(&mut self, now: Timestamp) -> Option<Alert> {
        if self.rng.gen_bool(self.emit_probability) {
            Some(self.synthesize(now))
        } else {
            None
        }
    }

    /// Build a random alert from the fixed camera/type/severity sets
    pub fn synthesize(&mut self, now: Timestamp) -> Alert {
        let (camera_id, camera_name) = ALERT_CAMERAS[self.rng.gen_range(0..ALERT_CAMERAS.len())];
        let kind = ALERT_KINDS
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or(AlertKind::System);
        let severity = Severity::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Severity::Low);

        let (title, description) = match kind {
            AlertKind::Anomaly => (
                "Unusual Behavior Detected",
                format!("Suspicious activity detected at {camera_name}"),
            ),
            AlertKind::Intrusion => (
                "Possible Intrusion",
                format!("Unauthorized access at {camera_name}"),
            ),
            AlertKind::Crowd => (
                "Crowd Density Alert",
                format!("High crowd density at {camera_name}"),
            ),
            _ => (
                "System Notification",
                "System performance degradation detected".to_string(),
            ),
        };

        Alert {
            id: AlertId::new(),
            title: title.to_string(),
            description,
            kind,
            severity,
            camera_id: CameraId::from(camera_id),
            camera_name: camera_name.to_string(),
            timestamp: now,
            acknowledged: false,
        }
    }
}

/// High-severity anomaly alert raised for an anomalous detection
pub fn alert_for_detection(detection: &Detection, camera_name: Option<&str>) -> Alert {
    let camera_name = camera_name.unwrap_or("Camera");
    let (title, description) = match detection.kind {
        DetectionKind::Smoke => (
            "Smoke Detected",
            format!("Possible smoke detected at {camera_name}"),
        ),
        DetectionKind::Fire => (
            "Fire Detected",
            format!("Possible fire detected at {camera_name}"),
        ),
        DetectionKind::CrowdDispersal => (
            "Crowd Dispersal",
            format!("Sudden crowd dispersal detected at {camera_name}"),
        ),
        DetectionKind::Face => (
            "Suspicious Person Detected",
            format!(
                "Face detection identified a suspicious person in camera {}",
                detection.camera_id
            ),
        ),
        _ => (
            "Suspicious Person Detected",
            format!("{} detected at {camera_name}", detection.label),
        ),
    };

    Alert {
        id: AlertId::new(),
        title: title.to_string(),
        description,
        kind: AlertKind::Anomaly,
        severity: Severity::High,
        camera_id: detection.camera_id.clone(),
        camera_name: camera_name.to_string(),
        timestamp: detection.timestamp,
        acknowledged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use sentinel_core::{BoundingBox, DetectionId};

    #[test]
    fn test_add_prepends_without_dedupe() {
        let store = AlertStore::new();
        let now = Timestamp::now();
        let mut generator = AlertGenerator::new(StdRng::seed_from_u64(1));
        let first = generator.synthesize(now);
        let second = generator.synthesize(now);

        store.add_alert(first.clone());
        store.add_alert(second.clone());
        store.add_alert(first.clone());

        let alerts = store.snapshot();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].id, first.id);
        assert_eq!(alerts[1].id, second.id);
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let store = AlertStore::new();
        store.seed(Timestamp::now());
        let target = AlertId::from("alert1");
        let before = store.snapshot();

        assert!(store.acknowledge_alert(&target));
        assert!(store.acknowledge_alert(&target));

        let after = store.snapshot();
        assert_eq!(after.len(), before.len());
        for (b, a) in before.iter().zip(after.iter()) {
            if a.id == target {
                assert!(a.acknowledged);
            } else {
                assert_eq!(a, b);
            }
        }
        assert!(!store.acknowledge_alert(&AlertId::from("nope")));
    }

    #[test]
    fn test_remove_alert() {
        let store = AlertStore::new();
        store.seed(Timestamp::now());
        assert!(store.remove_alert(&AlertId::from("alert3")));
        assert!(!store.remove_alert(&AlertId::from("alert3")));
        assert_eq!(store.len(), 5);
        assert!(store.get(&AlertId::from("alert3")).is_none());
    }

    #[test]
    fn test_seed_once_newest_first() {
        let store = AlertStore::new();
        let now = Timestamp::now();
        assert!(store.seed(now));
        assert!(!store.seed(now));

        let alerts = store.snapshot();
        assert_eq!(alerts.len(), 6);
        assert!(alerts.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert_eq!(alerts[0].timestamp, now.minus(Duration::minutes(15)));
        assert_eq!(alerts[5].camera_name, "System");
        assert_eq!(store.unacknowledged_count(), 4);
    }

    #[test]
    fn test_generator_emits_about_half_the_time() {
        let mut generator = AlertGenerator::new(StdRng::seed_from_u64(7));
        let now = Timestamp::now();
        let emitted = (0..1000).filter(|_| generator.tick(now).is_some()).count();
        assert!((400..600).contains(&emitted), "emitted {emitted}");
    }

    #[test]
    fn test_synthesized_alert_templates() {
        let mut generator = AlertGenerator::new(StdRng::seed_from_u64(3));
        let now = Timestamp::now();
        for _ in 0..200 {
            let alert = generator.synthesize(now);
            assert!(!alert.acknowledged);
            assert!(ALERT_CAMERAS
                .iter()
                .any(|(id, name)| alert.camera_id.as_str() == *id && alert.camera_name == *name));
            match alert.kind {
                AlertKind::Anomaly => assert_eq!(alert.title, "Unusual Behavior Detected"),
                AlertKind::Intrusion => assert_eq!(alert.title, "Possible Intrusion"),
                AlertKind::Crowd => assert_eq!(alert.title, "Crowd Density Alert"),
                AlertKind::System => assert_eq!(alert.title, "System Notification"),
                AlertKind::Other(_) => panic!("unexpected kind"),
            }
        }
    }

    #[test]
    fn test_alert_for_detection() {
        let detection = Detection {
            id: DetectionId::new(),
            camera_id: CameraId::from("supabase-cam-2"),
            kind: DetectionKind::Fire,
            label: "Fire Detected".to_string(),
            confidence: 0.95,
            bounding_box: BoundingBox::new(0.1, 0.1, 0.2, 0.3),
            is_anomaly: true,
            timestamp: Timestamp::now(),
            landmarks: None,
        };

        let alert = alert_for_detection(&detection, Some("Entrance Video 1"));
        assert_eq!(alert.title, "Fire Detected");
        assert_eq!(alert.kind, AlertKind::Anomaly);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.camera_id, detection.camera_id);
        assert_eq!(alert.camera_name, "Entrance Video 1");

        assert_eq!(alert_for_detection(&detection, None).camera_name, "Camera");
    }
}
