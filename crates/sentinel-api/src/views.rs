//! Read-only projections of the engine state served to the dashboard.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use sentinel_core::{
    Alert, AlertKind, Camera, CameraStatus, DemographicData, Detection, DetectionKind, Error,
    Result, Severity, Timestamp,
};
use sentinel_engine::{AiSettings, MonitoringEngine};

/// Alerts listed on the dashboard
pub const RECENT_ALERT_COUNT: usize = 5;

/// Days covered by the alert timeline and the default report range
pub const REPORT_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialCounts {
    pub smoke: usize,
    pub fire: usize,
    pub crowd_dispersal: usize,
}

impl SpecialCounts {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let count = |kind: DetectionKind| detections.iter().filter(|d| d.kind == kind).count();
        Self {
            smoke: count(DetectionKind::Smoke),
            fire: count(DetectionKind::Fire),
            crowd_dispersal: count(DetectionKind::CrowdDispersal),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub camera_count: usize,
    pub online_cameras: usize,
    pub alert_count: usize,
    pub unacknowledged_alerts: usize,
    pub recent_alerts: Vec<Alert>,
    pub special_detections: SpecialCounts,
    pub demographics: DemographicData,
    pub processing_enabled: bool,
    pub loading: bool,
}

impl DashboardSummary {
    pub fn build(engine: &MonitoringEngine) -> Self {
        let registry = engine.registry();
        let cameras = registry.cameras();
        let alerts = engine.alerts();

        Self {
            camera_count: cameras.len(),
            online_cameras: cameras
                .iter()
                .filter(|c| c.status == CameraStatus::Online)
                .count(),
            alert_count: alerts.len(),
            unacknowledged_alerts: alerts.unacknowledged_count(),
            recent_alerts: alerts.recent(RECENT_ALERT_COUNT),
            special_detections: SpecialCounts::from_detections(&engine.detections().snapshot()),
            demographics: engine.demographics().snapshot(),
            processing_enabled: engine.ai_settings().processing_enabled,
            loading: registry.is_loading(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveView {
    pub active_camera: Option<Camera>,
    pub playback_error: Option<String>,
    pub processing_error: Option<String>,
    /// Detections on the active camera at or above the confidence threshold
    pub detections: Vec<Detection>,
    /// Counts over every detection on the active camera, unfiltered
    pub people: usize,
    pub faces: usize,
    pub anomalies: usize,
    /// Smoke, fire and crowd dispersal across every camera
    pub special_detections: Vec<Detection>,
    pub settings: AiSettings,
}

impl LiveView {
    pub fn build(engine: &MonitoringEngine) -> Self {
        let settings = engine.ai_settings();
        let min_confidence = f64::from(settings.detection_threshold) / 100.0;
        let active_camera = engine.registry().active_camera();
        let all = engine.detections().snapshot();

        let on_camera: Vec<&Detection> = match &active_camera {
            Some(camera) => all.iter().filter(|d| d.camera_id == camera.id).collect(),
            None => Vec::new(),
        };
        let people = on_camera.iter().filter(|d| d.kind == DetectionKind::Person).count();
        let faces = on_camera.iter().filter(|d| d.kind == DetectionKind::Face).count();
        let anomalies = on_camera.iter().filter(|d| d.is_anomaly).count();
        let detections: Vec<Detection> = on_camera
            .into_iter()
            .filter(|d| d.confidence >= min_confidence)
            .cloned()
            .collect();

        let (playback_error, processing_error) = match &active_camera {
            Some(camera) => (
                engine.registry().playback_error(&camera.id),
                engine.processing_errors().remove(&camera.id),
            ),
            None => (None, None),
        };

        Self {
            people,
            faces,
            anomalies,
            special_detections: all.into_iter().filter(|d| d.kind.is_special()).collect(),
            active_camera,
            playback_error,
            processing_error,
            detections,
            settings,
        }
    }
}

/// Raw alert filter query: RFC 3339 bounds and comma-separated lists
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub severity: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Alert filter over an inclusive date range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFilter {
    pub start: Timestamp,
    pub end: Timestamp,
    pub severities: Vec<Severity>,
    #[serde(rename = "types")]
    pub kinds: Vec<AlertKind>,
}

fn parse_timestamp(field: &str, value: &str) -> Result<Timestamp> {
    chrono::DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| Timestamp::from_datetime(dt.with_timezone(&chrono::Utc)))
        .map_err(|e| Error::InvalidInput(format!("invalid {field} '{value}': {e}")))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl AlertFilter {
    /// Last seven days, every severity, anomaly/intrusion/crowd
    pub fn default_for(now: Timestamp) -> Self {
        Self {
            start: now.minus(Duration::days(REPORT_DAYS)),
            end: now,
            severities: Severity::ALL.to_vec(),
            kinds: vec![AlertKind::Anomaly, AlertKind::Intrusion, AlertKind::Crowd],
        }
    }

    /// Overlay the query on the defaults; absent fields keep their default
    pub fn from_query(query: &AlertQuery, now: Timestamp) -> Result<Self> {
        let mut filter = Self::default_for(now);

        if let Some(start) = &query.start {
            filter.start = parse_timestamp("start", start)?;
        }
        if let Some(end) = &query.end {
            filter.end = parse_timestamp("end", end)?;
        }
        if filter.start > filter.end {
            return Err(Error::InvalidInput("start is after end".to_string()));
        }
        if let Some(severity) = &query.severity {
            filter.severities = split_list(severity)
                .map(str::parse)
                .collect::<Result<Vec<Severity>>>()?;
        }
        if let Some(kind) = &query.kind {
            filter.kinds = split_list(kind).map(AlertKind::from).collect();
        }

        Ok(filter)
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        alert.timestamp >= self.start
            && alert.timestamp <= self.end
            && self.severities.contains(&alert.severity)
            && self.kinds.contains(&alert.kind)
    }

    pub fn apply(&self, alerts: Vec<Alert>) -> Vec<Alert> {
        alerts.into_iter().filter(|a| self.matches(a)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
    /// Rounded share of the filtered total
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    /// Calendar date (UTC) of the bucket
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertReport {
    pub filter: AlertFilter,
    pub total: usize,
    pub by_type: Vec<TypeCount>,
    /// Oldest day first, ending at the range end
    pub timeline: Vec<TimelinePoint>,
}

/// Counts per alert type, in type order
pub fn counts_by_type(alerts: &[Alert]) -> Vec<TypeCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for alert in alerts {
        *counts.entry(alert.kind.to_string()).or_default() += 1;
    }

    let total = alerts.len();
    counts
        .into_iter()
        .map(|(kind, count)| TypeCount {
            kind,
            count,
            percentage: ((count as f64 / total as f64) * 100.0).round() as u32,
        })
        .collect()
}

/// Daily counts for the seven days ending at `end`.
///
/// An alert lands in bucket `floor((end - ts) / 1 day)`; alerts after `end`
/// or seven or more days before it are not counted.
pub fn daily_timeline(alerts: &[Alert], end: Timestamp) -> Vec<TimelinePoint> {
    let day_ms = Duration::days(1).num_milliseconds();
    let mut counts = [0usize; REPORT_DAYS as usize];

    for alert in alerts {
        let diff = alert.timestamp.millis_until(end);
        if diff < 0 {
            continue;
        }
        let days_ago = diff / day_ms;
        if days_ago < REPORT_DAYS {
            counts[(REPORT_DAYS - 1 - days_ago) as usize] += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, count)| TimelinePoint {
            date: end
                .minus(Duration::days(REPORT_DAYS - 1 - i as i64))
                .to_datetime()
                .format("%Y-%m-%d")
                .to_string(),
            count: *count,
        })
        .collect()
}

impl AlertReport {
    pub fn build(alerts: Vec<Alert>, filter: AlertFilter) -> Self {
        let filtered = filter.apply(alerts);
        Self {
            total: filtered.len(),
            by_type: counts_by_type(&filtered),
            timeline: daily_timeline(&filtered, filter.end),
            filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::{AlertId, BoundingBox, CameraId, DetectionId};
    use sentinel_engine::seed_alerts;

    fn alert(kind: AlertKind, severity: Severity, at: Timestamp) -> Alert {
        Alert {
            id: AlertId::new(),
            title: "Test".to_string(),
            description: String::new(),
            kind,
            severity,
            camera_id: CameraId::from("cam1"),
            camera_name: "Main Entrance".to_string(),
            timestamp: at,
            acknowledged: false,
        }
    }

    #[test]
    fn test_default_filter_excludes_system_alerts() {
        let now = Timestamp::now();
        let filtered = AlertFilter::default_for(now).apply(seed_alerts(now));
        assert_eq!(filtered.len(), 4);
        assert!(filtered.iter().all(|a| a.kind != AlertKind::System));
    }

    #[test]
    fn test_filter_range_is_inclusive() {
        let now = Timestamp::now();
        let filter = AlertFilter::default_for(now);
        assert!(filter.matches(&alert(AlertKind::Crowd, Severity::Low, now)));
        assert!(filter.matches(&alert(AlertKind::Crowd, Severity::Low, filter.start)));
        assert!(!filter.matches(&alert(
            AlertKind::Crowd,
            Severity::Low,
            now.plus(Duration::milliseconds(1))
        )));
    }

    #[test]
    fn test_query_parsing() {
        let now = Timestamp::from_millis(1_700_000_000_000);
        let query = AlertQuery {
            start: Some("2023-11-10T00:00:00Z".to_string()),
            end: None,
            severity: Some("high, MEDIUM".to_string()),
            kind: Some("system,access".to_string()),
        };
        let filter = AlertFilter::from_query(&query, now).unwrap();
        assert_eq!(filter.severities, vec![Severity::High, Severity::Medium]);
        assert_eq!(
            filter.kinds,
            vec![AlertKind::System, AlertKind::Other("access".to_string())]
        );
        assert_eq!(filter.end, now);

        let bad = AlertQuery {
            severity: Some("urgent".to_string()),
            ..Default::default()
        };
        assert!(AlertFilter::from_query(&bad, now).is_err());

        let inverted = AlertQuery {
            start: Some("2030-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        assert!(AlertFilter::from_query(&inverted, now).is_err());
    }

    #[test]
    fn test_timeline_buckets() {
        let end = Timestamp::from_millis(1_700_000_000_000);
        let alerts = vec![
            alert(AlertKind::Anomaly, Severity::High, end),
            alert(AlertKind::Anomaly, Severity::High, end.minus(Duration::hours(23))),
            alert(AlertKind::Crowd, Severity::Low, end.minus(Duration::hours(25))),
            alert(AlertKind::Crowd, Severity::Low, end.minus(Duration::days(6))),
            alert(AlertKind::Crowd, Severity::Low, end.minus(Duration::days(7))),
            alert(AlertKind::Crowd, Severity::Low, end.plus(Duration::hours(1))),
        ];
        let timeline = daily_timeline(&alerts, end);
        let counts: Vec<usize> = timeline.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 1, 2]);
        assert_eq!(timeline[6].date, "2023-11-14");
        assert_eq!(timeline[0].date, "2023-11-08");
    }

    #[test]
    fn test_report_counts_by_type() {
        let now = Timestamp::now();
        let alerts = vec![
            alert(AlertKind::Anomaly, Severity::High, now),
            alert(AlertKind::Anomaly, Severity::Low, now),
            alert(AlertKind::Crowd, Severity::Medium, now),
            alert(AlertKind::System, Severity::Medium, now),
        ];
        let report = AlertReport::build(alerts, AlertFilter::default_for(now));
        assert_eq!(report.total, 3);
        assert_eq!(
            report.by_type,
            vec![
                TypeCount {
                    kind: "anomaly".to_string(),
                    count: 2,
                    percentage: 67
                },
                TypeCount {
                    kind: "crowd".to_string(),
                    count: 1,
                    percentage: 33
                },
            ]
        );
        assert_eq!(report.timeline.iter().map(|p| p.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_special_counts() {
        let now = Timestamp::now();
        let detection = |kind: DetectionKind| Detection {
            id: DetectionId::new(),
            camera_id: CameraId::from("supabase-cam-2"),
            kind,
            label: String::new(),
            confidence: 0.9,
            bounding_box: BoundingBox::default(),
            is_anomaly: true,
            timestamp: now,
            landmarks: None,
        };
        let counts = SpecialCounts::from_detections(&[
            detection(DetectionKind::Smoke),
            detection(DetectionKind::Smoke),
            detection(DetectionKind::CrowdDispersal),
            detection(DetectionKind::Person),
        ]);
        assert_eq!(
            counts,
            SpecialCounts {
                smoke: 2,
                fire: 0,
                crowd_dispersal: 1
            }
        );
    }
}
