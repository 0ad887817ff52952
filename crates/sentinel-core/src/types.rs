//! Fundamental types for the Sentinel system.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Id prefix of cameras synthesized from the video source
pub const VIDEO_CAMERA_PREFIX: &str = "supabase-cam";

/// Name marker of the crowd-only camera excluded from AI processing
pub const CROWD_ONLY_MARKER: &str = "hall crowd";

/// Location assigned to cameras built from recorded footage
pub const FOOTAGE_LOCATION: &str = "Security Footage";

/// Thumbnail used when the video source provides none
pub const DEFAULT_THUMBNAIL_URL: &str = "https://images.unsplash.com/photo-1577962917302-cd874c4e31d2?auto=format&fit=crop&w=300&q=80";

/// Camera identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(pub String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the `index`-th (zero based) camera built from the video source
    pub fn for_video(index: usize) -> Self {
        Self(format!("{}-{}", VIDEO_CAMERA_PREFIX, index + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_video_backed(&self) -> bool {
        self.0.starts_with(VIDEO_CAMERA_PREFIX)
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Detection identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionId(pub String);

impl DetectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for DetectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DetectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Alert identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub String);

impl AlertId {
    pub fn new() -> Self {
        Self(format!("alert-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlertId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// UTC wall-clock timestamp, serialized as an RFC 3339 string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds elapsed from `self` until `now` (negative if `self` is later)
    pub fn millis_until(&self, now: Timestamp) -> i64 {
        now.as_millis() - self.as_millis()
    }

    pub fn minus(&self, duration: Duration) -> Self {
        Self(self.0 - duration)
    }

    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    Online,
    Offline,
}

/// A camera feed known to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: CameraId,
    pub name: String,
    pub location: String,
    pub stream_url: String,
    pub thumbnail_url: String,
    pub status: CameraStatus,
}

impl Camera {
    /// Whether the name marks this as the crowd-only camera (case-insensitive)
    pub fn is_crowd_only(&self) -> bool {
        self.name.to_lowercase().contains(CROWD_ONLY_MARKER)
    }

    pub fn is_video_backed(&self) -> bool {
        self.id.is_video_backed()
    }

    /// Eligible for simulated AI processing
    pub fn is_eligible(&self) -> bool {
        self.is_video_backed() && !self.is_crowd_only()
    }
}

/// Normalized (0-1) bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Kind of detection; unknown kinds are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DetectionKind {
    Person,
    Face,
    Smoke,
    Fire,
    CrowdDispersal,
    Vehicle,
    Object,
    Other(String),
}

impl DetectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            DetectionKind::Person => "person",
            DetectionKind::Face => "face",
            DetectionKind::Smoke => "smoke",
            DetectionKind::Fire => "fire",
            DetectionKind::CrowdDispersal => "crowd_dispersal",
            DetectionKind::Vehicle => "vehicle",
            DetectionKind::Object => "object",
            DetectionKind::Other(s) => s,
        }
    }

    /// Smoke, fire and crowd dispersal get dedicated dashboard counters
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            DetectionKind::Smoke | DetectionKind::Fire | DetectionKind::CrowdDispersal
        )
    }
}

impl From<String> for DetectionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "person" => DetectionKind::Person,
            "face" => DetectionKind::Face,
            "smoke" => DetectionKind::Smoke,
            "fire" => DetectionKind::Fire,
            "crowd_dispersal" => DetectionKind::CrowdDispersal,
            "vehicle" => DetectionKind::Vehicle,
            "object" => DetectionKind::Object,
            _ => DetectionKind::Other(s),
        }
    }
}

impl From<DetectionKind> for String {
    fn from(kind: DetectionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single simulated or model-produced observation on one camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub id: DetectionId,
    pub camera_id: CameraId,
    #[serde(rename = "type")]
    pub kind: DetectionKind,
    pub label: String,
    /// Confidence [0, 1]
    pub confidence: f64,
    pub bounding_box: BoundingBox,
    pub is_anomaly: bool,
    pub timestamp: Timestamp,
    /// Landmark points on a 0-100 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<[f64; 2]>>,
}

impl Detection {
    pub fn age_millis(&self, now: Timestamp) -> i64 {
        self.timestamp.millis_until(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(Error::InvalidInput(format!("unknown severity '{other}'"))),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of alert; unknown kinds are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertKind {
    Anomaly,
    Intrusion,
    Crowd,
    System,
    Other(String),
}

impl AlertKind {
    pub fn as_str(&self) -> &str {
        match self {
            AlertKind::Anomaly => "anomaly",
            AlertKind::Intrusion => "intrusion",
            AlertKind::Crowd => "crowd",
            AlertKind::System => "system",
            AlertKind::Other(s) => s,
        }
    }
}

impl From<String> for AlertKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "anomaly" => AlertKind::Anomaly,
            "intrusion" => AlertKind::Intrusion,
            "crowd" => AlertKind::Crowd,
            "system" => AlertKind::System,
            _ => AlertKind::Other(s),
        }
    }
}

impl From<&str> for AlertKind {
    fn from(s: &str) -> Self {
        Self::from(s.trim().to_lowercase())
    }
}

impl From<AlertKind> for String {
    fn from(kind: AlertKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing security event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    /// Empty for system-wide alerts
    pub camera_id: CameraId,
    pub camera_name: String,
    pub timestamp: Timestamp,
    pub acknowledged: bool,
}
