//! Server configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use sentinel_engine::{EngineConfig, StorageConfig, VideoEntry};

use crate::settings::{DetectionTypeSettings, NotificationSettings, ServerSettings};

/// Environment variable prefix, e.g. `SENTINEL_HTTP__BIND_ADDR`
pub const ENV_PREFIX: &str = "SENTINEL";

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SentinelConfig {
    /// HTTP server configuration
    pub http: HttpConfig,

    /// Generator timing and AI defaults
    pub engine: EngineConfig,

    /// Where camera videos come from
    pub video: VideoConfig,

    /// Initial notification preferences
    pub notifications: NotificationSettings,

    /// Initial external server endpoints
    pub servers: ServerSettings,

    /// Initial detection type toggles
    pub detection_types: DetectionTypeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: SocketAddr,

    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_grace_secs: u64,

    /// Reload cameras from the video source at startup
    pub refresh_on_start: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            shutdown_grace_secs: 5,
            refresh_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VideoConfig {
    /// Videos tried first
    pub catalog: Vec<VideoEntry>,

    /// Storage bucket enumerated when the catalog is empty
    pub storage: Option<StorageConfig>,
}

impl SentinelConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Severity;

    #[test]
    fn test_default_config() {
        let config = SentinelConfig::default();
        assert_eq!(config.http.bind_addr.port(), 8080);
        assert_eq!(config.engine.ai.sensitivity, 75);
        assert!(config.video.catalog.is_empty());
        assert_eq!(config.notifications.alert_threshold, Severity::Medium);
        assert_eq!(config.servers.ai_server_url, "http://localhost:5000");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let source = r#"
            [http]
            bind_addr = "127.0.0.1:9000"

            [engine]
            generation_delay_ms = 1000

            [[video.catalog]]
            name = "Hall Crowd"
            url = "http://localhost:8000/hall_crowd.mp4"
        "#;
        let config: SentinelConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.http.bind_addr.port(), 9000);
        assert_eq!(config.engine.generation_delay_ms, 1000);
        assert_eq!(config.engine.alert_delay_ms, 45_000);
        assert_eq!(config.video.catalog.len(), 1);
        assert!(config.video.storage.is_none());
    }

    #[test]
    fn test_from_file_applies_settings_sections() {
        let source = r#"
            [engine.ai]
            processing_enabled = false
            sensitivity = 10
            detection_threshold = 33

            [[video.catalog]]
            name = "Lobby.mp4"
            url = "http://localhost:8000/lobby.mp4"
            thumbnail_url = "http://localhost:8000/lobby.jpg"

            [notifications]
            email_enabled = false
            push_enabled = true
            email_address = "ops@example.com"
            alert_threshold = "high"

            [servers]
            nx_server_url = "http://localhost:7001"
            ai_server_url = "http://localhost:5001"
            api_key = "local-key"

            [detection_types]
            crowd_density = false
            face_recognition = true
        "#;
        let file_name = format!("sentinel-config-{}.toml", std::process::id());
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(&path, source).unwrap();
        let loaded = SentinelConfig::from_file(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        let config = loaded.unwrap();

        let ai = config.engine.ai;
        assert!(!ai.processing_enabled);
        assert_eq!(ai.sensitivity, 10);
        assert_eq!(ai.detection_threshold, 33);

        assert_eq!(
            config.video.catalog[0].thumbnail_url.as_deref(),
            Some("http://localhost:8000/lobby.jpg")
        );

        let notifications = &config.notifications;
        assert!(!notifications.email_enabled);
        assert!(notifications.push_enabled);
        assert_eq!(notifications.email_address, "ops@example.com");
        assert_eq!(notifications.alert_threshold, Severity::High);

        assert_eq!(config.servers.nx_server_url, "http://localhost:7001");
        assert_eq!(config.servers.ai_server_url, "http://localhost:5001");
        assert_eq!(config.servers.api_key.as_deref(), Some("local-key"));

        assert!(!config.detection_types.crowd_density);
        assert!(config.detection_types.face_recognition);
        assert!(config.detection_types.people);
    }

    #[test]
    fn test_settings_wire_form_stays_camel_case() {
        let json = serde_json::to_value(SentinelConfig::default().engine.ai).unwrap();
        assert!(json.get("processingEnabled").is_some());
        assert!(json.get("detectionThreshold").is_some());

        let ai: sentinel_engine::AiSettings =
            serde_json::from_str(r#"{"processingEnabled":false,"detectionThreshold":20}"#).unwrap();
        assert!(!ai.processing_enabled);
        assert_eq!(ai.detection_threshold, 20);
    }
}
