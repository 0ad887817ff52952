//! Operator-editable dashboard settings.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use sentinel_core::{Error, Result, Severity};

/// Placeholder returned instead of a stored API key
pub const MASKED_SECRET: &str = "********";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(alias = "email_enabled")]
    pub email_enabled: bool,
    #[serde(alias = "push_enabled")]
    pub push_enabled: bool,
    #[serde(alias = "email_address")]
    pub email_address: String,
    /// Minimum severity that triggers a notification
    #[serde(alias = "alert_threshold")]
    pub alert_threshold: Severity,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            push_enabled: false,
            email_address: "admin@example.com".to_string(),
            alert_threshold: Severity::Medium,
        }
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<()> {
        if self.email_enabled && !self.email_address.contains('@') {
            return Err(Error::InvalidInput(format!(
                "invalid email address '{}'",
                self.email_address
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(alias = "nx_server_url")]
    pub nx_server_url: String,
    #[serde(alias = "ai_server_url")]
    pub ai_server_url: String,
    #[serde(alias = "api_key")]
    pub api_key: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            nx_server_url: "http://nx-server-ip".to_string(),
            ai_server_url: "http://localhost:5000".to_string(),
            api_key: None,
        }
    }
}

impl ServerSettings {
    /// Copy safe to hand out: the API key is replaced by a mask
    pub fn masked(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| MASKED_SECRET.to_string()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionTypeSettings {
    pub people: bool,
    #[serde(alias = "crowd_density")]
    pub crowd_density: bool,
    pub anomaly: bool,
    #[serde(alias = "face_recognition")]
    pub face_recognition: bool,
}

impl Default for DetectionTypeSettings {
    fn default() -> Self {
        Self {
            people: true,
            crowd_density: true,
            anomaly: true,
            face_recognition: false,
        }
    }
}

/// Shared settings state behind short synchronous locks
#[derive(Debug, Default)]
pub struct SettingsStore {
    notifications: RwLock<NotificationSettings>,
    servers: RwLock<ServerSettings>,
    detection_types: RwLock<DetectionTypeSettings>,
}

impl SettingsStore {
    pub fn new(
        notifications: NotificationSettings,
        servers: ServerSettings,
        detection_types: DetectionTypeSettings,
    ) -> Self {
        Self {
            notifications: RwLock::new(notifications),
            servers: RwLock::new(servers),
            detection_types: RwLock::new(detection_types),
        }
    }

    pub fn notifications(&self) -> NotificationSettings {
        self.notifications.read().clone()
    }

    pub fn set_notifications(
        &self,
        settings: NotificationSettings,
    ) -> Result<NotificationSettings> {
        settings.validate()?;
        *self.notifications.write() = settings.clone();
        tracing::info!(threshold = %settings.alert_threshold, "notification settings updated");
        Ok(settings)
    }

    /// Server settings with the API key masked
    pub fn servers(&self) -> ServerSettings {
        self.servers.read().masked()
    }

    /// Update server settings. A missing or masked key keeps the stored one.
    pub fn set_servers(&self, mut settings: ServerSettings) -> ServerSettings {
        let mut current = self.servers.write();
        if settings.api_key.is_none() || settings.api_key.as_deref() == Some(MASKED_SECRET) {
            settings.api_key = current.api_key.clone();
        }
        *current = settings;
        tracing::info!(ai_server = %current.ai_server_url, "server settings updated");
        current.masked()
    }

    pub fn detection_types(&self) -> DetectionTypeSettings {
        *self.detection_types.read()
    }

    pub fn set_detection_types(&self, settings: DetectionTypeSettings) -> DetectionTypeSettings {
        *self.detection_types.write() = settings;
        settings
    }
}
