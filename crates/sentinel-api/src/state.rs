//! Shared application state handed to every handler.

use std::sync::Arc;

use sentinel_core::Result;
use sentinel_engine::{
    CatalogSource, FallbackSource, MonitoringEngine, StorageBucketSource, VideoSource,
};

use crate::config::SentinelConfig;
use crate::settings::SettingsStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MonitoringEngine>,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    pub fn new(engine: Arc<MonitoringEngine>, settings: Arc<SettingsStore>) -> Self {
        Self { engine, settings }
    }

    /// Build the engine and settings described by `config`
    pub fn from_config(config: &SentinelConfig) -> Result<Self> {
        let video_source = video_source(config)?;
        let engine = MonitoringEngine::new(config.engine.clone(), video_source);
        let settings = SettingsStore::new(
            config.notifications.clone(),
            config.servers.clone(),
            config.detection_types,
        );
        Ok(Self::new(Arc::new(engine), Arc::new(settings)))
    }
}

/// Configured catalog, backed by the storage bucket when one is configured
fn video_source(config: &SentinelConfig) -> Result<Arc<dyn VideoSource>> {
    let catalog = CatalogSource::new(config.video.catalog.clone());
    match &config.video.storage {
        Some(storage) => {
            let bucket = StorageBucketSource::new(storage.clone())?;
            Ok(Arc::new(FallbackSource::new(catalog, bucket)))
        }
        None => Ok(Arc::new(catalog)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_engine::{StorageConfig, VideoEntry};

    #[tokio::test]
    async fn test_from_config_uses_catalog() {
        let mut config = SentinelConfig::default();
        config.video.catalog = vec![VideoEntry::new(
            "Lobby.mp4",
            "http://localhost:8000/lobby.mp4",
        )];
        config.video.storage = Some(StorageConfig::default());

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.engine.refresh_cameras().await.unwrap(), 1);
        assert_eq!(state.engine.registry().cameras()[0].name, "Lobby");
        assert!(!state.engine.is_running());
    }
}
