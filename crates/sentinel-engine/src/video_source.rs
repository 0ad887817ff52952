//! Video source collaborators feeding the camera registry.
//!
//! Sources are consumed read-only. The registry normally talks to a
//! [`FallbackSource`]: a configured catalog first, then an enumeration of a
//! Supabase-style storage bucket when the catalog is empty.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sentinel_core::{Error, Result};

/// A recorded video offered as a camera feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub name: String,
    pub url: String,
    #[serde(default, alias = "thumbnail_url")]
    pub thumbnail_url: Option<String>,
}

impl VideoEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            thumbnail_url: None,
        }
    }
}

/// Trait for video listing backends
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &str;

    /// List the available videos
    async fn list_videos(&self) -> Result<Vec<VideoEntry>>;
}

/// Fixed list of videos from configuration
#[derive(Debug, Clone, Default)]
pub struct CatalogSource {
    entries: Vec<VideoEntry>,
}

impl CatalogSource {
    pub fn new(entries: Vec<VideoEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl VideoSource for CatalogSource {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn list_videos(&self) -> Result<Vec<VideoEntry>> {
        Ok(self.entries.clone())
    }
}

/// Storage bucket connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub base_url: String,

    /// Anonymous API key sent as `apikey` and bearer token
    pub api_key: Option<String>,

    /// Buckets tried in order; the first one holding videos wins
    pub buckets: Vec<String>,

    /// File extensions treated as video
    pub extensions: Vec<String>,

    /// Maximum objects listed per bucket
    pub page_limit: u32,

    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            buckets: ["videos", "video", "media", "assets", "public"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extensions: ["mp4", "webm", "mov", "avi", "mkv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            page_limit: 100,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StorageObject {
    name: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
    #[serde(rename = "sortBy")]
    sort_by: SortBy<'a>,
}

#[derive(Debug, Serialize)]
struct SortBy<'a> {
    column: &'a str,
    order: &'a str,
}

/// Enumerates video objects in a storage bucket over the storage REST API
pub struct StorageBucketSource {
    client: reqwest::Client,
    config: StorageConfig,
}

impl StorageBucketSource {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Whether the file extension marks a video (case-insensitive)
    pub fn is_video_file(&self, name: &str) -> bool {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.config.extensions.iter().any(|e| *e == ext)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| Error::Config(format!("invalid storage base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("storage base url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Public URL of an object
    pub fn public_url(&self, bucket: &str, name: &str) -> Result<String> {
        Ok(self
            .endpoint(&["storage", "v1", "object", "public", bucket, name])?
            .to_string())
    }

    async fn list_bucket(&self, bucket: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&["storage", "v1", "object", "list", bucket])?;
        let body = ListRequest {
            prefix: "",
            limit: self.config.page_limit,
            offset: 0,
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
        };

        let mut request = self.client.post(url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::VideoSource(format!(
                "bucket '{}' returned {}",
                bucket,
                response.status()
            )));
        }

        let objects: Vec<StorageObject> = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(objects.into_iter().map(|o| o.name).collect())
    }
}

#[async_trait]
impl VideoSource for StorageBucketSource {
    fn name(&self) -> &str {
        "storage"
    }

    async fn list_videos(&self) -> Result<Vec<VideoEntry>> {
        for bucket in &self.config.buckets {
            let names = match self.list_bucket(bucket).await {
                Ok(names) => names,
                Err(e) => {
                    tracing::debug!(bucket = %bucket, "bucket not accessible: {e}");
                    continue;
                }
            };

            let videos: Vec<String> = names
                .into_iter()
                .filter(|name| self.is_video_file(name))
                .collect();

            if videos.is_empty() {
                continue;
            }

            tracing::info!(bucket = %bucket, count = videos.len(), "found videos in storage");

            return videos
                .into_iter()
                .map(|name| {
                    let url = self.public_url(bucket, &name)?;
                    Ok(VideoEntry::new(name, url))
                })
                .collect();
        }

        tracing::info!("no videos found in any storage bucket");
        Ok(Vec::new())
    }
}

/// Tries `primary`, falling back to `secondary` when it yields nothing
pub struct FallbackSource {
    primary: Box<dyn VideoSource>,
    secondary: Box<dyn VideoSource>,
}

impl FallbackSource {
    pub fn new<P, S>(primary: P, secondary: S) -> Self
    where
        P: VideoSource + 'static,
        S: VideoSource + 'static,
    {
        Self {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }
    }
}

#[async_trait]
impl VideoSource for FallbackSource {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn list_videos(&self) -> Result<Vec<VideoEntry>> {
        match self.primary.list_videos().await {
            Ok(videos) if !videos.is_empty() => return Ok(videos),
            Ok(_) => tracing::info!(
                primary = self.primary.name(),
                secondary = self.secondary.name(),
                "primary video source empty, trying secondary"
            ),
            Err(e) => tracing::warn!(
                primary = self.primary.name(),
                secondary = self.secondary.name(),
                "primary video source failed: {e}"
            ),
        }

        self.secondary.list_videos().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    #[async_trait]
    impl VideoSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn list_videos(&self) -> Result<Vec<VideoEntry>> {
            Err(Error::VideoSource("unreachable".into()))
        }
    }

    fn catalog(names: &[&str]) -> CatalogSource {
        CatalogSource::new(
            names
                .iter()
                .map(|n| VideoEntry::new(*n, format!("https://cdn.test/{n}.mp4")))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_fallback_prefers_primary() {
        let source = FallbackSource::new(catalog(&["Hall Crowd"]), catalog(&["Other"]));
        let videos = source.list_videos().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].name, "Hall Crowd");
    }

    #[tokio::test]
    async fn test_fallback_on_empty_or_failed_primary() {
        let source = FallbackSource::new(catalog(&[]), catalog(&["a", "b"]));
        assert_eq!(source.list_videos().await.unwrap().len(), 2);

        let source = FallbackSource::new(FailingSource, catalog(&["a"]));
        assert_eq!(source.list_videos().await.unwrap().len(), 1);

        let source = FallbackSource::new(catalog(&[]), FailingSource);
        assert!(source.list_videos().await.is_err());
    }

    #[test]
    fn test_storage_video_filter() {
        let source = StorageBucketSource::new(StorageConfig::default()).unwrap();
        assert!(source.is_video_file("lobby.MP4"));
        assert!(source.is_video_file("clip.final.webm"));
        assert!(!source.is_video_file("notes.txt"));
        assert!(!source.is_video_file("README"));
    }

    #[test]
    fn test_storage_public_url_encodes_names() {
        let config = StorageConfig {
            base_url: "https://demo.supabase.co/".to_string(),
            ..Default::default()
        };
        let source = StorageBucketSource::new(config).unwrap();
        let url = source.public_url("video", "01 - Entrance.mp4").unwrap();
        assert_eq!(
            url,
            "https://demo.supabase.co/storage/v1/object/public/video/01%20-%20Entrance.mp4"
        );
    }
}
