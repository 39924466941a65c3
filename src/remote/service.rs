use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::event_config::{EventConfig, RemoteConfig};
use crate::error::RemoteConfigError;

#[async_trait]
pub trait RemoteConfigSource: Send + Sync {
    async fn fetch(&self) -> Result<RemoteConfig, RemoteConfigError>;
}

/// Reads the config document from a local JSON file.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RemoteConfigSource for JsonFileSource {
    async fn fetch(&self) -> Result<RemoteConfig, RemoteConfigError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Serves a fixed document, or fails when there is none.
#[derive(Default)]
pub struct StaticConfigSource {
    config: Mutex<Option<RemoteConfig>>,
}

impl StaticConfigSource {
    pub fn new(config: Option<RemoteConfig>) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    pub fn replace(&self, config: Option<RemoteConfig>) {
        *self.config.lock().unwrap_or_else(|e| e.into_inner()) = config;
    }
}

#[async_trait]
impl RemoteConfigSource for StaticConfigSource {
    async fn fetch(&self) -> Result<RemoteConfig, RemoteConfigError> {
        self.config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| RemoteConfigError::Fetch("no config available".to_string()))
    }
}

struct CachedConfig {
    config: RemoteConfig,
    fetched_at: Instant,
}

/// TTL cache in front of a [`RemoteConfigSource`].
///
/// Every read re-checks the event window. A failed fetch falls back to the
/// last good document, stale or not.
pub struct RemoteConfigService {
    source: Arc<dyn RemoteConfigSource>,
    ttl: Duration,
    cache: Mutex<Option<CachedConfig>>,
}

impl RemoteConfigService {
    pub fn new(source: Arc<dyn RemoteConfigSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub async fn get(&self, force_refresh: bool) -> Option<RemoteConfig> {
        if !force_refresh {
            if let Some(config) = self.fresh_cached() {
                debug!("Using cached remote config");
                return Some(config.validated(Utc::now()));
            }
        }

        match self.source.fetch().await {
            Ok(config) => {
                info!(
                    "Fetched remote config, event: {}",
                    config
                        .current_event
                        .as_ref()
                        .map(|e| e.id.as_str())
                        .unwrap_or("none")
                );
                let validated = config.validated(Utc::now());
                *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = Some(CachedConfig {
                    config: validated.clone(),
                    fetched_at: Instant::now(),
                });
                Some(validated)
            }
            Err(e) => {
                error!("Failed to fetch remote config: {}", e);
                self.any_cached().map(|config| config.validated(Utc::now()))
            }
        }
    }

    pub async fn active_event(&self) -> Option<EventConfig> {
        self.get(false).await?.active_event().cloned()
    }

    fn fresh_cached(&self) -> Option<RemoteConfig> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.config.clone())
    }

    fn any_cached(&self) -> Option<RemoteConfig> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.as_ref().map(|cached| cached.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::event_config::{EventBoosts, EventConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: StaticConfigSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteConfigSource for CountingSource {
        async fn fetch(&self) -> Result<RemoteConfig, RemoteConfigError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch().await
        }
    }

    fn running_event(id: &str) -> RemoteConfig {
        RemoteConfig {
            current_event: Some(EventConfig {
                id: id.to_string(),
                is_event_running: true,
                title: "Test".into(),
                description: String::new(),
                image_url: None,
                start_date: None,
                end_date: None,
                boosts: Some(EventBoosts::default()),
                badge_url: None,
            }),
            default_probabilities: None,
            shop_listing_ids: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_respects_ttl() {
        let source = Arc::new(CountingSource {
            inner: StaticConfigSource::new(Some(running_event("a"))),
            calls: AtomicUsize::new(0),
        });
        let service = RemoteConfigService::new(source.clone(), Duration::from_secs(300));

        assert!(service.get(false).await.is_some());
        assert!(service.get(false).await.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(service.get(false).await.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        assert!(service.get(true).await.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_last_good_copy() {
        let source = Arc::new(StaticConfigSource::new(Some(running_event("a"))));
        let service = RemoteConfigService::new(source.clone(), Duration::from_secs(300));
        assert_eq!(service.active_event().await.unwrap().id, "a");

        source.replace(None);
        let config = service.get(true).await.unwrap();
        assert_eq!(config.active_event().unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_no_config_at_all() {
        let service =
            RemoteConfigService::new(Arc::new(StaticConfigSource::new(None)), Duration::from_secs(1));
        assert!(service.get(false).await.is_none());
        assert!(service.active_event().await.is_none());
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let dir = std::env::temp_dir().join(format!("pokewalk-remote-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("remote.json");
        tokio::fs::write(&path, serde_json::to_string(&running_event("file")).unwrap())
            .await
            .unwrap();

        let config = JsonFileSource::new(&path).fetch().await.unwrap();
        assert_eq!(config.current_event.unwrap().id, "file");
        assert!(JsonFileSource::new(dir.join("missing.json")).fetch().await.is_err());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
