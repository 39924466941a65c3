use std::sync::Arc;

use tracing::{info, warn};

use super::event_config::EventConfig;
use crate::persistence::{keys, StorageBackend};

/// Decides whether an active event still needs to be announced.
pub struct EventAnnouncer {
    storage: Arc<dyn StorageBackend>,
    last_seen: Option<String>,
}

impl EventAnnouncer {
    /// Reads the last acknowledged event id. A failed read behaves as if no
    /// event was ever seen.
    pub async fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let last_seen = match storage.get(keys::LAST_SEEN_EVENT_ID).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to load last seen event id: {}", e);
                None
            }
        };
        Self { storage, last_seen }
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    pub fn should_announce(&self, active: Option<&EventConfig>) -> bool {
        match active {
            Some(event) => self.last_seen.as_deref() != Some(event.id.as_str()),
            None => false,
        }
    }

    /// Records the event as seen. The in-memory id updates even if the
    /// write fails.
    pub async fn mark_seen(&mut self, event: &EventConfig) {
        info!("Marking event {} as seen", event.id);
        self.last_seen = Some(event.id.clone());
        if let Err(e) = self
            .storage
            .set(keys::LAST_SEEN_EVENT_ID, event.id.clone())
            .await
        {
            warn!("Failed to save last seen event id: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    fn event(id: &str) -> EventConfig {
        EventConfig {
            id: id.to_string(),
            is_event_running: true,
            title: String::new(),
            description: String::new(),
            image_url: None,
            start_date: None,
            end_date: None,
            boosts: None,
            badge_url: None,
        }
    }

    #[tokio::test]
    async fn test_announces_each_event_once() {
        let storage = Arc::new(MemoryStorage::new());
        let mut announcer = EventAnnouncer::load(storage.clone()).await;
        let fire = event("fire-week");

        assert!(!announcer.should_announce(None));
        assert!(announcer.should_announce(Some(&fire)));
        announcer.mark_seen(&fire).await;
        assert!(!announcer.should_announce(Some(&fire)));
        assert!(announcer.should_announce(Some(&event("water-week"))));

        let reloaded = EventAnnouncer::load(storage).await;
        assert_eq!(reloaded.last_seen(), Some("fire-week"));
        assert!(!reloaded.should_announce(Some(&fire)));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_in_memory_state() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_writes(true);
        let mut announcer = EventAnnouncer::load(storage.clone()).await;
        let fire = event("fire-week");

        announcer.mark_seen(&fire).await;
        assert!(!announcer.should_announce(Some(&fire)));
        assert_eq!(storage.raw(keys::LAST_SEEN_EVENT_ID), None);
    }
}
