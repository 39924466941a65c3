use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::persisted::{save, Persisted};
use super::storage::StorageBackend;
use crate::error::StorageError;
use crate::state::GameStore;

/// Mirrors store snapshots to storage, one debounced writer per key.
///
/// A write happens once a value has been quiet for the debounce period.
/// Failed writes are logged; the next change schedules another attempt.
pub struct PersistenceObserver {
    writers: Vec<JoinHandle<()>>,
}

impl PersistenceObserver {
    pub fn attach(store: &GameStore, storage: Arc<dyn StorageBackend>, debounce: Duration) -> Self {
        let writers = vec![
            spawn_writer(store.watch_backpack(), storage.clone(), debounce),
            spawn_writer(store.watch_pokedex(), storage.clone(), debounce),
            spawn_writer(store.watch_player(), storage.clone(), debounce),
            spawn_writer(store.watch_achievements(), storage, debounce),
        ];
        Self { writers }
    }

    pub fn shutdown(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for writer in self.writers.drain(..) {
            writer.abort();
        }
    }
}

impl Drop for PersistenceObserver {
    fn drop(&mut self) {
        self.abort_all();
    }
}

pub fn spawn_writer<T: Persisted>(
    rx: watch::Receiver<T>,
    storage: Arc<dyn StorageBackend>,
    debounce: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_writer(rx, storage, debounce))
}

async fn run_writer<T: Persisted>(
    mut rx: watch::Receiver<T>,
    storage: Arc<dyn StorageBackend>,
    debounce: Duration,
) {
    while rx.changed().await.is_ok() {
        let mut closed = false;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        closed = true;
                        break;
                    }
                }
            }
        }

        let snapshot = rx.borrow_and_update().clone();
        match save(storage.as_ref(), &snapshot).await {
            Ok(()) => debug!("Saved {}", T::KEY),
            Err(e) => warn!("Failed to save {}: {}", T::KEY, e),
        }
        if closed {
            break;
        }
    }
}

/// Writes every piece of state right away.
pub async fn flush(store: &GameStore, storage: &dyn StorageBackend) -> Result<(), StorageError> {
    save(storage, &store.backpack()).await?;
    save(storage, &store.pokedex()).await?;
    save(storage, &store.player()).await?;
    save(storage, &store.achievements()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{keys, load, MemoryStorage};
    use crate::state::{Backpack, Inventory, PlayerStats};

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_bursts_are_coalesced_into_one_write() {
        let store = GameStore::new();
        let storage = Arc::new(MemoryStorage::new());
        let _observer = PersistenceObserver::attach(&store, storage.clone(), Duration::from_secs(1));
        settle().await;

        for _ in 0..5 {
            store.add_item("potion", 1);
            tokio::time::advance(Duration::from_millis(200)).await;
            settle().await;
        }
        assert_eq!(storage.write_count(), 0);

        tokio::time::advance(Duration::from_millis(1_100)).await;
        settle().await;
        assert_eq!(storage.write_count(), 1);

        let saved: Backpack = load(storage.as_ref()).await.unwrap().unwrap();
        assert_eq!(saved.count("potion"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_is_retried_on_next_change() {
        let store = GameStore::new();
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_writes(true);
        let _observer = PersistenceObserver::attach(&store, storage.clone(), Duration::from_secs(1));
        settle().await;

        store.add_item("potion", 1);
        settle().await;
        tokio::time::advance(Duration::from_millis(1_100)).await;
        settle().await;
        assert!(storage.raw(keys::BACKPACK).is_none());
        assert_eq!(store.count("potion"), 1);

        storage.set_fail_writes(false);
        store.add_item("potion", 1);
        settle().await;
        tokio::time::advance(Duration::from_millis(1_100)).await;
        settle().await;
        let saved: Backpack = load(storage.as_ref()).await.unwrap().unwrap();
        assert_eq!(saved.count("potion"), 2);
    }

    #[tokio::test]
    async fn test_flush_writes_everything() {
        let store = GameStore::new();
        let storage = MemoryStorage::new();
        flush(&store, &storage).await.unwrap();
        assert_eq!(storage.write_count(), 4);
        let stats: PlayerStats = load(&storage).await.unwrap().unwrap();
        assert_eq!(stats, PlayerStats::default());
    }
}
