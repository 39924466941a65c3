use serde::de::DeserializeOwned;
use serde::Serialize;

use super::keys;
use super::storage::{load_json, save_json, StorageBackend};
use crate::error::StorageError;
use crate::state::{AchievementBook, AchievementProgress, Backpack, Pokedex, PokedexEntry, PlayerStats};
use crate::tables::catalog;

/// A state snapshot that is mirrored under one storage key.
pub trait Persisted: Clone + Send + Sync + 'static {
    const KEY: &'static str;
    type Stored: Serialize + DeserializeOwned + Send + Sync;

    fn to_stored(&self) -> Self::Stored;
    fn from_stored(stored: Self::Stored) -> Self;
}

pub async fn load<T: Persisted>(storage: &dyn StorageBackend) -> Result<Option<T>, StorageError> {
    Ok(load_json::<T::Stored>(storage, T::KEY).await?.map(T::from_stored))
}

pub async fn save<T: Persisted>(storage: &dyn StorageBackend, value: &T) -> Result<(), StorageError> {
    save_json(storage, T::KEY, &value.to_stored()).await
}

impl Persisted for Backpack {
    const KEY: &'static str = keys::BACKPACK;
    type Stored = Vec<(String, i64)>;

    fn to_stored(&self) -> Self::Stored {
        self.to_pairs()
    }

    fn from_stored(stored: Self::Stored) -> Self {
        Backpack::from_pairs(stored, catalog())
    }
}

impl Persisted for Pokedex {
    const KEY: &'static str = keys::POKEDEX;
    type Stored = Vec<(u32, PokedexEntry)>;

    fn to_stored(&self) -> Self::Stored {
        self.to_pairs()
    }

    fn from_stored(stored: Self::Stored) -> Self {
        Pokedex::from_pairs(stored)
    }
}

impl Persisted for PlayerStats {
    const KEY: &'static str = keys::PLAYER_STATS;
    type Stored = PlayerStats;

    fn to_stored(&self) -> Self::Stored {
        self.clone()
    }

    fn from_stored(stored: Self::Stored) -> Self {
        stored.normalized()
    }
}

impl Persisted for AchievementBook {
    const KEY: &'static str = keys::ACHIEVEMENT_PROGRESS;
    type Stored = Vec<(String, AchievementProgress)>;

    fn to_stored(&self) -> Self::Stored {
        self.to_pairs()
    }

    fn from_stored(stored: Self::Stored) -> Self {
        AchievementBook::from_pairs(stored)
    }
}
