use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use super::achievements::{definition, AchievementBook};
use super::backpack::Backpack;
use super::collaborators::{AchievementTracker, CatchRecord, Inventory, PlayerLedger, PokedexLedger};
use super::events::GameEvent;
use super::player::{catch_xp, PlayerStats};
use super::pokedex::{Pokedex, PokedexEntry, PokedexStatus, PokedexUpdate};
use crate::error::DataFetchError;
use crate::persistence::{load, Persisted, StorageBackend};
use crate::pokeapi::PokemonDataSource;
use crate::tables::catalog;

const EVENT_CAPACITY: usize = 256;

/// Receives game notifications.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: GameEvent);
}

impl EventSink for broadcast::Sender<GameEvent> {
    fn emit(&self, event: GameEvent) {
        // no subscribers is fine
        let _ = self.send(event);
    }
}

/// Owner of the canonical game state.
///
/// Each piece lives in a `watch` channel and is replaced wholesale on every
/// change, so subscribers (persistence, UI) always see complete snapshots.
pub struct GameStore {
    backpack: watch::Sender<Backpack>,
    pokedex: watch::Sender<Pokedex>,
    player: watch::Sender<PlayerStats>,
    achievements: watch::Sender<AchievementBook>,
    events: broadcast::Sender<GameEvent>,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::with_state(
            Backpack::starter(),
            Pokedex::default(),
            PlayerStats::default(),
            AchievementBook::default(),
        )
    }
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(
        backpack: Backpack,
        pokedex: Pokedex,
        player: PlayerStats,
        achievements: AchievementBook,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backpack: watch::Sender::new(backpack),
            pokedex: watch::Sender::new(pokedex),
            player: watch::Sender::new(player),
            achievements: watch::Sender::new(achievements),
            events,
        }
    }

    /// Restores every piece of state from storage. Missing or unreadable
    /// values fall back to their defaults.
    #[instrument(skip(storage))]
    pub async fn load(storage: &dyn StorageBackend) -> Self {
        let backpack = load_or(storage, Backpack::starter).await;
        let pokedex = load_or(storage, Pokedex::default).await;
        let player = load_or(storage, PlayerStats::default).await;
        let achievements = load_or(storage, AchievementBook::default).await;
        info!(
            "Loaded state: {} item types, {} pokedex entries, level {}",
            backpack.len(),
            pokedex.len(),
            player.level
        );
        Self::with_state(backpack, pokedex, player, achievements)
    }

    /// Builds the Pokédex skeleton from the species list if it is empty.
    /// Returns the number of entries created.
    pub async fn seed_pokedex(
        &self,
        source: &dyn PokemonDataSource,
        dex_count: u32,
    ) -> Result<usize, DataFetchError> {
        if !self.pokedex.borrow().is_empty() {
            return Ok(0);
        }
        let species = source.species_list(dex_count).await?;
        let seeded = Pokedex::seeded(&species);
        let created = seeded.len();
        self.pokedex.send_if_modified(|dex| {
            if dex.is_empty() {
                *dex = seeded;
                true
            } else {
                false
            }
        });
        info!("Seeded pokedex with {} species", created);
        Ok(created)
    }

    pub fn backpack(&self) -> Backpack {
        self.backpack.borrow().clone()
    }

    pub fn pokedex(&self) -> Pokedex {
        self.pokedex.borrow().clone()
    }

    pub fn player(&self) -> PlayerStats {
        self.player.borrow().clone()
    }

    pub fn achievements(&self) -> AchievementBook {
        self.achievements.borrow().clone()
    }

    pub fn watch_backpack(&self) -> watch::Receiver<Backpack> {
        self.backpack.subscribe()
    }

    pub fn watch_pokedex(&self) -> watch::Receiver<Pokedex> {
        self.pokedex.subscribe()
    }

    pub fn watch_player(&self) -> watch::Receiver<PlayerStats> {
        self.player.subscribe()
    }

    pub fn watch_achievements(&self) -> watch::Receiver<AchievementBook> {
        self.achievements.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> broadcast::Sender<GameEvent> {
        self.events.clone()
    }

    pub fn set_player_name(&self, name: &str) -> bool {
        self.player.send_if_modified(|stats| match stats.with_name(name) {
            Some(next) if next != *stats => {
                *stats = next;
                true
            }
            _ => false,
        })
    }

    pub fn set_profile_picture(&self, picture_id: Option<&str>) {
        self.player.send_if_modified(|stats| {
            let next = stats.with_profile_picture(picture_id);
            let changed = next != *stats;
            *stats = next;
            changed
        });
    }

    /// Resets everything to a new player's state.
    pub fn reset(&self) {
        self.backpack.send_replace(Backpack::starter());
        self.player.send_replace(PlayerStats::default());
        self.achievements.send_replace(AchievementBook::default());
        self.pokedex.send_modify(|dex| {
            *dex = Pokedex::from_pairs(
                dex.entries()
                    .map(|e| (e.pokemon_id, PokedexEntry::unknown(e.pokemon_id, &e.name))),
            );
        });
        info!("Game state reset");
    }

    pub fn achievement_title(id: &str) -> Option<&'static str> {
        definition(id).map(|a| a.title)
    }

    fn apply_xp(&self, amount: u64) -> u32 {
        let mut gained = 0;
        let mut level = 0;
        self.player.send_if_modified(|stats| {
            let (next, levels) = stats.with_xp(amount);
            gained = levels;
            level = next.level;
            let changed = next != *stats;
            *stats = next;
            changed
        });
        if gained > 0 {
            self.emit(GameEvent::LevelUp { level });
        }
        gained
    }
}

async fn load_or<T: Persisted>(storage: &dyn StorageBackend, default: fn() -> T) -> T {
    match load::<T>(storage).await {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!("Nothing stored under {}, using defaults", T::KEY);
            default()
        }
        Err(e) => {
            warn!("Failed to load {}: {}", T::KEY, e);
            default()
        }
    }
}

impl EventSink for GameStore {
    fn emit(&self, event: GameEvent) {
        self.events.emit(event);
    }
}

impl Inventory for GameStore {
    fn add_item(&self, item_id: &str, quantity: u32) {
        if !catalog().contains(item_id) {
            warn!("Ignoring unknown item {}", item_id);
            return;
        }
        let changed = self.backpack.send_if_modified(|backpack| match backpack.with_added(item_id, quantity) {
            Some(next) => {
                *backpack = next;
                true
            }
            None => false,
        });
        if changed {
            debug!("Added {}x {}", quantity, catalog().name_of(item_id));
        }
    }

    fn use_item(&self, item_id: &str, quantity: u32) -> bool {
        let used = self.backpack.send_if_modified(|backpack| match backpack.with_used(item_id, quantity) {
            Some(next) => {
                *backpack = next;
                true
            }
            None => false,
        });
        if used {
            debug!("Used {}x {}", quantity, catalog().name_of(item_id));
        } else {
            debug!("Not enough {} to use {}", item_id, quantity);
        }
        used
    }

    fn count(&self, item_id: &str) -> u32 {
        self.backpack.borrow().count(item_id)
    }
}

impl PokedexLedger for GameStore {
    fn update_entry(&self, pokemon_id: u32, update: PokedexUpdate) -> bool {
        self.pokedex.send_if_modified(|dex| match dex.with_update(pokemon_id, &update) {
            Some(next) => {
                *dex = next;
                true
            }
            None => false,
        })
    }

    fn status(&self, pokemon_id: u32) -> PokedexStatus {
        self.pokedex.borrow().status(pokemon_id)
    }
}

impl PlayerLedger for GameStore {
    fn add_xp(&self, amount: u64) -> u32 {
        self.apply_xp(amount)
    }

    fn add_distance_walked(&self, meters: f64) {
        let mut earned = 0;
        self.player.send_if_modified(|stats| {
            let (next, xp) = stats.with_distance(meters);
            earned = xp;
            let changed = next != *stats;
            *stats = next;
            changed
        });
        if earned > 0 {
            info!("Earned {} XP for distance walked", earned);
            self.apply_xp(earned);
        }
    }

    fn record_pokemon_catch(&self, is_shiny: bool, is_new_species: bool, xp_multiplier: f64) -> CatchRecord {
        let mut total_caught = 0;
        self.player.send_modify(|stats| {
            *stats = stats.with_catch(is_shiny);
            total_caught = stats.total_pokemon_caught;
        });
        let xp_gained = catch_xp(is_shiny, is_new_species, xp_multiplier);
        let levels_gained = self.apply_xp(xp_gained);
        CatchRecord {
            xp_gained,
            total_caught,
            levels_gained,
        }
    }
}

impl AchievementTracker for GameStore {
    fn recalculate_achievements(&self, total_caught: u32) -> Vec<&'static str> {
        let pokedex = self.pokedex();
        let mut completed = Vec::new();
        self.achievements.send_if_modified(|book| {
            let (next, done) = book.recalculate(total_caught, &pokedex);
            completed = done;
            match next {
                Some(next) => {
                    *book = next;
                    true
                }
                None => false,
            }
        });

        for achievement in &completed {
            let rewards: Vec<(&str, u32)> = achievement
                .rewards
                .iter()
                .map(|r| (r.item_id, r.quantity))
                .collect();
            self.add_items(&rewards);
            self.emit(GameEvent::AchievementCompleted {
                achievement_id: achievement.id.to_string(),
                title: achievement.title.to_string(),
            });
        }
        completed.iter().map(|a| a.id).collect()
    }
}

/// The store's collaborator views bundled for the engines.
#[derive(Clone)]
pub struct Collaborators {
    pub inventory: Arc<dyn Inventory>,
    pub pokedex: Arc<dyn PokedexLedger>,
    pub player: Arc<dyn PlayerLedger>,
    pub achievements: Arc<dyn AchievementTracker>,
    pub events: Arc<dyn EventSink>,
}

impl Collaborators {
    pub fn from_store(store: Arc<GameStore>) -> Self {
        Self {
            inventory: store.clone(),
            pokedex: store.clone(),
            player: store.clone(),
            achievements: store.clone(),
            events: store,
        }
    }
}
