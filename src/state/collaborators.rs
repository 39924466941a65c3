//! Narrow views of the shared game state handed to the engines.

use super::pokedex::{PokedexStatus, PokedexUpdate};

pub trait Inventory: Send + Sync {
    fn add_item(&self, item_id: &str, quantity: u32);

    fn add_items(&self, items: &[(&str, u32)]) {
        for (item_id, quantity) in items {
            self.add_item(item_id, *quantity);
        }
    }

    /// Removes `quantity` units. `false`, with nothing removed, if there
    /// are not enough.
    fn use_item(&self, item_id: &str, quantity: u32) -> bool;

    fn count(&self, item_id: &str) -> u32;

    fn has_item(&self, item_id: &str) -> bool {
        self.count(item_id) > 0
    }
}

pub trait PokedexLedger: Send + Sync {
    /// Returns whether the entry changed.
    fn update_entry(&self, pokemon_id: u32, update: PokedexUpdate) -> bool;

    fn status(&self, pokemon_id: u32) -> PokedexStatus;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchRecord {
    pub xp_gained: u64,
    pub total_caught: u32,
    pub levels_gained: u32,
}

pub trait PlayerLedger: Send + Sync {
    fn add_xp(&self, amount: u64) -> u32;

    fn add_distance_walked(&self, meters: f64);

    fn record_pokemon_catch(&self, is_shiny: bool, is_new_species: bool, xp_multiplier: f64) -> CatchRecord;
}

pub trait AchievementTracker: Send + Sync {
    /// Returns the ids of achievements completed by this pass.
    fn recalculate_achievements(&self, total_caught: u32) -> Vec<&'static str>;
}
