use serde::Serialize;
use uuid::Uuid;

/// Notifications for whatever presents the game to the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    ItemFound {
        item_id: String,
        quantity: u32,
    },
    ItemPurchased {
        item_id: String,
        quantity: u32,
        cost: u32,
    },
    PokemonSeen {
        pokemon_id: u32,
        is_shiny: bool,
    },
    PokemonCaught {
        encounter_id: Uuid,
        pokemon_id: u32,
        is_shiny: bool,
        xp_gained: u64,
    },
    PokemonFled {
        encounter_id: Uuid,
        pokemon_id: u32,
    },
    LevelUp {
        level: u32,
    },
    AchievementCompleted {
        achievement_id: String,
        title: String,
    },
    LuckyEggUsed {
        bonus_xp: u64,
    },
    SummaryReady {
        encounters: usize,
        distance_meters: f64,
    },
}
