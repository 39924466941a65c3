pub mod achievements;
pub mod backpack;
pub mod collaborators;
pub mod events;
pub mod player;
pub mod pokedex;
pub mod store;

pub use achievements::{
    AchievementBook, AchievementDefinition, AchievementKind, AchievementProgress, AchievementReward,
    ACHIEVEMENTS,
};
pub use backpack::Backpack;
pub use collaborators::{AchievementTracker, CatchRecord, Inventory, PlayerLedger, PokedexLedger};
pub use events::GameEvent;
pub use player::{xp_for_level, PlayerStats, MAX_PLAYER_LEVEL};
pub use pokedex::{Pokedex, PokedexEntry, PokedexStatus, PokedexUpdate};
pub use store::{Collaborators, EventSink, GameStore};
