pub mod items;
pub mod probability;

pub use items::{
    catalog, Item, ItemCatalog, ItemCategory, ItemEffect, FINDABLE_ITEM_IDS, GOLDEN_RAZZ_BERRY,
    GREAT_BALL, LUCKY_EGG, MASTER_BALL, NANAB_BERRY, POKE_BALL, POKE_COIN, POTION, RAZZ_BERRY,
    REVIVE, SHINY_CHARM, ULTRA_BALL,
};
pub use probability::{
    ball_modifier, berry_modifier, catch_chance, effective_shiny_probability, findable_weights,
    pick_item, CaptureDifficulty, WeightedItem,
};
