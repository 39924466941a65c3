use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const POKE_BALL: &str = "pokeball";
pub const GREAT_BALL: &str = "greatball";
pub const ULTRA_BALL: &str = "ultraball";
pub const MASTER_BALL: &str = "masterball";
pub const RAZZ_BERRY: &str = "razz-berry";
pub const NANAB_BERRY: &str = "nanab-berry";
pub const GOLDEN_RAZZ_BERRY: &str = "golden-razz-berry";
pub const SHINY_CHARM: &str = "shiny-charm";
pub const POTION: &str = "potion";
pub const REVIVE: &str = "revive";
pub const LUCKY_EGG: &str = "lucky-egg";
pub const POKE_COIN: &str = "poke-coin";

const SPRITE_URL_BASE: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/items/";

/// Items that can turn up on a walk, in the order weights are summed.
pub const FINDABLE_ITEM_IDS: [&str; 9] = [
    POKE_BALL,
    GREAT_BALL,
    ULTRA_BALL,
    RAZZ_BERRY,
    NANAB_BERRY,
    GOLDEN_RAZZ_BERRY,
    POTION,
    REVIVE,
    LUCKY_EGG,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Pokeball,
    Berry,
    Medicine,
    Key,
    Other,
    Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch_rate_modifier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiny_rate_multiplier: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub sprite: String,
    #[serde(default)]
    pub description: String,
    /// Higher is rarer. Selection weight is `1 / find_difficulty`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_difficulty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<ItemEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
}

impl Item {
    fn new(id: &str, name: &str, category: ItemCategory, sprite: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            sprite: format!("{SPRITE_URL_BASE}{sprite}"),
            description: String::new(),
            find_difficulty: None,
            effect: None,
            price: None,
        }
    }

    fn difficulty(mut self, difficulty: f64) -> Self {
        self.find_difficulty = Some(difficulty);
        self
    }

    fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    fn catch_modifier(mut self, modifier: f64) -> Self {
        self.effect.get_or_insert_with(ItemEffect::default).catch_rate_modifier = Some(modifier);
        self
    }

    fn shiny_multiplier(mut self, multiplier: f64) -> Self {
        self.effect.get_or_insert_with(ItemEffect::default).shiny_rate_multiplier = Some(multiplier);
        self
    }

    fn priced(mut self, price: u32) -> Self {
        self.price = Some(price);
        self
    }

    pub fn catch_rate_modifier(&self) -> Option<f64> {
        self.effect.as_ref().and_then(|effect| effect.catch_rate_modifier)
    }

    pub fn is_berry_with_catch_effect(&self) -> bool {
        self.category == ItemCategory::Berry && self.catch_rate_modifier().is_some()
    }
}

/// Every item the game knows about, keyed by id in declaration order.
#[derive(Debug, Clone)]
pub struct ItemCatalog {
    items: IndexMap<String, Item>,
}

impl ItemCatalog {
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.items.get(id).map(|item| item.name.as_str()).unwrap_or(id)
    }

    /// Berries that change the catch rate when fed before a throw.
    pub fn catch_berries(&self) -> impl Iterator<Item = &Item> {
        self.items.values().filter(|item| item.is_berry_with_catch_effect())
    }

    fn build() -> Self {
        use ItemCategory::*;

        let entries = vec![
            Item::new(POKE_BALL, "Poké Ball", Pokeball, "poke-ball.png")
                .difficulty(1.0)
                .priced(100)
                .described("A device for catching wild Pokémon."),
            Item::new(GREAT_BALL, "Great Ball", Pokeball, "great-ball.png")
                .difficulty(4.0)
                .priced(300)
                .described("A Poké Ball with a higher catch rate than the standard one."),
            Item::new(ULTRA_BALL, "Ultra Ball", Pokeball, "ultra-ball.png")
                .difficulty(8.0)
                .priced(600)
                .described("A high-performance Poké Ball."),
            Item::new(MASTER_BALL, "Master Ball", Pokeball, "master-ball.png")
                .difficulty(1000.0)
                .described("The best Poké Ball. It catches any wild Pokémon without fail."),
            Item::new(RAZZ_BERRY, "Razz Berry", Berry, "razz-berry.png")
                .difficulty(3.0)
                .catch_modifier(1.5)
                .priced(150)
                .described("Feed this to a Pokémon to make it easier to catch."),
            Item::new(NANAB_BERRY, "Nanab Berry", Berry, "nanab-berry.png")
                .difficulty(3.0)
                .described("Calms a Pokémon so it stops moving."),
            Item::new(GOLDEN_RAZZ_BERRY, "Golden Razz Berry", Berry, "golden-razz-berry.png")
                .difficulty(15.0)
                .catch_modifier(2.5)
                .priced(800)
                .described("Greatly increases the chance of catching a Pokémon."),
            Item::new(SHINY_CHARM, "Shiny Charm", Key, "shiny-charm.png")
                .difficulty(500.0)
                .shiny_multiplier(3.0)
                .described("Raises the chance of meeting shiny Pokémon."),
            Item::new(POTION, "Potion", Medicine, "potion.png")
                .difficulty(2.0)
                .priced(200)
                .described("Restores 20 HP of a Pokémon."),
            Item::new(REVIVE, "Revive", Medicine, "revive.png")
                .difficulty(6.0)
                .priced(500)
                .described("Revives a fainted Pokémon."),
            Item::new(LUCKY_EGG, "Lucky Egg", Other, "lucky-egg.png")
                .difficulty(30.0)
                .priced(1000)
                .described("Doubles the experience earned from the next catch."),
            Item::new(POKE_COIN, "Poké Coin", Money, "poke-coin.png")
                .described("Currency accepted at the shop."),
        ];

        Self {
            items: entries
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
        }
    }
}

pub fn catalog() -> &'static ItemCatalog {
    static CATALOG: OnceLock<ItemCatalog> = OnceLock::new();
    CATALOG.get_or_init(ItemCatalog::build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_findable_items_exist_with_positive_difficulty() {
        for id in FINDABLE_ITEM_IDS {
            let item = catalog().get(id).expect("findable item missing from catalog");
            assert!(item.find_difficulty.unwrap_or(0.0) > 0.0, "{id}");
        }
    }

    #[test]
    fn test_catch_berries() {
        let berries: Vec<&str> = catalog().catch_berries().map(|item| item.id.as_str()).collect();
        assert_eq!(berries, vec![RAZZ_BERRY, GOLDEN_RAZZ_BERRY]);
    }

    #[test]
    fn test_catalog_keeps_declaration_order() {
        let first: Vec<&str> = catalog().iter().take(3).map(|item| item.id.as_str()).collect();
        assert_eq!(first, vec![POKE_BALL, GREAT_BALL, ULTRA_BALL]);
        assert_eq!(catalog().name_of("unknown"), "unknown");
    }
}
