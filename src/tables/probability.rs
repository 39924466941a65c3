use indexmap::IndexMap;

use super::items::{ItemCatalog, Item, FINDABLE_ITEM_IDS, GREAT_BALL, MASTER_BALL, POKE_BALL, ULTRA_BALL};

pub const MAX_CATCH_RATE: f64 = 255.0;

/// Catch modifiers per Poké Ball id.
pub const BALL_MODIFIERS: [(&str, f64); 4] = [
    (POKE_BALL, 1.0),
    (GREAT_BALL, 1.5),
    (ULTRA_BALL, 2.0),
    (MASTER_BALL, 255.0),
];

pub fn ball_modifier(ball_id: &str) -> Option<f64> {
    BALL_MODIFIERS
        .iter()
        .find(|(id, _)| *id == ball_id)
        .map(|(_, modifier)| *modifier)
}

pub fn berry_modifier(berry: Option<&Item>) -> f64 {
    berry.and_then(Item::catch_rate_modifier).unwrap_or(1.0)
}

/// `clamp01(max(1, rate) / 255 * ball * berry)`
pub fn catch_chance(capture_rate: u32, ball_modifier: f64, berry_modifier: f64) -> f64 {
    let rate = f64::from(capture_rate.max(1));
    let chance = (rate / MAX_CATCH_RATE) * ball_modifier * berry_modifier;
    if chance.is_nan() {
        return 0.0;
    }
    chance.clamp(0.0, 1.0)
}

/// Shiny odds for a session. Event multipliers that are missing or not
/// positive leave the base untouched.
pub fn effective_shiny_probability(
    base: f64,
    has_shiny_charm: bool,
    charm_multiplier: f64,
    event_multiplier: Option<f64>,
) -> f64 {
    let charm = if has_shiny_charm { charm_multiplier } else { 1.0 };
    let event = event_multiplier.filter(|m| *m > 0.0).unwrap_or(1.0);
    (base * charm * event).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedItem<'a> {
    pub item: &'a Item,
    pub difficulty: f64,
    pub weight: f64,
}

/// Findable items with their inverse-difficulty weights.
///
/// An event override map, when it names anything, replaces the static
/// findable set entirely and supplies the difficulties in its own order.
/// Items without a positive finite difficulty are dropped.
pub fn findable_weights<'a>(
    catalog: &'a ItemCatalog,
    overrides: Option<&IndexMap<String, f64>>,
) -> Vec<WeightedItem<'a>> {
    let candidates: Vec<(&str, Option<f64>)> = match overrides.filter(|map| !map.is_empty()) {
        Some(map) => map.iter().map(|(id, difficulty)| (id.as_str(), Some(*difficulty))).collect(),
        None => FINDABLE_ITEM_IDS
            .iter()
            .map(|id| (*id, catalog.get(id).and_then(|item| item.find_difficulty)))
            .collect(),
    };

    candidates
        .into_iter()
        .filter_map(|(id, difficulty)| {
            let item = catalog.get(id)?;
            let difficulty = difficulty?;
            (difficulty > 0.0 && difficulty.is_finite()).then(|| WeightedItem {
                item,
                difficulty,
                weight: 1.0 / difficulty,
            })
        })
        .collect()
}

pub fn total_weight(weights: &[WeightedItem<'_>]) -> f64 {
    weights.iter().map(|entry| entry.weight).sum()
}

/// Walks cumulative weights in slice order; the first entry whose running
/// sum reaches `draw` wins. `draw` is expected in `[0, total)`.
pub fn pick_by_weight<T>(entries: &[T], weight: impl Fn(&T) -> f64, draw: f64) -> Option<&T> {
    let mut cumulative = 0.0;
    for entry in entries {
        cumulative += weight(entry);
        if draw <= cumulative {
            return Some(entry);
        }
    }
    // float drift at the upper edge
    entries.last()
}

/// Draw an item given a uniform `roll` in `[0, 1)`.
pub fn pick_item<'a, 'b>(weights: &'b [WeightedItem<'a>], roll: f64) -> Option<&'b WeightedItem<'a>> {
    let total = total_weight(weights);
    if total <= 0.0 {
        return None;
    }
    pick_by_weight(weights, |entry| entry.weight, roll * total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureDifficulty {
    VeryEasy,
    Easy,
    Normal,
    Hard,
    VeryHard,
    Legendary,
    Impossible,
}

pub fn capture_difficulty(capture_rate: u32) -> CaptureDifficulty {
    match capture_rate {
        200.. => CaptureDifficulty::VeryEasy,
        120..=199 => CaptureDifficulty::Easy,
        60..=119 => CaptureDifficulty::Normal,
        30..=59 => CaptureDifficulty::Hard,
        4..=29 => CaptureDifficulty::VeryHard,
        3 => CaptureDifficulty::Legendary,
        _ => CaptureDifficulty::Impossible,
    }
}
