use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::pokedex::Pokedex;
use crate::tables::items::{
    GOLDEN_RAZZ_BERRY, GREAT_BALL, LUCKY_EGG, MASTER_BALL, POKE_BALL, RAZZ_BERRY, ULTRA_BALL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    TotalCaptured,
    PokedexCaughtCount,
    PokedexTypeCaughtCount(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementReward {
    pub item_id: &'static str,
    pub quantity: u32,
}

const fn reward(item_id: &'static str, quantity: u32) -> AchievementReward {
    AchievementReward { item_id, quantity }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub goal: u32,
    pub kind: AchievementKind,
    pub rewards: &'static [AchievementReward],
}

pub const ACHIEVEMENTS: &[AchievementDefinition] = &[
    AchievementDefinition {
        id: "catch_10",
        title: "Rookie Trainer",
        description: "Catch 10 Pokemon.",
        goal: 10,
        kind: AchievementKind::TotalCaptured,
        rewards: &[reward(POKE_BALL, 10), reward(RAZZ_BERRY, 5)],
    },
    AchievementDefinition {
        id: "catch_50",
        title: "Fifty and Counting",
        description: "Catch 50 Pokemon.",
        goal: 50,
        kind: AchievementKind::TotalCaptured,
        rewards: &[reward(GREAT_BALL, 10), reward(GOLDEN_RAZZ_BERRY, 5)],
    },
    AchievementDefinition {
        id: "catch_100",
        title: "Serial Collector",
        description: "Catch 100 Pokemon.",
        goal: 100,
        kind: AchievementKind::TotalCaptured,
        rewards: &[reward(ULTRA_BALL, 15), reward(LUCKY_EGG, 4), reward(MASTER_BALL, 1)],
    },
    AchievementDefinition {
        id: "catch_200",
        title: "Pokemaniac",
        description: "Catch 200 Pokemon.",
        goal: 200,
        kind: AchievementKind::TotalCaptured,
        rewards: &[reward(ULTRA_BALL, 30), reward(LUCKY_EGG, 3)],
    },
    AchievementDefinition {
        id: "pokedex_complete_251",
        title: "Pokemon Master",
        description: "Register 251 Pokemon as caught.",
        goal: 251,
        kind: AchievementKind::PokedexCaughtCount,
        rewards: &[reward(MASTER_BALL, 1), reward(LUCKY_EGG, 5)],
    },
    AchievementDefinition {
        id: "type_normal_20",
        title: "Nothing Normal About It",
        description: "Catch 20 Normal-type Pokemon.",
        goal: 20,
        kind: AchievementKind::PokedexTypeCaughtCount("normal"),
        rewards: &[reward(POKE_BALL, 20)],
    },
    AchievementDefinition {
        id: "type_fire_20",
        title: "Feeling the Heat",
        description: "Catch 20 Fire-type Pokemon.",
        goal: 20,
        kind: AchievementKind::PokedexTypeCaughtCount("fire"),
        rewards: &[reward(GREAT_BALL, 10), reward(RAZZ_BERRY, 10)],
    },
    AchievementDefinition {
        id: "type_water_20",
        title: "Ruler of the Tides",
        description: "Catch 20 Water-type Pokemon.",
        goal: 20,
        kind: AchievementKind::PokedexTypeCaughtCount("water"),
        rewards: &[reward(GREAT_BALL, 10), reward(RAZZ_BERRY, 10)],
    },
    AchievementDefinition {
        id: "type_grass_20",
        title: "Botanical Collector",
        description: "Catch 20 Grass-type Pokemon.",
        goal: 20,
        kind: AchievementKind::PokedexTypeCaughtCount("grass"),
        rewards: &[reward(GREAT_BALL, 10), reward(RAZZ_BERRY, 10)],
    },
];

pub fn definition(id: &str) -> Option<&'static AchievementDefinition> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub current_value: u32,
    pub achieved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementBook {
    progress: IndexMap<String, AchievementProgress>,
}

impl Default for AchievementBook {
    fn default() -> Self {
        Self::from_pairs(Vec::new())
    }
}

impl AchievementBook {
    /// Stored progress, with a zeroed entry added for every definition the
    /// stored data lacks.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, AchievementProgress)>) -> Self {
        let mut progress: IndexMap<String, AchievementProgress> = pairs.into_iter().collect();
        for achievement in ACHIEVEMENTS {
            progress.entry(achievement.id.to_string()).or_default();
        }
        Self { progress }
    }

    pub fn to_pairs(&self) -> Vec<(String, AchievementProgress)> {
        self.progress
            .iter()
            .map(|(id, progress)| (id.clone(), *progress))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<AchievementProgress> {
        self.progress.get(id).copied()
    }

    pub fn achieved_count(&self) -> usize {
        self.progress.values().filter(|p| p.achieved).count()
    }

    /// Re-evaluates every open achievement. Returns the new book (`None` if
    /// nothing moved) and the achievements completed by this pass.
    pub fn recalculate(
        &self,
        total_caught: u32,
        pokedex: &Pokedex,
    ) -> (Option<Self>, Vec<&'static AchievementDefinition>) {
        let mut next = self.clone();
        let mut changed = false;
        let mut completed = Vec::new();

        for achievement in ACHIEVEMENTS {
            let progress = next.progress.entry(achievement.id.to_string()).or_default();
            if progress.achieved {
                continue;
            }
            let value = current_value(achievement.kind, total_caught, pokedex);
            if progress.current_value != value {
                progress.current_value = value;
                changed = true;
            }
            if value >= achievement.goal {
                progress.achieved = true;
                changed = true;
                info!("Achievement completed: {}", achievement.title);
                completed.push(achievement);
            }
        }

        (changed.then_some(next), completed)
    }
}

fn current_value(kind: AchievementKind, total_caught: u32, pokedex: &Pokedex) -> u32 {
    let count = match kind {
        AchievementKind::TotalCaptured => return total_caught,
        AchievementKind::PokedexCaughtCount => pokedex.caught_count(),
        AchievementKind::PokedexTypeCaughtCount(type_name) => pokedex.caught_count_of_type(type_name),
    };
    u32::try_from(count).unwrap_or(u32::MAX)
}
