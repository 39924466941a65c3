use serde::{Deserialize, Serialize};
use tracing::info;

pub const MAX_PLAYER_LEVEL: u32 = 50;
pub const XP_PER_CATCH_BASE: u64 = 100;
pub const XP_PER_CATCH_SHINY_BONUS: u64 = 500;
pub const XP_PER_CATCH_NEW_SPECIES_BONUS: u64 = 300;
pub const XP_PER_KM_WALKED: u64 = 50;
pub const MAX_PLAYER_NAME_CHARS: usize = 20;
pub const DEFAULT_PLAYER_NAME: &str = "Trainer";

/// XP needed to go from `level` to the next one.
pub fn xp_for_level(level: u32) -> u64 {
    (100.0 * f64::from(level).powf(2.5)).floor() as u64
}

/// XP awarded for one catch.
pub fn catch_xp(is_shiny: bool, is_new_species: bool, multiplier: f64) -> u64 {
    let mut base = XP_PER_CATCH_BASE;
    if is_shiny {
        base += XP_PER_CATCH_SHINY_BONUS;
    }
    if is_new_species {
        base += XP_PER_CATCH_NEW_SPECIES_BONUS;
    }
    (base as f64 * multiplier.max(0.0)).floor() as u64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u64,
    #[serde(rename = "xpToNextLevel")]
    pub xp_to_next_level: u64,
    pub total_pokemon_caught: u32,
    pub total_shiny_caught: u32,
    pub total_distance_walked: f64,
    pub profile_picture_id: Option<String>,
    pub player_name: String,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            level: 1,
            current_xp: 0,
            xp_to_next_level: xp_for_level(1),
            total_pokemon_caught: 0,
            total_shiny_caught: 0,
            total_distance_walked: 0.0,
            profile_picture_id: None,
            player_name: DEFAULT_PLAYER_NAME.to_string(),
        }
    }
}

impl PlayerStats {
    /// Repairs values a stored record may have lost.
    pub fn normalized(mut self) -> Self {
        self.level = self.level.clamp(1, MAX_PLAYER_LEVEL);
        if self.level < MAX_PLAYER_LEVEL && self.xp_to_next_level == 0 {
            self.xp_to_next_level = xp_for_level(self.level);
        }
        if !self.total_distance_walked.is_finite() || self.total_distance_walked < 0.0 {
            self.total_distance_walked = 0.0;
        }
        if self.player_name.trim().is_empty() {
            self.player_name = DEFAULT_PLAYER_NAME.to_string();
        }
        self
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_PLAYER_LEVEL
    }

    /// Adds XP, levelling up as many times as it covers. Returns the new
    /// stats and the levels gained.
    pub fn with_xp(&self, amount: u64) -> (Self, u32) {
        let mut next = self.clone();
        if amount == 0 || (next.is_max_level() && next.xp_to_next_level == 0) {
            return (next, 0);
        }
        next.current_xp += amount;
        let mut gained = 0;
        while next.xp_to_next_level > 0
            && next.current_xp >= next.xp_to_next_level
            && next.level < MAX_PLAYER_LEVEL
        {
            next.current_xp -= next.xp_to_next_level;
            next.level += 1;
            next.xp_to_next_level = xp_for_level(next.level);
            gained += 1;
            info!("Level up! Now level {}", next.level);
        }
        if next.is_max_level() {
            next.xp_to_next_level = 0;
        }
        (next, gained)
    }

    /// Adds walked distance. Returns the new stats and the XP earned for each
    /// whole kilometre crossed.
    pub fn with_distance(&self, meters: f64) -> (Self, u64) {
        let mut next = self.clone();
        if !meters.is_finite() || meters <= 0.0 {
            return (next, 0);
        }
        let previous_km = (self.total_distance_walked / 1000.0).floor() as u64;
        next.total_distance_walked += meters;
        let current_km = (next.total_distance_walked / 1000.0).floor() as u64;
        (next, current_km.saturating_sub(previous_km) * XP_PER_KM_WALKED)
    }

    /// Counts a catch. XP is granted separately with [`PlayerStats::with_xp`].
    pub fn with_catch(&self, is_shiny: bool) -> Self {
        let mut next = self.clone();
        next.total_pokemon_caught += 1;
        if is_shiny {
            next.total_shiny_caught += 1;
        }
        next
    }

    /// Trims and caps the name. `None` if nothing is left.
    pub fn with_name(&self, name: &str) -> Option<Self> {
        let trimmed: String = name.trim().chars().take(MAX_PLAYER_NAME_CHARS).collect();
        if trimmed.is_empty() {
            return None;
        }
        let mut next = self.clone();
        next.player_name = trimmed;
        Some(next)
    }

    pub fn with_profile_picture(&self, picture_id: Option<&str>) -> Self {
        let mut next = self.clone();
        next.profile_picture_id = picture_id.map(str::to_string);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_curve() {
        assert_eq!(xp_for_level(1), 100);
        assert_eq!(xp_for_level(2), 565);
        assert_eq!(xp_for_level(10), 31_622);
    }

    #[test]
    fn test_catch_xp() {
        assert_eq!(catch_xp(false, false, 1.0), 100);
        assert_eq!(catch_xp(true, true, 1.0), 900);
        assert_eq!(catch_xp(false, true, 2.0), 800);
    }

    #[test]
    fn test_xp_rolls_over_multiple_levels() {
        let stats = PlayerStats::default();
        let (next, gained) = stats.with_xp(100 + 565 + 10);
        assert_eq!(gained, 2);
        assert_eq!(next.level, 3);
        assert_eq!(next.current_xp, 10);
        assert_eq!(next.xp_to_next_level, xp_for_level(3));
    }

    #[test]
    fn test_max_level_stops_progression() {
        let stats = PlayerStats {
            level: MAX_PLAYER_LEVEL - 1,
            xp_to_next_level: xp_for_level(MAX_PLAYER_LEVEL - 1),
            ..PlayerStats::default()
        };
        let (maxed, gained) = stats.with_xp(u64::MAX / 2);
        assert_eq!(gained, 1);
        assert!(maxed.is_max_level());
        assert_eq!(maxed.xp_to_next_level, 0);

        let (after, gained) = maxed.with_xp(1_000);
        assert_eq!(gained, 0);
        assert_eq!(after, maxed);
    }

    #[test]
    fn test_distance_xp_per_whole_km() {
        let stats = PlayerStats {
            total_distance_walked: 900.0,
            ..PlayerStats::default()
        };
        // 900 m -> 3100 m crosses the 1, 2 and 3 km marks
        let (next, xp) = stats.with_distance(2_200.0);
        assert_eq!(xp, 3 * XP_PER_KM_WALKED);
        assert!((next.total_distance_walked - 3_100.0).abs() < 1e-9);

        let (_, xp) = next.with_distance(-5.0);
        assert_eq!(xp, 0);
    }

    #[test]
    fn test_name_rules() {
        let stats = PlayerStats::default();
        assert!(stats.with_name("   ").is_none());
        let renamed = stats.with_name("  Ash Ketchum of Pallet Town ").unwrap();
        assert_eq!(renamed.player_name.chars().count(), MAX_PLAYER_NAME_CHARS);
        assert_eq!(renamed.player_name, "Ash Ketchum of Palle");
    }

    #[test]
    fn test_partial_record_is_repaired() {
        let stats: PlayerStats =
            serde_json::from_str(r#"{"level":3,"currentXP":20,"xpToNextLevel":0,"playerName":""}"#)
                .unwrap();
        let stats = stats.normalized();
        assert_eq!(stats.xp_to_next_level, xp_for_level(3));
        assert_eq!(stats.player_name, DEFAULT_PLAYER_NAME);
        assert_eq!(stats.total_pokemon_caught, 0);
    }
}
