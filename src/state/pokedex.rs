use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pokeapi::SpeciesInfo;

/// Per-species knowledge. Ordered so that upgrades compare with `>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PokedexStatus {
    #[default]
    Unknown,
    Seen,
    Caught,
}

impl From<PokedexStatus> for u8 {
    fn from(status: PokedexStatus) -> Self {
        match status {
            PokedexStatus::Unknown => 0,
            PokedexStatus::Seen => 1,
            PokedexStatus::Caught => 2,
        }
    }
}

impl TryFrom<u8> for PokedexStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PokedexStatus::Unknown),
            1 => Ok(PokedexStatus::Seen),
            2 => Ok(PokedexStatus::Caught),
            other => Err(format!("invalid pokedex status {other}")),
        }
    }
}

/// Stored entry. Fields added after the first release default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokedexEntry {
    pub pokemon_id: u32,
    #[serde(default)]
    pub name: String,
    pub status: PokedexStatus,
    #[serde(default)]
    pub sprite_url: Option<String>,
    #[serde(default)]
    pub is_caught_shiny: bool,
    #[serde(default)]
    pub caught_with_ball_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl PokedexEntry {
    pub fn unknown(pokemon_id: u32, name: impl Into<String>) -> Self {
        Self {
            pokemon_id,
            name: name.into(),
            status: PokedexStatus::Unknown,
            sprite_url: None,
            is_caught_shiny: false,
            caught_with_ball_id: None,
            types: Vec::new(),
        }
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t.eq_ignore_ascii_case(type_name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PokedexUpdate {
    pub status: PokedexStatus,
    pub name: Option<String>,
    pub sprite_url: Option<String>,
    pub is_shiny: bool,
    pub ball_id: Option<String>,
    pub types: Option<Vec<String>>,
}

impl PokedexUpdate {
    pub fn seen(name: &str, sprite_url: Option<&str>, is_shiny: bool) -> Self {
        Self {
            status: PokedexStatus::Seen,
            name: Some(name.to_string()),
            sprite_url: sprite_url.map(str::to_string),
            is_shiny,
            ball_id: None,
            types: None,
        }
    }

    pub fn caught(
        name: &str,
        sprite_url: Option<&str>,
        is_shiny: bool,
        ball_id: &str,
        types: &[String],
    ) -> Self {
        Self {
            status: PokedexStatus::Caught,
            name: Some(name.to_string()),
            sprite_url: sprite_url.map(str::to_string),
            is_shiny,
            ball_id: Some(ball_id.to_string()),
            types: Some(types.to_vec()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pokedex {
    entries: IndexMap<u32, PokedexEntry>,
}

impl Pokedex {
    /// Skeleton with one `Unknown` entry per species, sorted by id.
    pub fn seeded(species: &[SpeciesInfo]) -> Self {
        let mut entries: IndexMap<u32, PokedexEntry> = species
            .iter()
            .filter_map(|info| info.id().map(|id| (id, PokedexEntry::unknown(id, &info.name))))
            .collect();
        entries.sort_keys();
        Self { entries }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, PokedexEntry)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    pub fn to_pairs(&self) -> Vec<(u32, PokedexEntry)> {
        self.entries
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, pokemon_id: u32) -> Option<&PokedexEntry> {
        self.entries.get(&pokemon_id)
    }

    pub fn status(&self, pokemon_id: u32) -> PokedexStatus {
        self.get(pokemon_id).map(|e| e.status).unwrap_or_default()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PokedexEntry> {
        self.entries.values()
    }

    pub fn count_with_status(&self, status: PokedexStatus) -> usize {
        self.entries().filter(|e| e.status == status).count()
    }

    pub fn caught_count(&self) -> usize {
        self.count_with_status(PokedexStatus::Caught)
    }

    pub fn caught_count_of_type(&self, type_name: &str) -> usize {
        self.entries()
            .filter(|e| e.status == PokedexStatus::Caught && e.has_type(type_name))
            .count()
    }

    /// Applies an update and returns the new snapshot, or `None` if nothing
    /// changed.
    ///
    /// Status only ever moves up. The sprite is filled in when missing and
    /// replaced on a catch. Shiny flag, ball and types are only recorded by
    /// a catch. Species missing from the skeleton get a fresh entry.
    pub fn with_update(&self, pokemon_id: u32, update: &PokedexUpdate) -> Option<Self> {
        let current = self.entries.get(&pokemon_id).cloned().unwrap_or_else(|| {
            PokedexEntry::unknown(pokemon_id, update.name.clone().unwrap_or_default())
        });
        let is_new_entry = !self.entries.contains_key(&pokemon_id);
        let is_catch = update.status == PokedexStatus::Caught;
        let raise_status = update.status > current.status;
        let replace_sprite =
            update.sprite_url.is_some() && (current.sprite_url.is_none() || is_catch);

        if !(is_new_entry || raise_status || replace_sprite || is_catch) {
            return None;
        }

        let mut entry = current;
        if raise_status {
            entry.status = update.status;
        }
        if replace_sprite {
            entry.sprite_url = update.sprite_url.clone();
        }
        if entry.name.is_empty() {
            if let Some(name) = &update.name {
                entry.name = name.clone();
            }
        }
        if is_catch {
            entry.is_caught_shiny = entry.is_caught_shiny || update.is_shiny;
            entry.caught_with_ball_id = update.ball_id.clone();
            if let Some(types) = &update.types {
                entry.types = types.clone();
            }
        }

        debug!(
            "Pokedex updated: {} status {:?} shiny {} ball {:?}",
            pokemon_id, entry.status, entry.is_caught_shiny, entry.caught_with_ball_id
        );
        let mut next = self.clone();
        next.entries.insert(pokemon_id, entry);
        Some(next)
    }
}
