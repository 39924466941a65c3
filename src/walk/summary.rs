use serde::Serialize;
use uuid::Uuid;

use crate::encounter::{Encounter, ItemEncounter, PokemonEncounter};
use crate::geo::Coordinate;

/// Record of one finished walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkSummary {
    pub route: Vec<Coordinate>,
    pub encounters: Vec<Encounter>,
    pub distance_meters: f64,
}

impl WalkSummary {
    pub fn new(route: Vec<Coordinate>, encounters: Vec<Encounter>, distance_meters: f64) -> Self {
        Self {
            route,
            encounters,
            distance_meters,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Encounter> {
        self.encounters.iter().find(|e| e.id() == id)
    }

    pub fn pokemon(&self) -> impl Iterator<Item = &PokemonEncounter> {
        self.encounters.iter().filter_map(Encounter::as_pokemon)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemEncounter> {
        self.encounters.iter().filter_map(|e| match e {
            Encounter::Item(item) => Some(item),
            Encounter::Pokemon(_) => None,
        })
    }

    /// Returns `false` if no Pokémon encounter has this id.
    pub fn mark_caught(&mut self, id: Uuid) -> bool {
        for encounter in &mut self.encounters {
            if let Encounter::Pokemon(pokemon) = encounter {
                if pokemon.id == id {
                    pokemon.caught = true;
                    return true;
                }
            }
        }
        false
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.encounters.len();
        self.encounters.retain(|e| e.id() != id);
        self.encounters.len() != before
    }
}
