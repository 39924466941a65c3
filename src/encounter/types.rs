use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::pokeapi::PokemonDetails;
use crate::remote::EventConfig;
use crate::tables::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonEncounter {
    pub id: Uuid,
    pub location: Coordinate,
    pub pokemon_details: PokemonDetails,
    pub is_shiny: bool,
    pub caught: bool,
}

impl PokemonEncounter {
    pub fn sprite(&self) -> Option<&str> {
        self.pokemon_details.sprite(self.is_shiny)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEncounter {
    pub id: Uuid,
    pub location: Coordinate,
    pub item_details: Item,
    pub quantity: u32,
}

/// Something found along the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Encounter {
    Pokemon(PokemonEncounter),
    Item(ItemEncounter),
}

impl Encounter {
    pub fn id(&self) -> Uuid {
        match self {
            Encounter::Pokemon(p) => p.id,
            Encounter::Item(i) => i.id,
        }
    }

    pub fn location(&self) -> Coordinate {
        match self {
            Encounter::Pokemon(p) => p.location,
            Encounter::Item(i) => i.location,
        }
    }

    pub fn as_pokemon(&self) -> Option<&PokemonEncounter> {
        match self {
            Encounter::Pokemon(p) => Some(p),
            Encounter::Item(_) => None,
        }
    }

    pub fn is_caught(&self) -> bool {
        matches!(self, Encounter::Pokemon(p) if p.caught)
    }
}

/// A fetched species weighed against the active event's type boosts.
#[derive(Debug, Clone)]
pub struct SpawnCandidate {
    pub details: PokemonDetails,
    pub is_target_type: bool,
    pub spawn_multiplier: f64,
}

impl SpawnCandidate {
    pub fn evaluate(details: PokemonDetails, event: Option<&EventConfig>) -> Self {
        let boost = event.and_then(|e| e.boost_for_types(details.types.iter().map(String::as_str)));
        Self {
            details,
            is_target_type: boost.is_some(),
            spawn_multiplier: boost.unwrap_or(1.0).max(1.0),
        }
    }

    /// Probability that this candidate survives the event filter.
    ///
    /// A boosted type with multiplier `m > 1` is kept with `m / (m + 1)`.
    /// Anything else, while the event boosts some type, is kept with
    /// `1 / max_boost` unless `suppress_unboosted` is off.
    pub fn keep_chance(&self, event: Option<&EventConfig>, suppress_unboosted: bool) -> f64 {
        let Some(event) = event.filter(|e| e.type_rates().is_some()) else {
            return 1.0;
        };
        if self.is_target_type && self.spawn_multiplier > 1.0 {
            let m = self.spawn_multiplier;
            return m / (m + 1.0);
        }
        if !suppress_unboosted {
            return 1.0;
        }
        let skip_chance = 1.0 - 1.0 / event.max_type_boost();
        1.0 - skip_chance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokeapi::species;
    use crate::remote::EventBoosts;
    use indexmap::IndexMap;

    fn fire_event(rate: f64) -> EventConfig {
        let mut rates = IndexMap::new();
        rates.insert("fire".to_string(), rate);
        rates.insert("water".to_string(), 1.5);
        EventConfig {
            id: "fire-fest".into(),
            is_event_running: true,
            boosts: Some(EventBoosts {
                pokemon_type_rates: rates,
                ..EventBoosts::default()
            }),
            ..EventConfig::default()
        }
    }

    #[test]
    fn test_keep_chance_for_boosted_and_unboosted() {
        let event = fire_event(3.0);
        let charmander = SpawnCandidate::evaluate(species(4, "charmander", &["fire"], 45), Some(&event));
        assert!(charmander.is_target_type);
        assert_eq!(charmander.keep_chance(Some(&event), true), 0.75);

        let pidgey = SpawnCandidate::evaluate(species(16, "pidgey", &["normal", "flying"], 255), Some(&event));
        assert!(!pidgey.is_target_type);
        assert!((pidgey.keep_chance(Some(&event), true) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(pidgey.keep_chance(Some(&event), false), 1.0);
        assert_eq!(pidgey.keep_chance(None, true), 1.0);
    }

    #[test]
    fn test_encounter_serializes_with_type_tag() {
        let encounter = Encounter::Pokemon(PokemonEncounter {
            id: Uuid::new_v4(),
            location: Coordinate::new(1.0, 2.0),
            pokemon_details: species(25, "pikachu", &["electric"], 190),
            is_shiny: false,
            caught: false,
        });
        let json = serde_json::to_value(&encounter).unwrap();
        assert_eq!(json["type"], "pokemon");
        assert_eq!(json["pokemonDetails"]["name"], "pikachu");
        assert_eq!(json["isShiny"], false);
    }
}
